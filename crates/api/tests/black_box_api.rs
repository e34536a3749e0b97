use std::sync::Arc;
use std::time::{Duration, Instant};

use orderdesk_api::app::{build_app, services::AppServices};
use orderdesk_infra::config::AppConfig;
use orderdesk_orders::TransitionPolicy;
use reqwest::StatusCode;
use serde_json::{Value, json};

const PAYMENT_DELAY: Duration = Duration::from_millis(200);

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(AppConfig {
            payment_delay: PAYMENT_DELAY,
            ..AppConfig::default()
        })
        .await
    }

    async fn spawn_with(config: AppConfig) -> Self {
        // Same router as prod, in-memory stores, bound to an ephemeral port.
        let app = build_app(Arc::new(AppServices::in_memory(&config)));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        (res.status(), res.json().await.unwrap())
    }

    async fn send(&self, method: reqwest::Method, path: &str) -> (StatusCode, Value) {
        let res = self.client.request(method, self.url(path)).send().await.unwrap();
        (res.status(), res.json().await.unwrap())
    }

    async fn customer(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/customer",
                json!({ "firstName": "Ada", "lastName": "Lovelace", "email": email }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn product(&self, name: &str, price: f64, stock: u32) -> String {
        let (status, body) = self
            .post(
                "/product",
                json!({ "name": name, "description": format!("{name} description"), "price": price, "stock": stock }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn order(&self, customer: &str, items: Value) -> (StatusCode, Value) {
        self.post("/order", json!({ "customerID": customer, "items": items }))
            .await
    }

    async fn stock(&self, product: &str) -> u64 {
        let (status, body) = self
            .send(reqwest::Method::GET, &format!("/product/{product}"))
            .await;
        assert_eq!(status, StatusCode::OK);
        body["stock"].as_u64().unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_ok() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn customer_registration_and_duplicate_email() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv
        .post(
            "/customer",
            json!({ "firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["firstName"], "Ada");
    assert_eq!(body["lastName"], "Lovelace");
    assert_eq!(body["email"], "ada@example.com");
    assert!(body["id"].is_string());

    let (status, body) = srv
        .post(
            "/customer",
            json!({ "firstName": "Grace", "lastName": "Hopper", "email": "ada@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Customer with this email already exists");

    let (status, body) = srv
        .post("/customer", json!({ "firstName": "Ada", "email": "x@example.com" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "First name, last name, and email are required");
}

#[tokio::test]
async fn product_validation() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv
        .post("/product", json!({ "name": "Pen", "price": 1.0, "stock": 3 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Name, description, price, and stock are required");

    let (status, _) = srv
        .post(
            "/product",
            json!({ "name": "Pen", "description": "Blue", "price": -1.0, "stock": 3 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = srv
        .post(
            "/product",
            json!({ "name": "Free", "description": "Sample", "price": 0, "stock": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["price"], json!(0.0));
    assert_eq!(body["stock"], 0);
}

#[tokio::test]
async fn placing_an_order_prices_lines_and_decrements_stock() {
    let srv = TestServer::spawn().await;
    let customer = srv.customer("ada@example.com").await;
    let p1 = srv.product("P1", 1.0, 100).await;

    let (status, body) = srv
        .order(&customer, json!([{ "productID": p1, "quantity": 2 }]))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["totalPrice"], json!(2.0));
    assert_eq!(body["status"], "Pending");
    assert_eq!(body["paymentStatus"], "Pending");
    assert_eq!(body["customerID"], customer.as_str());
    assert_eq!(body["items"][0]["productID"], p1.as_str());
    assert_eq!(srv.stock(&p1).await, 98);
}

#[tokio::test]
async fn order_failures_map_to_client_errors() {
    let srv = TestServer::spawn().await;
    let customer = srv.customer("ada@example.com").await;
    let p1 = srv.product("Widget", 1.0, 10).await;

    let (status, body) = srv.post("/order", json!({ "items": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "CustomerID and items are required");

    let (status, body) = srv
        .order(&customer, json!([{ "productID": p1, "quantity": 11 }]))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Insufficient stock for product: Widget");

    let missing_customer = "0190f5a0-0000-7000-8000-000000000000";
    let (status, body) = srv
        .order(missing_customer, json!([{ "productID": p1, "quantity": 1 }]))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Customer not found");

    // A later missing product fails the order; the earlier decrement stays.
    let missing_product = "0190f5a0-0000-7000-8000-000000000001";
    let (status, body) = srv
        .order(
            &customer,
            json!([
                { "productID": p1, "quantity": 3 },
                { "productID": missing_product, "quantity": 1 }
            ]),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains(missing_product));
    assert_eq!(srv.stock(&p1).await, 7);

    let (status, body) = srv.send(reqwest::Method::GET, "/order").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .post(srv.url("/customer"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["message"].is_string());

    let (status, _) = srv.send(reqwest::Method::PUT, "/order/not-an-id/cancel").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_routes_and_methods_still_answer_with_a_message() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.send(reqwest::Method::GET, "/nowhere").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Not found" }));

    let res = srv
        .client
        .get(srv.url("/order/0190a5b2-0000-7000-8000-000000000000/pay"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    let allow = res.headers().get("allow").and_then(|v| v.to_str().ok());
    assert!(allow.is_some_and(|methods| methods.contains("POST")));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Method not allowed" }));
}

#[tokio::test]
async fn cancel_and_pay_lifecycle() {
    let srv = TestServer::spawn().await;
    let customer = srv.customer("ada@example.com").await;
    let p1 = srv.product("P1", 2.5, 10).await;

    let missing = "0190f5a0-0000-7000-8000-000000000002";
    let (status, body) = srv
        .send(reqwest::Method::PUT, &format!("/order/{missing}/cancel"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Order not found");

    let (_, order) = srv
        .order(&customer, json!([{ "productID": p1, "quantity": 1 }]))
        .await;
    let id = order["id"].as_str().unwrap();

    let (status, body) = srv
        .send(reqwest::Method::PUT, &format!("/order/{id}/cancel"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Cancelled");
    assert_eq!(body["paymentStatus"], "Pending");

    let (_, order) = srv
        .order(&customer, json!([{ "productID": p1, "quantity": 1 }]))
        .await;
    let id = order["id"].as_str().unwrap();

    let started = Instant::now();
    let (status, body) = srv
        .send(reqwest::Method::POST, &format!("/order/{id}/pay"))
        .await;
    assert!(started.elapsed() >= PAYMENT_DELAY);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Completed");
    assert_eq!(body["paymentStatus"], "Paid");
    assert_eq!(body["totalPrice"], json!(2.5));
}

#[tokio::test]
async fn strict_policy_rejects_cancel_after_payment() {
    let srv = TestServer::spawn_with(AppConfig {
        payment_delay: Duration::from_millis(1),
        transition_policy: TransitionPolicy::Strict,
        ..AppConfig::default()
    })
    .await;
    let customer = srv.customer("ada@example.com").await;
    let p1 = srv.product("P1", 1.0, 10).await;

    let (_, order) = srv
        .order(&customer, json!([{ "productID": p1, "quantity": 1 }]))
        .await;
    let id = order["id"].as_str().unwrap();

    let (status, _) = srv
        .send(reqwest::Method::POST, &format!("/order/{id}/pay"))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = srv
        .send(reqwest::Method::PUT, &format!("/order/{id}/cancel"))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn deleting_a_product_prunes_orders_and_listing_expands_references() {
    let srv = TestServer::spawn().await;
    let customer = srv.customer("ada@example.com").await;
    let doomed = srv.product("Doomed", 1.0, 10).await;
    let kept = srv.product("Kept", 3.0, 10).await;

    srv.order(
        &customer,
        json!([{ "productID": doomed, "quantity": 1 }, { "productID": kept, "quantity": 1 }]),
    )
    .await;
    srv.order(&customer, json!([{ "productID": doomed, "quantity": 2 }]))
        .await;

    let (status, body) = srv
        .send(reqwest::Method::DELETE, &format!("/product/{doomed}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted and removed from current orders");

    let (status, body) = srv
        .send(reqwest::Method::DELETE, &format!("/product/{doomed}"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Product not found");

    let (status, body) = srv.send(reqwest::Method::GET, "/order").await;
    assert_eq!(status, StatusCode::OK);
    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 2);

    let first = &orders[0];
    assert_eq!(first["customerID"]["firstName"], "Ada");
    assert_eq!(first["customerID"]["email"], "ada@example.com");
    assert_eq!(first["items"].as_array().unwrap().len(), 1);
    assert_eq!(first["items"][0]["productID"]["name"], "Kept");
    assert_eq!(first["items"][0]["productID"]["stock"], 9);
    assert_eq!(first["totalPrice"], json!(4.0));

    let second = &orders[1];
    assert_eq!(second["items"].as_array().unwrap().len(), 0);
    assert_eq!(second["totalPrice"], json!(2.0));
}
