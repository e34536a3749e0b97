//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database (unique violation) | `23505` | `DuplicateEmail` | Email already registered (customers only) |
//! | Database (other) | Any other | `Backend` | Constraint or query failure |
//! | PoolClosed / Other | N/A | `Backend` | Network errors, connection failures, etc. |
//!
//! ## Atomicity
//!
//! - Stock decrement is one conditional `UPDATE ... WHERE stock >= $2`.
//! - Email uniqueness is a `UNIQUE` constraint.
//! - Guarded status changes are one conditional `UPDATE ... WHERE status = $4`.
//! - Order creation inserts the order row and its line items in one transaction.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use orderdesk_catalog::{NewProduct, Product, ProductId};
use orderdesk_core::{EntityId, Money};
use orderdesk_customers::{Customer, CustomerId, NewCustomer};
use orderdesk_orders::{
    CustomerSummary, ExpandedLineItem, ExpandedOrder, LineItem, NewOrder, Order, OrderId,
    OrderStatus, PaymentStatus, ProductSummary, StatusChange,
};

use super::{CatalogStore, CustomerStore, OrderStore, StoreError, StoreResult};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id UUID PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
        stock BIGINT NOT NULL CHECK (stock >= 0),
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS orders (
        id UUID PRIMARY KEY,
        seq BIGSERIAL NOT NULL,
        customer_id UUID NOT NULL,
        total_price_cents BIGINT NOT NULL CHECK (total_price_cents >= 0),
        status TEXT NOT NULL,
        payment_status TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    // No foreign key to products: deleting a product prunes line items
    // best-effort, after the delete.
    r#"
    CREATE TABLE IF NOT EXISTS order_items (
        order_id UUID NOT NULL REFERENCES orders(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        product_id UUID NOT NULL,
        quantity BIGINT NOT NULL CHECK (quantity >= 1),
        PRIMARY KEY (order_id, position)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS order_items_product_id_idx ON order_items (product_id)",
];

/// Create the tables the stores use if they do not exist yet.
#[instrument(skip(pool))]
pub async fn migrate(pool: &PgPool) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(*statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
    }
    Ok(())
}

fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => StoreError::backend(
            operation,
            format!("database error: {}", db_err.message()),
        ),
        sqlx::Error::PoolClosed => StoreError::backend(operation, "connection pool closed"),
        other => StoreError::backend(operation, format!("sqlx error: {other}")),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}

fn corrupt(operation: &'static str, what: impl std::fmt::Display) -> StoreError {
    StoreError::backend(operation, format!("invalid stored value: {what}"))
}

fn cents_to_money(operation: &'static str, cents: i64) -> StoreResult<Money> {
    u64::try_from(cents)
        .map(Money::from_cents)
        .map_err(|_| corrupt(operation, format!("negative amount {cents}")))
}

fn money_to_cents(operation: &'static str, money: Money) -> StoreResult<i64> {
    i64::try_from(money.cents()).map_err(|_| corrupt(operation, "amount out of range"))
}

fn to_u32(operation: &'static str, value: i64) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| corrupt(operation, format!("count {value} out of range")))
}

// SQLx row types

#[derive(Debug)]
struct CustomerRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for CustomerRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CustomerRow {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            id: CustomerId(EntityId::from_uuid(row.id)),
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug)]
struct ProductRow {
    id: Uuid,
    name: String,
    description: String,
    price_cents: i64,
    stock: i64,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price_cents: row.try_get("price_cents")?,
            stock: row.try_get("stock")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl ProductRow {
    fn into_product(self, operation: &'static str) -> StoreResult<Product> {
        Ok(Product {
            id: ProductId(EntityId::from_uuid(self.id)),
            name: self.name,
            description: self.description,
            price: cents_to_money(operation, self.price_cents)?,
            stock: to_u32(operation, self.stock)?,
            created_at: self.created_at,
        })
    }
}

fn product_from_row(operation: &'static str, row: &PgRow) -> StoreResult<Product> {
    ProductRow::from_row(row)
        .map_err(|e| map_sqlx_error(operation, e))?
        .into_product(operation)
}

#[derive(Debug)]
struct OrderRow {
    id: Uuid,
    customer_id: Uuid,
    total_price_cents: i64,
    status: String,
    payment_status: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for OrderRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(OrderRow {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            total_price_cents: row.try_get("total_price_cents")?,
            status: row.try_get("status")?,
            payment_status: row.try_get("payment_status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl OrderRow {
    fn into_order(self, operation: &'static str, items: Vec<LineItem>) -> StoreResult<Order> {
        Ok(Order {
            id: OrderId(EntityId::from_uuid(self.id)),
            customer_id: CustomerId(EntityId::from_uuid(self.customer_id)),
            items,
            total_price: cents_to_money(operation, self.total_price_cents)?,
            status: self
                .status
                .parse()
                .map_err(|_| corrupt(operation, &self.status))?,
            payment_status: self
                .payment_status
                .parse()
                .map_err(|_| corrupt(operation, &self.payment_status))?,
            created_at: self.created_at,
        })
    }
}

/// Postgres-backed product catalog.
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, price_cents, stock, created_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;

        match row {
            Some(row) => product_from_row("get_product", &row),
            None => Err(StoreError::not_found("Product", id)),
        }
    }

    #[instrument(skip(self, product), fields(name = %product.name()))]
    async fn create_product(&self, product: NewProduct) -> StoreResult<Product> {
        let price_cents = money_to_cents("create_product", product.price())?;
        let row = sqlx::query(
            r#"
            INSERT INTO products (id, name, description, price_cents, stock, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, price_cents, stock, created_at
            "#,
        )
        .bind(ProductId::new().as_uuid())
        .bind(product.name())
        .bind(product.description())
        .bind(price_cents)
        .bind(i64::from(product.stock()))
        .bind(Utc::now())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;

        product_from_row("create_product", &row)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn decrement_stock(&self, id: ProductId, quantity: u32) -> StoreResult<Product> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - $2
            WHERE id = $1 AND stock >= $2
            RETURNING id, name, description, price_cents, stock, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("decrement_stock", e))?;

        if let Some(row) = row {
            return product_from_row("decrement_stock", &row);
        }

        // Nothing updated: either the product is gone or stock is short.
        let exists = sqlx::query("SELECT 1 FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("decrement_stock", e))?
            .is_some();

        if exists {
            Err(StoreError::InsufficientStock { product_id: id })
        } else {
            Err(StoreError::not_found("Product", id))
        }
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn restock_product(&self, id: ProductId, quantity: u32) -> StoreResult<Product> {
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + $2
            WHERE id = $1
            RETURNING id, name, description, price_cents, stock, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(i64::from(quantity))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("restock_product", e))?;

        match row {
            Some(row) => product_from_row("restock_product", &row),
            None => Err(StoreError::not_found("Product", id)),
        }
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Product", id));
        }
        Ok(())
    }
}

/// Postgres-backed customer registry.
#[derive(Debug, Clone)]
pub struct PostgresCustomerStore {
    pool: Arc<PgPool>,
}

impl PostgresCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl CustomerStore for PostgresCustomerStore {
    #[instrument(skip(self), fields(customer_id = %id))]
    async fn get_customer(&self, id: CustomerId) -> StoreResult<Customer> {
        let row = sqlx::query(
            r#"
            SELECT id, first_name, last_name, email, created_at
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_customer", e))?;

        match row {
            Some(row) => CustomerRow::from_row(&row)
                .map(Customer::from)
                .map_err(|e| map_sqlx_error("get_customer", e)),
            None => Err(StoreError::not_found("Customer", id)),
        }
    }

    #[instrument(skip(self, email))]
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
        let row = sqlx::query(
            r#"
            SELECT id, first_name, last_name, email, created_at
            FROM customers
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_email", e))?;

        row.map(|row| CustomerRow::from_row(&row).map(Customer::from))
            .transpose()
            .map_err(|e| map_sqlx_error("find_by_email", e))
    }

    #[instrument(skip(self, customer))]
    async fn create_customer(&self, customer: NewCustomer) -> StoreResult<Customer> {
        let result = sqlx::query(
            r#"
            INSERT INTO customers (id, first_name, last_name, email, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, email, created_at
            "#,
        )
        .bind(CustomerId::new().as_uuid())
        .bind(customer.first_name())
        .bind(customer.last_name())
        .bind(customer.email())
        .bind(Utc::now())
        .fetch_one(&*self.pool)
        .await;

        let row = match result {
            Ok(row) => row,
            Err(e) if is_unique_violation(&e) => {
                return Err(StoreError::DuplicateEmail {
                    email: customer.email().to_string(),
                });
            }
            Err(e) => return Err(map_sqlx_error("create_customer", e)),
        };

        CustomerRow::from_row(&row)
            .map(Customer::from)
            .map_err(|e| map_sqlx_error("create_customer", e))
    }
}

/// Postgres-backed order store.
#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: Arc<PgPool>,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn load_items(&self, operation: &'static str, id: OrderId) -> StoreResult<Vec<LineItem>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let product_id: Uuid = row
                .try_get("product_id")
                .map_err(|e| map_sqlx_error(operation, e))?;
            let quantity: i64 = row
                .try_get("quantity")
                .map_err(|e| map_sqlx_error(operation, e))?;
            items.push(LineItem {
                product_id: ProductId(EntityId::from_uuid(product_id)),
                quantity: to_u32(operation, quantity)?,
            });
        }
        Ok(items)
    }

    async fn load_order(&self, operation: &'static str, id: OrderId) -> StoreResult<Order> {
        let row = sqlx::query(
            r#"
            SELECT id, customer_id, total_price_cents, status, payment_status, created_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error(operation, e))?
        .ok_or_else(|| StoreError::not_found("Order", id))?;

        let order_row = OrderRow::from_row(&row).map_err(|e| map_sqlx_error(operation, e))?;
        let items = self.load_items(operation, id).await?;
        order_row.into_order(operation, items)
    }

    /// Distinguish "no such order" from "guard did not match" after an
    /// update touched no rows.
    async fn explain_miss(&self, operation: &'static str, id: OrderId) -> StoreError {
        let current = sqlx::query("SELECT status FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await;

        match current {
            Ok(None) => StoreError::not_found("Order", id),
            Ok(Some(row)) => match row.try_get::<String, _>("status") {
                Ok(status) => match status.parse::<OrderStatus>() {
                    Ok(current) => StoreError::StatusConflict { current },
                    Err(_) => corrupt(operation, status),
                },
                Err(e) => map_sqlx_error(operation, e),
            },
            Err(e) => map_sqlx_error(operation, e),
        }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[instrument(skip(self, order), fields(customer_id = %order.customer_id, item_count = order.items.len()))]
    async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        let id = OrderId::new();
        let total_cents = money_to_cents("create_order", order.total_price)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_order", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, total_price_cents, status, payment_status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, customer_id, total_price_cents, status, payment_status, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(total_cents)
        .bind(OrderStatus::Pending.as_str())
        .bind(PaymentStatus::Pending.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_order", e))?;

        for (position, item) in order.items.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| StoreError::backend("create_order", "too many line items"))?;
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, product_id, quantity)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id.as_uuid())
            .bind(position)
            .bind(item.product_id.as_uuid())
            .bind(i64::from(item.quantity))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("create_order", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_order", e))?;

        OrderRow::from_row(&row)
            .map_err(|e| map_sqlx_error("create_order", e))?
            .into_order("create_order", order.items)
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: OrderId) -> StoreResult<Order> {
        self.load_order("get_order", id).await
    }

    #[instrument(skip(self))]
    async fn list_orders_expanded(&self) -> StoreResult<Vec<ExpandedOrder>> {
        const OP: &str = "list_orders";

        let order_rows = sqlx::query(
            r#"
            SELECT
                o.id,
                o.customer_id,
                o.total_price_cents,
                o.status,
                o.payment_status,
                o.created_at,
                c.id AS c_id,
                c.first_name AS c_first_name,
                c.last_name AS c_last_name,
                c.email AS c_email
            FROM orders o
            LEFT JOIN customers c ON c.id = o.customer_id
            ORDER BY o.seq ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;

        let item_rows = sqlx::query(
            r#"
            SELECT
                i.order_id,
                i.quantity,
                p.id AS p_id,
                p.name AS p_name,
                p.description AS p_description,
                p.price_cents AS p_price_cents,
                p.stock AS p_stock
            FROM order_items i
            LEFT JOIN products p ON p.id = i.product_id
            ORDER BY i.order_id, i.position ASC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;

        let mut items_by_order: HashMap<Uuid, Vec<ExpandedLineItem>> = HashMap::new();
        for row in item_rows {
            let order_id: Uuid = row.try_get("order_id").map_err(|e| map_sqlx_error(OP, e))?;
            let quantity: i64 = row.try_get("quantity").map_err(|e| map_sqlx_error(OP, e))?;
            let product_id: Option<Uuid> =
                row.try_get("p_id").map_err(|e| map_sqlx_error(OP, e))?;

            let product = match product_id {
                Some(product_id) => {
                    let price_cents: i64 =
                        row.try_get("p_price_cents").map_err(|e| map_sqlx_error(OP, e))?;
                    let stock: i64 = row.try_get("p_stock").map_err(|e| map_sqlx_error(OP, e))?;
                    Some(ProductSummary {
                        id: ProductId(EntityId::from_uuid(product_id)),
                        name: row.try_get("p_name").map_err(|e| map_sqlx_error(OP, e))?,
                        description: row
                            .try_get("p_description")
                            .map_err(|e| map_sqlx_error(OP, e))?,
                        price: cents_to_money(OP, price_cents)?,
                        stock: to_u32(OP, stock)?,
                    })
                }
                None => None,
            };

            items_by_order
                .entry(order_id)
                .or_default()
                .push(ExpandedLineItem {
                    product,
                    quantity: to_u32(OP, quantity)?,
                });
        }

        let mut expanded = Vec::with_capacity(order_rows.len());
        for row in order_rows {
            let order_row = OrderRow::from_row(&row).map_err(|e| map_sqlx_error(OP, e))?;
            let customer_id: Option<Uuid> =
                row.try_get("c_id").map_err(|e| map_sqlx_error(OP, e))?;

            let customer = match customer_id {
                Some(customer_id) => Some(CustomerSummary {
                    id: CustomerId(EntityId::from_uuid(customer_id)),
                    first_name: row
                        .try_get("c_first_name")
                        .map_err(|e| map_sqlx_error(OP, e))?,
                    last_name: row
                        .try_get("c_last_name")
                        .map_err(|e| map_sqlx_error(OP, e))?,
                    email: row.try_get("c_email").map_err(|e| map_sqlx_error(OP, e))?,
                }),
                None => None,
            };

            let items = items_by_order.remove(&order_row.id).unwrap_or_default();
            let order = order_row.into_order(OP, Vec::new())?;
            expanded.push(ExpandedOrder {
                id: order.id,
                customer,
                items,
                total_price: order.total_price,
                status: order.status,
                payment_status: order.payment_status,
                created_at: order.created_at,
            });
        }

        Ok(expanded)
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    async fn set_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order> {
        self.apply_status_change(id, StatusChange::set_status(status))
            .await
    }

    #[instrument(skip(self), fields(order_id = %id, payment_status = %status))]
    async fn set_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> StoreResult<Order> {
        let result = sqlx::query("UPDATE orders SET payment_status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_payment_status", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Order", id));
        }
        self.load_order("set_payment_status", id).await
    }

    #[instrument(skip(self), fields(order_id = %id, status = %change.status))]
    async fn apply_status_change(
        &self,
        id: OrderId,
        change: StatusChange,
    ) -> StoreResult<Order> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2,
                payment_status = COALESCE($3, payment_status)
            WHERE id = $1
                AND ($4::text IS NULL OR status = $4)
            "#,
        )
        .bind(id.as_uuid())
        .bind(change.status.as_str())
        .bind(change.payment_status.map(PaymentStatus::as_str))
        .bind(change.guard.map(OrderStatus::as_str))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("apply_status_change", e))?;

        if result.rows_affected() == 0 {
            return Err(self.explain_miss("apply_status_change", id).await);
        }
        self.load_order("apply_status_change", id).await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn remove_line_items_referencing(&self, product_id: ProductId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM order_items WHERE product_id = $1")
            .bind(product_id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("remove_line_items", e))?;

        Ok(result.rows_affected())
    }
}
