use serde::{Deserialize, Serialize};

use orderdesk_catalog::{NewProduct, ProductId};
use orderdesk_core::{DomainError, DomainResult};
use orderdesk_customers::{CustomerId, NewCustomer};
use orderdesk_orders::{LineItem, PlaceOrder};

const ORDER_REQUIRED_FIELDS: &str = "CustomerID and items are required";

// -------------------------
// Request DTOs
// -------------------------
//
// Fields are optional so a missing field surfaces as the domain's own
// validation message rather than a deserializer error.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl CreateCustomerRequest {
    pub fn into_new_customer(self) -> DomainResult<NewCustomer> {
        NewCustomer::from_parts(self.first_name, self.last_name, self.email)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<f64>,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> DomainResult<NewProduct> {
        NewProduct::from_parts(self.name, self.description, self.price, self.stock)
    }
}

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    #[serde(rename = "productID")]
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(rename = "customerID")]
    pub customer_id: Option<String>,
    pub items: Option<Vec<OrderItemRequest>>,
}

impl CreateOrderRequest {
    /// Presence is checked before any id is parsed, so an absent customer or
    /// item list always reports the "required" message first.
    pub fn into_place_order(self) -> DomainResult<PlaceOrder> {
        let customer_id = self.customer_id.filter(|id| !id.trim().is_empty());
        let items = self.items.unwrap_or_default();

        let Some(customer_id) = customer_id else {
            return Err(DomainError::validation(ORDER_REQUIRED_FIELDS));
        };
        if items.is_empty() {
            return Err(DomainError::validation(ORDER_REQUIRED_FIELDS));
        }

        let customer_id: CustomerId = customer_id.parse()?;
        let items = items
            .into_iter()
            .map(OrderItemRequest::into_line_item)
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(PlaceOrder {
            customer_id: Some(customer_id),
            items,
        })
    }
}

impl OrderItemRequest {
    fn into_line_item(self) -> DomainResult<LineItem> {
        let (Some(product_id), Some(quantity)) = (self.product_id, self.quantity) else {
            return Err(DomainError::validation(
                "each item requires productID and quantity",
            ));
        };

        let product_id: ProductId = product_id.parse()?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| DomainError::validation("quantity must be a positive integer"))?;
        LineItem::new(product_id, quantity)
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order_request(value: serde_json::Value) -> CreateOrderRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_customer_is_reported_before_bad_item_ids() {
        let err = order_request(json!({ "items": [{ "productID": "nope", "quantity": 1 }] }))
            .into_place_order()
            .unwrap_err();
        assert_eq!(err.to_string(), ORDER_REQUIRED_FIELDS);

        let err = order_request(json!({ "customerID": CustomerId::new().to_string(), "items": [] }))
            .into_place_order()
            .unwrap_err();
        assert_eq!(err.to_string(), ORDER_REQUIRED_FIELDS);
    }

    #[test]
    fn malformed_ids_are_invalid_id_errors() {
        let err = order_request(json!({
            "customerID": "not-a-uuid",
            "items": [{ "productID": ProductId::new().to_string(), "quantity": 1 }]
        }))
        .into_place_order()
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(_)));
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        for quantity in [0, -3] {
            let err = order_request(json!({
                "customerID": CustomerId::new().to_string(),
                "items": [{ "productID": ProductId::new().to_string(), "quantity": quantity }]
            }))
            .into_place_order()
            .unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }

    #[test]
    fn well_formed_order_maps_to_place_order() {
        let customer = CustomerId::new();
        let product = ProductId::new();
        let place = order_request(json!({
            "customerID": customer.to_string(),
            "items": [{ "productID": product.to_string(), "quantity": 2 }]
        }))
        .into_place_order()
        .unwrap();

        assert_eq!(place.customer_id, Some(customer));
        assert_eq!(place.items, vec![LineItem::new(product, 2).unwrap()]);
    }

    #[test]
    fn customer_fields_are_camel_case() {
        let req: CreateCustomerRequest = serde_json::from_value(json!({
            "firstName": "Ada", "lastName": "Lovelace", "email": "ada@example.com"
        }))
        .unwrap();
        let customer = req.into_new_customer().unwrap();
        assert_eq!(customer.first_name(), "Ada");
    }
}
