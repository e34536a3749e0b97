//! Expanded order views: orders with their customer and product references
//! resolved for listing.
//!
//! A reference whose target no longer exists resolves to `None` and
//! serializes as `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_catalog::{Product, ProductId};
use orderdesk_core::Money;
use orderdesk_customers::{Customer, CustomerId};

use crate::order::{Order, OrderId, OrderStatus, PaymentStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&Customer> for CustomerSummary {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedLineItem {
    #[serde(rename = "productID")]
    pub product: Option<ProductSummary>,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedOrder {
    pub id: OrderId,
    #[serde(rename = "customerID")]
    pub customer: Option<CustomerSummary>,
    pub items: Vec<ExpandedLineItem>,
    pub total_price: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl ExpandedOrder {
    /// Join an order with whatever its references currently resolve to.
    pub fn resolve<F>(order: Order, customer: Option<CustomerSummary>, mut product: F) -> Self
    where
        F: FnMut(&ProductId) -> Option<ProductSummary>,
    {
        let items = order
            .items
            .iter()
            .map(|item| ExpandedLineItem {
                product: product(&item.product_id),
                quantity: item.quantity,
            })
            .collect();

        Self {
            id: order.id,
            customer,
            items,
            total_price: order.total_price,
            status: order.status,
            payment_status: order.payment_status,
            created_at: order.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{LineItem, NewOrder};

    fn product(name: &str, cents: u64, stock: u32) -> Product {
        Product {
            id: ProductId::new(),
            name: name.to_string(),
            description: format!("{name} description"),
            price: Money::from_cents(cents),
            stock,
            created_at: Utc::now(),
        }
    }

    fn customer() -> Customer {
        Customer {
            id: CustomerId::new(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn resolved_references_expose_summary_fields() {
        let customer = customer();
        let pen = product("Pen", 150, 9);
        let order = NewOrder {
            customer_id: customer.id,
            items: vec![LineItem::new(pen.id, 1).unwrap()],
            total_price: Money::from_cents(150),
        }
        .into_order(OrderId::new(), Utc::now());

        let expanded = ExpandedOrder::resolve(
            order,
            Some(CustomerSummary::from(&customer)),
            |id| (*id == pen.id).then(|| ProductSummary::from(&pen)),
        );

        let json = serde_json::to_value(&expanded).unwrap();
        assert_eq!(json["customerID"]["firstName"], "Ada");
        assert_eq!(json["customerID"]["email"], "ada@example.com");
        assert_eq!(json["items"][0]["productID"]["name"], "Pen");
        assert_eq!(json["items"][0]["productID"]["price"], serde_json::json!(1.5));
        assert_eq!(json["items"][0]["productID"]["stock"], 9);
        assert_eq!(json["items"][0]["quantity"], 1);
        assert_eq!(json["totalPrice"], serde_json::json!(1.5));
    }

    #[test]
    fn dangling_references_serialize_as_null() {
        let order = NewOrder {
            customer_id: CustomerId::new(),
            items: vec![LineItem::new(ProductId::new(), 3).unwrap()],
            total_price: Money::from_cents(900),
        }
        .into_order(OrderId::new(), Utc::now());

        let expanded = ExpandedOrder::resolve(order, None, |_| None);
        let json = serde_json::to_value(&expanded).unwrap();
        assert!(json["customerID"].is_null());
        assert!(json["items"][0]["productID"].is_null());
        assert_eq!(json["items"][0]["quantity"], 3);
    }
}
