//! Persistence boundary for customers, products and orders.
//!
//! Each store is an async trait so the workflow engine can run against the
//! in-memory implementations (tests/dev) or the Postgres ones (production)
//! without knowing which.
//!
//! Atomicity contract:
//! - `CatalogStore::decrement_stock` is a single conditional write: it either
//!   verifies `stock >= quantity` and subtracts, or fails without mutating.
//! - `CustomerStore::create_customer` rejects a duplicate email at the storage
//!   layer, so two concurrent registrations cannot both succeed.
//! - `OrderStore::apply_status_change` honours the change's guard as a
//!   conditional update.

use async_trait::async_trait;
use thiserror::Error;

use orderdesk_catalog::{NewProduct, Product, ProductId};
use orderdesk_customers::{Customer, CustomerId, NewCustomer};
use orderdesk_orders::{
    ExpandedOrder, NewOrder, Order, OrderId, OrderStatus, PaymentStatus, StatusChange,
};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryCatalogStore, InMemoryCustomerStore, InMemoryOrderStore};
pub use postgres::{PostgresCatalogStore, PostgresCustomerStore, PostgresOrderStore};

/// Store operation error.
///
/// These are storage-level outcomes. The workflow layer turns the
/// business-relevant ones (not found, duplicate, shortfall, conflict) into
/// domain errors; `Backend` stays an infrastructure failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("insufficient stock for product {product_id}")]
    InsufficientStock { product_id: ProductId },

    #[error("email already registered: {email}")]
    DuplicateEmail { email: String },

    #[error("order status is {current}")]
    StatusConflict { current: OrderStatus },

    #[error("storage failure in {operation}: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        StoreError::Backend {
            operation,
            message: message.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_product(&self, id: ProductId) -> StoreResult<Product>;

    async fn create_product(&self, product: NewProduct) -> StoreResult<Product>;

    /// Atomically subtract `quantity` if enough stock is available.
    ///
    /// Returns the updated product (its `price` is the price the line is
    /// charged at).
    async fn decrement_stock(&self, id: ProductId, quantity: u32) -> StoreResult<Product>;

    /// Atomically add `quantity` back. Used only by the compensating stock policy.
    async fn restock_product(&self, id: ProductId, quantity: u32) -> StoreResult<Product>;

    async fn delete_product(&self, id: ProductId) -> StoreResult<()>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn get_customer(&self, id: CustomerId) -> StoreResult<Customer>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Customer>>;

    /// Create a customer, or `DuplicateEmail` if the email is already taken.
    async fn create_customer(&self, customer: NewCustomer) -> StoreResult<Customer>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist a new order with `Pending`/`Pending` status.
    async fn create_order(&self, order: NewOrder) -> StoreResult<Order>;

    async fn get_order(&self, id: OrderId) -> StoreResult<Order>;

    /// All orders in creation order, with customer and product references
    /// resolved at read time.
    async fn list_orders_expanded(&self) -> StoreResult<Vec<ExpandedOrder>>;

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order>;

    async fn set_payment_status(&self, id: OrderId, status: PaymentStatus)
    -> StoreResult<Order>;

    /// Write status (and optionally payment status) in one step. If the
    /// change carries a guard and the current status differs, nothing is
    /// written and `StatusConflict` reports the current status.
    async fn apply_status_change(&self, id: OrderId, change: StatusChange)
    -> StoreResult<Order>;

    /// Remove every line item referencing `product_id` across all orders.
    /// Totals are left as they are. Returns the number of removed lines.
    async fn remove_line_items_referencing(&self, product_id: ProductId) -> StoreResult<u64>;
}
