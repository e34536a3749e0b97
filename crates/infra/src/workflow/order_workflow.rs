//! Order workflow engine.
//!
//! ```text
//! place_order
//!   ↓
//! 1. Validate input (customer present, items non-empty, quantities ≥ 1)
//!   ↓
//! 2. Resolve customer
//!   ↓
//! 3. For each line, in order: resolve product, decrement stock, accumulate
//!    price × quantity at the decremented product's price
//!   ↓
//! 4. Create the order (Pending / Pending)
//! ```
//!
//! Placement is strictly sequential and not atomic across lines. Under
//! [`StockPolicy::Keep`] a failure part-way leaves earlier decrements applied;
//! [`StockPolicy::Restore`] replays a reservation log in reverse to put them back.

use std::sync::Arc;

use tracing::{Span, field, info, instrument, warn};

use orderdesk_catalog::ProductId;
use orderdesk_core::DomainError;
use orderdesk_customers::CustomerId;
use orderdesk_orders::{
    ExpandedOrder, LineItem, NewOrder, Order, OrderId, OrderStatus, OrderTotal, PlaceOrder,
    TransitionPolicy,
};

use super::payment::PaymentGateway;
use super::{WorkflowError, not_found_as};
use crate::store::{CatalogStore, CustomerStore, OrderStore, StoreError};

/// What happens to already-decremented stock when placement fails part-way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StockPolicy {
    /// Earlier decrements stay applied.
    #[default]
    Keep,
    /// Earlier decrements are restocked in reverse order.
    Restore,
}

impl core::str::FromStr for StockPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(StockPolicy::Keep),
            "restore" => Ok(StockPolicy::Restore),
            other => Err(DomainError::validation(format!(
                "stock policy must be one of: keep, restore (got {other})"
            ))),
        }
    }
}

/// Successful decrements made during one placement.
#[derive(Debug, Default)]
struct ReservationLog {
    entries: Vec<(ProductId, u32)>,
}

impl ReservationLog {
    fn record(&mut self, product_id: ProductId, quantity: u32) {
        self.entries.push((product_id, quantity));
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct OrderWorkflow {
    customers: Arc<dyn CustomerStore>,
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
    payments: Arc<dyn PaymentGateway>,
    transitions: TransitionPolicy,
    stock_policy: StockPolicy,
}

impl OrderWorkflow {
    pub fn new(
        customers: Arc<dyn CustomerStore>,
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            customers,
            catalog,
            orders,
            payments,
            transitions: TransitionPolicy::default(),
            stock_policy: StockPolicy::default(),
        }
    }

    pub fn with_transition_policy(mut self, policy: TransitionPolicy) -> Self {
        self.transitions = policy;
        self
    }

    pub fn with_stock_policy(mut self, policy: StockPolicy) -> Self {
        self.stock_policy = policy;
        self
    }

    #[instrument(
        skip(self, request),
        fields(customer_id = field::Empty, item_count = request.items.len())
    )]
    pub async fn place_order(&self, request: PlaceOrder) -> Result<Order, WorkflowError> {
        let customer_id = request.validate()?;
        Span::current().record("customer_id", field::display(customer_id));

        self.customers
            .get_customer(customer_id)
            .await
            .map_err(|e| not_found_as(e, || DomainError::not_found("Customer")))?;

        let mut log = ReservationLog::default();
        let result = self.reserve_and_create(customer_id, request.items, &mut log).await;

        if result.is_err() && !log.is_empty() {
            self.release(log).await;
        }

        let order = result?;
        info!(order_id = %order.id, total = %order.total_price, "order placed");
        Ok(order)
    }

    async fn reserve_and_create(
        &self,
        customer_id: CustomerId,
        items: Vec<LineItem>,
        log: &mut ReservationLog,
    ) -> Result<Order, WorkflowError> {
        let mut total = OrderTotal::new();

        for item in &items {
            let product_not_found = || DomainError::not_found_with_id("Product", item.product_id);

            let product = self
                .catalog
                .get_product(item.product_id)
                .await
                .map_err(|e| not_found_as(e, product_not_found))?;

            let reserved = match self.catalog.decrement_stock(item.product_id, item.quantity).await {
                Ok(reserved) => reserved,
                Err(StoreError::InsufficientStock { .. }) => {
                    return Err(DomainError::insufficient_stock(product.name).into());
                }
                Err(e) => return Err(not_found_as(e, product_not_found)),
            };
            log.record(item.product_id, item.quantity);

            total.add_line(reserved.price, item.quantity)?;
        }

        let order = self
            .orders
            .create_order(NewOrder {
                customer_id,
                items,
                total_price: total.total(),
            })
            .await?;
        Ok(order)
    }

    /// Compensate a failed placement according to the stock policy.
    async fn release(&self, log: ReservationLog) {
        match self.stock_policy {
            StockPolicy::Keep => {
                warn!(
                    decrements = log.entries.len(),
                    "order placement failed; earlier stock decrements are kept"
                );
            }
            StockPolicy::Restore => {
                for (product_id, quantity) in log.entries.into_iter().rev() {
                    match self.catalog.restock_product(product_id, quantity).await {
                        Ok(_) => info!(%product_id, quantity, "restored reserved stock"),
                        Err(e) => warn!(
                            %product_id,
                            quantity,
                            error = %e,
                            "failed to restore reserved stock"
                        ),
                    }
                }
            }
        }
    }

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<Order, WorkflowError> {
        let order = self.load(id).await?;
        let change = order.plan_cancel(self.transitions)?;

        let updated = self
            .orders
            .apply_status_change(id, change)
            .await
            .map_err(|e| not_found_as(e, order_not_found))?;

        info!(status = %updated.status, "order cancelled");
        Ok(updated)
    }

    /// Charge through the gateway, then mark the order Completed/Paid.
    ///
    /// The order is not locked while the gateway runs. Under the permissive
    /// policy the final write overwrites whatever landed meanwhile; under the
    /// strict policy it is guarded on `Pending`.
    ///
    /// The strict guard only covers the status write. Two concurrent strict
    /// payments both pass the pre-check and both charge the gateway; the
    /// slower one then fails with "Order is already paid". Refunding that
    /// second charge is not handled.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn pay_order(&self, id: OrderId) -> Result<Order, WorkflowError> {
        let order = self.load(id).await?;
        let change = order.plan_payment(self.transitions)?;

        self.payments.charge(&order).await?;

        let updated = self
            .orders
            .apply_status_change(id, change)
            .await
            .map_err(|e| match e {
                StoreError::StatusConflict { current } => {
                    WorkflowError::Domain(payment_conflict(current))
                }
                other => not_found_as(other, order_not_found),
            })?;

        info!(total = %updated.total_price, "order paid");
        Ok(updated)
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order, WorkflowError> {
        self.load(id).await
    }

    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<ExpandedOrder>, WorkflowError> {
        Ok(self.orders.list_orders_expanded().await?)
    }

    async fn load(&self, id: OrderId) -> Result<Order, WorkflowError> {
        self.orders
            .get_order(id)
            .await
            .map_err(|e| not_found_as(e, order_not_found))
    }
}

fn order_not_found() -> DomainError {
    DomainError::not_found("Order")
}

fn payment_conflict(current: OrderStatus) -> DomainError {
    match current {
        OrderStatus::Cancelled => {
            DomainError::invalid_transition("Cancelled orders cannot be paid")
        }
        _ => DomainError::invalid_transition("Order is already paid"),
    }
}
