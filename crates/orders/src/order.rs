use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_catalog::ProductId;
use orderdesk_core::{DomainError, DomainResult, Entity, EntityId, Money};
use orderdesk_customers::CustomerId;

/// Order identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub EntityId);

orderdesk_core::entity_id_newtype!(OrderId);

/// Order status lifecycle: `Pending → {Completed, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(OrderStatus::Pending),
            "Completed" => Ok(OrderStatus::Completed),
            "Cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(DomainError::validation(format!("unknown order status: {other}"))),
        }
    }
}

/// Payment lifecycle: `Pending → Paid`, monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
        }
    }
}

impl core::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Paid" => Ok(PaymentStatus::Paid),
            other => Err(DomainError::validation(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

/// Order line: product reference + quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "productID")]
    pub product_id: ProductId,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(product_id: ProductId, quantity: u32) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        Ok(Self {
            product_id,
            quantity,
        })
    }
}

/// A persisted order.
///
/// `total_price` is fixed at creation (price at time of order) and is never
/// recomputed, not even when line items are pruned after a product deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "customerID")]
    pub customer_id: CustomerId,
    pub items: Vec<LineItem>,
    pub total_price: Money,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// How strictly terminal statuses are enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransitionPolicy {
    /// Cancel and pay always overwrite the current status.
    #[default]
    Permissive,
    /// Completed and Cancelled are terminal; writes are guarded on `Pending`.
    Strict,
}

impl core::str::FromStr for TransitionPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(TransitionPolicy::Permissive),
            "strict" => Ok(TransitionPolicy::Strict),
            other => Err(DomainError::validation(format!(
                "transition policy must be one of: permissive, strict (got {other})"
            ))),
        }
    }
}

/// A status write to apply to a stored order.
///
/// When `guard` is set the write is conditional: it only lands if the order's
/// current status still equals the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
    pub guard: Option<OrderStatus>,
}

impl StatusChange {
    pub fn set_status(status: OrderStatus) -> Self {
        Self {
            status,
            payment_status: None,
            guard: None,
        }
    }

    /// Apply to an in-memory record. On guard mismatch, returns the current
    /// status and leaves the order untouched.
    pub fn apply_to(&self, order: &mut Order) -> Result<(), OrderStatus> {
        if let Some(expected) = self.guard {
            if order.status != expected {
                return Err(order.status);
            }
        }

        order.status = self.status;
        if let Some(payment_status) = self.payment_status {
            order.payment_status = payment_status;
        }
        Ok(())
    }
}

impl Order {
    /// Decide the write a cancellation performs.
    ///
    /// Permissive: always `Cancelled`, payment untouched. Strict: only from
    /// `Pending`.
    pub fn plan_cancel(&self, policy: TransitionPolicy) -> DomainResult<StatusChange> {
        match policy {
            TransitionPolicy::Permissive => Ok(StatusChange::set_status(OrderStatus::Cancelled)),
            TransitionPolicy::Strict => match self.status {
                OrderStatus::Pending => Ok(StatusChange {
                    status: OrderStatus::Cancelled,
                    payment_status: None,
                    guard: Some(OrderStatus::Pending),
                }),
                OrderStatus::Cancelled => {
                    Err(DomainError::invalid_transition("Order is already cancelled"))
                }
                OrderStatus::Completed => Err(DomainError::invalid_transition(
                    "Completed orders cannot be cancelled",
                )),
            },
        }
    }

    /// Decide the write a completed payment performs.
    ///
    /// Permissive: always `Completed` + `Paid`. Strict: only from an unpaid
    /// `Pending` order.
    pub fn plan_payment(&self, policy: TransitionPolicy) -> DomainResult<StatusChange> {
        let change = StatusChange {
            status: OrderStatus::Completed,
            payment_status: Some(PaymentStatus::Paid),
            guard: None,
        };

        match policy {
            TransitionPolicy::Permissive => Ok(change),
            TransitionPolicy::Strict => match (self.status, self.payment_status) {
                (OrderStatus::Pending, PaymentStatus::Pending) => Ok(StatusChange {
                    guard: Some(OrderStatus::Pending),
                    ..change
                }),
                (OrderStatus::Cancelled, _) => Err(DomainError::invalid_transition(
                    "Cancelled orders cannot be paid",
                )),
                _ => Err(DomainError::invalid_transition("Order is already paid")),
            },
        }
    }
}

/// Placement request as received by the workflow engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub customer_id: Option<CustomerId>,
    pub items: Vec<LineItem>,
}

impl PlaceOrder {
    /// Reject absent customer, empty items and zero quantities.
    pub fn validate(&self) -> DomainResult<CustomerId> {
        let customer_id = match self.customer_id {
            Some(id) if !self.items.is_empty() => id,
            _ => return Err(DomainError::validation("CustomerID and items are required")),
        };

        if self.items.iter().any(|item| item.quantity == 0) {
            return Err(DomainError::validation("quantity must be at least 1"));
        }

        Ok(customer_id)
    }
}

/// Running total of `price × quantity` over the lines actually reserved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderTotal(Money);

impl OrderTotal {
    pub fn new() -> Self {
        Self(Money::ZERO)
    }

    pub fn add_line(&mut self, unit_price: Money, quantity: u32) -> DomainResult<()> {
        let line = unit_price
            .checked_mul(quantity)
            .ok_or_else(|| DomainError::validation("order total is too large"))?;
        self.0 = self
            .0
            .checked_add(line)
            .ok_or_else(|| DomainError::validation("order total is too large"))?;
        Ok(())
    }

    pub fn total(&self) -> Money {
        self.0
    }
}

/// Order creation input handed to the order store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub items: Vec<LineItem>,
    pub total_price: Money,
}

impl NewOrder {
    /// Materialize the record a store persists: `Pending` / `Pending`.
    pub fn into_order(self, id: OrderId, created_at: DateTime<Utc>) -> Order {
        Order {
            id,
            customer_id: self.customer_id,
            items: self.items,
            total_price: self.total_price,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            created_at,
        }
    }
}
