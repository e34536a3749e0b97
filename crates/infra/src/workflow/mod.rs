//! Application-level orchestration over the stores.
//!
//! The workflow layer owns the cross-store sequences (order placement,
//! cancellation, payment, product removal) and turns store outcomes into the
//! error taxonomy callers see:
//!
//! - **Domain**: deterministic business failures (validation, not found,
//!   duplicate email, insufficient stock, invalid transition). `Display` is the
//!   client-facing message.
//! - **Store**: storage faults. Details are for logs, not clients.
//! - **Payment**: the payment gateway failed.
//!
//! This module contains no IO itself; it composes the store and gateway traits.

use thiserror::Error;

use orderdesk_core::DomainError;

use crate::store::StoreError;

pub mod catalog;
pub mod customers;
pub mod order_workflow;
pub mod payment;

pub use catalog::CatalogService;
pub use customers::CustomerService;
pub use order_workflow::{OrderWorkflow, StockPolicy};
pub use payment::{InstantGateway, PaymentError, PaymentGateway, SimulatedGateway};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Domain(DomainError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl From<DomainError> for WorkflowError {
    fn from(value: DomainError) -> Self {
        WorkflowError::Domain(value)
    }
}

/// Business-relevant store outcomes become domain errors; only backend
/// failures stay storage errors.
impl From<StoreError> for WorkflowError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { entity, id } => {
                WorkflowError::Domain(DomainError::not_found_with_id(entity, id))
            }
            StoreError::InsufficientStock { product_id } => {
                WorkflowError::Domain(DomainError::insufficient_stock(product_id.to_string()))
            }
            StoreError::DuplicateEmail { email } => {
                WorkflowError::Domain(DomainError::duplicate_email(email))
            }
            StoreError::StatusConflict { current } => WorkflowError::Domain(
                DomainError::invalid_transition(format!("Order is already {current}")),
            ),
            backend @ StoreError::Backend { .. } => WorkflowError::Store(backend),
        }
    }
}

/// Map a store `NotFound` to a specific domain message; everything else
/// converts as usual.
pub(crate) fn not_found_as(err: StoreError, domain: impl FnOnce() -> DomainError) -> WorkflowError {
    match err {
        StoreError::NotFound { .. } => WorkflowError::Domain(domain()),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_orders::OrderStatus;

    #[test]
    fn backend_failures_stay_storage_errors() {
        let err: WorkflowError = StoreError::backend("get_order", "connection reset").into();
        assert!(matches!(err, WorkflowError::Store(_)));
    }

    #[test]
    fn business_outcomes_become_domain_errors() {
        let err: WorkflowError = StoreError::DuplicateEmail {
            email: "ada@example.com".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Customer with this email already exists");

        let err: WorkflowError = StoreError::StatusConflict {
            current: OrderStatus::Cancelled,
        }
        .into();
        assert!(matches!(
            err,
            WorkflowError::Domain(DomainError::InvalidTransition(_))
        ));
    }

    #[test]
    fn not_found_can_carry_a_specific_message() {
        let err = not_found_as(StoreError::not_found("Order", "x"), || {
            DomainError::not_found("Order")
        });
        assert_eq!(err.to_string(), "Order not found");
    }
}
