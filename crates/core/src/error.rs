//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing references, stock, status rules). Infrastructure concerns belong
/// elsewhere.
///
/// The `Display` output is the client-facing message: the HTTP layer returns it
/// verbatim as `{"message": ...}`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (missing or malformed input).
    #[error("{0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A referenced customer/product/order does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Another customer already uses this email address.
    #[error("Customer with this email already exists")]
    DuplicateEmail(String),

    /// The requested quantity exceeds the available stock of the named product.
    #[error("Insufficient stock for product: {0}")]
    InsufficientStock(String),

    /// A status change was rejected because the order is in a terminal state.
    #[error("{0}")]
    InvalidTransition(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// `"{entity} not found"`.
    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{entity} not found"))
    }

    /// `"{entity} not found: {id}"`, identifying which reference failed.
    pub fn not_found_with_id(entity: &str, id: impl core::fmt::Display) -> Self {
        Self::NotFound(format!("{entity} not found: {id}"))
    }

    pub fn duplicate_email(email: impl Into<String>) -> Self {
        Self::DuplicateEmail(email.into())
    }

    pub fn insufficient_stock(product_name: impl Into<String>) -> Self {
        Self::InsufficientStock(product_name.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_messages_identify_the_reference() {
        assert_eq!(DomainError::not_found("Order").to_string(), "Order not found");
        assert_eq!(
            DomainError::not_found_with_id("Product", "abc").to_string(),
            "Product not found: abc"
        );
    }

    #[test]
    fn insufficient_stock_names_the_product() {
        let err = DomainError::insufficient_stock("Widget");
        assert_eq!(err.to_string(), "Insufficient stock for product: Widget");
    }

    #[test]
    fn duplicate_email_message_does_not_echo_the_address() {
        let err = DomainError::duplicate_email("a@example.com");
        assert_eq!(err.to_string(), "Customer with this email already exists");
        assert_eq!(err, DomainError::DuplicateEmail("a@example.com".to_string()));
    }
}
