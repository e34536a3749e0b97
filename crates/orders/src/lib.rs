//! Orders domain module.
//!
//! Business rules for orders, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage): placement input validation, total
//! accumulation, and the status/payment transition rules.

pub mod order;
pub mod view;

pub use order::{
    LineItem, NewOrder, Order, OrderId, OrderStatus, OrderTotal, PaymentStatus, PlaceOrder,
    StatusChange, TransitionPolicy,
};
pub use view::{CustomerSummary, ExpandedLineItem, ExpandedOrder, ProductSummary};
