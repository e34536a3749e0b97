//! Customers domain module.
//!
//! Customer records and the validation applied at registration. Pure domain
//! logic (no IO, no HTTP, no storage); uniqueness of email is a store concern.

pub mod customer;

pub use customer::{Customer, CustomerId, NewCustomer};
