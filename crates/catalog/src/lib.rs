//! Product catalog domain module.
//!
//! Product records, creation-time validation and the stock arithmetic that
//! stores apply inside their atomic sections. No IO.

pub mod product;

pub use product::{NewProduct, Product, ProductId, StockShortfall};
