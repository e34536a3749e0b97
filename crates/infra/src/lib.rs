//! Infrastructure layer: stores, the order workflow engine, payment and config.

pub mod config;
pub mod store;
pub mod workflow;
