//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity** - they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**:
/// - `Money::from_cents(200)` is a value object
/// - `Product { id: ProductId(...), name: "..." }` is an entity
///
/// To "modify" a value object, create a new one (`price.checked_mul(quantity)`).
///
/// The trait requires:
/// - **Clone**: Value objects should be cheap to copy
/// - **PartialEq**: Value objects are compared by their attribute values
/// - **Debug**: Value objects should be debuggable (logging, tests)
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
