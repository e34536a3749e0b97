//! Money value object.
//!
//! Amounts are held in the smallest currency unit (cents) so totals are exact.
//! On the wire they travel as JSON decimal numbers (`1.5` is 150 cents).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Non-negative amount of money in cents.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(u64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    /// Largest amount whose decimal form is exactly representable as an `f64`.
    pub const MAX_CENTS: u64 = 1 << 53;

    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents(self) -> u64 {
        self.0
    }

    /// Parse a decimal amount, rounding to the nearest cent.
    pub fn from_decimal(value: f64) -> DomainResult<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(DomainError::validation(
                "price must be a valid non-negative number",
            ));
        }

        let cents = (value * 100.0).round();
        if cents > Self::MAX_CENTS as f64 {
            return Err(DomainError::validation("price is too large"));
        }

        Ok(Self(cents as u64))
    }

    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// `self × quantity`, or `None` if the result leaves the representable range.
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0
            .checked_mul(u64::from(quantity))
            .filter(|c| *c <= Self::MAX_CENTS)
            .map(Self)
    }

    pub fn checked_add(self, other: Money) -> Option<Self> {
        self.0
            .checked_add(other.0)
            .filter(|c| *c <= Self::MAX_CENTS)
            .map(Self)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Money::from_decimal(value).map_err(serde::de::Error::custom)
    }
}
