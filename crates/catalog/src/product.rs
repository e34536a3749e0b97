use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use orderdesk_core::{DomainError, DomainResult, Entity, EntityId, Money};

/// Product identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub EntityId);

orderdesk_core::entity_id_newtype!(ProductId);

const REQUIRED_FIELDS: &str = "Name, description, price, and stock are required";

/// A catalog product.
///
/// Invariant: `stock` never goes below zero. All stock changes go through
/// [`Product::take_stock`] / [`Product::return_stock`], which refuse to break it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A decrement was refused: the product does not hold enough stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("requested {requested}, available {available}")]
pub struct StockShortfall {
    pub requested: u32,
    pub available: u32,
}

impl Product {
    /// Remove `quantity` units. On shortfall the product is left untouched.
    pub fn take_stock(&mut self, quantity: u32) -> Result<(), StockShortfall> {
        match self.stock.checked_sub(quantity) {
            Some(remaining) => {
                self.stock = remaining;
                Ok(())
            }
            None => Err(StockShortfall {
                requested: quantity,
                available: self.stock,
            }),
        }
    }

    /// Put `quantity` units back (compensation for a reservation that did not
    /// turn into an order).
    pub fn return_stock(&mut self, quantity: u32) -> DomainResult<()> {
        self.stock = self
            .stock
            .checked_add(quantity)
            .ok_or_else(|| DomainError::validation("stock would overflow"))?;
        Ok(())
    }
}

/// Validated product creation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    name: String,
    description: String,
    price: Money,
    stock: u32,
}

impl NewProduct {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        stock: u32,
    ) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        let description = description.into().trim().to_string();

        if name.is_empty() || description.is_empty() {
            return Err(DomainError::validation(REQUIRED_FIELDS));
        }

        Ok(Self {
            name,
            description,
            price,
            stock,
        })
    }

    /// Validate loosely-typed input as it arrives over the wire.
    ///
    /// Zero is a valid price and a valid stock level; only absent, negative,
    /// fractional (stock) or non-finite values are rejected.
    pub fn from_parts(
        name: Option<String>,
        description: Option<String>,
        price: Option<f64>,
        stock: Option<f64>,
    ) -> DomainResult<Self> {
        let (Some(name), Some(description), Some(price), Some(stock)) =
            (name, description, price, stock)
        else {
            return Err(DomainError::validation(REQUIRED_FIELDS));
        };

        let price = Money::from_decimal(price)?;
        let stock = parse_stock(stock)?;
        Self::new(name, description, price, stock)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            created_at,
        }
    }
}

fn parse_stock(value: f64) -> DomainResult<u32> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(DomainError::validation(
            "stock must be a valid non-negative integer",
        ));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn widget(stock: u32) -> Product {
        NewProduct::new("Widget", "A widget", Money::from_cents(100), stock)
            .unwrap()
            .into_product(ProductId::new(), Utc::now())
    }

    #[test]
    fn take_stock_subtracts_when_sufficient() {
        let mut product = widget(100);
        product.take_stock(2).unwrap();
        assert_eq!(product.stock, 98);
    }

    #[test]
    fn take_stock_refuses_and_leaves_stock_unchanged() {
        let mut product = widget(3);
        let err = product.take_stock(4).unwrap_err();
        assert_eq!(err, StockShortfall { requested: 4, available: 3 });
        assert_eq!(product.stock, 3);
    }

    #[test]
    fn exact_stock_can_be_taken() {
        let mut product = widget(5);
        product.take_stock(5).unwrap();
        assert_eq!(product.stock, 0);
    }

    #[test]
    fn return_stock_refuses_overflow() {
        let mut product = widget(u32::MAX);
        assert!(product.return_stock(1).is_err());
        assert_eq!(product.stock, u32::MAX);
    }

    #[test]
    fn zero_price_and_zero_stock_are_valid() {
        let new = NewProduct::from_parts(
            Some("Free sample".into()),
            Some("Sold out".into()),
            Some(0.0),
            Some(0.0),
        )
        .unwrap();
        assert_eq!(new.price(), Money::ZERO);
        assert_eq!(new.stock(), 0);
    }

    #[test]
    fn missing_fields_are_rejected() {
        let err = NewProduct::from_parts(Some("Widget".into()), None, Some(1.0), Some(1.0))
            .unwrap_err();
        assert_eq!(err.to_string(), REQUIRED_FIELDS);

        let err = NewProduct::from_parts(Some("  ".into()), Some("d".into()), Some(1.0), Some(1.0))
            .unwrap_err();
        assert_eq!(err.to_string(), REQUIRED_FIELDS);
    }

    #[test]
    fn negative_or_fractional_numbers_are_rejected() {
        let name = || Some("Widget".to_string());
        let desc = || Some("A widget".to_string());

        assert!(NewProduct::from_parts(name(), desc(), Some(-1.0), Some(1.0)).is_err());
        assert!(NewProduct::from_parts(name(), desc(), Some(1.0), Some(-1.0)).is_err());
        assert!(NewProduct::from_parts(name(), desc(), Some(1.0), Some(1.5)).is_err());
    }

    #[test]
    fn product_serializes_price_as_decimal() {
        let json = serde_json::to_value(widget(7)).unwrap();
        assert_eq!(json["price"], serde_json::json!(1.0));
        assert_eq!(json["stock"], 7);
        assert_eq!(json["name"], "Widget");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: stock never underflows, and a refused decrement changes nothing.
        #[test]
        fn stock_never_goes_negative(
            initial in 0u32..1_000u32,
            requests in prop::collection::vec(0u32..200u32, 0..40)
        ) {
            let mut product = widget(initial);
            let mut expected = initial;

            for quantity in requests {
                let before = product.stock;
                match product.take_stock(quantity) {
                    Ok(()) => {
                        prop_assert!(quantity <= before);
                        expected -= quantity;
                    }
                    Err(shortfall) => {
                        prop_assert!(quantity > before);
                        prop_assert_eq!(shortfall.available, before);
                        prop_assert_eq!(product.stock, before);
                    }
                }
                prop_assert_eq!(product.stock, expected);
            }
        }
    }
}
