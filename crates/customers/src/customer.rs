use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{DomainError, DomainResult, Entity, EntityId};

/// Customer identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(pub EntityId);

orderdesk_core::entity_id_newtype!(CustomerId);

const REQUIRED_FIELDS: &str = "First name, last name, and email are required";

/// A registered customer. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    /// Unique across all customers.
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Validated registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    first_name: String,
    last_name: String,
    email: String,
}

impl NewCustomer {
    /// Validate registration fields. Surrounding whitespace is trimmed; a field
    /// that is empty afterwards counts as missing.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> DomainResult<Self> {
        let first_name = first_name.into().trim().to_string();
        let last_name = last_name.into().trim().to_string();
        let email = email.into().trim().to_string();

        if first_name.is_empty() || last_name.is_empty() || email.is_empty() {
            return Err(DomainError::validation(REQUIRED_FIELDS));
        }

        Ok(Self {
            first_name,
            last_name,
            email,
        })
    }

    /// Same as [`NewCustomer::new`], treating an absent field as missing.
    pub fn from_parts(
        first_name: Option<String>,
        last_name: Option<String>,
        email: Option<String>,
    ) -> DomainResult<Self> {
        match (first_name, last_name, email) {
            (Some(first), Some(last), Some(email)) => Self::new(first, last, email),
            _ => Err(DomainError::validation(REQUIRED_FIELDS)),
        }
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Materialize the record a store persists.
    pub fn into_customer(self, id: CustomerId, created_at: DateTime<Utc>) -> Customer {
        Customer {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_trims_fields() {
        let new = NewCustomer::new(" Ada ", "Lovelace", " ada@example.com").unwrap();
        assert_eq!(new.first_name(), "Ada");
        assert_eq!(new.last_name(), "Lovelace");
        assert_eq!(new.email(), "ada@example.com");
    }

    #[test]
    fn blank_fields_are_missing_fields() {
        for (first, last, email) in [("", "L", "e@x"), ("F", "  ", "e@x"), ("F", "L", "")] {
            let err = NewCustomer::new(first, last, email).unwrap_err();
            assert_eq!(err, DomainError::validation(REQUIRED_FIELDS));
        }
    }

    #[test]
    fn absent_fields_are_missing_fields() {
        let err = NewCustomer::from_parts(Some("Ada".into()), None, Some("a@x".into())).unwrap_err();
        assert_eq!(err.to_string(), REQUIRED_FIELDS);
    }

    #[test]
    fn customer_serializes_with_wire_field_names() {
        let customer = NewCustomer::new("Ada", "Lovelace", "ada@example.com")
            .unwrap()
            .into_customer(CustomerId::new(), Utc::now());

        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["lastName"], "Lovelace");
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["id"], customer.id.to_string());
        assert!(json.get("createdAt").is_some());
    }
}
