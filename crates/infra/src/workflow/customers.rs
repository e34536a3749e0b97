use std::sync::Arc;

use tracing::{info, instrument};

use orderdesk_core::DomainError;
use orderdesk_customers::{Customer, CustomerId, NewCustomer};

use super::{WorkflowError, not_found_as};
use crate::store::CustomerStore;

/// Customer registration.
///
/// The email lookup only pre-checks; two racing registrations are decided by
/// the store's uniqueness enforcement.
pub struct CustomerService {
    customers: Arc<dyn CustomerStore>,
}

impl CustomerService {
    pub fn new(customers: Arc<dyn CustomerStore>) -> Self {
        Self { customers }
    }

    #[instrument(skip(self, customer))]
    pub async fn register_customer(
        &self,
        customer: NewCustomer,
    ) -> Result<Customer, WorkflowError> {
        if self.customers.find_by_email(customer.email()).await?.is_some() {
            return Err(DomainError::duplicate_email(customer.email()).into());
        }

        let customer = self.customers.create_customer(customer).await?;
        info!(customer_id = %customer.id, "customer registered");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: CustomerId) -> Result<Customer, WorkflowError> {
        self.customers
            .get_customer(id)
            .await
            .map_err(|e| not_found_as(e, || DomainError::not_found("Customer")))
    }
}
