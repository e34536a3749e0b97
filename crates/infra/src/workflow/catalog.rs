use std::sync::Arc;

use tracing::{error, info, instrument};

use orderdesk_catalog::{NewProduct, Product, ProductId};
use orderdesk_core::DomainError;

use super::{WorkflowError, not_found_as};
use crate::store::{CatalogStore, OrderStore};

/// Product registration and removal.
///
/// Removal deletes the product first, then prunes matching line items from
/// every order. The prune is best-effort: if it fails the failure is logged
/// and the removal still counts as done.
pub struct CatalogService {
    catalog: Arc<dyn CatalogStore>,
    orders: Arc<dyn OrderStore>,
}

impl CatalogService {
    pub fn new(catalog: Arc<dyn CatalogStore>, orders: Arc<dyn OrderStore>) -> Self {
        Self { catalog, orders }
    }

    #[instrument(skip(self, product), fields(name = %product.name()))]
    pub async fn register_product(&self, product: NewProduct) -> Result<Product, WorkflowError> {
        let product = self.catalog.create_product(product).await?;
        info!(product_id = %product.id, stock = product.stock, "product registered");
        Ok(product)
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product, WorkflowError> {
        self.catalog
            .get_product(id)
            .await
            .map_err(|e| not_found_as(e, || DomainError::not_found("Product")))
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn remove_product(&self, id: ProductId) -> Result<(), WorkflowError> {
        self.catalog
            .delete_product(id)
            .await
            .map_err(|e| not_found_as(e, || DomainError::not_found("Product")))?;

        match self.orders.remove_line_items_referencing(id).await {
            Ok(pruned) => info!(pruned, "product removed and pruned from orders"),
            Err(e) => error!(error = %e, "product removed but pruning order lines failed"),
        }
        Ok(())
    }
}
