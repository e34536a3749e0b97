//! Store and workflow wiring.
//!
//! `USE_PERSISTENT_STORES=true` selects the Postgres stores (tables are
//! created on startup); otherwise everything lives in memory.

use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use orderdesk_infra::config::AppConfig;
use orderdesk_infra::store::postgres::migrate;
use orderdesk_infra::store::{
    CatalogStore, CustomerStore, InMemoryCatalogStore, InMemoryCustomerStore, InMemoryOrderStore,
    OrderStore, PostgresCatalogStore, PostgresCustomerStore, PostgresOrderStore,
};
use orderdesk_infra::workflow::{
    CatalogService, CustomerService, OrderWorkflow, PaymentGateway, SimulatedGateway,
};

/// Everything the handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub customers: CustomerService,
    pub catalog: CatalogService,
    pub orders: OrderWorkflow,
}

impl AppServices {
    pub fn from_stores(
        config: &AppConfig,
        customers: Arc<dyn CustomerStore>,
        catalog: Arc<dyn CatalogStore>,
        orders: Arc<dyn OrderStore>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        let workflow = OrderWorkflow::new(customers.clone(), catalog.clone(), orders.clone(), payments)
            .with_transition_policy(config.transition_policy)
            .with_stock_policy(config.stock_policy);

        Self {
            customers: CustomerService::new(customers),
            catalog: CatalogService::new(catalog, orders),
            orders: workflow,
        }
    }

    pub fn in_memory(config: &AppConfig) -> Self {
        let customers = Arc::new(InMemoryCustomerStore::new());
        let catalog = Arc::new(InMemoryCatalogStore::new());
        let orders = Arc::new(InMemoryOrderStore::new(customers.clone(), catalog.clone()));

        Self::from_stores(
            config,
            customers,
            catalog,
            orders,
            Arc::new(SimulatedGateway::new(config.payment_delay)),
        )
    }

    pub async fn persistent(config: &AppConfig, database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("failed to connect to Postgres")?;
        migrate(&pool).await.context("failed to create tables")?;

        Ok(Self::from_stores(
            config,
            Arc::new(PostgresCustomerStore::new(pool.clone())),
            Arc::new(PostgresCatalogStore::new(pool.clone())),
            Arc::new(PostgresOrderStore::new(pool)),
            Arc::new(SimulatedGateway::new(config.payment_delay)),
        ))
    }
}

pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("using Postgres stores");
            AppServices::persistent(config, url).await
        }
        None => {
            tracing::info!("using in-memory stores");
            Ok(AppServices::in_memory(config))
        }
    }
}
