//! In-memory stores for tests/dev.
//!
//! Every check-and-write happens inside one write-lock critical section, which
//! is what makes `decrement_stock` and `create_customer` atomic here. Locks are
//! never held across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use orderdesk_catalog::{NewProduct, Product, ProductId};
use orderdesk_customers::{Customer, CustomerId, NewCustomer};
use orderdesk_orders::{
    CustomerSummary, ExpandedOrder, NewOrder, Order, OrderId, OrderStatus, PaymentStatus,
    ProductSummary, StatusChange,
};

use super::{CatalogStore, CustomerStore, OrderStore, StoreError, StoreResult};

fn poisoned(operation: &'static str) -> StoreError {
    StoreError::backend(operation, "lock poisoned")
}

/// In-memory product catalog.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn summary(&self, id: &ProductId) -> StoreResult<Option<ProductSummary>> {
        let products = self
            .products
            .read()
            .map_err(|_| poisoned("product_summary"))?;
        Ok(products.get(id).map(ProductSummary::from))
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn get_product(&self, id: ProductId) -> StoreResult<Product> {
        let products = self.products.read().map_err(|_| poisoned("get_product"))?;
        products
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Product", id))
    }

    async fn create_product(&self, product: NewProduct) -> StoreResult<Product> {
        let product = product.into_product(ProductId::new(), Utc::now());
        let mut products = self
            .products
            .write()
            .map_err(|_| poisoned("create_product"))?;
        products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn decrement_stock(&self, id: ProductId, quantity: u32) -> StoreResult<Product> {
        let mut products = self
            .products
            .write()
            .map_err(|_| poisoned("decrement_stock"))?;
        let product = products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;
        product
            .take_stock(quantity)
            .map_err(|_| StoreError::InsufficientStock { product_id: id })?;
        Ok(product.clone())
    }

    async fn restock_product(&self, id: ProductId, quantity: u32) -> StoreResult<Product> {
        let mut products = self
            .products
            .write()
            .map_err(|_| poisoned("restock_product"))?;
        let product = products
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Product", id))?;
        product
            .return_stock(quantity)
            .map_err(|e| StoreError::backend("restock_product", e.to_string()))?;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<()> {
        let mut products = self
            .products
            .write()
            .map_err(|_| poisoned("delete_product"))?;
        products
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Product", id))
    }
}

/// In-memory customer registry.
#[derive(Debug, Default)]
pub struct InMemoryCustomerStore {
    customers: RwLock<HashMap<CustomerId, Customer>>,
}

impl InMemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn summary(&self, id: &CustomerId) -> StoreResult<Option<CustomerSummary>> {
        let customers = self
            .customers
            .read()
            .map_err(|_| poisoned("customer_summary"))?;
        Ok(customers.get(id).map(CustomerSummary::from))
    }
}

#[async_trait]
impl CustomerStore for InMemoryCustomerStore {
    async fn get_customer(&self, id: CustomerId) -> StoreResult<Customer> {
        let customers = self
            .customers
            .read()
            .map_err(|_| poisoned("get_customer"))?;
        customers
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Customer", id))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Customer>> {
        let customers = self
            .customers
            .read()
            .map_err(|_| poisoned("find_by_email"))?;
        Ok(customers.values().find(|c| c.email == email).cloned())
    }

    async fn create_customer(&self, customer: NewCustomer) -> StoreResult<Customer> {
        let mut customers = self
            .customers
            .write()
            .map_err(|_| poisoned("create_customer"))?;

        if customers.values().any(|c| c.email == customer.email()) {
            return Err(StoreError::DuplicateEmail {
                email: customer.email().to_string(),
            });
        }

        let customer = customer.into_customer(CustomerId::new(), Utc::now());
        customers.insert(customer.id, customer.clone());
        Ok(customer)
    }
}

#[derive(Debug, Default)]
struct OrderTable {
    next_seq: u64,
    rows: HashMap<OrderId, (u64, Order)>,
}

/// In-memory order store.
///
/// Holds the customer and catalog stores it joins against when listing.
#[derive(Debug)]
pub struct InMemoryOrderStore {
    orders: RwLock<OrderTable>,
    customers: Arc<InMemoryCustomerStore>,
    catalog: Arc<InMemoryCatalogStore>,
}

impl InMemoryOrderStore {
    pub fn new(customers: Arc<InMemoryCustomerStore>, catalog: Arc<InMemoryCatalogStore>) -> Self {
        Self {
            orders: RwLock::new(OrderTable::default()),
            customers,
            catalog,
        }
    }

    fn update<F>(&self, operation: &'static str, id: OrderId, f: F) -> StoreResult<Order>
    where
        F: FnOnce(&mut Order) -> StoreResult<()>,
    {
        let mut table = self.orders.write().map_err(|_| poisoned(operation))?;
        let (_, order) = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Order", id))?;
        f(order)?;
        Ok(order.clone())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
        let order = order.into_order(OrderId::new(), Utc::now());
        let mut table = self.orders.write().map_err(|_| poisoned("create_order"))?;
        let seq = table.next_seq;
        table.next_seq += 1;
        table.rows.insert(order.id, (seq, order.clone()));
        Ok(order)
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Order> {
        let table = self.orders.read().map_err(|_| poisoned("get_order"))?;
        table
            .rows
            .get(&id)
            .map(|(_, order)| order.clone())
            .ok_or_else(|| StoreError::not_found("Order", id))
    }

    async fn list_orders_expanded(&self) -> StoreResult<Vec<ExpandedOrder>> {
        let mut snapshot: Vec<(u64, Order)> = {
            let table = self.orders.read().map_err(|_| poisoned("list_orders"))?;
            table.rows.values().cloned().collect()
        };
        snapshot.sort_by_key(|(seq, _)| *seq);

        let mut expanded = Vec::with_capacity(snapshot.len());
        for (_, order) in snapshot {
            let customer = self.customers.summary(&order.customer_id)?;
            let mut products = HashMap::new();
            for item in &order.items {
                if !products.contains_key(&item.product_id) {
                    products.insert(item.product_id, self.catalog.summary(&item.product_id)?);
                }
            }
            expanded.push(ExpandedOrder::resolve(order, customer, |id| {
                products.get(id).cloned().flatten()
            }));
        }
        Ok(expanded)
    }

    async fn set_status(&self, id: OrderId, status: OrderStatus) -> StoreResult<Order> {
        self.update("set_status", id, |order| {
            order.status = status;
            Ok(())
        })
    }

    async fn set_payment_status(
        &self,
        id: OrderId,
        status: PaymentStatus,
    ) -> StoreResult<Order> {
        self.update("set_payment_status", id, |order| {
            order.payment_status = status;
            Ok(())
        })
    }

    async fn apply_status_change(
        &self,
        id: OrderId,
        change: StatusChange,
    ) -> StoreResult<Order> {
        self.update("apply_status_change", id, |order| {
            change
                .apply_to(order)
                .map_err(|current| StoreError::StatusConflict { current })
        })
    }

    async fn remove_line_items_referencing(&self, product_id: ProductId) -> StoreResult<u64> {
        let mut table = self
            .orders
            .write()
            .map_err(|_| poisoned("remove_line_items"))?;

        let mut removed = 0u64;
        for (_, order) in table.rows.values_mut() {
            let before = order.items.len();
            order.items.retain(|item| item.product_id != product_id);
            removed += (before - order.items.len()) as u64;
        }
        Ok(removed)
    }
}
