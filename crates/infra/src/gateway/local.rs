//! In-process gateways. Intended for tests/dev.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use stockflow_core::ProductId;
use stockflow_inventory::{StockAdjustment, StockAdjustmentRequest};
use stockflow_orders::{ActiveStock, Product};

use super::{ProductCatalog, WarehouseGateway, rejected_adjustment};
use crate::coordinator::StockAdjustmentCoordinator;
use crate::error::{GatewayError, ServiceError};
use crate::ledger::{StockLedger, WarehouseDirectory};

/// Map a coordinator failure the way the HTTP surface would expose it.
fn remote_error(err: ServiceError) -> GatewayError {
    match err {
        ServiceError::Domain(e) => rejected_adjustment(e),
        ServiceError::Store(e) => GatewayError::Status {
            status: 500,
            body: e.to_string(),
        },
        ServiceError::Gateway(e) => e,
    }
}

/// Warehouse gateway calling a coordinator in the same process.
pub struct LocalWarehouseGateway<S> {
    coordinator: Arc<StockAdjustmentCoordinator<S>>,
}

impl<S> LocalWarehouseGateway<S> {
    pub fn new(coordinator: Arc<StockAdjustmentCoordinator<S>>) -> Self {
        Self { coordinator }
    }
}

impl<S> Clone for LocalWarehouseGateway<S> {
    fn clone(&self) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
        }
    }
}

#[async_trait]
impl<S> WarehouseGateway for LocalWarehouseGateway<S>
where
    S: StockLedger + WarehouseDirectory + 'static,
{
    async fn active_stock(&self, product_ids: &[ProductId]) -> Result<Vec<ActiveStock>, GatewayError> {
        let view = self
            .coordinator
            .active_stock(product_ids)
            .await
            .map_err(remote_error)?;
        Ok(ActiveStock::from_view(&view))
    }

    async fn adjust(&self, adjustments: &[StockAdjustment]) -> Result<(), GatewayError> {
        self.coordinator
            .adjust(&StockAdjustmentRequest::new(adjustments.to_vec()))
            .await
            .map_err(remote_error)
    }
}

/// Product catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductCatalog {
    products: Arc<RwLock<Vec<Product>>>,
}

impl InMemoryProductCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }

    pub async fn insert(&self, product: Product) {
        let mut products = self.products.write().await;
        products.retain(|p| p.id != product.id);
        products.push(product);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn list_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, GatewayError> {
        let products = self.products.read().await;
        Ok(products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }
}
