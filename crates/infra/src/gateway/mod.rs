//! Order-side views of the other services: the product catalog and the
//! warehouse service.
//!
//! `http` talks to the real services; `local` runs the warehouse coordinator
//! in-process and serves products from memory (tests/dev).

pub mod http;
pub mod local;

use std::sync::Arc;

use async_trait::async_trait;

use stockflow_core::{DomainError, ProductId};
use stockflow_inventory::StockAdjustment;
use stockflow_orders::{ActiveStock, Product};

use crate::error::GatewayError;

pub use http::{BasicAuth, HttpProductCatalog, HttpWarehouseGateway, ServiceClient};
pub use local::{InMemoryProductCatalog, LocalWarehouseGateway};

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Products known for `ids`. Unknown ids are simply absent.
    async fn list_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, GatewayError>;
}

#[async_trait]
pub trait WarehouseGateway: Send + Sync {
    /// Stock of `product_ids` in active warehouses, joined with owning shop.
    async fn active_stock(&self, product_ids: &[ProductId]) -> Result<Vec<ActiveStock>, GatewayError>;

    /// Submit one all-or-nothing adjustment batch.
    async fn adjust(&self, adjustments: &[StockAdjustment]) -> Result<(), GatewayError>;
}

#[async_trait]
impl<T: ProductCatalog + ?Sized> ProductCatalog for Arc<T> {
    async fn list_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, GatewayError> {
        (**self).list_by_ids(ids).await
    }
}

#[async_trait]
impl<T: WarehouseGateway + ?Sized> WarehouseGateway for Arc<T> {
    async fn active_stock(&self, product_ids: &[ProductId]) -> Result<Vec<ActiveStock>, GatewayError> {
        (**self).active_stock(product_ids).await
    }

    async fn adjust(&self, adjustments: &[StockAdjustment]) -> Result<(), GatewayError> {
        (**self).adjust(adjustments).await
    }
}

/// Business rejection of an adjustment, as seen by the order service.
///
/// A missing ledger row on the warehouse side means the product has no stock
/// in that warehouse from the buyer's point of view.
pub(crate) fn rejected_adjustment(err: DomainError) -> GatewayError {
    match err {
        DomainError::StockRowNotFound => GatewayError::Rejected(DomainError::StockNotFound),
        other => GatewayError::Rejected(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_ledger_row_reads_as_missing_stock() {
        assert_eq!(
            rejected_adjustment(DomainError::StockRowNotFound),
            GatewayError::Rejected(DomainError::StockNotFound)
        );
        assert_eq!(
            rejected_adjustment(DomainError::OutOfStock),
            GatewayError::Rejected(DomainError::OutOfStock)
        );
        assert_eq!(
            rejected_adjustment(DomainError::AdjustmentFailed),
            GatewayError::Rejected(DomainError::AdjustmentFailed)
        );
    }
}
