use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{
    DomainResult, Entity, ProductId, RequestValidator, Validate, WarehouseId, WarehouseStockId,
};

use crate::warehouse::Warehouse;

/// The (warehouse, product) pair identifying exactly one ledger row.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
}

impl StockKey {
    pub fn new(warehouse_id: WarehouseId, product_id: ProductId) -> Self {
        Self {
            warehouse_id,
            product_id,
        }
    }
}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "warehouse={} product={}", self.warehouse_id, self.product_id)
    }
}

/// Ledger row: the authoritative quantity of one product in one warehouse.
///
/// `stock` is never negative. The guard lives in the storage engine's
/// conditional decrement, not in this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseStock {
    pub id: WarehouseStockId,
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WarehouseStock {
    pub fn key(&self) -> StockKey {
        StockKey::new(self.warehouse_id, self.product_id)
    }
}

impl Entity for WarehouseStock {
    type Id = WarehouseStockId;

    fn id(&self) -> WarehouseStockId {
        self.id
    }
}

/// Request: create the ledger row for a (warehouse, product) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStockRowRequest {
    pub warehouse_id: WarehouseId,
    pub product_id: ProductId,
    #[serde(default)]
    pub stock: i64,
}

impl CreateStockRowRequest {
    pub fn key(&self) -> StockKey {
        StockKey::new(self.warehouse_id, self.product_id)
    }
}

impl Validate for CreateStockRowRequest {
    fn validate(&self, v: &RequestValidator) -> DomainResult<()> {
        v.required_id("warehouse_id", self.warehouse_id.get())?;
        v.required_id("product_id", self.product_id.get())?;
        v.not_negative("stock", self.stock)
    }
}

/// Stock held in active warehouses for a set of products, together with the
/// warehouses those rows belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveStockView {
    pub warehouses: Vec<Warehouse>,
    pub warehouse_stocks: Vec<WarehouseStock>,
}
