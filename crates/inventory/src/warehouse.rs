use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockflow_core::{DomainResult, Entity, RequestValidator, ShopId, Validate, WarehouseId};

/// A physical warehouse owned by a shop.
///
/// Only active warehouses contribute to the active-stock view used for
/// reservation. Ledger rows themselves ignore the flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub shop_id: ShopId,
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> WarehouseId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateWarehouseRequest {
    pub shop_id: ShopId,
    pub name: String,
}

impl Validate for CreateWarehouseRequest {
    fn validate(&self, v: &RequestValidator) -> DomainResult<()> {
        v.required_id("shop_id", self.shop_id.get())?;
        v.not_blank("name", &self.name)
    }
}

/// Request: flip a warehouse's active flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseActivationRequest {
    pub warehouse_id: WarehouseId,
    pub active: bool,
}

impl Validate for WarehouseActivationRequest {
    fn validate(&self, v: &RequestValidator) -> DomainResult<()> {
        v.required_id("warehouse_id", self.warehouse_id.get())
    }
}
