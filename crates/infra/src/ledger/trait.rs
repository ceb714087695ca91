use async_trait::async_trait;

use stockflow_core::{ProductId, ShopId, WarehouseId};
use stockflow_inventory::{StockKey, Warehouse, WarehouseStock};

use crate::error::StoreError;

/// Per-(warehouse, product) stock counters.
///
/// `increase`/`decrease` return the number of rows affected (0 or 1). They run
/// inside `tx` when one is given and autocommit otherwise.
///
/// ## Guarded decrement
///
/// `decrease` must be a single conditional write equivalent to
///
/// ```sql
/// UPDATE warehouse_stocks SET stock = stock - $amount
/// WHERE warehouse_id = $w AND product_id = $p AND stock >= $amount
/// ```
///
/// so that concurrent decrements against one row can never take it below
/// zero: the loser sees 0 rows affected. Snapshots are for early rejection
/// only and may be stale.
#[async_trait]
pub trait StockLedger: Send + Sync {
    type Tx: Send;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Insert the row for `key`. A second row for the same pair is a
    /// [`StoreError::Conflict`].
    async fn create_row(&self, key: StockKey, initial: i64) -> Result<WarehouseStock, StoreError>;

    async fn increase(
        &self,
        key: StockKey,
        amount: i64,
        tx: Option<&mut Self::Tx>,
    ) -> Result<u64, StoreError>;

    async fn decrease(
        &self,
        key: StockKey,
        amount: i64,
        tx: Option<&mut Self::Tx>,
    ) -> Result<u64, StoreError>;

    /// Rows for every (warehouse, product) combination of the given ids that exists.
    async fn snapshot(
        &self,
        warehouse_ids: &[WarehouseId],
        product_ids: &[ProductId],
    ) -> Result<Vec<WarehouseStock>, StoreError>;

    /// Rows for the given products held in active warehouses.
    async fn snapshot_active(&self, product_ids: &[ProductId]) -> Result<Vec<WarehouseStock>, StoreError>;
}

/// Warehouse records and their active flag.
#[async_trait]
pub trait WarehouseDirectory: Send + Sync {
    /// New warehouses start active.
    async fn create_warehouse(&self, shop_id: ShopId, name: &str) -> Result<Warehouse, StoreError>;

    async fn list_by_ids(&self, ids: &[WarehouseId]) -> Result<Vec<Warehouse>, StoreError>;

    /// Rows affected; 0 means the warehouse does not exist.
    async fn set_active(&self, id: WarehouseId, active: bool) -> Result<u64, StoreError>;
}
