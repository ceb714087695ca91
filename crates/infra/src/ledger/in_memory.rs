use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use stockflow_core::{ProductId, ShopId, WarehouseId, WarehouseStockId};
use stockflow_inventory::{StockKey, Warehouse, WarehouseStock};

use super::r#trait::{StockLedger, WarehouseDirectory};
use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
struct InventoryState {
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    stocks: BTreeMap<StockKey, WarehouseStock>,
    last_warehouse_id: i64,
    last_stock_id: i64,
}

impl InventoryState {
    fn increase(&mut self, key: StockKey, amount: i64) -> Result<u64, StoreError> {
        let Some(row) = self.stocks.get_mut(&key) else {
            return Ok(0);
        };
        row.stock = row
            .stock
            .checked_add(amount)
            .ok_or_else(|| StoreError::Backend(format!("stock out of range for {key}")))?;
        row.updated_at = Utc::now();
        Ok(1)
    }

    fn decrease(&mut self, key: StockKey, amount: i64) -> u64 {
        match self.stocks.get_mut(&key) {
            Some(row) if row.stock >= amount => {
                row.stock -= amount;
                row.updated_at = Utc::now();
                1
            }
            _ => 0,
        }
    }
}

/// Transaction over the in-memory store.
///
/// Holds the store lock until commit or rollback, so transactions are
/// serialized. Rollback restores the state captured at `begin`.
pub struct InMemoryInventoryTx {
    state: OwnedMutexGuard<InventoryState>,
    backup: InventoryState,
}

/// In-memory warehouse store.
///
/// Intended for tests/dev. Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryStore {
    state: Arc<Mutex<InventoryState>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current quantity of a row, if it exists.
    pub async fn stock_of(&self, key: StockKey) -> Option<i64> {
        self.state.lock().await.stocks.get(&key).map(|row| row.stock)
    }
}

#[async_trait]
impl StockLedger for InMemoryInventoryStore {
    type Tx = InMemoryInventoryTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let state = self.state.clone().lock_owned().await;
        let backup = state.clone();
        Ok(InMemoryInventoryTx { state, backup })
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
        drop(tx);
        Ok(())
    }

    async fn rollback(&self, mut tx: Self::Tx) -> Result<(), StoreError> {
        *tx.state = tx.backup;
        Ok(())
    }

    async fn create_row(&self, key: StockKey, initial: i64) -> Result<WarehouseStock, StoreError> {
        let mut state = self.state.lock().await;
        if state.stocks.contains_key(&key) {
            return Err(StoreError::Conflict(format!("stock row already exists for {key}")));
        }

        state.last_stock_id += 1;
        let now = Utc::now();
        let row = WarehouseStock {
            id: WarehouseStockId::new(state.last_stock_id),
            warehouse_id: key.warehouse_id,
            product_id: key.product_id,
            stock: initial,
            created_at: now,
            updated_at: now,
        };
        state.stocks.insert(key, row.clone());
        Ok(row)
    }

    async fn increase(
        &self,
        key: StockKey,
        amount: i64,
        tx: Option<&mut Self::Tx>,
    ) -> Result<u64, StoreError> {
        match tx {
            Some(tx) => tx.state.increase(key, amount),
            None => self.state.lock().await.increase(key, amount),
        }
    }

    async fn decrease(
        &self,
        key: StockKey,
        amount: i64,
        tx: Option<&mut Self::Tx>,
    ) -> Result<u64, StoreError> {
        Ok(match tx {
            Some(tx) => tx.state.decrease(key, amount),
            None => self.state.lock().await.decrease(key, amount),
        })
    }

    async fn snapshot(
        &self,
        warehouse_ids: &[WarehouseId],
        product_ids: &[ProductId],
    ) -> Result<Vec<WarehouseStock>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .stocks
            .values()
            .filter(|row| {
                warehouse_ids.contains(&row.warehouse_id) && product_ids.contains(&row.product_id)
            })
            .cloned()
            .collect())
    }

    async fn snapshot_active(&self, product_ids: &[ProductId]) -> Result<Vec<WarehouseStock>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .stocks
            .values()
            .filter(|row| product_ids.contains(&row.product_id))
            .filter(|row| {
                state
                    .warehouses
                    .get(&row.warehouse_id)
                    .is_some_and(|w| w.active)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WarehouseDirectory for InMemoryInventoryStore {
    async fn create_warehouse(&self, shop_id: ShopId, name: &str) -> Result<Warehouse, StoreError> {
        let mut state = self.state.lock().await;
        state.last_warehouse_id += 1;
        let now = Utc::now();
        let warehouse = Warehouse {
            id: WarehouseId::new(state.last_warehouse_id),
            shop_id,
            name: name.to_string(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        state.warehouses.insert(warehouse.id, warehouse.clone());
        Ok(warehouse)
    }

    async fn list_by_ids(&self, ids: &[WarehouseId]) -> Result<Vec<Warehouse>, StoreError> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.warehouses.get(id).cloned())
            .collect())
    }

    async fn set_active(&self, id: WarehouseId, active: bool) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        match state.warehouses.get_mut(&id) {
            Some(w) => {
                w.active = active;
                w.updated_at = Utc::now();
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
