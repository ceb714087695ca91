use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use stockflow_core::{OrderDetailId, OrderId};
use stockflow_orders::{NewOrder, NewOrderDetail, Order, OrderDetail, OrderState};

use super::r#trait::OrderStore;
use crate::error::StoreError;

#[derive(Debug, Clone, Default)]
struct OrderTables {
    orders: BTreeMap<OrderId, Order>,
    details: BTreeMap<OrderDetailId, OrderDetail>,
    last_order_id: i64,
    last_detail_id: i64,
}

/// Transaction over the in-memory order store; see
/// [`crate::ledger::in_memory::InMemoryInventoryTx`].
pub struct InMemoryOrderTx {
    state: OwnedMutexGuard<OrderTables>,
    backup: OrderTables,
}

/// In-memory order store.
///
/// Intended for tests/dev. Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<Mutex<OrderTables>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    type Tx = InMemoryOrderTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let state = self.state.clone().lock_owned().await;
        let backup = state.clone();
        Ok(InMemoryOrderTx { state, backup })
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
        drop(tx);
        Ok(())
    }

    async fn rollback(&self, mut tx: Self::Tx) -> Result<(), StoreError> {
        *tx.state = tx.backup;
        Ok(())
    }

    async fn insert_order(&self, tx: &mut Self::Tx, order: &NewOrder) -> Result<Order, StoreError> {
        let state = &mut *tx.state;
        state.last_order_id += 1;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(state.last_order_id),
            user_id: order.user_id,
            shop_id: order.shop_id,
            state: OrderState::Created,
            total_stock: order.total_stock,
            total_price: order.total_price,
            expired_at: order.expired_at,
            created_at: now,
            updated_at: now,
        };
        state.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn insert_detail(
        &self,
        tx: &mut Self::Tx,
        order_id: OrderId,
        detail: &NewOrderDetail,
    ) -> Result<OrderDetail, StoreError> {
        let state = &mut *tx.state;
        if !state.orders.contains_key(&order_id) {
            return Err(StoreError::Backend(format!("order {order_id} does not exist")));
        }

        state.last_detail_id += 1;
        let now = Utc::now();
        let detail = OrderDetail {
            id: OrderDetailId::new(state.last_detail_id),
            order_id,
            product_id: detail.product_id,
            warehouse_id: detail.warehouse_id,
            stock: detail.stock,
            price: detail.price,
            created_at: now,
            updated_at: now,
        };
        state.details.insert(detail.id, detail.clone());
        Ok(detail)
    }

    async fn mark_expired(&self, tx: &mut Self::Tx, order_id: OrderId) -> Result<u64, StoreError> {
        match tx.state.orders.get_mut(&order_id) {
            Some(order) => Ok(order.expire(Utc::now()).map_or(0, |()| 1)),
            None => Ok(0),
        }
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        let state = self.state.lock().await;
        let mut due: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.is_due_for_expiry(now))
            .cloned()
            .collect();
        due.sort_by_key(|o| (o.expired_at, o.id));
        Ok(due)
    }

    async fn details_of(&self, order_id: OrderId) -> Result<Vec<OrderDetail>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .details
            .values()
            .filter(|d| d.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn find(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.state.lock().await.orders.get(&order_id).cloned())
    }
}
