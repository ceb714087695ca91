use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockflow_core::OrderId;
use stockflow_orders::{NewOrder, NewOrderDetail, Order, OrderDetail};

use crate::error::StoreError;

/// Persistence for orders and their details.
///
/// Writes always happen inside a transaction obtained from [`OrderStore::begin`];
/// reads do not take one.
#[async_trait]
pub trait OrderStore: Send + Sync {
    type Tx: Send;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Insert an order in the `Created` state.
    async fn insert_order(&self, tx: &mut Self::Tx, order: &NewOrder) -> Result<Order, StoreError>;

    async fn insert_detail(
        &self,
        tx: &mut Self::Tx,
        order_id: OrderId,
        detail: &NewOrderDetail,
    ) -> Result<OrderDetail, StoreError>;

    /// Flip `Created -> Expired`. Conditional on the current state, so an
    /// order that is already expired affects 0 rows.
    async fn mark_expired(&self, tx: &mut Self::Tx, order_id: OrderId) -> Result<u64, StoreError>;

    /// Orders still `Created` whose expiry is before `now`, oldest first.
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Order>, StoreError>;

    async fn details_of(&self, order_id: OrderId) -> Result<Vec<OrderDetail>, StoreError>;

    async fn find(&self, order_id: OrderId) -> Result<Option<Order>, StoreError>;
}
