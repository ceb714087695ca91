//! Postgres-backed order store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::instrument;

use stockflow_core::{OrderDetailId, OrderId, ProductId, ShopId, UserId, WarehouseId};
use stockflow_orders::{NewOrder, NewOrderDetail, Order, OrderDetail, OrderState};

use super::r#trait::OrderStore;
use crate::db::map_sqlx_error;
use crate::error::StoreError;

const ORDER_COLUMNS: &str =
    "id, user_id, shop_id, state, total_stock, total_price, expired_at, created_at, updated_at";
const DETAIL_COLUMNS: &str =
    "id, order_id, product_id, warehouse_id, stock, price, created_at, updated_at";

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    shop_id: i64,
    state: i16,
    total_stock: i64,
    total_price: Decimal,
    expired_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let state = OrderState::try_from(row.state)
            .map_err(|e| StoreError::Backend(format!("order {}: {}", row.id, e)))?;
        Ok(Order {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            shop_id: ShopId::new(row.shop_id),
            state,
            total_stock: row.total_stock,
            total_price: row.total_price,
            expired_at: row.expired_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderDetailRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    warehouse_id: i64,
    stock: i64,
    price: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderDetailRow> for OrderDetail {
    fn from(row: OrderDetailRow) -> Self {
        OrderDetail {
            id: OrderDetailId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            warehouse_id: WarehouseId::new(row.warehouse_id),
            stock: row.stock,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    type Tx = Transaction<'static, Postgres>;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError> {
        tx.rollback().await.map_err(|e| map_sqlx_error("rollback", e))
    }

    #[instrument(skip(self, tx, order), fields(user_id = %order.user_id, shop_id = %order.shop_id), err)]
    async fn insert_order(&self, tx: &mut Self::Tx, order: &NewOrder) -> Result<Order, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO orders (user_id, shop_id, state, total_stock, total_price, expired_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order.user_id.get())
            .bind(order.shop_id.get())
            .bind(OrderState::Created.as_i16())
            .bind(order.total_stock)
            .bind(order.total_price)
            .bind(order.expired_at)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order", e))?;

        row.try_into()
    }

    #[instrument(skip(self, tx, detail), fields(order_id = %order_id), err)]
    async fn insert_detail(
        &self,
        tx: &mut Self::Tx,
        order_id: OrderId,
        detail: &NewOrderDetail,
    ) -> Result<OrderDetail, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO order_details (order_id, product_id, warehouse_id, stock, price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {DETAIL_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, OrderDetailRow>(&sql)
            .bind(order_id.get())
            .bind(detail.product_id.get())
            .bind(detail.warehouse_id.get())
            .bind(detail.stock)
            .bind(detail.price)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_detail", e))?;

        Ok(row.into())
    }

    #[instrument(skip(self, tx), fields(order_id = %order_id), err)]
    async fn mark_expired(&self, tx: &mut Self::Tx, order_id: OrderId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET state = $1, updated_at = NOW()
            WHERE id = $2 AND state = $3
            "#,
        )
        .bind(OrderState::Expired.as_i16())
        .bind(order_id.get())
        .bind(OrderState::Created.as_i16())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("mark_expired", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), err)]
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
        let sql = format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE state = $1 AND expired_at < $2
            ORDER BY expired_at, id
            "#
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(OrderState::Created.as_i16())
            .bind(now)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_expired", e))?;

        rows.into_iter().map(Order::try_from).collect()
    }

    #[instrument(skip(self), fields(order_id = %order_id), err)]
    async fn details_of(&self, order_id: OrderId) -> Result<Vec<OrderDetail>, StoreError> {
        let sql = format!("SELECT {DETAIL_COLUMNS} FROM order_details WHERE order_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, OrderDetailRow>(&sql)
            .bind(order_id.get())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_order_details", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(order_id = %order_id), err)]
    async fn find(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_order", e))?;

        row.map(Order::try_from).transpose()
    }
}
