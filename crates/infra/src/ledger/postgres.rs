//! Postgres-backed warehouse store.
//!
//! The guarded decrement is a single `UPDATE ... WHERE stock >= $1`; Postgres
//! row locking makes it atomic against concurrent decrements of the same row,
//! and the `CHECK (stock >= 0)` constraint backs it up.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{Span, instrument};

use stockflow_core::{ProductId, ShopId, WarehouseId, WarehouseStockId};
use stockflow_inventory::{StockKey, Warehouse, WarehouseStock};

use super::r#trait::{StockLedger, WarehouseDirectory};
use crate::db::map_sqlx_error;
use crate::error::StoreError;

#[derive(Debug, FromRow)]
struct WarehouseRow {
    id: i64,
    shop_id: i64,
    name: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WarehouseRow> for Warehouse {
    fn from(row: WarehouseRow) -> Self {
        Warehouse {
            id: WarehouseId::new(row.id),
            shop_id: ShopId::new(row.shop_id),
            name: row.name,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct WarehouseStockRow {
    id: i64,
    warehouse_id: i64,
    product_id: i64,
    stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WarehouseStockRow> for WarehouseStock {
    fn from(row: WarehouseStockRow) -> Self {
        WarehouseStock {
            id: WarehouseStockId::new(row.id),
            warehouse_id: WarehouseId::new(row.warehouse_id),
            product_id: ProductId::new(row.product_id),
            stock: row.stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn raw_ids<T: Copy + Into<i64>>(ids: &[T]) -> Vec<i64> {
    ids.iter().map(|&id| id.into()).collect()
}

/// Warehouse store over a Postgres pool. `Clone` shares the pool.
#[derive(Debug, Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StockLedger for PostgresInventoryStore {
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

    #[instrument(
        skip(self),
        fields(warehouse_id = %key.warehouse_id, product_id = %key.product_id),
        err
    )]
    async fn create_row(&self, key: StockKey, initial: i64) -> Result<WarehouseStock, StoreError> {
        let row = sqlx::query_as::<_, WarehouseStockRow>(
            r#"
            INSERT INTO warehouse_stocks (warehouse_id, product_id, stock)
            VALUES ($1, $2, $3)
            RETURNING id, warehouse_id, product_id, stock, created_at, updated_at
            "#,
        )
        .bind(key.warehouse_id.get())
        .bind(key.product_id.get())
        .bind(initial)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_sqlx_error("create_row", e) {
            StoreError::Conflict(_) => {
                StoreError::Conflict(format!("stock row already exists for {key}"))
            }
            other => other,
        })?;

        Ok(row.into())
    }

    #[instrument(
        skip(self, tx),
        fields(
            warehouse_id = %key.warehouse_id,
            product_id = %key.product_id,
            in_tx = tx.is_some(),
            rows_affected = tracing::field::Empty
        ),
        err
    )]
    async fn increase(
        &self,
        key: StockKey,
        amount: i64,
        tx: Option<&mut Self::Tx>,
    ) -> Result<u64, StoreError> {
        let query = sqlx::query(
            r#"
            UPDATE warehouse_stocks
            SET stock = stock + $1, updated_at = NOW()
            WHERE warehouse_id = $2 AND product_id = $3
            "#,
        )
        .bind(amount)
        .bind(key.warehouse_id.get())
        .bind(key.product_id.get());

        let result = match tx {
            Some(tx) => query.execute(&mut **tx).await,
            None => query.execute(&self.pool).await,
        }
        .map_err(|e| map_sqlx_error("increase_stock", e))?;

        Span::current().record("rows_affected", result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(
        skip(self, tx),
        fields(
            warehouse_id = %key.warehouse_id,
            product_id = %key.product_id,
            in_tx = tx.is_some(),
            rows_affected = tracing::field::Empty
        ),
        err
    )]
    async fn decrease(
        &self,
        key: StockKey,
        amount: i64,
        tx: Option<&mut Self::Tx>,
    ) -> Result<u64, StoreError> {
        let query = sqlx::query(
            r#"
            UPDATE warehouse_stocks
            SET stock = stock - $1, updated_at = NOW()
            WHERE warehouse_id = $2 AND product_id = $3 AND stock >= $1
            "#,
        )
        .bind(amount)
        .bind(key.warehouse_id.get())
        .bind(key.product_id.get());

        let result = match tx {
            Some(tx) => query.execute(&mut **tx).await,
            None => query.execute(&self.pool).await,
        }
        .map_err(|e| map_sqlx_error("decrease_stock", e))?;

        Span::current().record("rows_affected", result.rows_affected());
        Ok(result.rows_affected())
    }

    #[instrument(
        skip(self),
        fields(warehouse_count = warehouse_ids.len(), product_count = product_ids.len()),
        err
    )]
    async fn snapshot(
        &self,
        warehouse_ids: &[WarehouseId],
        product_ids: &[ProductId],
    ) -> Result<Vec<WarehouseStock>, StoreError> {
        let rows = sqlx::query_as::<_, WarehouseStockRow>(
            r#"
            SELECT id, warehouse_id, product_id, stock, created_at, updated_at
            FROM warehouse_stocks
            WHERE warehouse_id = ANY($1) AND product_id = ANY($2)
            "#,
        )
        .bind(raw_ids(warehouse_ids))
        .bind(raw_ids(product_ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("snapshot", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(product_count = product_ids.len()), err)]
    async fn snapshot_active(&self, product_ids: &[ProductId]) -> Result<Vec<WarehouseStock>, StoreError> {
        let rows = sqlx::query_as::<_, WarehouseStockRow>(
            r#"
            SELECT ws.id, ws.warehouse_id, ws.product_id, ws.stock, ws.created_at, ws.updated_at
            FROM warehouse_stocks ws
            JOIN warehouses w ON w.id = ws.warehouse_id
            WHERE w.active AND ws.product_id = ANY($1)
            ORDER BY ws.id
            "#,
        )
        .bind(raw_ids(product_ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("snapshot_active", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl WarehouseDirectory for PostgresInventoryStore {
    #[instrument(skip(self), fields(shop_id = %shop_id), err)]
    async fn create_warehouse(&self, shop_id: ShopId, name: &str) -> Result<Warehouse, StoreError> {
        let row = sqlx::query_as::<_, WarehouseRow>(
            r#"
            INSERT INTO warehouses (shop_id, name, active)
            VALUES ($1, $2, TRUE)
            RETURNING id, shop_id, name, active, created_at, updated_at
            "#,
        )
        .bind(shop_id.get())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_warehouse", e))?;

        Ok(row.into())
    }

    #[instrument(skip(self), fields(warehouse_count = ids.len()), err)]
    async fn list_by_ids(&self, ids: &[WarehouseId]) -> Result<Vec<Warehouse>, StoreError> {
        let rows = sqlx::query_as::<_, WarehouseRow>(
            r#"
            SELECT id, shop_id, name, active, created_at, updated_at
            FROM warehouses
            WHERE id = ANY($1)
            "#,
        )
        .bind(raw_ids(ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_warehouses", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(warehouse_id = %id), err)]
    async fn set_active(&self, id: WarehouseId, active: bool) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE warehouses
            SET active = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(active)
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_active", e))?;

        Ok(result.rows_affected())
    }
}
