//! Stock adjustment coordinator (warehouse service).
//!
//! Applies a batch of signed deltas as one all-or-nothing transaction:
//!
//! 1. validate the batch shape
//! 2. every referenced warehouse must exist
//! 3. every delta must fit the current snapshot (early rejection only)
//! 4. apply each delta in order inside one transaction; the first error or
//!    guarded write that affects no row rolls the whole batch back
//! 5. commit
//!
//! Transfers are composed from the same batch, so they are never observable
//! half-applied.

use tracing::{Span, error, info, instrument, warn};

use stockflow_core::{DomainError, ProductId, RequestValidator, distinct};
use stockflow_inventory::{
    ActiveStockView, CreateStockRowRequest, CreateWarehouseRequest, LedgerOp, StockAdjustment,
    StockAdjustmentRequest, TransferRequest, Warehouse, WarehouseActivationRequest,
    WarehouseStock, ensure_warehouses_exist, plan_adjustment, referenced_products,
    referenced_warehouses,
};

use crate::error::ServiceError;
use crate::ledger::{StockLedger, WarehouseDirectory};

/// Warehouse-side application service.
#[derive(Debug, Clone)]
pub struct StockAdjustmentCoordinator<S> {
    store: S,
    validator: RequestValidator,
}

impl<S> StockAdjustmentCoordinator<S>
where
    S: StockLedger + WarehouseDirectory,
{
    pub fn new(store: S, validator: RequestValidator) -> Self {
        Self { store, validator }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply a batch of signed deltas atomically.
    #[instrument(skip(self, request), fields(deltas = request.warehouse_stocks.len()), err)]
    pub async fn adjust(&self, request: &StockAdjustmentRequest) -> Result<(), ServiceError> {
        self.validator.check(request)?;
        self.apply(&request.warehouse_stocks).await
    }

    /// Move stock between two warehouses: for each product a decrement at the
    /// origin and an equal increment at the destination, in one batch.
    #[instrument(
        skip(self, request),
        fields(
            origin = %request.original_warehouse_id,
            destination = %request.destination_warehouse_id,
            products = request.products.len()
        ),
        err
    )]
    pub async fn transfer(&self, request: &TransferRequest) -> Result<(), ServiceError> {
        self.validator.check(request)?;
        self.apply(&request.to_adjustments()).await
    }

    async fn apply(&self, adjustments: &[StockAdjustment]) -> Result<(), ServiceError> {
        let warehouse_ids = referenced_warehouses(adjustments);
        let found = self.store.list_by_ids(&warehouse_ids).await?;
        ensure_warehouses_exist(&warehouse_ids, &found)?;

        let snapshot = self
            .store
            .snapshot(&warehouse_ids, &referenced_products(adjustments))
            .await?;
        let ops = plan_adjustment(adjustments, &snapshot)?;

        let mut tx = self.store.begin().await?;
        for (idx, op) in ops.iter().enumerate() {
            let applied = match *op {
                LedgerOp::Increase { key, amount } => {
                    self.store.increase(key, amount, Some(&mut tx)).await
                }
                LedgerOp::Decrease { key, amount } => {
                    self.store.decrease(key, amount, Some(&mut tx)).await
                }
            };

            match applied {
                Ok(affected) if affected > 0 => {}
                Ok(_) => {
                    warn!(index = idx, key = %op.key(), delta = op.delta(), "guarded stock update affected no row");
                    self.abandon(tx).await;
                    return Err(DomainError::AdjustmentFailed.into());
                }
                Err(e) => {
                    warn!(index = idx, key = %op.key(), error = %e, "stock update failed");
                    self.abandon(tx).await;
                    return Err(DomainError::AdjustmentFailed.into());
                }
            }
        }

        self.store.commit(tx).await?;
        info!(ops = ops.len(), "stock adjustment committed");
        Ok(())
    }

    async fn abandon(&self, tx: S::Tx) {
        if let Err(e) = self.store.rollback(tx).await {
            error!(error = %e, "failed to roll back stock adjustment");
        }
    }

    /// Active-warehouse stock for the given products, with the warehouses the
    /// rows belong to.
    #[instrument(
        skip(self, product_ids),
        fields(products = product_ids.len(), rows = tracing::field::Empty),
        err
    )]
    pub async fn active_stock(&self, product_ids: &[ProductId]) -> Result<ActiveStockView, ServiceError> {
        let product_ids = distinct(product_ids.iter().copied());
        if product_ids.is_empty() {
            return Ok(ActiveStockView::default());
        }

        let warehouse_stocks = self.store.snapshot_active(&product_ids).await?;
        Span::current().record("rows", warehouse_stocks.len());

        let warehouse_ids = distinct(warehouse_stocks.iter().map(|s| s.warehouse_id));
        let warehouses = if warehouse_ids.is_empty() {
            Vec::new()
        } else {
            self.store.list_by_ids(&warehouse_ids).await?
        };

        Ok(ActiveStockView {
            warehouses,
            warehouse_stocks,
        })
    }

    /// Create the ledger row for a (warehouse, product) pair.
    #[instrument(skip(self), err)]
    pub async fn create_stock_row(
        &self,
        request: &CreateStockRowRequest,
    ) -> Result<WarehouseStock, ServiceError> {
        self.validator.check(request)?;

        let found = self.store.list_by_ids(&[request.warehouse_id]).await?;
        ensure_warehouses_exist(&[request.warehouse_id], &found)?;

        let row = self.store.create_row(request.key(), request.stock).await?;
        Ok(row)
    }

    #[instrument(skip(self), err)]
    pub async fn create_warehouse(
        &self,
        request: &CreateWarehouseRequest,
    ) -> Result<Warehouse, ServiceError> {
        self.validator.check(request)?;
        let warehouse = self
            .store
            .create_warehouse(request.shop_id, request.name.trim())
            .await?;
        Ok(warehouse)
    }

    /// Flip a warehouse's active flag. Deactivated warehouses drop out of
    /// [`Self::active_stock`] immediately.
    #[instrument(skip(self), err)]
    pub async fn set_warehouse_active(
        &self,
        request: &WarehouseActivationRequest,
    ) -> Result<(), ServiceError> {
        self.validator.check(request)?;
        match self
            .store
            .set_active(request.warehouse_id, request.active)
            .await
        {
            Ok(0) => Err(DomainError::WarehouseNotFound.into()),
            Ok(_) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryInventoryStore;
    use stockflow_core::{ShopId, WarehouseId};
    use stockflow_inventory::{StockKey, TransferProduct};

    const P1: ProductId = ProductId::new(1);
    const P2: ProductId = ProductId::new(2);

    struct Fixture {
        coordinator: StockAdjustmentCoordinator<InMemoryInventoryStore>,
        w1: WarehouseId,
        w2: WarehouseId,
    }

    async fn fixture() -> Fixture {
        let coordinator =
            StockAdjustmentCoordinator::new(InMemoryInventoryStore::new(), RequestValidator::new());
        let w1 = coordinator
            .create_warehouse(&CreateWarehouseRequest {
                shop_id: ShopId::new(1),
                name: "north".into(),
            })
            .await
            .unwrap()
            .id;
        let w2 = coordinator
            .create_warehouse(&CreateWarehouseRequest {
                shop_id: ShopId::new(1),
                name: "south".into(),
            })
            .await
            .unwrap()
            .id;

        for (w, p, qty) in [(w1, P1, 10), (w1, P2, 5), (w2, P1, 0)] {
            coordinator
                .create_stock_row(&CreateStockRowRequest {
                    warehouse_id: w,
                    product_id: p,
                    stock: qty,
                })
                .await
                .unwrap();
        }

        Fixture { coordinator, w1, w2 }
    }

    impl Fixture {
        async fn stock(&self, w: WarehouseId, p: ProductId) -> i64 {
            self.coordinator
                .store()
                .stock_of(StockKey::new(w, p))
                .await
                .unwrap()
        }

        async fn adjust(&self, deltas: &[(WarehouseId, ProductId, i64)]) -> Result<(), ServiceError> {
            let request = StockAdjustmentRequest::new(
                deltas
                    .iter()
                    .map(|&(w, p, s)| StockAdjustment::new(w, p, s))
                    .collect(),
            );
            self.coordinator.adjust(&request).await
        }

        async fn transfer(&self, from: WarehouseId, to: WarehouseId, p: ProductId, qty: i64) -> Result<(), ServiceError> {
            self.coordinator
                .transfer(&TransferRequest {
                    original_warehouse_id: from,
                    destination_warehouse_id: to,
                    products: vec![TransferProduct {
                        product_id: p,
                        stock: qty,
                    }],
                })
                .await
        }
    }

    #[tokio::test]
    async fn applies_mixed_batch() {
        let f = fixture().await;
        f.adjust(&[(f.w1, P1, -4), (f.w1, P2, 3)]).await.unwrap();
        assert_eq!(f.stock(f.w1, P1).await, 6);
        assert_eq!(f.stock(f.w1, P2).await, 8);
    }

    #[tokio::test]
    async fn unknown_warehouse_is_rejected_before_anything_else() {
        let f = fixture().await;
        let err = f
            .adjust(&[(WarehouseId::new(99), P1, -100)])
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::WarehouseNotFound));
    }

    #[tokio::test]
    async fn snapshot_rejections() {
        let f = fixture().await;

        let err = f.adjust(&[(f.w2, P2, 1)]).await.unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::StockRowNotFound));

        let err = f.adjust(&[(f.w1, P1, -11)]).await.unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::OutOfStock));
        assert_eq!(f.stock(f.w1, P1).await, 10);
    }

    #[tokio::test]
    async fn invalid_batches_never_reach_the_store() {
        let f = fixture().await;
        let err = f.adjust(&[]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidRequest(_))));
        let err = f.adjust(&[(f.w1, P1, 0)]).await.unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn lost_guard_rolls_back_whole_batch() {
        let f = fixture().await;
        // Each entry passes the snapshot check on its own; the second guarded
        // decrement finds only 4 left.
        let err = f
            .adjust(&[(f.w1, P2, 2), (f.w1, P1, -6), (f.w1, P1, -6)])
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::AdjustmentFailed));
        assert_eq!(f.stock(f.w1, P1).await, 10);
        assert_eq!(f.stock(f.w1, P2).await, 5);
    }

    #[tokio::test]
    async fn transfer_round_trip_restores_both_sides() {
        let f = fixture().await;

        f.transfer(f.w1, f.w2, P1, 5).await.unwrap();
        assert_eq!(f.stock(f.w1, P1).await, 5);
        assert_eq!(f.stock(f.w2, P1).await, 5);

        f.transfer(f.w2, f.w1, P1, 5).await.unwrap();
        assert_eq!(f.stock(f.w1, P1).await, 10);
        assert_eq!(f.stock(f.w2, P1).await, 0);
    }

    #[tokio::test]
    async fn transfer_needs_a_destination_row() {
        let f = fixture().await;
        let err = f.transfer(f.w1, f.w2, P2, 1).await.unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::StockRowNotFound));
        assert_eq!(f.stock(f.w1, P2).await, 5);
    }

    #[tokio::test]
    async fn duplicate_row_and_unknown_warehouse_on_create() {
        let f = fixture().await;
        let err = f
            .coordinator
            .create_stock_row(&CreateStockRowRequest {
                warehouse_id: f.w1,
                product_id: P1,
                stock: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), stockflow_core::codes::WAREHOUSE_STOCK_DUPLICATED);

        let err = f
            .coordinator
            .create_stock_row(&CreateStockRowRequest {
                warehouse_id: WarehouseId::new(77),
                product_id: P1,
                stock: 1,
            })
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::WarehouseNotFound));

        let err = f
            .coordinator
            .create_stock_row(&CreateStockRowRequest {
                warehouse_id: f.w2,
                product_id: P2,
                stock: -1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn deactivation_hides_stock_from_active_view() {
        let f = fixture().await;

        let view = f.coordinator.active_stock(&[P1, P1]).await.unwrap();
        assert_eq!(view.warehouse_stocks.len(), 2);
        assert_eq!(view.warehouses.len(), 2);

        f.coordinator
            .set_warehouse_active(&WarehouseActivationRequest {
                warehouse_id: f.w2,
                active: false,
            })
            .await
            .unwrap();

        let view = f.coordinator.active_stock(&[P1]).await.unwrap();
        assert_eq!(view.warehouse_stocks.len(), 1);
        assert_eq!(view.warehouses[0].id, f.w1);

        // Adjustments still reach rows of inactive warehouses.
        f.adjust(&[(f.w2, P1, 2)]).await.unwrap();
        assert_eq!(f.stock(f.w2, P1).await, 2);
    }

    #[tokio::test]
    async fn activating_unknown_warehouse_is_not_found() {
        let f = fixture().await;
        let err = f
            .coordinator
            .set_warehouse_active(&WarehouseActivationRequest {
                warehouse_id: WarehouseId::new(500),
                active: true,
            })
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::WarehouseNotFound));
    }
}
