//! End-to-end tests for the reservation saga.
//!
//! Checkout → warehouse coordinator → ledger, and expiry → release, with the
//! in-memory stores and the in-process warehouse gateway.
//!
//! Verifies:
//! - A checkout reserves exactly the requested stock and nothing on rejection
//! - Expiry releases the reservation once, even across repeated passes
//! - A failing order does not stop the reconciler from expiring the others
//! - Stale snapshots are caught by the warehouse, not the order service

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use rust_decimal_macros::dec;

    use stockflow_core::{DomainError, OrderId, ProductId, RequestValidator, ShopId, UserId, WarehouseId};
    use stockflow_inventory::{
        CreateStockRowRequest, CreateWarehouseRequest, StockAdjustment, StockKey,
    };
    use stockflow_orders::{
        ActiveStock, CreateOrderProduct, CreateOrderRequest, NewOrder, NewOrderDetail, Order,
        OrderDetail, OrderState, Product,
    };

    use crate::checkout::OrderCreationOrchestrator;
    use crate::coordinator::StockAdjustmentCoordinator;
    use crate::error::{GatewayError, ServiceError, StoreError};
    use crate::expiration::{ExpirationReconciler, ReconciliationReport};
    use crate::gateway::{InMemoryProductCatalog, LocalWarehouseGateway, WarehouseGateway};
    use crate::ledger::InMemoryInventoryStore;
    use crate::order_store::{InMemoryOrderStore, OrderStore};

    const S1: ShopId = ShopId::new(1);
    const P1: ProductId = ProductId::new(1);
    const P2: ProductId = ProductId::new(2);
    const BUYER: UserId = UserId::new(42);

    type Gateway = LocalWarehouseGateway<InMemoryInventoryStore>;

    struct World {
        inventory: InMemoryInventoryStore,
        warehouse: Gateway,
        orders: InMemoryOrderStore,
        catalog: InMemoryProductCatalog,
        w1: WarehouseId,
    }

    impl World {
        /// W1 (shop S1) holds 10 × P1 and 10 × P2.
        async fn new() -> Self {
            let inventory = InMemoryInventoryStore::new();
            let coordinator = Arc::new(StockAdjustmentCoordinator::new(
                inventory.clone(),
                RequestValidator::new(),
            ));
            let w1 = coordinator
                .create_warehouse(&CreateWarehouseRequest {
                    shop_id: S1,
                    name: "W1".into(),
                })
                .await
                .unwrap()
                .id;
            for product_id in [P1, P2] {
                coordinator
                    .create_stock_row(&CreateStockRowRequest {
                        warehouse_id: w1,
                        product_id,
                        stock: 10,
                    })
                    .await
                    .unwrap();
            }

            let catalog = InMemoryProductCatalog::new(vec![
                Product {
                    id: P1,
                    name: "P1".into(),
                    price: dec!(3.25),
                },
                Product {
                    id: P2,
                    name: "P2".into(),
                    price: dec!(10),
                },
            ]);

            Self {
                inventory,
                warehouse: LocalWarehouseGateway::new(coordinator),
                orders: InMemoryOrderStore::new(),
                catalog,
                w1,
            }
        }

        fn orchestrator(&self) -> OrderCreationOrchestrator<InMemoryOrderStore, InMemoryProductCatalog, Gateway> {
            self.orchestrator_with(self.warehouse.clone())
        }

        fn orchestrator_with<W: WarehouseGateway>(
            &self,
            warehouse: W,
        ) -> OrderCreationOrchestrator<InMemoryOrderStore, InMemoryProductCatalog, W> {
            OrderCreationOrchestrator::new(
                self.orders.clone(),
                self.catalog.clone(),
                warehouse,
                RequestValidator::new(),
                Duration::minutes(15),
            )
        }

        fn reconciler(&self) -> ExpirationReconciler<InMemoryOrderStore, Gateway> {
            ExpirationReconciler::new(self.orders.clone(), self.warehouse.clone())
        }

        async fn stock(&self, product_id: ProductId) -> i64 {
            self.inventory
                .stock_of(StockKey::new(self.w1, product_id))
                .await
                .unwrap()
        }

        fn request(&self, lines: &[(ProductId, i64)]) -> CreateOrderRequest {
            CreateOrderRequest {
                shop_id: S1,
                products: lines
                    .iter()
                    .map(|&(product_id, stock)| CreateOrderProduct {
                        product_id,
                        warehouse_id: self.w1,
                        stock,
                    })
                    .collect(),
            }
        }
    }

    fn after_expiry() -> DateTime<Utc> {
        Utc::now() + Duration::minutes(16)
    }

    #[tokio::test]
    async fn checkout_reserves_and_insufficient_stock_leaves_no_trace() {
        let world = World::new().await;
        let svc = world.orchestrator();

        let placed = svc.checkout(BUYER, &world.request(&[(P1, 4)])).await.unwrap();
        assert_eq!(placed.order.total_stock, 4);
        assert_eq!(placed.order.total_price, dec!(13.00));
        assert_eq!(placed.order.state, OrderState::Created);
        assert_eq!(world.stock(P1).await, 6);

        let err = svc.checkout(BUYER, &world.request(&[(P1, 8)])).await.unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::InsufficientStock));
        assert_eq!(world.orders.order_count().await, 1);
        assert_eq!(world.stock(P1).await, 6);
    }

    #[tokio::test]
    async fn expiry_releases_the_reservation_exactly_once() {
        let world = World::new().await;
        let placed = world
            .orchestrator()
            .checkout(BUYER, &world.request(&[(P1, 4), (P2, 1)]))
            .await
            .unwrap();
        assert_eq!(world.stock(P1).await, 6);
        assert_eq!(world.stock(P2).await, 9);

        let reconciler = world.reconciler();
        let report = reconciler.run_at(after_expiry()).await.unwrap();
        assert_eq!(
            report,
            ReconciliationReport {
                scanned: 1,
                expired: 1,
                failed: 0
            }
        );

        let order = world.orders.find(placed.order.id).await.unwrap().unwrap();
        assert_eq!(order.state, OrderState::Expired);
        assert_eq!(world.stock(P1).await, 10);
        assert_eq!(world.stock(P2).await, 10);

        let second = reconciler.run_at(after_expiry()).await.unwrap();
        assert_eq!(second, ReconciliationReport::default());
        assert_eq!(world.stock(P1).await, 10);
    }

    #[tokio::test]
    async fn orders_inside_their_window_are_not_released() {
        let world = World::new().await;
        world
            .orchestrator()
            .checkout(BUYER, &world.request(&[(P1, 2)]))
            .await
            .unwrap();

        let report = world.reconciler().run_at(Utc::now()).await.unwrap();
        assert_eq!(report.scanned, 0);
        assert_eq!(world.stock(P1).await, 8);
    }

    /// Fails any adjustment touching P2 while `p2_down` is set.
    struct SelectiveOutage {
        inner: Gateway,
        p2_down: AtomicBool,
    }

    #[async_trait]
    impl WarehouseGateway for SelectiveOutage {
        async fn active_stock(&self, ids: &[ProductId]) -> Result<Vec<ActiveStock>, GatewayError> {
            self.inner.active_stock(ids).await
        }

        async fn adjust(&self, adjustments: &[StockAdjustment]) -> Result<(), GatewayError> {
            if self.p2_down.load(Ordering::SeqCst) && adjustments.iter().any(|a| a.product_id == P2) {
                return Err(GatewayError::Transport("connection refused".into()));
            }
            self.inner.adjust(adjustments).await
        }
    }

    #[tokio::test]
    async fn one_failing_order_does_not_block_the_others() {
        let world = World::new().await;
        let svc = world.orchestrator();
        let a = svc.checkout(BUYER, &world.request(&[(P1, 3)])).await.unwrap();
        let b = svc.checkout(BUYER, &world.request(&[(P2, 5)])).await.unwrap();
        let c = svc.checkout(BUYER, &world.request(&[(P1, 1)])).await.unwrap();

        let outage = Arc::new(SelectiveOutage {
            inner: world.warehouse.clone(),
            p2_down: AtomicBool::new(true),
        });
        let reconciler = ExpirationReconciler::new(world.orders.clone(), outage.clone());

        let report = reconciler.run_at(after_expiry()).await.unwrap();
        assert_eq!(
            report,
            ReconciliationReport {
                scanned: 3,
                expired: 2,
                failed: 1
            }
        );
        for (order, expected) in [
            (&a, OrderState::Expired),
            (&b, OrderState::Created),
            (&c, OrderState::Expired),
        ] {
            let stored = world.orders.find(order.order.id).await.unwrap().unwrap();
            assert_eq!(stored.state, expected);
        }
        assert_eq!(world.stock(P1).await, 10);
        assert_eq!(world.stock(P2).await, 5);

        outage.p2_down.store(false, Ordering::SeqCst);
        let retry = reconciler.run_at(after_expiry()).await.unwrap();
        assert_eq!(retry.expired, 1);
        assert_eq!(world.stock(P2).await, 10);
    }

    /// Answers the active-stock query, then lets a competing buyer drain the
    /// row before the reservation arrives.
    struct CompetingBuyer {
        inner: Gateway,
        w1: WarehouseId,
    }

    #[async_trait]
    impl WarehouseGateway for CompetingBuyer {
        async fn active_stock(&self, ids: &[ProductId]) -> Result<Vec<ActiveStock>, GatewayError> {
            let snapshot = self.inner.active_stock(ids).await?;
            self.inner
                .adjust(&[StockAdjustment::new(self.w1, P1, -9)])
                .await?;
            Ok(snapshot)
        }

        async fn adjust(&self, adjustments: &[StockAdjustment]) -> Result<(), GatewayError> {
            self.inner.adjust(adjustments).await
        }
    }

    #[tokio::test]
    async fn stale_snapshot_is_rejected_by_the_warehouse() {
        let world = World::new().await;
        let svc = world.orchestrator_with(CompetingBuyer {
            inner: world.warehouse.clone(),
            w1: world.w1,
        });

        let err = svc.checkout(BUYER, &world.request(&[(P1, 4)])).await.unwrap_err();
        assert_eq!(err.as_domain(), Some(&DomainError::OutOfStock));
        assert_eq!(world.orders.order_count().await, 0);
        assert_eq!(world.stock(P1).await, 1);
    }

    /// Order store whose commit always fails after rolling back.
    #[derive(Clone)]
    struct CommitFails(InMemoryOrderStore);

    #[async_trait]
    impl OrderStore for CommitFails {
        type Tx = <InMemoryOrderStore as OrderStore>::Tx;

        async fn begin(&self) -> Result<Self::Tx, StoreError> {
            self.0.begin().await
        }

        async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
            self.0.rollback(tx).await?;
            Err(StoreError::Backend("connection reset".into()))
        }

        async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError> {
            self.0.rollback(tx).await
        }

        async fn insert_order(&self, tx: &mut Self::Tx, order: &NewOrder) -> Result<Order, StoreError> {
            self.0.insert_order(tx, order).await
        }

        async fn insert_detail(
            &self,
            tx: &mut Self::Tx,
            order_id: OrderId,
            detail: &NewOrderDetail,
        ) -> Result<OrderDetail, StoreError> {
            self.0.insert_detail(tx, order_id, detail).await
        }

        async fn mark_expired(
            &self,
            tx: &mut Self::Tx,
            order_id: OrderId,
        ) -> Result<u64, StoreError> {
            self.0.mark_expired(tx, order_id).await
        }

        async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<Order>, StoreError> {
            self.0.list_expired(now).await
        }

        async fn details_of(&self, order_id: OrderId) -> Result<Vec<OrderDetail>, StoreError> {
            self.0.details_of(order_id).await
        }

        async fn find(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
            self.0.find(order_id).await
        }
    }

    #[tokio::test]
    async fn commit_failure_after_reservation_orphans_the_stock() {
        let world = World::new().await;
        let svc = OrderCreationOrchestrator::new(
            CommitFails(world.orders.clone()),
            world.catalog.clone(),
            world.warehouse.clone(),
            RequestValidator::new(),
            Duration::minutes(15),
        );

        let err = svc.checkout(BUYER, &world.request(&[(P1, 4)])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Backend(_))));
        assert_eq!(world.orders.order_count().await, 0);
        // Nothing compensates: the reservation stays applied.
        assert_eq!(world.stock(P1).await, 6);
    }

    #[tokio::test]
    async fn concurrent_checkouts_never_oversell() {
        let world = World::new().await;
        let svc = Arc::new(world.orchestrator());

        let mut handles = Vec::new();
        for _ in 0..6 {
            let svc = svc.clone();
            let request = world.request(&[(P1, 3)]);
            handles.push(tokio::spawn(async move { svc.checkout(BUYER, &request).await }));
        }

        let mut placed = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                placed += 1;
            }
        }

        assert_eq!(placed, 3);
        assert_eq!(world.orders.order_count().await, 3);
        assert_eq!(world.stock(P1).await, 1);
    }

    #[tokio::test]
    async fn manual_adjustment_and_checkout_share_the_ledger() {
        let world = World::new().await;
        world
            .warehouse
            .adjust(&[StockAdjustment::new(world.w1, P1, 5)])
            .await
            .unwrap();
        assert_eq!(world.stock(P1).await, 15);

        world
            .orchestrator()
            .checkout(BUYER, &world.request(&[(P1, 15)]))
            .await
            .unwrap();
        assert_eq!(world.stock(P1).await, 0);
    }
}
