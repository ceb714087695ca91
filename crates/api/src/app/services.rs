use std::sync::Arc;

use sqlx::PgPool;

use stockflow_core::{OrderId, ProductId, RequestValidator, UserId};
use stockflow_infra::{
    GatewayError, OrderCreationOrchestrator, OrderServiceConfig, ServiceError,
    StockAdjustmentCoordinator,
    gateway::{ProductCatalog, ServiceClient, WarehouseGateway},
    ledger::{InMemoryInventoryStore, PostgresInventoryStore},
    order_store::{InMemoryOrderStore, PostgresOrderStore},
};
use stockflow_inventory::{
    ActiveStockView, CreateStockRowRequest, CreateWarehouseRequest, StockAdjustmentRequest,
    TransferRequest, Warehouse, WarehouseActivationRequest, WarehouseStock,
};
use stockflow_orders::{CreateOrderRequest, OrderWithDetails};

/// Warehouse service backends.
#[derive(Clone)]
pub enum WarehouseServices {
    /// Dev/test wiring.
    InMemory(Arc<StockAdjustmentCoordinator<InMemoryInventoryStore>>),
    Postgres(Arc<StockAdjustmentCoordinator<PostgresInventoryStore>>),
}

macro_rules! with_coordinator {
    ($services:expr, $c:ident => $body:expr) => {
        match $services {
            WarehouseServices::InMemory($c) => $body,
            WarehouseServices::Postgres($c) => $body,
        }
    };
}

impl WarehouseServices {
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(StockAdjustmentCoordinator::new(
            InMemoryInventoryStore::new(),
            RequestValidator::new(),
        )))
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::Postgres(Arc::new(StockAdjustmentCoordinator::new(
            PostgresInventoryStore::new(pool),
            RequestValidator::new(),
        )))
    }

    pub async fn adjust(&self, request: &StockAdjustmentRequest) -> Result<(), ServiceError> {
        with_coordinator!(self, c => c.adjust(request).await)
    }

    pub async fn transfer(&self, request: &TransferRequest) -> Result<(), ServiceError> {
        with_coordinator!(self, c => c.transfer(request).await)
    }

    pub async fn active_stock(&self, product_ids: &[ProductId]) -> Result<ActiveStockView, ServiceError> {
        with_coordinator!(self, c => c.active_stock(product_ids).await)
    }

    pub async fn create_warehouse(
        &self,
        request: &CreateWarehouseRequest,
    ) -> Result<Warehouse, ServiceError> {
        with_coordinator!(self, c => c.create_warehouse(request).await)
    }

    pub async fn create_stock_row(
        &self,
        request: &CreateStockRowRequest,
    ) -> Result<WarehouseStock, ServiceError> {
        with_coordinator!(self, c => c.create_stock_row(request).await)
    }

    pub async fn set_warehouse_active(
        &self,
        request: &WarehouseActivationRequest,
    ) -> Result<(), ServiceError> {
        with_coordinator!(self, c => c.set_warehouse_active(request).await)
    }
}

pub type DynProductCatalog = Arc<dyn ProductCatalog>;
pub type DynWarehouseGateway = Arc<dyn WarehouseGateway>;

type Orchestrator<O> = OrderCreationOrchestrator<O, DynProductCatalog, DynWarehouseGateway>;

/// Order service backends. Collaborators are type-erased so the same router
/// runs against HTTP or in-process gateways.
#[derive(Clone)]
pub enum OrderServices {
    /// Dev/test wiring.
    InMemory(Arc<Orchestrator<InMemoryOrderStore>>),
    Postgres(Arc<Orchestrator<PostgresOrderStore>>),
}

impl OrderServices {
    pub fn in_memory(
        products: DynProductCatalog,
        warehouse: DynWarehouseGateway,
        expiration: chrono::Duration,
    ) -> Self {
        Self::InMemory(Arc::new(OrderCreationOrchestrator::new(
            InMemoryOrderStore::new(),
            products,
            warehouse,
            RequestValidator::new(),
            expiration,
        )))
    }

    pub fn postgres(
        pool: PgPool,
        products: DynProductCatalog,
        warehouse: DynWarehouseGateway,
        expiration: chrono::Duration,
    ) -> Self {
        Self::Postgres(Arc::new(OrderCreationOrchestrator::new(
            PostgresOrderStore::new(pool),
            products,
            warehouse,
            RequestValidator::new(),
            expiration,
        )))
    }

    pub async fn checkout(
        &self,
        user_id: UserId,
        request: &CreateOrderRequest,
    ) -> Result<OrderWithDetails, ServiceError> {
        match self {
            OrderServices::InMemory(o) => o.checkout(user_id, request).await,
            OrderServices::Postgres(o) => o.checkout(user_id, request).await,
        }
    }

    pub async fn find_order(&self, order_id: OrderId) -> Result<OrderWithDetails, ServiceError> {
        match self {
            OrderServices::InMemory(o) => o.find_order(order_id).await,
            OrderServices::Postgres(o) => o.find_order(order_id).await,
        }
    }
}

/// Client for the warehouse service as configured for the order side.
pub fn warehouse_client(config: &OrderServiceConfig) -> Result<ServiceClient, GatewayError> {
    ServiceClient::new(
        "warehouse-service",
        config.warehouse_service.host.clone(),
        config.http_timeout,
        Some(config.warehouse_service.auth.clone()),
        config.retry_policy(),
    )
}

pub fn product_client(config: &OrderServiceConfig) -> Result<ServiceClient, GatewayError> {
    ServiceClient::new(
        "product-service",
        config.product_service.host.clone(),
        config.http_timeout,
        Some(config.product_service.auth.clone()),
        config.retry_policy(),
    )
}
