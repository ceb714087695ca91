//! Infrastructure layer: storage, application services, outbound clients and
//! configuration.

pub mod checkout;
pub mod config;
pub mod coordinator;
pub mod cron;
pub mod db;
pub mod error;
pub mod expiration;
pub mod gateway;
pub mod ledger;
pub mod order_store;
pub mod retry;

mod integration_tests;

pub use checkout::OrderCreationOrchestrator;
pub use config::{ConfigError, OrderServiceConfig, ServiceEndpoint, WarehouseServiceConfig};
pub use coordinator::StockAdjustmentCoordinator;
pub use cron::CronRunner;
pub use error::{GatewayError, ServiceError, StoreError};
pub use expiration::{ExpirationReconciler, ReconciliationReport};
pub use retry::RetryPolicy;
