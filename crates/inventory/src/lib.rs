//! Warehouse domain module.
//!
//! This crate contains the business rules for the stock ledger, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage): the
//! ledger row and warehouse types, the plausibility check that precedes every
//! adjustment batch, and the composition of transfers from adjustments.

pub mod adjustment;
pub mod stock;
pub mod warehouse;

pub use adjustment::{
    LedgerOp, StockAdjustment, StockAdjustmentRequest, TransferProduct, TransferRequest,
    ensure_warehouses_exist, plan_adjustment, referenced_products, referenced_warehouses,
};
pub use stock::{ActiveStockView, CreateStockRowRequest, StockKey, WarehouseStock};
pub use warehouse::{CreateWarehouseRequest, Warehouse, WarehouseActivationRequest};
