//! Warehouse-side storage: the stock ledger and the warehouse directory.
//!
//! Both traits are implemented by a single store per backend so that the
//! coordinator can check warehouses and mutate stock against the same
//! database.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;
pub use r#trait::{StockLedger, WarehouseDirectory};
