//! `stockflow-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! numeric identifiers, the business error taxonomy and request validation.

pub mod entity;
pub mod error;
pub mod id;
pub mod validate;

pub use entity::{Entity, index_by_id};
pub use error::{DomainError, DomainResult, ErrorKind, codes};
pub use id::{
    OrderDetailId, OrderId, ProductId, ShopId, UserId, WarehouseId, WarehouseStockId, distinct,
    parse_id_list,
};
pub use validate::{RequestValidator, Validate};
