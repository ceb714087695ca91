//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Coarse classification of a failure, used once at the service boundary to
/// pick a transport status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input. Never retried.
    InvalidRequest,
    /// A referenced product, warehouse or stock row does not exist.
    NotFound,
    /// Duplicate row or a conflicting concurrent write.
    Conflict,
    /// Business rejection the caller can act on (stock, shop mix).
    Rejected,
    /// A guarded ledger write affected no row (lost race or vanished row).
    AdjustmentFailed,
    /// Storage or network failure.
    Infrastructure,
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Storage and
/// transport failures belong to the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A request failed structural validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("product not found")]
    ProductNotFound,

    #[error("warehouse not found")]
    WarehouseNotFound,

    #[error("order not found")]
    OrderNotFound,

    /// No ledger row exists for a (warehouse, product) pair being adjusted.
    #[error("warehouse stock not found")]
    StockRowNotFound,

    /// No active-stock entry exists for a (product, warehouse) pair at checkout.
    #[error("product stock not found")]
    StockNotFound,

    /// Duplicate row or a conflict reported by the warehouse service.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A checkout mixes warehouses owned by different shops.
    #[error("order products come from more than one shop")]
    MultiShopViolation,

    /// Checkout snapshot holds less stock than requested.
    #[error("insufficient stock")]
    InsufficientStock,

    /// An adjustment would drive a ledger row below zero.
    #[error("out of stock")]
    OutOfStock,

    /// A guarded update affected no row; the whole batch was rolled back.
    #[error("stock adjustment failed due to a concurrent update")]
    AdjustmentFailed,
}

impl DomainError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            DomainError::ProductNotFound
            | DomainError::WarehouseNotFound
            | DomainError::OrderNotFound
            | DomainError::StockRowNotFound
            | DomainError::StockNotFound => ErrorKind::NotFound,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::MultiShopViolation
            | DomainError::InsufficientStock
            | DomainError::OutOfStock => ErrorKind::Rejected,
            DomainError::AdjustmentFailed => ErrorKind::AdjustmentFailed,
        }
    }

    /// Stable machine-readable code carried in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidRequest(_) => codes::INVALID_REQUEST,
            DomainError::ProductNotFound => codes::PRODUCT_NOT_FOUND,
            DomainError::WarehouseNotFound => codes::WAREHOUSE_NOT_FOUND,
            DomainError::OrderNotFound => codes::ORDER_NOT_FOUND,
            DomainError::StockRowNotFound => codes::WAREHOUSE_STOCK_NOT_FOUND,
            DomainError::StockNotFound => codes::PRODUCT_STOCK_NOT_FOUND,
            DomainError::Conflict(_) => codes::WAREHOUSE_STOCK_DUPLICATED,
            DomainError::MultiShopViolation => codes::PRODUCT_MULTI_SHOP,
            DomainError::InsufficientStock => codes::PRODUCT_INSUFFICIENT_STOCK,
            DomainError::OutOfStock => codes::ADJUSTMENT_OUT_OF_STOCK,
            DomainError::AdjustmentFailed => codes::ADJUSTMENT_FAILED,
        }
    }

    /// Reverse of [`DomainError::code`], used by clients decoding a remote error body.
    pub fn from_code(code: &str, message: &str) -> Option<Self> {
        let err = match code {
            codes::INVALID_REQUEST => DomainError::invalid(message),
            codes::PRODUCT_NOT_FOUND => DomainError::ProductNotFound,
            codes::WAREHOUSE_NOT_FOUND => DomainError::WarehouseNotFound,
            codes::ORDER_NOT_FOUND => DomainError::OrderNotFound,
            codes::WAREHOUSE_STOCK_NOT_FOUND => DomainError::StockRowNotFound,
            codes::PRODUCT_STOCK_NOT_FOUND => DomainError::StockNotFound,
            codes::WAREHOUSE_STOCK_DUPLICATED => DomainError::conflict(message),
            codes::PRODUCT_MULTI_SHOP => DomainError::MultiShopViolation,
            codes::PRODUCT_INSUFFICIENT_STOCK => DomainError::InsufficientStock,
            codes::ADJUSTMENT_OUT_OF_STOCK => DomainError::OutOfStock,
            codes::ADJUSTMENT_FAILED => DomainError::AdjustmentFailed,
            _ => return None,
        };
        Some(err)
    }
}

/// Wire codes shared by the warehouse and order services.
pub mod codes {
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const INVALID_REQUEST: &str = "BODY-JSON_INVALID";
    pub const ORDER_NOT_FOUND: &str = "ORDER_NOT-FOUND";
    pub const PRODUCT_NOT_FOUND: &str = "ORDER-PRODUCT_NOT-FOUND";
    pub const PRODUCT_STOCK_NOT_FOUND: &str = "ORDER-PRODUCT-STOCK_NOT-FOUND";
    pub const PRODUCT_INSUFFICIENT_STOCK: &str = "ORDER-PRODUCT_INSUFFICIENT-STOCK";
    pub const PRODUCT_MULTI_SHOP: &str = "ORDER-PRODUCT_MULTI-SHOP";
    pub const WAREHOUSE_NOT_FOUND: &str = "WAREHOUSE_NOT-FOUND";
    pub const WAREHOUSE_STOCK_NOT_FOUND: &str = "WAREHOUSE-STOCK_NOT-FOUND";
    pub const WAREHOUSE_STOCK_DUPLICATED: &str = "WAREHOUSE-STOCK_DUPLICATED";
    pub const ADJUSTMENT_FAILED: &str = "WAREHOUSE-STOCK_ADJUSTMENT-FAILED";
    pub const ADJUSTMENT_OUT_OF_STOCK: &str = "WAREHOUSE-STOCK_ADJUSTMENT-OUT-OF-STOCK";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
}
