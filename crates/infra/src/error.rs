//! Infrastructure error types.
//!
//! Domain rejections travel as [`DomainError`]; everything the storage engine
//! or the network can do wrong is kept separate so the service boundary can
//! tell a business "no" from a broken dependency.

use thiserror::Error;

use stockflow_core::{DomainError, ErrorKind, codes};

/// Storage failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Connection, query or decoding failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Failure talking to another service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The remote side answered with a known business error.
    #[error("rejected by remote service: {0}")]
    Rejected(DomainError),

    /// No usable response (connect error, timeout, retries exhausted).
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success status without a recognised error code.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Error returned by the application services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(DomainError),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Gateway(GatewayError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Domain(e) => e.kind(),
            ServiceError::Store(StoreError::Conflict(_)) => ErrorKind::Conflict,
            ServiceError::Store(StoreError::Backend(_)) => ErrorKind::Infrastructure,
            ServiceError::Gateway(GatewayError::Rejected(e)) => e.kind(),
            ServiceError::Gateway(_) => ErrorKind::Infrastructure,
        }
    }

    /// Wire code for error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Domain(e) | ServiceError::Gateway(GatewayError::Rejected(e)) => e.code(),
            ServiceError::Store(StoreError::Conflict(_)) => codes::WAREHOUSE_STOCK_DUPLICATED,
            ServiceError::Store(StoreError::Backend(_)) => codes::STORAGE_ERROR,
            ServiceError::Gateway(_) => codes::UPSTREAM_ERROR,
        }
    }

    /// The business error carried by this failure, local or remote.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) | ServiceError::Gateway(GatewayError::Rejected(e)) => Some(e),
            _ => None,
        }
    }

    /// True for failures of a downstream service rather than of this one.
    pub fn is_upstream(&self) -> bool {
        matches!(self, ServiceError::Gateway(e) if !matches!(e, GatewayError::Rejected(_)))
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        ServiceError::Domain(err)
    }
}

/// A uniqueness conflict is a business outcome; other storage failures are not.
impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ServiceError::Domain(DomainError::Conflict(msg)),
            other => ServiceError::Store(other),
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        ServiceError::Gateway(err)
    }
}
