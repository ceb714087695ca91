//! HTTP application wiring (Axum routers + service wiring).
//!
//! - `services.rs`: backend wiring (in-memory or Postgres) behind one enum per service
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request/response DTOs that are not domain types
//! - `errors.rs`: consistent error responses

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use stockflow_infra::gateway::BasicAuth;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{OrderServices, WarehouseServices};

/// Router for the warehouse service. Everything but `/health` requires the
/// configured basic-auth credentials.
pub fn build_warehouse_app(services: WarehouseServices, credentials: BasicAuth) -> Router {
    let protected = routes::warehouse_router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            middleware::BasicAuthState::new(credentials),
            middleware::basic_auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}

/// Router for the order service. Everything but `/health` requires a user
/// context.
pub fn build_order_app(services: OrderServices) -> Router {
    let protected = routes::order_router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn(middleware::user_context_middleware));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
