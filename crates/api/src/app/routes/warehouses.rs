use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use stockflow_inventory::{CreateWarehouseRequest, WarehouseActivationRequest};

use crate::app::dto::MessageResponse;
use crate::app::errors;
use crate::app::services::WarehouseServices;

pub async fn create_warehouse(
    Extension(services): Extension<WarehouseServices>,
    body: Result<Json<CreateWarehouseRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::invalid_body(e),
    };

    match services.create_warehouse(&body).await {
        Ok(warehouse) => (StatusCode::CREATED, Json(warehouse)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn set_active(
    Extension(services): Extension<WarehouseServices>,
    body: Result<Json<WarehouseActivationRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::invalid_body(e),
    };

    match services.set_warehouse_active(&body).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Success inactive/active warehouse")),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
