use axum::{
    Json,
    extract::{Extension, Query, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};

use stockflow_inventory::{CreateStockRowRequest, StockAdjustmentRequest, TransferRequest};

use crate::app::dto::{ActiveStockQuery, MessageResponse};
use crate::app::errors;
use crate::app::services::WarehouseServices;

pub async fn adjust(
    Extension(services): Extension<WarehouseServices>,
    body: Result<Json<StockAdjustmentRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::invalid_body(e),
    };

    match services.adjust(&body).await {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::new("Success adjustment stock"))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn transfer(
    Extension(services): Extension<WarehouseServices>,
    body: Result<Json<TransferRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::invalid_body(e),
    };

    match services.transfer(&body).await {
        Ok(()) => (StatusCode::OK, Json(MessageResponse::new("Success transfer stock"))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn active_stocks(
    Extension(services): Extension<WarehouseServices>,
    query: Result<Query<ActiveStockQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(e) => return errors::invalid_query(e),
    };
    let product_ids = match query.product_ids() {
        Ok(ids) => ids,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.active_stock(&product_ids).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_stock_row(
    Extension(services): Extension<WarehouseServices>,
    body: Result<Json<CreateStockRowRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::invalid_body(e),
    };

    match services.create_stock_row(&body).await {
        Ok(row) => (StatusCode::CREATED, Json(row)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
