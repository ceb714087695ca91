use axum::{
    Json,
    extract::{Extension, Path},
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::IntoResponse,
};

use stockflow_core::OrderId;
use stockflow_orders::CreateOrderRequest;

use crate::app::dto::CreatedOrderResponse;
use crate::app::errors;
use crate::app::services::OrderServices;
use crate::context::UserContext;

pub async fn checkout(
    Extension(services): Extension<OrderServices>,
    Extension(user): Extension<UserContext>,
    body: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(e) => return errors::invalid_body(e),
    };

    match services.checkout(user.user_id(), &body).await {
        Ok(order) => (
            StatusCode::CREATED,
            Json(CreatedOrderResponse {
                message: "Success create order",
                order,
            }),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<OrderServices>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.find_order(order_id).await {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}
