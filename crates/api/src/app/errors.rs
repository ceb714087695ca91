use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use stockflow_core::{DomainError, ErrorKind, codes};
use stockflow_infra::ServiceError;

/// Transport status for an error kind. The only place this mapping lives.
pub fn status_for(kind: ErrorKind, upstream: bool) -> StatusCode {
    match kind {
        ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict | ErrorKind::AdjustmentFailed => StatusCode::CONFLICT,
        ErrorKind::Rejected => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Infrastructure if upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    let status = status_for(err.kind(), err.is_upstream());
    if status.is_server_error() {
        error!(error = %err, code = err.code(), "request failed");
    }
    json_error(status, err.code(), err.to_string())
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    service_error_to_response(ServiceError::Domain(err))
}

pub fn invalid_body(rejection: JsonRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, codes::INVALID_REQUEST, rejection.body_text())
}

pub fn invalid_query(rejection: QueryRejection) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, codes::INVALID_REQUEST, rejection.body_text())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
