use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use stockflow_core::{UserId, codes};
use stockflow_infra::gateway::BasicAuth;

use crate::app::errors;
use crate::context::UserContext;

pub const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Clone)]
pub struct BasicAuthState {
    pub credentials: Arc<BasicAuth>,
}

impl BasicAuthState {
    pub fn new(credentials: BasicAuth) -> Self {
        Self {
            credentials: Arc::new(credentials),
        }
    }
}

/// Static-credential check for the internal warehouse endpoints. Any failure
/// answers 403.
pub async fn basic_auth_middleware(
    State(state): State<BasicAuthState>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    match extract_basic(req.headers()) {
        Some((user, password))
            if user == state.credentials.username && password == state.credentials.password =>
        {
            next.run(req).await
        }
        _ => errors::json_error(StatusCode::FORBIDDEN, codes::FORBIDDEN, "forbidden"),
    }
}

fn extract_basic(headers: &HeaderMap) -> Option<(String, String)> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = header.strip_prefix("Basic ")?.trim();
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

/// Resolve the buyer from `X-User-Id`; missing or malformed answers 401.
pub async fn user_context_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    match extract_user(req.headers()) {
        Some(user_id) => {
            req.extensions_mut().insert(UserContext::new(user_id));
            next.run(req).await
        }
        None => errors::json_error(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHENTICATED,
            "missing or invalid user id",
        ),
    }
}

fn extract_user(headers: &HeaderMap) -> Option<UserId> {
    headers.get(USER_ID_HEADER)?.to_str().ok()?.parse().ok()
}
