//! HTTP clients for the product and warehouse services.
//!
//! Every call goes through [`ServiceClient`], which adds basic auth, a request
//! timeout and transport-level retries. A retried adjustment is not
//! idempotent: if the first attempt was applied but its response was lost,
//! the retry applies it again. `X-Request-Id` only correlates logs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::{instrument, warn};
use uuid::Uuid;

use stockflow_core::{DomainError, ProductId};
use stockflow_inventory::{ActiveStockView, StockAdjustment, StockAdjustmentRequest};
use stockflow_orders::{ActiveStock, Product};

use super::{ProductCatalog, WarehouseGateway, rejected_adjustment};
use crate::error::GatewayError;
use crate::retry::{RetryPolicy, is_retryable_status};

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// Error body shared by both services: `{"error": <code>, "message": <text>}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    message: String,
}

/// HTTP client for one collaborating service.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    name: &'static str,
    client: Client,
    base_url: String,
    auth: Option<BasicAuth>,
    retry: RetryPolicy,
}

impl ServiceClient {
    pub fn new(
        name: &'static str,
        base_url: impl Into<String>,
        timeout: Duration,
        auth: Option<BasicAuth>,
        retry: RetryPolicy,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(format!("{name}: failed to build client: {e}")))?;

        Ok(Self {
            name,
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
            retry,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request built by `build`, retrying transient failures.
    ///
    /// Returns the first response that is not retried, whatever its status.
    async fn send<F>(&self, build: F) -> Result<Response, GatewayError>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let request_id = Uuid::now_v7().to_string();
        let mut retries = 0;

        loop {
            let mut request = build(&self.client).header(REQUEST_ID_HEADER, &request_id);
            if let Some(auth) = &self.auth {
                request = request.basic_auth(&auth.username, Some(&auth.password));
            }

            match request.send().await {
                Ok(resp)
                    if is_retryable_status(resp.status().as_u16())
                        && self.retry.should_retry(retries) =>
                {
                    warn!(
                        service = self.name,
                        request_id = %request_id,
                        status = resp.status().as_u16(),
                        retry = retries + 1,
                        "retrying service call"
                    );
                }
                Ok(resp) => return Ok(resp),
                Err(e) if (e.is_connect() || e.is_timeout()) && self.retry.should_retry(retries) => {
                    warn!(
                        service = self.name,
                        request_id = %request_id,
                        error = %e,
                        retry = retries + 1,
                        "retrying service call"
                    );
                }
                Err(e) => {
                    return Err(GatewayError::Transport(format!("{}: {}", self.name, e)));
                }
            }

            retries += 1;
            tokio::time::sleep(self.retry.delay_for_attempt(retries)).await;
        }
    }

    async fn get_json<T>(&self, path: &str) -> Result<T, GatewayError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = self.url(path);
        let resp = self.send(|client| client.get(&url)).await?;
        decode(ensure_success(resp).await?).await
    }
}

async fn ensure_success(resp: Response) -> Result<Response, GatewayError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    Err(error_from_response(resp).await)
}

async fn decode<T>(resp: Response) -> Result<T, GatewayError>
where
    T: for<'de> Deserialize<'de>,
{
    resp.json::<T>()
        .await
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Turn a non-success response into a gateway error. Known error codes become
/// [`GatewayError::Rejected`]; anything else keeps its status and body.
async fn error_from_response(resp: Response) -> GatewayError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    error_from_body(status, body)
}

fn error_from_body(status: StatusCode, body: String) -> GatewayError {
    serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| DomainError::from_code(&b.error, &b.message))
        .map(GatewayError::Rejected)
        .unwrap_or(GatewayError::Status {
            status: status.as_u16(),
            body,
        })
}

fn id_list(ids: &[ProductId]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

#[derive(Debug, Deserialize)]
struct ProductsResponse {
    products: Vec<Product>,
}

/// Product catalog served by the product service.
#[derive(Debug, Clone)]
pub struct HttpProductCatalog {
    client: ServiceClient,
}

impl HttpProductCatalog {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    #[instrument(skip(self, ids), fields(products = ids.len()), err)]
    async fn list_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, GatewayError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let resp: ProductsResponse = self
            .client
            .get_json(&format!("/check-products?ids={}", id_list(ids)))
            .await?;
        Ok(resp.products)
    }
}

/// Warehouse service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpWarehouseGateway {
    client: ServiceClient,
}

impl HttpWarehouseGateway {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WarehouseGateway for HttpWarehouseGateway {
    #[instrument(skip(self, product_ids), fields(products = product_ids.len()), err)]
    async fn active_stock(&self, product_ids: &[ProductId]) -> Result<Vec<ActiveStock>, GatewayError> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        let view: ActiveStockView = self
            .client
            .get_json(&format!("/active-stocks?product_ids={}", id_list(product_ids)))
            .await?;
        Ok(ActiveStock::from_view(&view))
    }

    #[instrument(skip(self, adjustments), fields(deltas = adjustments.len()), err)]
    async fn adjust(&self, adjustments: &[StockAdjustment]) -> Result<(), GatewayError> {
        let body = StockAdjustmentRequest::new(adjustments.to_vec());
        let url = self.client.url("/adjustment-stocks");
        let resp = self
            .client
            .send(|client| client.post(&url).json(&body))
            .await?;

        match ensure_success(resp).await {
            Ok(_) => Ok(()),
            Err(GatewayError::Rejected(e)) => Err(rejected_adjustment(e)),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockflow_core::codes;

    #[test]
    fn known_error_code_becomes_a_rejection() {
        let body = format!(r#"{{"error":"{}","message":"out of stock"}}"#, codes::ADJUSTMENT_OUT_OF_STOCK);
        assert_eq!(
            error_from_body(StatusCode::UNPROCESSABLE_ENTITY, body),
            GatewayError::Rejected(DomainError::OutOfStock)
        );
    }

    #[test]
    fn unknown_error_body_keeps_status() {
        let err = error_from_body(StatusCode::BAD_GATEWAY, "upstream down".into());
        assert_eq!(
            err,
            GatewayError::Status {
                status: 502,
                body: "upstream down".into()
            }
        );

        let err = error_from_body(StatusCode::FORBIDDEN, r#"{"error":"FORBIDDEN","message":""}"#.into());
        assert!(matches!(err, GatewayError::Status { status: 403, .. }));
    }

    #[test]
    fn id_lists_are_comma_separated() {
        assert_eq!(id_list(&[ProductId::new(1), ProductId::new(22)]), "1,22");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = ServiceClient::new(
            "warehouse",
            "http://localhost:8082/",
            Duration::from_secs(1),
            None,
            RetryPolicy::no_retry(),
        )
        .unwrap();
        assert_eq!(client.url("/health"), "http://localhost:8082/health");
    }
}
