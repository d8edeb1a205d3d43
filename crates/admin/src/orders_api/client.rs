//! HTTP client for the orders API.
//!
//! Three endpoints are used:
//! - `POST order/list` - the full order list envelope
//! - `POST order/details` - one order's detail envelope
//! - `GET order/download` - the server-generated bulk export

use std::sync::Arc;

use async_trait::async_trait;
use ops_console_core::OrderId;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use tracing::instrument;
use uuid::Uuid;

use super::{ExportBlob, OrderSource, OrdersApiError};
use crate::config::OrdersApiConfig;

const LIST_PATH: &str = "order/list";
const DETAILS_PATH: &str = "order/details";
const DOWNLOAD_PATH: &str = "order/download";

/// Longest response body excerpt kept in errors and logs.
const BODY_EXCERPT_CHARS: usize = 500;

/// Orders API client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct OrdersClient {
    inner: Arc<OrdersClientInner>,
}

struct OrdersClientInner {
    client: reqwest::Client,
    config: OrdersApiConfig,
}

impl OrdersClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `OrdersApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: OrdersApiConfig) -> Result<Self, OrdersApiError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(OrdersClientInner { client, config }),
        })
    }

    /// The configuration this client was built from.
    #[must_use]
    pub fn config(&self) -> &OrdersApiConfig {
        &self.inner.config
    }

    /// Start a request with the console's standard headers.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let config = &self.inner.config;
        let correlation_id = config
            .correlation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        self.inner
            .client
            .request(method, config.endpoint(path))
            .header(
                AUTHORIZATION,
                format!("Bearer {}", config.credentials.token.expose_secret()),
            )
            .header("email", &config.credentials.account_email)
            .header(CONTENT_TYPE, "application/json")
            .header("X-API-VERSION", &config.api_version)
            .header("x-correlationid", correlation_id)
    }

    /// POST a JSON body and parse the JSON response.
    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, OrdersApiError> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        let response = check_status(response).await?;
        let text = response.text().await?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                path,
                body = %excerpt(&text),
                "Failed to parse orders API response"
            );
            OrdersApiError::Parse(e)
        })
    }
}

/// Map non-success statuses to errors.
async fn check_status(response: Response) -> Result<Response, OrdersApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::UNAUTHORIZED {
        return Err(OrdersApiError::Unauthorized);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return Err(OrdersApiError::RateLimited(retry_after));
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(
        status = %status,
        body = %excerpt(&body),
        "Orders API returned non-success status"
    );
    Err(OrdersApiError::Status {
        status: status.as_u16(),
        body: excerpt(&body),
    })
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

#[async_trait]
impl OrderSource for OrdersClient {
    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<serde_json::Value, OrdersApiError> {
        self.post_json(LIST_PATH, &serde_json::json!({})).await
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn fetch_order_detail(
        &self,
        order_id: &OrderId,
    ) -> Result<serde_json::Value, OrdersApiError> {
        self.post_json(DETAILS_PATH, &serde_json::json!({ "orderId": order_id }))
            .await
    }

    #[instrument(skip(self))]
    async fn download_orders_export(&self) -> Result<ExportBlob, OrdersApiError> {
        let response = self.request(Method::GET, DOWNLOAD_PATH).send().await?;
        let response = check_status(response).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let bytes = response.bytes().await?.to_vec();

        tracing::info!(size = bytes.len(), "Downloaded orders export");
        Ok(ExportBlob {
            bytes,
            content_type,
        })
    }
}
