//! Orders API transport adapter.
//!
//! Issues authenticated calls to the three order endpoints and hands back raw,
//! loosely-typed bodies. Interpreting those bodies is the normalizer's job; this
//! module owns nothing beyond the credentials it is given.
//!
//! # Architecture
//!
//! - [`OrderSource`] is the seam the rest of the pipeline depends on
//! - [`OrdersClient`] implements it over HTTP with `reqwest`
//! - Every request carries the bearer token and the account email header

pub mod client;

pub use client::OrdersClient;

use async_trait::async_trait;
use ops_console_core::OrderId;
use thiserror::Error;

/// Errors that can occur when talking to the orders API.
#[derive(Debug, Error)]
pub enum OrdersApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The credentials were rejected.
    #[error("Unauthorized: credentials rejected by orders API")]
    Unauthorized,

    /// Rate limited by the orders API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("Orders API returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// Response body was not JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Body of the bulk export download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBlob {
    /// Raw bytes as served.
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the server, if any.
    pub content_type: Option<String>,
}

/// Source of raw order data.
///
/// Results are returned unparsed; callers run them through
/// [`crate::orders::normalize`].
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Fetch the raw order list envelope.
    async fn list_orders(&self) -> Result<serde_json::Value, OrdersApiError>;

    /// Fetch the raw detail envelope for one order.
    async fn fetch_order_detail(
        &self,
        order_id: &OrderId,
    ) -> Result<serde_json::Value, OrdersApiError>;

    /// Download the server-generated bulk export.
    async fn download_orders_export(&self) -> Result<ExportBlob, OrdersApiError>;
}
