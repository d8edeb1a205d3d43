//! Integration test support for the Ops Console.
//!
//! [`MockUpstream`] serves the three orders API endpoints from memory on an
//! ephemeral local port and records every request it receives, so tests can
//! drive the real `OrdersClient` over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ops-console-integration-tests
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ops_console_admin::config::{OrdersApiConfig, SessionCredentials};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// Bearer token used by [`MockUpstream::api_config`].
pub const TEST_TOKEN: &str = "test-token";

/// Account email used by [`MockUpstream::api_config`].
pub const TEST_EMAIL: &str = "ops@example.com";

/// A request seen by the mock.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    /// Parsed JSON body; `Null` when empty or not JSON.
    pub body: Value,
}

impl RecordedRequest {
    /// Header value as text, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Canned failure returned by every endpoint.
#[derive(Debug, Clone)]
struct Failure {
    status: StatusCode,
    retry_after: Option<String>,
    body: String,
}

#[derive(Default)]
struct MockState {
    orders: Mutex<Vec<Value>>,
    details: Mutex<HashMap<String, Value>>,
    export: Mutex<Option<(Vec<u8>, String)>>,
    raw_list_body: Mutex<Option<String>>,
    failure: Mutex<Option<Failure>>,
    detail_delay: Mutex<Duration>,
    requests: Mutex<Vec<RecordedRequest>>,
    detail_calls: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockState {
    fn record(&self, method: Method, path: &str, headers: HeaderMap, body: &Bytes) {
        let body = serde_json::from_slice(body).unwrap_or(Value::Null);
        lock(&self.requests).push(RecordedRequest {
            method,
            path: path.to_string(),
            headers,
            body,
        });
    }

    fn failure_response(&self) -> Option<Response> {
        let failure = lock(&self.failure).clone()?;
        let mut response = (failure.status, failure.body).into_response();
        if let Some(value) = failure
            .retry_after
            .and_then(|v| HeaderValue::from_str(&v).ok())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        Some(response)
    }
}

/// In-memory orders API.
pub struct MockUpstream {
    base_url: Url,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockUpstream {
    /// Bind to an ephemeral port on 127.0.0.1 and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/api/order/list", post(list_orders))
            .route("/api/order/details", post(order_details))
            .route("/api/order/download", get(download))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let base_url = Url::parse(&format!("http://{addr}/api"))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url,
            state,
            server,
        })
    }

    /// Base URL of the mock API, e.g. `http://127.0.0.1:PORT/api`.
    #[must_use]
    pub fn base_url(&self) -> Url {
        self.base_url.clone()
    }

    /// Client configuration pointed at this mock with the test credentials.
    #[must_use]
    pub fn api_config(&self) -> OrdersApiConfig {
        OrdersApiConfig::new(
            self.base_url(),
            SessionCredentials::new(TEST_TOKEN, TEST_EMAIL),
        )
    }

    /// Entries served under `data.content` by the list endpoint.
    pub fn set_orders(&self, orders: Vec<Value>) {
        *lock(&self.state.orders) = orders;
    }

    /// Serve this exact text from the list endpoint instead of JSON.
    pub fn set_raw_list_body(&self, body: impl Into<String>) {
        *lock(&self.state.raw_list_body) = Some(body.into());
    }

    /// Detail payload served under `data` for `order_id`; unknown ids get
    /// `data: null`.
    pub fn set_detail(&self, order_id: &str, detail: Value) {
        lock(&self.state.details).insert(order_id.to_string(), detail);
    }

    /// Delay applied to every detail request.
    pub fn set_detail_delay(&self, delay: Duration) {
        *lock(&self.state.detail_delay) = delay;
    }

    /// Body and content type served by the download endpoint.
    pub fn set_export(&self, bytes: impl Into<Vec<u8>>, content_type: &str) {
        *lock(&self.state.export) = Some((bytes.into(), content_type.to_string()));
    }

    /// Make every endpoint answer with `status`.
    pub fn fail_with(&self, status: u16, retry_after: Option<&str>, body: &str) {
        *lock(&self.state.failure) = Some(Failure {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            retry_after: retry_after.map(ToString::to_string),
            body: body.to_string(),
        });
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    /// Number of detail requests received.
    #[must_use]
    pub fn detail_calls(&self) -> usize {
        self.state.detail_calls.load(Ordering::SeqCst)
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn list_orders(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record(Method::POST, "/api/order/list", headers, &body);
    if let Some(response) = state.failure_response() {
        return response;
    }

    let raw = lock(&state.raw_list_body).clone();
    if let Some(raw) = raw {
        return ([(header::CONTENT_TYPE, "application/json")], raw).into_response();
    }

    let content = lock(&state.orders).clone();
    Json(json!({
        "code": 200,
        "message": "OK",
        "data": { "content": content, "totalElements": content.len() },
    }))
    .into_response()
}

async fn order_details(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.record(Method::POST, "/api/order/details", headers, &body);
    state.detail_calls.fetch_add(1, Ordering::SeqCst);

    let delay = *lock(&state.detail_delay);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    if let Some(response) = state.failure_response() {
        return response;
    }

    let order_id = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("orderId").and_then(Value::as_str).map(ToString::to_string))
        .unwrap_or_default();
    let detail = lock(&state.details)
        .get(&order_id)
        .cloned()
        .unwrap_or(Value::Null);

    Json(json!({ "code": 200, "message": "OK", "data": detail })).into_response()
}

async fn download(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record(Method::GET, "/api/order/download", headers, &Bytes::new());
    if let Some(response) = state.failure_response() {
        return response;
    }

    let export = lock(&state.export).clone();
    match export {
        Some((bytes, content_type)) => {
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
