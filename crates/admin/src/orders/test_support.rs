//! In-memory [`OrderSource`] used by the pipeline's unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ops_console_core::OrderId;
use serde_json::{Value, json};

use crate::orders_api::{ExportBlob, OrderSource, OrdersApiError};

/// Fake source serving canned envelopes.
///
/// Detail fetches sleep for `delay`; list fetches sleep for the next queued
/// list delay, if any.
#[derive(Default)]
pub struct FakeSource {
    list: Mutex<Vec<Value>>,
    details: Mutex<HashMap<String, Value>>,
    delay: Duration,
    list_delays: Mutex<VecDeque<Duration>>,
    fail_list: AtomicBool,
    list_calls: AtomicUsize,
    detail_calls: Mutex<HashMap<String, usize>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_list_delays(self, delays: Vec<Duration>) -> Self {
        *self.list_delays.lock().unwrap() = delays.into();
        self
    }

    pub fn with_orders(self, orders: Vec<Value>) -> Self {
        self.set_orders(orders);
        self
    }

    /// Register a detail payload; ids without one answer with a 404.
    pub fn with_detail(self, order_id: &str, data: Value) -> Self {
        self.details
            .lock()
            .unwrap()
            .insert(order_id.to_string(), data);
        self
    }

    pub fn set_orders(&self, orders: Vec<Value>) {
        *self.list.lock().unwrap() = orders;
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self, order_id: &str) -> usize {
        self.detail_calls
            .lock()
            .unwrap()
            .get(order_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl OrderSource for FakeSource {
    async fn list_orders(&self) -> Result<Value, OrdersApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let content = self.list.lock().unwrap().clone();
        let delay = self.list_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(OrdersApiError::Unauthorized);
        }
        Ok(json!({ "data": { "content": content } }))
    }

    async fn fetch_order_detail(&self, order_id: &OrderId) -> Result<Value, OrdersApiError> {
        *self
            .detail_calls
            .lock()
            .unwrap()
            .entry(order_id.to_string())
            .or_insert(0) += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let data = self.details.lock().unwrap().get(order_id.as_str()).cloned();
        data.map(|data| json!({ "data": data }))
            .ok_or_else(|| OrdersApiError::Status {
                status: 404,
                body: "not found".to_string(),
            })
    }

    async fn download_orders_export(&self) -> Result<ExportBlob, OrdersApiError> {
        Ok(ExportBlob {
            bytes: b"<orders/>".to_vec(),
            content_type: Some("application/xml".to_string()),
        })
    }
}

/// Minimal list entry.
pub fn order_json(id: &str, status: &str, order_date: &str) -> Value {
    json!({
        "orderId": id,
        "orderNumber": format!("N-{id}"),
        "platform": "Shopee",
        "productType": "eSIM",
        "productName": "Japan 5GB",
        "quantity": 1,
        "status": status,
        "orderDate": order_date,
        "totalAmount": 10.5,
        "customerEmail": format!("{id}@example.com"),
    })
}

/// Minimal detail payload with `items` order items.
pub fn detail_json(id: &str, items: usize) -> Value {
    let order_items: Vec<Value> = (0..items)
        .map(|i| {
            json!({
                "orderItemId": format!("{id}-{i}"),
                "unitPrice": 5,
                "quantity": 1,
                "totalPrice": 5,
                "product": { "productId": format!("P{i}"), "productName": "Japan 5GB" },
            })
        })
        .collect();
    json!({
        "orderId": id,
        "customerName": "Ana",
        "orderItems": order_items,
    })
}
