//! Conversions from raw orders API payloads to strict order types.
//!
//! Every function here is total: missing fields, wrongly-typed fields and extra
//! fields all resolve to documented defaults instead of errors.
//!
//! - Strings default to `""`; numbers and booleans are stringified.
//! - Nullable strings (`customerEmail`, `customerName`, `phoneNumber`) accept
//!   only JSON strings.
//! - Amounts and quantities default to zero when the value is not a JSON
//!   number. Negative numbers are kept as reported.
//! - `orderDate` is the first parseable, non-empty value of `orderDate` and
//!   `updatedAt`, else `None`.
//! - A line item without a `product` object has `product: None`.

use std::collections::HashSet;

use ops_console_core::{
    Order, OrderDetails, OrderId, OrderItem, OrderItemId, Product, ProductId, Timestamp,
};
use rust_decimal::Decimal;
use serde_json::Value;

/// JSON pointer to the order array inside the list envelope.
const LIST_CONTENT_POINTER: &str = "/data/content";
/// JSON pointer to the detail record inside the detail envelope.
const DETAIL_DATA_POINTER: &str = "/data";

// =============================================================================
// Envelopes
// =============================================================================

/// Extract the order list from a list-response envelope.
///
/// A missing or non-array `data.content` yields an empty list. Entries without
/// an order id, and repeats of an id already seen, are dropped so that ids are
/// unique within the snapshot.
#[must_use]
pub fn orders_from_envelope(raw: &Value) -> Vec<Order> {
    let Some(entries) = raw.pointer(LIST_CONTENT_POINTER).and_then(Value::as_array) else {
        tracing::warn!("Order list envelope has no data.content array");
        return Vec::new();
    };

    let mut seen: HashSet<OrderId> = HashSet::with_capacity(entries.len());
    let mut orders = Vec::with_capacity(entries.len());

    for (position, entry) in entries.iter().enumerate() {
        let order = normalize_order(entry);
        if order.order_id.is_empty() {
            tracing::warn!(position, "Skipping order list entry without orderId");
            continue;
        }
        if !seen.insert(order.order_id.clone()) {
            tracing::warn!(order_id = %order.order_id, "Skipping duplicate order list entry");
            continue;
        }
        orders.push(order);
    }

    orders
}

/// Extract order details from a detail-response envelope.
///
/// Returns `None` when `data` is absent, `null`, or not an object.
#[must_use]
pub fn details_from_envelope(raw: &Value) -> Option<OrderDetails> {
    raw.pointer(DETAIL_DATA_POINTER)
        .filter(|data| data.is_object())
        .map(normalize_order_details)
}

// =============================================================================
// Records
// =============================================================================

/// Normalize one raw order list entry.
#[must_use]
pub fn normalize_order(raw: &Value) -> Order {
    Order {
        order_id: OrderId::new(string_field(raw, "orderId")),
        platform: string_field(raw, "platform"),
        order_number: string_field(raw, "orderNumber"),
        product_type: string_field(raw, "productType"),
        product_name: string_field(raw, "productName"),
        quantity: quantity_field(raw, "quantity"),
        status: string_field(raw, "status"),
        order_date: resolve_order_date(raw),
        updated_at: timestamp_field(raw, "updatedAt"),
        total_amount: decimal_field(raw, "totalAmount"),
        customer_email: nullable_string(raw, "customerEmail"),
    }
}

/// Normalize a raw order detail record.
#[must_use]
pub fn normalize_order_details(raw: &Value) -> OrderDetails {
    let order_items = raw
        .get("orderItems")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(normalize_order_item).collect())
        .unwrap_or_default();

    OrderDetails {
        order_id: OrderId::new(string_field(raw, "orderId")),
        order_number: string_field(raw, "orderNumber"),
        platform: string_field(raw, "platform"),
        product_type: string_field(raw, "productType"),
        product_name: string_field(raw, "productName"),
        quantity: quantity_field(raw, "quantity"),
        status: string_field(raw, "status"),
        order_date: resolve_order_date(raw),
        updated_at: timestamp_field(raw, "updatedAt"),
        total_amount: decimal_field(raw, "totalAmount"),
        customer_name: nullable_string(raw, "customerName"),
        customer_email: nullable_string(raw, "customerEmail"),
        phone_number: nullable_string(raw, "phoneNumber"),
        order_items,
    }
}

fn normalize_order_item(raw: &Value) -> OrderItem {
    let order_item_id = string_field(raw, "orderItemId");
    let product = normalize_product(raw.get("product"), &order_item_id);

    OrderItem {
        order_item_id: OrderItemId::new(order_item_id),
        unit_price: decimal_field(raw, "unitPrice"),
        quantity: quantity_field(raw, "quantity"),
        total_price: decimal_field(raw, "totalPrice"),
        product,
        product_info: raw.get("productInfo").filter(|v| !v.is_null()).cloned(),
    }
}

/// Product id resolution: explicit id, then SKU, then the line item's id.
fn normalize_product(raw: Option<&Value>, order_item_id: &str) -> Option<Product> {
    let raw = raw.filter(|v| v.is_object())?;
    let product_sku = string_field(raw, "productSku");

    let product_id = [string_field(raw, "productId"), product_sku.clone()]
        .into_iter()
        .find(|candidate| !candidate.is_empty())
        .unwrap_or_else(|| order_item_id.to_string());

    Some(Product {
        product_id: ProductId::new(product_id),
        product_sku,
        category: string_field(raw, "category"),
        product_name: string_field(raw, "productName"),
        description: nullable_string(raw, "description"),
    })
}

// =============================================================================
// Field helpers
// =============================================================================

fn string_field(raw: &Value, key: &str) -> String {
    match raw.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn nullable_string(raw: &Value, key: &str) -> Option<String> {
    raw.get(key).and_then(Value::as_str).map(ToString::to_string)
}

fn timestamp_field(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| Timestamp::is_valid(s))
        .map(ToString::to_string)
}

fn resolve_order_date(raw: &Value) -> Option<String> {
    timestamp_field(raw, "orderDate").or_else(|| timestamp_field(raw, "updatedAt"))
}

fn decimal_field(raw: &Value, key: &str) -> Decimal {
    match raw.get(key) {
        Some(Value::Number(n)) => {
            let text = n.to_string();
            text.parse::<Decimal>()
                .or_else(|_| Decimal::from_scientific(&text))
                .unwrap_or(Decimal::ZERO)
        }
        _ => Decimal::ZERO,
    }
}

// Allow: fractional quantities truncate, out-of-range ones saturate.
#[allow(clippy::cast_possible_truncation)]
fn quantity_field(raw: &Value, key: &str) -> i64 {
    match raw.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().map_or(0, |f| f.trunc() as i64)),
        _ => 0,
    }
}
