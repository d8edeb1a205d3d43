//! Normalized order records.
//!
//! These are the strict shapes produced by the admin crate's normalizer. Every
//! field has a concrete value or an explicit `Option`; nothing downstream needs
//! to guess whether an upstream field was present.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{OrderId, OrderItemId, ProductId};
use super::timestamp::Timestamp;

/// One row of the order list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Unique within one list snapshot, never empty.
    pub order_id: OrderId,
    /// Sales platform (e.g. "Shopee"), may be empty.
    pub platform: String,
    /// Platform-facing order number.
    pub order_number: String,
    /// Product type (e.g. "eSIM"), may be empty.
    pub product_type: String,
    /// Product name, may be empty.
    pub product_name: String,
    /// Ordered quantity.
    pub quantity: i64,
    /// Free-text status, compared case-insensitively.
    pub status: String,
    /// Order date, or the last-updated timestamp when no order date exists.
    pub order_date: Option<String>,
    /// Last-updated timestamp as reported upstream.
    pub updated_at: Option<String>,
    /// Order total.
    pub total_amount: Decimal,
    /// Customer email, when known.
    pub customer_email: Option<String>,
}

impl Order {
    /// The date used for filtering and export: `order_date`, else `updated_at`.
    #[must_use]
    pub fn effective_date(&self) -> Option<&str> {
        self.order_date
            .as_deref()
            .or(self.updated_at.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// The effective date, parsed.
    #[must_use]
    pub fn effective_timestamp(&self) -> Option<Timestamp> {
        self.effective_date().and_then(Timestamp::parse)
    }

    /// Text matched by the product-type filter: the product type, or the
    /// product name when no type is recorded.
    #[must_use]
    pub fn product_label(&self) -> &str {
        if self.product_type.is_empty() {
            &self.product_name
        } else {
            &self.product_type
        }
    }
}

/// Full detail for one order, fetched when its row is expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub order_id: OrderId,
    pub order_number: String,
    pub platform: String,
    pub product_type: String,
    pub product_name: String,
    pub quantity: i64,
    pub status: String,
    pub order_date: Option<String>,
    pub updated_at: Option<String>,
    pub total_amount: Decimal,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub phone_number: Option<String>,
    /// Line items in upstream order.
    pub order_items: Vec<OrderItem>,
}

impl OrderDetails {
    /// Number of line items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.order_items.len()
    }

    /// The line item at `index`, if any.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&OrderItem> {
        self.order_items.get(index)
    }
}

/// A single line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub order_item_id: OrderItemId,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub total_price: Decimal,
    /// `None` when the upstream line carried no product information.
    pub product: Option<Product>,
    /// Opaque upstream payload, never interpreted.
    pub product_info: Option<serde_json::Value>,
}

/// Product information attached to a line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Explicit id, else the SKU, else the owning line item's id.
    pub product_id: ProductId,
    pub product_sku: String,
    pub category: String,
    pub product_name: String,
    /// `None` when absent upstream; `Some("")` is kept distinct.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
