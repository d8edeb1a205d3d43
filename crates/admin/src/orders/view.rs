//! Filtering and pagination of the order list.
//!
//! Filtering never reorders: the filtered view keeps the list's relative
//! order, and a page is a contiguous window of it.

use chrono::{Local, NaiveDate, TimeZone};
use ops_console_core::{Order, StatusFilter};
use serde::Serialize;

/// Rows per page in the order table.
pub const ORDER_TABLE_PAGE_SIZE: usize = 7;

/// Rows per page in the administrative list tables.
pub const ADMIN_TABLE_PAGE_SIZE: usize = 5;

/// Criteria applied to the order list.
///
/// `None` (or an empty string passed to a setter) disables a criterion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderFilter {
    /// Exact status, ignoring case.
    pub status: StatusFilter,
    /// Calendar day of the effective order date.
    pub date: Option<NaiveDate>,
    /// Exact platform, ignoring case.
    pub platform: Option<String>,
    /// Substring of the product type (or product name), ignoring case.
    pub product_type: Option<String>,
}

impl OrderFilter {
    /// A filter that keeps every order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status criterion.
    #[must_use]
    pub fn status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    /// Set the calendar-day criterion.
    #[must_use]
    pub const fn date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    /// Set the platform criterion.
    #[must_use]
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = non_blank(platform.into());
        self
    }

    /// Set the product-type criterion.
    #[must_use]
    pub fn product_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = non_blank(product_type.into());
        self
    }

    /// Whether no criterion is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_all()
            && self.date.is_none()
            && self.platform.is_none()
            && self.product_type.is_none()
    }

    /// Whether `order` passes, comparing dates in the local timezone.
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        self.matches_in(order, &Local)
    }

    /// Whether `order` passes, comparing dates in `tz`.
    #[must_use]
    pub fn matches_in<Tz: TimeZone>(&self, order: &Order, tz: &Tz) -> bool {
        if !self.status.matches(&order.status) {
            return false;
        }

        if let Some(date) = self.date {
            let order_day = order.effective_timestamp().map(|ts| ts.date_in(tz));
            if order_day != Some(date) {
                return false;
            }
        }

        let platform_ok = self
            .platform
            .as_ref()
            .is_none_or(|platform| platform.eq_ignore_ascii_case(&order.platform));

        let product_ok = self.product_type.as_ref().is_none_or(|needle| {
            order
                .product_label()
                .to_lowercase()
                .contains(&needle.to_lowercase())
        });

        platform_ok && product_ok
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Orders passing `filter`, in their original order (local timezone).
#[must_use]
pub fn filter_orders<'a>(orders: &'a [Order], filter: &OrderFilter) -> Vec<&'a Order> {
    filter_orders_in(orders, filter, &Local)
}

/// Orders passing `filter`, in their original order, comparing dates in `tz`.
#[must_use]
pub fn filter_orders_in<'a, Tz: TimeZone>(
    orders: &'a [Order],
    filter: &OrderFilter,
    tz: &Tz,
) -> Vec<&'a Order> {
    if filter.is_empty() {
        return orders.iter().collect();
    }
    orders.iter().filter(|o| filter.matches_in(o, tz)).collect()
}

/// Page position over a filtered list. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page_size: usize,
    current_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(ORDER_TABLE_PAGE_SIZE)
    }
}

impl Pagination {
    /// Start on page 1. A zero page size is treated as 1.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
        }
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub const fn current_page(&self) -> usize {
        self.current_page
    }

    /// Number of pages for `filtered_count` rows; never less than 1.
    #[must_use]
    pub fn total_pages(&self, filtered_count: usize) -> usize {
        filtered_count.div_ceil(self.page_size).max(1)
    }

    /// Move to `page`, clamped to `[1, total_pages]`. Returns the new page.
    pub fn set_page(&mut self, page: usize, filtered_count: usize) -> usize {
        self.current_page = page.clamp(1, self.total_pages(filtered_count));
        self.current_page
    }

    /// Advance one page; stays on the last page.
    pub fn next(&mut self, filtered_count: usize) -> usize {
        self.set_page(self.current_page.saturating_add(1), filtered_count)
    }

    /// Go back one page; stays on page 1.
    pub fn prev(&mut self, filtered_count: usize) -> usize {
        self.set_page(self.current_page.saturating_sub(1), filtered_count)
    }

    /// Back to page 1.
    pub const fn reset(&mut self) {
        self.current_page = 1;
    }

    /// The current page's slice of `items`.
    ///
    /// If the list shrank below the current page, the last page is shown.
    #[must_use]
    pub fn window<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let page = self.current_page.min(self.total_pages(items.len()));
        let start = (page - 1) * self.page_size;
        let end = start.saturating_add(self.page_size).min(items.len());
        items.get(start..end).unwrap_or(&[])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{FixedOffset, Utc};
    use rust_decimal::Decimal;

    use super::*;

    fn order(id: &str) -> Order {
        Order {
            order_id: id.into(),
            platform: "Shopee".to_string(),
            product_type: "eSIM".to_string(),
            product_name: "Japan 5GB".to_string(),
            status: "Created".to_string(),
            order_date: Some("2024-03-05T10:00:00Z".to_string()),
            total_amount: Decimal::ONE,
            ..Order::default()
        }
    }

    fn ids(orders: &[&Order]) -> Vec<String> {
        orders.iter().map(|o| o.order_id.to_string()).collect()
    }

    #[test]
    fn test_all_status_keeps_list_and_order() {
        let orders: Vec<Order> = ["c", "a", "b"].into_iter().map(order).collect();
        let filtered = filter_orders(&orders, &OrderFilter::new().status(StatusFilter::All));
        assert_eq!(ids(&filtered), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_status_is_case_insensitive() {
        let mut cancelled = order("2");
        cancelled.status = "CANCELLED".to_string();
        let orders = vec![order("1"), cancelled, order("3")];

        let filter = OrderFilter::new().status("cancelled".into());
        assert_eq!(ids(&filter_orders(&orders, &filter)), vec!["2"]);
    }

    #[test]
    fn test_platform_exact_match_ignoring_case() {
        let mut lazada = order("2");
        lazada.platform = "Lazada".to_string();
        let mut prefix = order("3");
        prefix.platform = "Shopee Mall".to_string();
        let orders = vec![order("1"), lazada, prefix];

        let filter = OrderFilter::new().platform("SHOPEE");
        assert_eq!(ids(&filter_orders(&orders, &filter)), vec!["1"]);
    }

    #[test]
    fn test_product_type_substring_falls_back_to_name() {
        let mut untyped = order("2");
        untyped.product_type = String::new();
        untyped.product_name = "Thailand eSIM 10GB".to_string();
        let mut other = order("3");
        other.product_type = "Voucher".to_string();
        let orders = vec![order("1"), untyped, other];

        let filter = OrderFilter::new().product_type("esi");
        assert_eq!(ids(&filter_orders(&orders, &filter)), vec!["1", "2"]);
    }

    #[test]
    fn test_date_uses_updated_at_fallback() {
        let mut undated = order("2");
        undated.order_date = None;
        undated.updated_at = Some("2024-03-06T01:00:00Z".to_string());
        let mut no_dates = order("3");
        no_dates.order_date = None;
        let orders = vec![order("1"), undated, no_dates];

        let filter = OrderFilter::new().date(NaiveDate::from_ymd_opt(2024, 3, 6));
        assert_eq!(ids(&filter_orders_in(&orders, &filter, &Utc)), vec!["2"]);
    }

    #[test]
    fn test_date_compares_in_viewer_timezone() {
        // 2024-03-05T20:00Z is already 2024-03-06 at UTC+8.
        let mut late = order("1");
        late.order_date = Some("2024-03-05T20:00:00Z".to_string());
        let orders = vec![late];
        let plus_eight = FixedOffset::east_opt(8 * 3600).unwrap();

        let march_6 = OrderFilter::new().date(NaiveDate::from_ymd_opt(2024, 3, 6));
        assert_eq!(filter_orders_in(&orders, &march_6, &plus_eight).len(), 1);
        assert!(filter_orders_in(&orders, &march_6, &Utc).is_empty());
    }

    #[test]
    fn test_blank_setters_disable_criteria() {
        let filter = OrderFilter::new().platform("  ").product_type("");
        assert!(filter.is_empty());
    }

    #[test]
    fn test_eight_orders_two_pages() {
        let orders: Vec<Order> = (1..=8).map(|i| order(&i.to_string())).collect();
        let mut pagination = Pagination::new(ORDER_TABLE_PAGE_SIZE);

        assert_eq!(pagination.total_pages(orders.len()), 2);
        assert_eq!(pagination.window(&orders).len(), 7);

        pagination.next(orders.len());
        let page_two = pagination.window(&orders);
        assert_eq!(page_two.len(), 1);
        assert_eq!(page_two.first().unwrap().order_id.as_str(), "8");
    }

    #[test]
    fn test_empty_list_has_one_page() {
        let mut pagination = Pagination::new(ORDER_TABLE_PAGE_SIZE);
        let empty: Vec<Order> = Vec::new();

        assert_eq!(pagination.total_pages(0), 1);
        assert_eq!(pagination.set_page(5, 0), 1);
        assert!(pagination.window(&empty).is_empty());
    }

    #[test]
    fn test_set_page_clamps_both_bounds() {
        let mut pagination = Pagination::new(ADMIN_TABLE_PAGE_SIZE);
        assert_eq!(pagination.set_page(0, 12), 1);
        assert_eq!(pagination.set_page(99, 12), 3);
        assert_eq!(pagination.next(12), 3);
        assert_eq!(pagination.prev(12), 2);
        pagination.reset();
        assert_eq!(pagination.prev(12), 1);
    }

    #[test]
    fn test_window_after_list_shrinks() {
        let orders: Vec<Order> = (1..=15).map(|i| order(&i.to_string())).collect();
        let mut pagination = Pagination::new(ORDER_TABLE_PAGE_SIZE);
        pagination.set_page(3, orders.len());

        let shorter = orders.get(..9).unwrap();
        let window = pagination.window(shorter);
        assert_eq!(window.len(), 2);
        assert_eq!(window.first().unwrap().order_id.as_str(), "8");
    }
}
