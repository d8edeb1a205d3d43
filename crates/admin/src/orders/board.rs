//! Order board: the console's view-model over one order list.
//!
//! Owns the list snapshot, the active filter, pagination, row expansion and
//! the detail cache. Every method is safe to call concurrently; state is
//! guarded by a `tokio::sync::RwLock` that is never held across a network
//! call.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ops_console_core::{Order, OrderId, OrderItem};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

use super::details::{DetailCache, DetailOutcome};
use super::expansion::{ExpansionState, RowExpansion, Toggle};
use super::export::serialize_orders;
use super::normalize;
use super::view::{OrderFilter, Pagination, filter_orders};
use crate::orders_api::{ExportBlob, OrderSource, OrdersApiError};

/// One page of the filtered order list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageView {
    /// Rows on this page, in list order.
    pub rows: Vec<Order>,
    /// 1-based page number.
    pub page: usize,
    pub total_pages: usize,
    /// Size of the filtered list across all pages.
    pub filtered_count: usize,
}

/// Snapshot of the expanded row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionView {
    pub state: ExpansionState,
    /// Cached details of the open row; `None` while loading or if the fetch
    /// failed.
    pub details: DetailOutcome,
    /// Whether the open row's details are still being fetched.
    pub loading: bool,
    /// The order item selected by `item_index`.
    pub selected_item: Option<OrderItem>,
}

#[derive(Debug, Default)]
struct BoardState {
    orders: Vec<Order>,
    filter: OrderFilter,
    pagination: Pagination,
    expansion: RowExpansion,
}

impl BoardState {
    fn filtered(&self) -> Vec<&Order> {
        filter_orders(&self.orders, &self.filter)
    }

    fn on_current_page(&self, order_id: &OrderId) -> bool {
        let filtered = self.filtered();
        self.pagination
            .window(&filtered)
            .iter()
            .any(|o| o.order_id == *order_id)
    }
}

/// View-model for the order console.
pub struct OrderBoard<S> {
    source: Arc<S>,
    details: DetailCache<S>,
    state: RwLock<BoardState>,
    reload_generation: AtomicU64,
}

impl<S: OrderSource + 'static> OrderBoard<S> {
    /// Create an empty board using the order table's page size.
    #[must_use]
    pub fn new(source: Arc<S>) -> Self {
        Self::with_pagination(source, Pagination::default())
    }

    /// Create an empty board with custom pagination.
    #[must_use]
    pub fn with_pagination(source: Arc<S>, pagination: Pagination) -> Self {
        Self {
            details: DetailCache::new(Arc::clone(&source)),
            source,
            state: RwLock::new(BoardState {
                pagination,
                ..BoardState::default()
            }),
            reload_generation: AtomicU64::new(0),
        }
    }

    /// The detail cache backing row expansion.
    #[must_use]
    pub const fn details(&self) -> &DetailCache<S> {
        &self.details
    }

    /// Replace the order list from the source.
    ///
    /// A transport failure is logged and leaves an empty list. Returns the
    /// number of orders loaded.
    pub async fn reload(&self) -> usize {
        let generation = self.next_generation();
        let orders = match self.source.list_orders().await {
            Ok(raw) => normalize::orders_from_envelope(&raw),
            Err(e) => {
                error!(error = %e, "Failed to load orders");
                Vec::new()
            }
        };
        self.apply(generation, orders).await
    }

    /// Like [`reload`](Self::reload), but a transport failure is returned
    /// and the current list is kept.
    ///
    /// # Errors
    ///
    /// Returns the source's error if the list could not be fetched.
    pub async fn try_reload(&self) -> Result<usize, OrdersApiError> {
        let generation = self.next_generation();
        let raw = self.source.list_orders().await?;
        let orders = normalize::orders_from_envelope(&raw);
        Ok(self.apply(generation, orders).await)
    }

    fn next_generation(&self) -> u64 {
        self.reload_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install a freshly loaded list unless a newer reload has started.
    #[instrument(skip(self, orders), fields(count = orders.len()))]
    async fn apply(&self, generation: u64, orders: Vec<Order>) -> usize {
        let mut state = self.state.write().await;
        if self.reload_generation.load(Ordering::SeqCst) != generation {
            debug!("Discarding order list from a superseded reload");
            return state.orders.len();
        }

        let count = orders.len();
        state.orders = orders;
        state.pagination.reset();
        state.expansion.collapse();
        drop(state);

        self.details.clear().await;
        info!(count, "Order list loaded");
        count
    }

    /// The full, unfiltered order list.
    pub async fn orders(&self) -> Vec<Order> {
        self.state.read().await.orders.clone()
    }

    /// The active filter.
    pub async fn filter(&self) -> OrderFilter {
        self.state.read().await.filter.clone()
    }

    /// Replace the filter, returning to page 1 and collapsing any open row.
    pub async fn set_filter(&self, filter: OrderFilter) {
        let mut state = self.state.write().await;
        if state.filter == filter {
            return;
        }
        state.filter = filter;
        state.pagination.reset();
        state.expansion.collapse();
    }

    /// Clear every filter criterion.
    pub async fn reset_filters(&self) {
        self.set_filter(OrderFilter::default()).await;
    }

    /// All orders passing the active filter, ignoring pagination.
    pub async fn filtered(&self) -> Vec<Order> {
        self.state
            .read()
            .await
            .filtered()
            .into_iter()
            .cloned()
            .collect()
    }

    /// The current page of the filtered list.
    pub async fn page(&self) -> PageView {
        let state = self.state.read().await;
        let filtered = state.filtered();
        let total_pages = state.pagination.total_pages(filtered.len());

        PageView {
            rows: state
                .pagination
                .window(&filtered)
                .iter()
                .map(|o| (*o).clone())
                .collect(),
            page: state.pagination.current_page().min(total_pages),
            total_pages,
            filtered_count: filtered.len(),
        }
    }

    /// Go to `page`, clamped to the valid range. Returns the page shown.
    pub async fn set_page(&self, page: usize) -> usize {
        self.move_page(|pagination, count| pagination.set_page(page, count))
            .await
    }

    pub async fn next_page(&self) -> usize {
        self.move_page(Pagination::next).await
    }

    pub async fn prev_page(&self) -> usize {
        self.move_page(Pagination::prev).await
    }

    /// Move to the page showing `order_id` in the filtered list.
    ///
    /// Returns the page, or `None` if the filter excludes the order.
    pub async fn reveal(&self, order_id: &OrderId) -> Option<usize> {
        let page = {
            let state = self.state.read().await;
            let position = state
                .filtered()
                .iter()
                .position(|o| o.order_id == *order_id)?;
            position / state.pagination.page_size() + 1
        };
        Some(self.set_page(page).await)
    }

    async fn move_page<F>(&self, step: F) -> usize
    where
        F: FnOnce(&mut Pagination, usize) -> usize,
    {
        let mut state = self.state.write().await;
        let count = state.filtered().len();
        let before = state.pagination.current_page();
        let after = step(&mut state.pagination, count);
        if after != before {
            state.expansion.collapse();
        }
        after
    }

    /// Open or close the row for `order_id`.
    ///
    /// Opening loads the row's details first. If anything else changed the
    /// expansion while they were loading, the load still populates the cache
    /// but the row is not reopened. Rows outside the current page are
    /// ignored. Returns the resulting state.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn toggle(&self, order_id: &OrderId) -> ExpansionState {
        let ticket = {
            let mut state = self.state.write().await;
            if !state.on_current_page(order_id) {
                debug!("Ignoring toggle for a row not on the current page");
                return state.expansion.state().clone();
            }
            match state.expansion.begin_toggle(order_id) {
                Toggle::Collapsed => return state.expansion.state().clone(),
                Toggle::Expanding(ticket) => ticket,
            }
        };

        self.details.ensure_loaded(ticket.order_id()).await;

        let mut state = self.state.write().await;
        if !state.expansion.complete(&ticket) {
            debug!("Expansion changed while details loaded; not reopening");
        }
        state.expansion.state().clone()
    }

    /// Select the open row's next order item. `None` if no row is expanded.
    pub async fn next_item(&self) -> Option<usize> {
        let mut state = self.state.write().await;
        let count = self.open_item_count(state.expansion.state()).await?;
        state.expansion.next_item(count)
    }

    /// Select the open row's previous order item.
    pub async fn prev_item(&self) -> Option<usize> {
        let mut state = self.state.write().await;
        self.open_item_count(state.expansion.state()).await?;
        state.expansion.prev_item()
    }

    async fn open_item_count(&self, expansion: &ExpansionState) -> Option<usize> {
        let ExpansionState::Expanded { order_id, .. } = expansion else {
            return None;
        };
        Some(
            self.details
                .get(order_id)
                .await
                .map_or(0, |details| details.item_count()),
        )
    }

    /// The expansion state with its details, loading flag and selected item.
    pub async fn expansion(&self) -> ExpansionView {
        let state = self.state.read().await.expansion.state().clone();

        let (details, loading) = match state.order_id() {
            Some(order_id) => (
                self.details.get(order_id).await,
                self.details.is_loading(order_id),
            ),
            None => (None, false),
        };
        let selected_item = details
            .as_ref()
            .zip(state.item_index())
            .and_then(|(details, index)| details.item(index).cloned());

        ExpansionView {
            state,
            details,
            loading,
            selected_item,
        }
    }

    /// CSV of every order passing the active filter, across all pages.
    pub async fn export_csv(&self) -> String {
        let state = self.state.read().await;
        serialize_orders(state.filtered())
    }

    /// Fetch the server-generated bulk export.
    ///
    /// # Errors
    ///
    /// Returns the source's error if the download fails.
    #[instrument(skip(self))]
    pub async fn download_export(&self) -> Result<ExportBlob, OrdersApiError> {
        self.source.download_orders_export().await.inspect_err(|e| {
            error!(error = %e, "Orders export download failed");
        })
    }
}
