//! Lazy, single-flight cache of order details.
//!
//! Details are fetched the first time a row is expanded and then reused for
//! the lifetime of the current order list. At most one fetch per order id is
//! in flight: concurrent callers for the same id share the first caller's
//! result via `moka`'s `get_with` coalescing.
//!
//! Fetches run on their own task, so a caller that stops waiting (a collapsed
//! row, a reloaded list) does not abort the request; its outcome still lands in
//! the cache. A failed fetch is cached as `None` and is not retried until the
//! cache is cleared.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use moka::future::Cache;
use ops_console_core::{OrderDetails, OrderId};
use tracing::{debug, error, instrument, warn};

use super::normalize;
use crate::orders_api::OrderSource;

/// Cached fetch outcome: `None` means the fetch failed or returned no data.
pub type DetailOutcome = Option<Arc<OrderDetails>>;

/// What the cache knows about one order id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailState {
    /// Never requested (or cleared since).
    Absent,
    /// A fetch is in flight.
    Loading,
    /// A fetch completed.
    Loaded(DetailOutcome),
}

/// Per-order-id cache of normalized [`OrderDetails`].
pub struct DetailCache<S> {
    inner: Arc<DetailCacheInner<S>>,
}

struct DetailCacheInner<S> {
    source: Arc<S>,
    entries: Cache<OrderId, DetailOutcome>,
    loading: Mutex<HashSet<OrderId>>,
}

impl<S> Clone for DetailCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: OrderSource + 'static> DetailCache<S> {
    /// Create an empty cache reading from `source`.
    #[must_use]
    pub fn new(source: Arc<S>) -> Self {
        // No TTL and no capacity bound: entries live until `clear`.
        let entries = Cache::builder().build();

        Self {
            inner: Arc::new(DetailCacheInner {
                source,
                entries,
                loading: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Make sure details for `order_id` are loaded, fetching them if needed.
    ///
    /// Returns immediately on a cache hit (including a cached `None`). If a
    /// fetch for the same id is already in flight, waits for it instead of
    /// issuing another.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn ensure_loaded(&self, order_id: &OrderId) -> DetailOutcome {
        if let Some(outcome) = self.inner.entries.get(order_id).await {
            debug!("Detail cache hit");
            return outcome;
        }

        let cache = self.clone();
        let key = order_id.clone();
        let task = tokio::spawn(async move {
            let loader = cache.clone();
            let id = key.clone();
            let outcome = cache
                .inner
                .entries
                .get_with(key.clone(), async move { loader.load(&id).await })
                .await;
            // Cleared only once the outcome is stored, so `peek` never sees
            // a gap between Loading and Loaded.
            cache.set_loading(&key, false);
            outcome
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Order details loader task failed");
                None
            }
        }
    }

    /// Fetch and normalize details; runs at most once per id at a time.
    ///
    /// Sets the loading flag; the caller clears it.
    async fn load(&self, order_id: &OrderId) -> DetailOutcome {
        self.set_loading(order_id, true);

        match self.inner.source.fetch_order_detail(order_id).await {
            Ok(raw) => {
                let Some(mut details) = normalize::details_from_envelope(&raw) else {
                    debug!(order_id = %order_id, "Order details response had no data");
                    return None;
                };
                if details.order_id != *order_id {
                    if !details.order_id.is_empty() {
                        warn!(
                            order_id = %order_id,
                            reported = %details.order_id,
                            "Order details reported a different orderId"
                        );
                    }
                    details.order_id = order_id.clone();
                }
                Some(Arc::new(details))
            }
            Err(e) => {
                error!(order_id = %order_id, error = %e, "Order details fetch failed");
                None
            }
        }
    }

    /// Whether a fetch for `order_id` is in flight.
    #[must_use]
    pub fn is_loading(&self, order_id: &OrderId) -> bool {
        self.inner
            .loading
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(order_id)
    }

    /// Current state for `order_id`, without triggering a fetch.
    pub async fn peek(&self, order_id: &OrderId) -> DetailState {
        if let Some(outcome) = self.inner.entries.get(order_id).await {
            return DetailState::Loaded(outcome);
        }
        if self.is_loading(order_id) {
            DetailState::Loading
        } else {
            DetailState::Absent
        }
    }

    /// Cached details for `order_id`, if a fetch completed successfully.
    pub async fn get(&self, order_id: &OrderId) -> DetailOutcome {
        self.inner.entries.get(order_id).await.flatten()
    }

    /// Drop every cached entry.
    ///
    /// Fetches already in flight are not aborted; their results are cached
    /// when they arrive.
    pub async fn clear(&self) {
        self.inner.entries.invalidate_all();
        self.inner.entries.run_pending_tasks().await;
    }

    fn set_loading(&self, order_id: &OrderId, loading: bool) {
        let mut set = self
            .inner
            .loading
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if loading {
            set.insert(order_id.clone());
        } else {
            set.remove(order_id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::orders::test_support::{FakeSource, detail_json};

    fn cache_over(source: FakeSource) -> (Arc<FakeSource>, DetailCache<FakeSource>) {
        let source = Arc::new(source);
        (Arc::clone(&source), DetailCache::new(source))
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let (source, cache) = cache_over(
            FakeSource::new()
                .with_delay(Duration::from_millis(30))
                .with_detail("A", detail_json("A", 2)),
        );
        let id = OrderId::new("A");

        let (first, second) = tokio::join!(cache.ensure_loaded(&id), cache.ensure_loaded(&id));

        assert_eq!(source.detail_calls("A"), 1);
        assert_eq!(first.unwrap().item_count(), 2);
        assert_eq!(second.unwrap().item_count(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_fetch() {
        let (source, cache) = cache_over(FakeSource::new().with_detail("A", detail_json("A", 1)));
        let id = OrderId::new("A");

        cache.ensure_loaded(&id).await.unwrap();
        cache.ensure_loaded(&id).await.unwrap();

        assert_eq!(source.detail_calls("A"), 1);
        assert!(cache.get(&id).await.is_some());
    }

    #[tokio::test]
    async fn test_failed_fetch_is_cached_and_not_retried() {
        let (source, cache) = cache_over(FakeSource::new());
        let id = OrderId::new("missing");

        assert!(cache.ensure_loaded(&id).await.is_none());
        assert!(cache.ensure_loaded(&id).await.is_none());

        assert_eq!(source.detail_calls("missing"), 1);
        assert_eq!(cache.peek(&id).await, DetailState::Loaded(None));
        assert!(!cache.is_loading(&id));
    }

    #[tokio::test]
    async fn test_null_data_is_cached_as_none() {
        let (_, cache) = cache_over(FakeSource::new().with_detail("A", serde_json::Value::Null));
        let id = OrderId::new("A");

        assert!(cache.ensure_loaded(&id).await.is_none());
        assert_eq!(cache.peek(&id).await, DetailState::Loaded(None));
    }

    #[tokio::test]
    async fn test_loading_flag_tracks_fetch() {
        let (_, cache) = cache_over(
            FakeSource::new()
                .with_delay(Duration::from_millis(50))
                .with_detail("A", detail_json("A", 1)),
        );
        let id = OrderId::new("A");
        assert_eq!(cache.peek(&id).await, DetailState::Absent);

        let background = cache.clone();
        let key = id.clone();
        let handle = tokio::spawn(async move { background.ensure_loaded(&key).await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.is_loading(&id));
        assert_eq!(cache.peek(&id).await, DetailState::Loading);

        handle.await.unwrap().unwrap();
        assert!(!cache.is_loading(&id));
        assert!(matches!(cache.peek(&id).await, DetailState::Loaded(Some(_))));
    }

    #[tokio::test]
    async fn test_abandoned_caller_still_populates_cache() {
        let (source, cache) = cache_over(
            FakeSource::new()
                .with_delay(Duration::from_millis(40))
                .with_detail("A", detail_json("A", 1)),
        );
        let id = OrderId::new("A");

        let waited =
            tokio::time::timeout(Duration::from_millis(5), cache.ensure_loaded(&id)).await;
        assert!(waited.is_err());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(matches!(cache.peek(&id).await, DetailState::Loaded(Some(_))));

        cache.ensure_loaded(&id).await.unwrap();
        assert_eq!(source.detail_calls("A"), 1);
    }

    #[tokio::test]
    async fn test_detail_order_id_follows_cache_key() {
        let (_, cache) = cache_over(
            FakeSource::new().with_detail("A", json!({ "orderId": "B", "orderItems": [] })),
        );

        let details = cache.ensure_loaded(&OrderId::new("A")).await.unwrap();
        assert_eq!(details.order_id.as_str(), "A");
    }

    #[tokio::test]
    async fn test_clear_forces_refetch() {
        let (source, cache) = cache_over(FakeSource::new().with_detail("A", detail_json("A", 1)));
        let id = OrderId::new("A");

        cache.ensure_loaded(&id).await.unwrap();
        cache.clear().await;
        assert_eq!(cache.peek(&id).await, DetailState::Absent);

        cache.ensure_loaded(&id).await.unwrap();
        assert_eq!(source.detail_calls("A"), 2);
    }
}
