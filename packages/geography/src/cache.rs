//! Per-parent geography list cache with coalescing fetches.
//!
//! Every dashboard screen reads District/Block/GP lists through a
//! [`GeoCache`]. Rapid hover events can request the same list many
//! times while a fetch is still outstanding; the cache keeps one
//! in-flight future per [`FetchKey`] and hands the same future to every
//! concurrent caller, so a second network request for the same key is
//! never issued. Results are whole-list replacements; there is no
//! incremental merging.
//!
//! Failure policy: a failed fetch clears the cached list for its key,
//! records the error message (observable via [`GeoCache::error_for`]),
//! logs it, and yields an empty list. Screens keep rendering.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::FutureExt as _;
use futures::future::{BoxFuture, Shared};
use swachh_monitor_geography_models::{GeoId, GeographyNode};

use crate::{GeoError, GeographyApi};

/// Identifies one cacheable fetch: the operation plus its parent ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKey {
    /// The district list (no parent).
    Districts,
    /// The block list of one district.
    Blocks {
        /// Parent district.
        district_id: GeoId,
    },
    /// The GP list of one block.
    Gps {
        /// Grandparent district.
        district_id: GeoId,
        /// Parent block.
        block_id: GeoId,
    },
}

impl FetchKey {
    /// Returns `true` for keys below the district level.
    #[must_use]
    const fn is_child_level(self) -> bool {
        !matches!(self, Self::Districts)
    }
}

type FetchOutcome = Arc<Result<Vec<GeographyNode>, GeoError>>;
type SharedFetch = Shared<BoxFuture<'static, FetchOutcome>>;

#[derive(Default)]
struct Inner {
    lists: HashMap<FetchKey, Vec<GeographyNode>>,
    errors: HashMap<FetchKey, String>,
    in_flight: HashMap<FetchKey, SharedFetch>,
}

/// Shared cache of administrative hierarchy lists.
///
/// Cheap to clone; clones share the same state. Lists are cached for
/// the cache's lifetime and only replaced when a consumer fetches
/// again; staleness between fetches is an accepted trade-off.
pub struct GeoCache<A> {
    api: Arc<A>,
    inner: Arc<Mutex<Inner>>,
}

impl<A> Clone for GeoCache<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> GeoCache<A>
where
    A: GeographyApi + 'static,
{
    /// Creates an empty cache backed by the given API.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api: Arc::new(api),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Issues a fetch for `key`, coalescing with any in-flight fetch
    /// for the same key, and returns the resulting list (empty on
    /// failure).
    pub async fn fetch(&self, key: FetchKey) -> Vec<GeographyNode> {
        let shared = {
            let mut inner = self
                .inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            if let Some(existing) = inner.in_flight.get(&key) {
                log::debug!("Coalescing geography fetch for {key:?}");
                existing.clone()
            } else {
                let fut = Self::run_fetch(Arc::clone(&self.api), Arc::clone(&self.inner), key)
                    .boxed()
                    .shared();
                inner.in_flight.insert(key, fut.clone());
                fut
            }
        };

        match shared.await.as_ref() {
            Ok(list) => list.clone(),
            Err(_) => Vec::new(),
        }
    }

    /// Returns the cached list for `key`, fetching it first if absent.
    pub async fn ensure(&self, key: FetchKey) -> Vec<GeographyNode> {
        if let Some(cached) = self.cached(key) {
            return cached;
        }
        self.fetch(key).await
    }

    /// Performs the network call for `key` and applies the result to
    /// the cache. Runs inside the shared in-flight future.
    async fn run_fetch(api: Arc<A>, inner: Arc<Mutex<Inner>>, key: FetchKey) -> FetchOutcome {
        let result = match key {
            FetchKey::Districts => api.districts().await,
            FetchKey::Blocks { district_id } => api.blocks(district_id).await,
            FetchKey::Gps {
                district_id,
                block_id,
            } => api.gps(district_id, block_id).await,
        };

        let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.in_flight.remove(&key);

        match result {
            Ok(list) => {
                inner.errors.remove(&key);
                inner.lists.insert(key, list.clone());
                Arc::new(Ok(list))
            }
            Err(e) => {
                log::error!("Geography fetch failed for {key:?}: {e}");
                inner.lists.remove(&key);
                inner.errors.insert(key, e.to_string());
                Arc::new(Err(e))
            }
        }
    }

    /// Fetches the district list.
    pub async fn fetch_districts(&self) -> Vec<GeographyNode> {
        self.fetch(FetchKey::Districts).await
    }

    /// Fetches the blocks of `district_id`. A missing parent id
    /// short-circuits to an empty list without touching the network.
    pub async fn fetch_blocks(&self, district_id: Option<GeoId>) -> Vec<GeographyNode> {
        let Some(district_id) = district_id else {
            return Vec::new();
        };
        self.fetch(FetchKey::Blocks { district_id }).await
    }

    /// Fetches the GPs of `block_id`. Both parent ids are required,
    /// otherwise this short-circuits to an empty list.
    pub async fn fetch_gps(
        &self,
        district_id: Option<GeoId>,
        block_id: Option<GeoId>,
    ) -> Vec<GeographyNode> {
        let (Some(district_id), Some(block_id)) = (district_id, block_id) else {
            return Vec::new();
        };
        self.fetch(FetchKey::Gps {
            district_id,
            block_id,
        })
        .await
    }

    /// Cache-first variant of [`fetch_districts`](Self::fetch_districts).
    pub async fn ensure_districts(&self) -> Vec<GeographyNode> {
        self.ensure(FetchKey::Districts).await
    }

    /// Cache-first variant of [`fetch_blocks`](Self::fetch_blocks).
    pub async fn ensure_blocks(&self, district_id: Option<GeoId>) -> Vec<GeographyNode> {
        let Some(district_id) = district_id else {
            return Vec::new();
        };
        self.ensure(FetchKey::Blocks { district_id }).await
    }

    /// Cache-first variant of [`fetch_gps`](Self::fetch_gps).
    pub async fn ensure_gps(
        &self,
        district_id: Option<GeoId>,
        block_id: Option<GeoId>,
    ) -> Vec<GeographyNode> {
        let (Some(district_id), Some(block_id)) = (district_id, block_id) else {
            return Vec::new();
        };
        self.ensure(FetchKey::Gps {
            district_id,
            block_id,
        })
        .await
    }

    /// Returns a reference to the backing API.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Returns the cached list for `key`, if any.
    #[must_use]
    pub fn cached(&self, key: FetchKey) -> Option<Vec<GeographyNode>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .lists
            .get(&key)
            .cloned()
    }

    /// Returns the recorded error message for `key`, if the last fetch
    /// for it failed.
    #[must_use]
    pub fn error_for(&self, key: FetchKey) -> Option<String> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .errors
            .get(&key)
            .cloned()
    }

    /// Returns `true` while a fetch for `key` is outstanding.
    #[must_use]
    pub fn is_in_flight(&self, key: FetchKey) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_flight
            .contains_key(&key)
    }

    /// Drops all cached Block and GP lists (and their error records).
    ///
    /// Called when the scope returns to the state root, where child
    /// lists are meaningless. The district list is kept.
    pub fn clear_children(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.lists.retain(|key, _| !key.is_child_level());
        inner.errors.retain(|key, _| !key.is_child_level());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;

    /// Mock API that counts network calls and can be told to fail.
    struct MockApi {
        calls: AtomicU32,
        fail: bool,
    }

    impl MockApi {
        fn new(fail: bool) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail,
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        async fn respond(&self, list: Vec<GeographyNode>) -> Result<Vec<GeographyNode>, GeoError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Hold the request open long enough for a second caller to
            // arrive while this one is still in flight.
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                Err(GeoError::Conversion {
                    message: "backend unavailable".to_owned(),
                })
            } else {
                Ok(list)
            }
        }
    }

    impl GeographyApi for MockApi {
        async fn districts(&self) -> Result<Vec<GeographyNode>, GeoError> {
            self.respond(vec![GeographyNode::district(1, "Ajmer".to_owned())])
                .await
        }

        async fn blocks(&self, district_id: GeoId) -> Result<Vec<GeographyNode>, GeoError> {
            self.respond(vec![GeographyNode::block(
                10,
                "Beawar".to_owned(),
                district_id,
            )])
            .await
        }

        async fn gps(
            &self,
            _district_id: GeoId,
            block_id: GeoId,
        ) -> Result<Vec<GeographyNode>, GeoError> {
            self.respond(vec![GeographyNode::gp(100, "Jawaja".to_owned(), block_id)])
                .await
        }
    }

    #[tokio::test]
    async fn concurrent_fetches_coalesce_into_one_request() {
        let cache = GeoCache::new(MockApi::new(false));

        let (a, b) = tokio::join!(cache.fetch_blocks(Some(1)), cache.fetch_blocks(Some(1)));

        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
        assert_eq!(cache.api.call_count(), 1);
        assert!(!cache.is_in_flight(FetchKey::Blocks { district_id: 1 }));
    }

    #[tokio::test]
    async fn distinct_parents_fetch_independently() {
        let cache = GeoCache::new(MockApi::new(false));

        let (a, b) = tokio::join!(cache.fetch_blocks(Some(1)), cache.fetch_blocks(Some(2)));

        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(cache.api.call_count(), 2);
    }

    #[tokio::test]
    async fn missing_parent_short_circuits() {
        let cache = GeoCache::new(MockApi::new(false));

        assert!(cache.fetch_blocks(None).await.is_empty());
        assert!(cache.fetch_gps(Some(1), None).await.is_empty());
        assert!(cache.fetch_gps(None, Some(10)).await.is_empty());
        assert_eq!(cache.api.call_count(), 0);
    }

    #[tokio::test]
    async fn failure_clears_cache_and_records_error() {
        let key = FetchKey::Blocks { district_id: 1 };

        let ok_cache = GeoCache::new(MockApi::new(false));
        let list = ok_cache.fetch_blocks(Some(1)).await;
        assert_eq!(list.len(), 1);
        assert_eq!(ok_cache.cached(key).as_deref(), Some(&list[..]));

        let failing = GeoCache::new(MockApi::new(true));
        let list = failing.fetch_blocks(Some(1)).await;
        assert!(list.is_empty());
        assert_eq!(failing.cached(key), None);
        let message = failing.error_for(key).expect("error should be recorded");
        assert!(message.contains("backend unavailable"));
    }

    #[tokio::test]
    async fn ensure_serves_from_cache() {
        let cache = GeoCache::new(MockApi::new(false));

        let first = cache.ensure_blocks(Some(1)).await;
        let second = cache.ensure_blocks(Some(1)).await;

        assert_eq!(first, second);
        assert_eq!(cache.api.call_count(), 1);
    }

    #[tokio::test]
    async fn fetch_refreshes_even_when_cached() {
        let cache = GeoCache::new(MockApi::new(false));

        cache.fetch_blocks(Some(1)).await;
        cache.fetch_blocks(Some(1)).await;

        assert_eq!(cache.api.call_count(), 2);
    }

    #[tokio::test]
    async fn clear_children_keeps_districts() {
        let cache = GeoCache::new(MockApi::new(false));

        cache.fetch_districts().await;
        cache.fetch_blocks(Some(1)).await;
        cache.fetch_gps(Some(1), Some(10)).await;

        cache.clear_children();

        assert!(cache.cached(FetchKey::Districts).is_some());
        assert_eq!(cache.cached(FetchKey::Blocks { district_id: 1 }), None);
        assert_eq!(
            cache.cached(FetchKey::Gps {
                district_id: 1,
                block_id: 10
            }),
            None
        );
    }
}
