use crate::cache::{CacheStats, RouteRequestKey};
use crate::error::RoutingError;
use crate::models::Coordinates;
use crate::services::oracle::{RouteOptions, RouteResult, RoutingOracle};
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

type MemoEntry = Result<Arc<Vec<RouteResult>>, RoutingError>;

/// Search-scoped memo in front of a routing oracle, backed by moka.
/// One instance lives for a single planning search and is then dropped.
/// All methods take `&self`; moka handles the synchronization.
pub struct MemoizedOracle {
    inner: Arc<dyn RoutingOracle>,
    answers: Cache<RouteRequestKey, MemoEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoizedOracle {
    pub fn new(inner: Arc<dyn RoutingOracle>, max_capacity: u64) -> Self {
        MemoizedOracle {
            inner,
            answers: Cache::builder().max_capacity(max_capacity).build(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Hits are memo answers; misses are real oracle calls.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl RoutingOracle for MemoizedOracle {
    async fn fetch_route_via(
        &self,
        waypoints: &[Coordinates],
        options: RouteOptions,
    ) -> Result<Vec<RouteResult>, RoutingError> {
        let key = RouteRequestKey::new(waypoints, options);

        if let Some(entry) = self.answers.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(waypoints = waypoints.len(), "Oracle memo hit");
            return entry.map(|routes| (*routes).clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let result = self.inner.fetch_route_via(waypoints, options).await;

        match &result {
            Ok(routes) => {
                self.answers.insert(key, Ok(Arc::new(routes.clone()))).await;
            }
            // Transient failures are worth asking again
            Err(e) if e.is_deterministic() => {
                self.answers.insert(key, Err(e.clone())).await;
            }
            Err(_) => {}
        }

        result
    }

    fn backend_name(&self) -> &'static str {
        self.inner.backend_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingOracle {
        calls: AtomicUsize,
        error: Option<RoutingError>,
    }

    impl CountingOracle {
        fn ok() -> Self {
            CountingOracle {
                calls: AtomicUsize::new(0),
                error: None,
            }
        }

        fn failing(error: RoutingError) -> Self {
            CountingOracle {
                calls: AtomicUsize::new(0),
                error: Some(error),
            }
        }
    }

    #[async_trait]
    impl RoutingOracle for CountingOracle {
        async fn fetch_route_via(
            &self,
            waypoints: &[Coordinates],
            _options: RouteOptions,
        ) -> Result<Vec<RouteResult>, RoutingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(ref e) = self.error {
                return Err(e.clone());
            }
            Ok(vec![RouteResult {
                distance_m: waypoints[0].distance_m(&waypoints[waypoints.len() - 1]),
                duration_s: 60.0,
                geometry: waypoints.to_vec(),
            }])
        }

        fn backend_name(&self) -> &'static str {
            "counting"
        }
    }

    fn points() -> (Coordinates, Coordinates) {
        (
            Coordinates::new(48.8566, 2.3522).unwrap(),
            Coordinates::new(48.8666, 2.3522).unwrap(),
        )
    }

    #[tokio::test]
    async fn repeated_request_hits_memo() {
        let inner = Arc::new(CountingOracle::ok());
        let memo = MemoizedOracle::new(inner.clone(), 100);
        let (a, b) = points();

        let first = memo.fetch_route(a, b, RouteOptions::single()).await.unwrap();
        let second = memo.fetch_route(a, b, RouteOptions::single()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(memo.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[tokio::test]
    async fn different_options_are_separate_entries() {
        let inner = Arc::new(CountingOracle::ok());
        let memo = MemoizedOracle::new(inner.clone(), 100);
        let (a, b) = points();

        memo.fetch_route(a, b, RouteOptions::single()).await.unwrap();
        memo.fetch_route(a, b, RouteOptions::with_alternatives(2))
            .await
            .unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_route_is_memoized() {
        let inner = Arc::new(CountingOracle::failing(RoutingError::NoRouteFound));
        let memo = MemoizedOracle::new(inner.clone(), 100);
        let (a, b) = points();

        for _ in 0..3 {
            let result = memo.fetch_route(a, b, RouteOptions::single()).await;
            assert_eq!(result.unwrap_err(), RoutingError::NoRouteFound);
        }
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_not_memoized() {
        let inner = Arc::new(CountingOracle::failing(RoutingError::RateLimited));
        let memo = MemoizedOracle::new(inner.clone(), 100);
        let (a, b) = points();

        for _ in 0..3 {
            assert!(memo.fetch_route(a, b, RouteOptions::single()).await.is_err());
        }
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(memo.backend_name(), "counting");
    }
}
