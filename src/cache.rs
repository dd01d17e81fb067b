// Read-through cache for full-sheet snapshots.
// One slot, time-based expiry, explicit invalidation after writes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

/// Default snapshot lifetime: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

struct Slot<T> {
    snapshot: Arc<Vec<T>>,
    expires_at: Instant,
}

struct CacheState<T> {
    slot: Option<Slot<T>>,
    /// Bumped by every invalidation.
    generation: u64,
}

/// Holds the most recent snapshot of all rows. Snapshots are never patched;
/// a write discards the whole snapshot.
pub struct SnapshotCache<T> {
    ttl: Duration,
    state: RwLock<CacheState<T>>,
}

impl<T> SnapshotCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(CacheState {
                slot: None,
                generation: 0,
            }),
        }
    }

    /// Returns the cached snapshot if it has not expired, otherwise runs
    /// `fetch` and caches its result. Fetch errors are returned as-is and
    /// leave the cache empty.
    ///
    /// A snapshot whose fetch started before an [`invalidate`](Self::invalidate)
    /// is handed to its caller but not stored.
    pub async fn get_or_fetch<F, Fut, E>(&self, fetch: F) -> Result<Arc<Vec<T>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let generation = {
            let state = self.state.read().await;
            if let Some(slot) = &state.slot {
                if Instant::now() < slot.expires_at {
                    tracing::debug!("Snapshot cache hit ({} rows)", slot.snapshot.len());
                    return Ok(slot.snapshot.clone());
                }
            }
            state.generation
        };

        tracing::debug!("Snapshot cache miss, fetching");
        let snapshot = Arc::new(fetch().await?);

        let mut state = self.state.write().await;
        if state.generation == generation {
            state.slot = Some(Slot {
                snapshot: snapshot.clone(),
                expires_at: Instant::now() + self.ttl,
            });
        } else {
            tracing::debug!("Snapshot invalidated during fetch, not caching it");
        }

        Ok(snapshot)
    }

    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.slot = None;
        state.generation += 1;
    }
}

impl<T> Default for SnapshotCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn fetch_counted(counter: &AtomicUsize) -> Result<Vec<usize>, String> {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(vec![n])
    }

    #[tokio::test(start_paused = true)]
    async fn serves_snapshot_until_ttl_elapses() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        let fetches = AtomicUsize::new(0);

        let first = cache.get_or_fetch(|| fetch_counted(&fetches)).await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        let second = cache.get_or_fetch(|| fetch_counted(&fetches)).await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));

        tokio::time::advance(Duration::from_secs(1)).await;
        let third = cache.get_or_fetch(|| fetch_counted(&fetches)).await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(*third, vec![2]);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = SnapshotCache::default();
        let fetches = AtomicUsize::new(0);

        cache.get_or_fetch(|| fetch_counted(&fetches)).await.unwrap();
        cache.invalidate().await;
        let snapshot = cache.get_or_fetch(|| fetch_counted(&fetches)).await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
        assert_eq!(*snapshot, vec![2]);
    }

    #[tokio::test]
    async fn fetch_errors_are_not_cached() {
        let cache: SnapshotCache<usize> = SnapshotCache::default();

        let err = cache
            .get_or_fetch(|| async { Err::<Vec<usize>, _>("backend down") })
            .await
            .unwrap_err();
        assert_eq!(err, "backend down");

        let snapshot = cache
            .get_or_fetch(|| async { Ok::<_, &str>(vec![7]) })
            .await
            .unwrap();
        assert_eq!(*snapshot, vec![7]);
    }

    #[tokio::test]
    async fn snapshot_fetched_across_invalidation_is_not_stored() {
        let cache = SnapshotCache::default();
        let fetches = AtomicUsize::new(0);

        let stale = cache
            .get_or_fetch(|| async {
                cache.invalidate().await;
                Ok::<_, String>(vec![0])
            })
            .await
            .unwrap();
        assert_eq!(*stale, vec![0]);

        let fresh = cache.get_or_fetch(|| fetch_counted(&fetches)).await.unwrap();
        assert_eq!(*fresh, vec![1]);
    }

    #[tokio::test]
    async fn holds_values_that_are_not_send() {
        let cache: SnapshotCache<std::rc::Rc<u8>> = SnapshotCache::default();

        let snapshot = cache
            .get_or_fetch(|| async { Ok::<_, ()>(vec![std::rc::Rc::new(4)]) })
            .await
            .unwrap();
        assert_eq!(*snapshot[0], 4);
    }
}
