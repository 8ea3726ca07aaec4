use dashmap::DashMap;
use relay_dns_domain::{DnsAnswer, DomainError, QueryKey};
use rustc_hash::FxBuildHasher;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

pub type FetchResult = Result<Arc<DnsAnswer>, DomainError>;

type InflightSender = Arc<watch::Sender<Option<FetchResult>>>;
type InflightMap = DashMap<QueryKey, InflightSender, FxBuildHasher>;

/// Removes the in-flight record when the fetch task finishes, however it
/// finishes. If it never published a result, waiters get `UpstreamAborted`.
struct InflightLeaderGuard {
    inflight: Arc<InflightMap>,
    key: QueryKey,
}

impl InflightLeaderGuard {
    fn complete(self, result: FetchResult) {
        if let Some((_, tx)) = self.inflight.remove(&self.key) {
            let _ = tx.send(Some(result));
        }
    }
}

impl Drop for InflightLeaderGuard {
    fn drop(&mut self) {
        if let Some((_, tx)) = self.inflight.remove(&self.key) {
            let _ = tx.send(Some(Err(DomainError::UpstreamAborted)));
        }
    }
}

/// Outcome of [`QueryCoalescer::resolve`] for one caller.
#[derive(Debug, Clone)]
pub struct Coalesced {
    pub result: FetchResult,
    /// True when this caller attached to a fetch someone else started.
    pub joined: bool,
}

/// Single-flight registry: at most one fetch per [`QueryKey`] runs at a time
/// and every caller that arrives while it runs receives its result.
pub struct QueryCoalescer {
    inflight: Arc<InflightMap>,
}

impl QueryCoalescer {
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(DashMap::with_hasher(FxBuildHasher)),
        }
    }

    /// Number of keys with a fetch currently running.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Runs `fetch` if no fetch for `key` is in flight, otherwise waits on
    /// the running one. `fetch` is only called by the caller that creates the
    /// in-flight record.
    ///
    /// The fetch runs as its own task, so dropping this future (the leader's
    /// included) never cancels a fetch other callers may be waiting on.
    pub async fn resolve<F, Fut>(&self, key: QueryKey, fetch: F) -> Coalesced
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult> + Send + 'static,
    {
        let (is_leader, rx) = self.register_or_join_inflight(&key);

        if is_leader {
            debug!(key = %key, "Starting upstream fetch");
            let guard = InflightLeaderGuard {
                inflight: Arc::clone(&self.inflight),
                key,
            };
            let fut = fetch();
            tokio::spawn(async move {
                let result = fut.await;
                guard.complete(result);
            });
        } else {
            debug!(key = %key, "Joining in-flight fetch");
        }

        Coalesced {
            result: wait_for_result(rx).await,
            joined: !is_leader,
        }
    }

    fn register_or_join_inflight(
        &self,
        key: &QueryKey,
    ) -> (bool, watch::Receiver<Option<FetchResult>>) {
        match self.inflight.entry(key.clone()) {
            dashmap::Entry::Occupied(e) => {
                let rx = e.get().subscribe();
                drop(e);
                (false, rx)
            }
            dashmap::Entry::Vacant(e) => {
                let (tx, rx) = watch::channel(None::<FetchResult>);
                e.insert(Arc::new(tx));
                (true, rx)
            }
        }
    }
}

impl Default for QueryCoalescer {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_result(mut rx: watch::Receiver<Option<FetchResult>>) -> FetchResult {
    loop {
        if let Some(result) = rx.borrow_and_update().clone() {
            return result;
        }
        if rx.changed().await.is_err() {
            return rx
                .borrow()
                .clone()
                .unwrap_or(Err(DomainError::UpstreamAborted));
        }
    }
}
