use relay_dns_application::events::{RelayEvent, RelayMetrics};
use relay_dns_application::ports::CacheStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{Instant, Interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const DEFAULT_INTERVAL_SECS: u64 = 60;
const TOP_RECORD_TYPES: usize = 5;

/// Drains the relay event stream into [`RelayMetrics`] and logs a summary
/// every `interval_secs`. An interval of zero keeps counting but never logs.
pub struct StatsReportJob {
    events: Mutex<mpsc::UnboundedReceiver<RelayEvent>>,
    metrics: RelayMetrics,
    cache: Option<Arc<dyn CacheStore>>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl StatsReportJob {
    pub fn new(events: mpsc::UnboundedReceiver<RelayEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            metrics: RelayMetrics::new(),
            cache: None,
            interval_secs: DEFAULT_INTERVAL_SECS,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// Adds cache size and eviction counters to each report.
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Shared handle to the counters this job fills.
    pub fn metrics(&self) -> RelayMetrics {
        self.metrics.clone()
    }

    pub async fn start(self: Arc<Self>) {
        info!(interval_secs = self.interval_secs, "Starting stats report job");

        let mut events = self.events.lock().await;
        let mut ticker = (self.interval_secs > 0).then(|| {
            let period = Duration::from_secs(self.interval_secs);
            tokio::time::interval_at(Instant::now() + period, period)
        });

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    self.report();
                    info!("StatsReportJob: shutting down");
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => {
                        debug!(kind = event.kind(), "Relay event");
                        self.metrics.track(&event);
                    }
                    None => {
                        self.report();
                        info!("StatsReportJob: event stream closed");
                        break;
                    }
                },
                _ = next_tick(&mut ticker) => self.report(),
            }
        }
    }

    fn report(&self) {
        if self.interval_secs == 0 {
            return;
        }

        let top_types = self
            .metrics
            .top_record_types(TOP_RECORD_TYPES)
            .iter()
            .map(|(rtype, count)| format!("{}={}", rtype, count))
            .collect::<Vec<_>>()
            .join(",");

        let cache = self
            .cache
            .as_ref()
            .map(|c| c.metrics_snapshot())
            .unwrap_or_default();

        info!(
            queries = self.metrics.total_queries(),
            cache_hits = self.metrics.cache_hits(),
            cache_misses = self.metrics.cache_misses(),
            hit_rate = %format!("{:.1}%", self.metrics.hit_rate() * 100.0),
            coalesced_joins = self.metrics.coalesced_joins(),
            upstream_failures = self.metrics.upstream_failures(),
            malformed = self.metrics.malformed(),
            cache_corruptions = self.metrics.cache_corruptions(),
            cache_entries = cache.total_entries,
            cache_evictions = cache.evictions,
            cache_expired = cache.expired_removals,
            top_types = %top_types,
            "Relay statistics"
        );
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
