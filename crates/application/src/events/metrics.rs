use super::RelayEvent;
use dashmap::DashMap;
use relay_dns_domain::RecordType;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Running totals built from the relay event stream.
#[derive(Clone)]
pub struct RelayMetrics {
    cache_hits: Arc<AtomicU64>,
    cache_misses: Arc<AtomicU64>,
    coalesced_joins: Arc<AtomicU64>,
    upstream_failures: Arc<AtomicU64>,
    malformed: Arc<AtomicU64>,
    cache_corruptions: Arc<AtomicU64>,
    record_type_counts: Arc<DashMap<RecordType, u64, FxBuildHasher>>,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self {
            cache_hits: Arc::new(AtomicU64::new(0)),
            cache_misses: Arc::new(AtomicU64::new(0)),
            coalesced_joins: Arc::new(AtomicU64::new(0)),
            upstream_failures: Arc::new(AtomicU64::new(0)),
            malformed: Arc::new(AtomicU64::new(0)),
            cache_corruptions: Arc::new(AtomicU64::new(0)),
            record_type_counts: Arc::new(DashMap::with_hasher(FxBuildHasher)),
        }
    }

    pub fn track(&self, event: &RelayEvent) {
        let counter = match event {
            RelayEvent::CacheHit { .. } => &self.cache_hits,
            RelayEvent::CacheMiss { .. } => &self.cache_misses,
            RelayEvent::CoalescedJoin { .. } => &self.coalesced_joins,
            RelayEvent::UpstreamFailure { .. } => &self.upstream_failures,
            RelayEvent::Malformed { .. } => &self.malformed,
            RelayEvent::CacheCorruption { .. } => &self.cache_corruptions,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        // Each query produces exactly one hit or miss.
        if let RelayEvent::CacheHit { key } | RelayEvent::CacheMiss { key } = event {
            self.record_type_counts
                .entry(key.record_type)
                .and_modify(|c| *c += 1)
                .or_insert(1);
        }
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn coalesced_joins(&self) -> u64 {
        self.coalesced_joins.load(Ordering::Relaxed)
    }

    pub fn upstream_failures(&self) -> u64 {
        self.upstream_failures.load(Ordering::Relaxed)
    }

    pub fn malformed(&self) -> u64 {
        self.malformed.load(Ordering::Relaxed)
    }

    pub fn cache_corruptions(&self) -> u64 {
        self.cache_corruptions.load(Ordering::Relaxed)
    }

    pub fn total_queries(&self) -> u64 {
        self.cache_hits() + self.cache_misses()
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.total_queries();
        if total == 0 {
            return 0.0;
        }
        self.cache_hits() as f64 / total as f64
    }

    pub fn record_type_count(&self, record_type: RecordType) -> u64 {
        self.record_type_counts
            .get(&record_type)
            .map(|v| *v)
            .unwrap_or(0)
    }

    pub fn top_record_types(&self, n: usize) -> Vec<(RecordType, u64)> {
        let mut types: Vec<_> = self
            .record_type_counts
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();

        types.sort_by(|a, b| b.1.cmp(&a.1));
        types.truncate(n);
        types
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}
