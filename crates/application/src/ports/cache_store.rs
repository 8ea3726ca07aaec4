use relay_dns_domain::{CachedEntry, DnsAnswer, DomainError, QueryKey};
use std::sync::Arc;
use std::time::Instant;

/// Snapshot of cache counters for reporting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheMetricsSnapshot {
    pub total_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub expired_removals: u64,
    pub corruptions: u64,
    pub hit_rate: f64,
}

/// TTL-aware answer store keyed by normalized question.
///
/// Implementations must be safe for concurrent lookups and inserts: a reader
/// sees either the previous entry for a key or the new one, never a mix.
pub trait CacheStore: Send + Sync {
    /// `Ok(None)` when nothing is stored or the entry expired at or before
    /// `now`. An entry that fails its consistency check is removed and
    /// reported as `Err(DomainError::CacheCorruption)`; callers treat that
    /// as a miss.
    fn lookup(&self, key: &QueryKey, now: Instant)
        -> Result<Option<Arc<CachedEntry>>, DomainError>;

    /// Stores `answer` under `key`, replacing any previous entry. Returns
    /// `None` when the answer is not cacheable (failure rcode, negative
    /// answer without SOA, zero TTL).
    fn insert(
        &self,
        key: QueryKey,
        answer: Arc<DnsAnswer>,
        now: Instant,
    ) -> Option<Arc<CachedEntry>>;

    fn remove(&self, key: &QueryKey) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn metrics_snapshot(&self) -> CacheMetricsSnapshot;
}
