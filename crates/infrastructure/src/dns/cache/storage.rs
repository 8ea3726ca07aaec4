use super::eviction::ActiveEvictionPolicy;
use super::{CacheMetrics, CachedRecord};
use dashmap::DashMap;
use relay_dns_application::ports::{CacheMetricsSnapshot, CacheStore};
use relay_dns_domain::config::{CacheConfig, EvictionStrategy};
use relay_dns_domain::{CachedEntry, DnsAnswer, DomainError, QueryKey};
use rustc_hash::FxBuildHasher;
use std::sync::atomic::Ordering as AtomicOrdering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

pub struct DnsCacheConfig {
    /// 0 disables the bound.
    pub max_entries: usize,
    pub min_ttl: u32,
    pub max_ttl: u32,
    pub eviction_strategy: EvictionStrategy,
    /// Entries scored per eviction. Higher values pick better victims at
    /// the cost of a longer scan.
    pub eviction_sample_size: usize,
}

impl From<&CacheConfig> for DnsCacheConfig {
    fn from(config: &CacheConfig) -> Self {
        Self {
            max_entries: config.max_entries,
            min_ttl: config.min_ttl,
            max_ttl: config.max_ttl,
            eviction_strategy: config.eviction_strategy,
            eviction_sample_size: config.eviction_sample_size,
        }
    }
}

impl Default for DnsCacheConfig {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

pub struct DnsCache {
    pub(super) cache: DashMap<QueryKey, CachedRecord, FxBuildHasher>,
    pub(super) max_entries: usize,
    pub(super) min_ttl: u32,
    pub(super) max_ttl: u32,
    pub(super) eviction_policy: ActiveEvictionPolicy,
    pub(super) eviction_sample_size: usize,
    pub(super) metrics: Arc<CacheMetrics>,
    /// Origin for the nanosecond ticks kept in `CachedRecord::last_access`.
    epoch: Instant,
}

impl DnsCache {
    pub fn new(config: DnsCacheConfig) -> Self {
        let eviction_policy = ActiveEvictionPolicy::from_config(config.eviction_strategy);

        info!(
            max_entries = config.max_entries,
            eviction_strategy = eviction_policy.strategy().as_str(),
            min_ttl = config.min_ttl,
            max_ttl = config.max_ttl,
            "Initializing DNS cache"
        );

        Self {
            cache: DashMap::with_hasher(FxBuildHasher),
            max_entries: config.max_entries,
            min_ttl: config.min_ttl,
            max_ttl: config.max_ttl.max(config.min_ttl),
            eviction_policy,
            eviction_sample_size: config.eviction_sample_size.max(1),
            metrics: Arc::new(CacheMetrics::default()),
            epoch: Instant::now(),
        }
    }

    #[inline]
    fn ticks(&self, at: Instant) -> u64 {
        at.saturating_duration_since(self.epoch)
            .as_nanos()
            .min(u64::MAX as u128) as u64
    }

    /// Applies the configured floor and ceiling. Zero stays zero.
    fn clamp_ttl(&self, ttl: u32) -> u32 {
        if ttl == 0 {
            return 0;
        }
        ttl.max(self.min_ttl).min(self.max_ttl)
    }

    fn is_full(&self) -> bool {
        self.max_entries > 0 && self.cache.len() >= self.max_entries
    }

    fn make_room(&self, now: Instant) {
        let purged = self.purge_expired(now);
        if purged > 0 {
            debug!(purged, "Purged expired entries before insert");
        }

        if self.is_full() {
            let excess = self.cache.len() + 1 - self.max_entries;
            self.evict_by_strategy(excess);
        }
    }

    fn purge_expired(&self, now: Instant) -> usize {
        let mut purged = 0usize;
        self.cache.retain(|_, record| {
            if record.entry.is_expired(now) {
                purged += 1;
                false
            } else {
                true
            }
        });

        if purged > 0 {
            self.metrics
                .expired_removals
                .fetch_add(purged as u64, AtomicOrdering::Relaxed);
        }
        purged
    }

    fn evict_by_strategy(&self, count: usize) {
        if self.cache.is_empty() || count == 0 {
            return;
        }

        let total_to_sample = count.saturating_mul(self.eviction_sample_size);
        let mut scored: Vec<(QueryKey, u64)> = Vec::with_capacity(total_to_sample);

        for entry in self.cache.iter().take(total_to_sample) {
            let record = entry.value();
            let expires_ticks = self.ticks(record.entry.expires_at);
            let score = self.eviction_policy.compute_score(record, expires_ticks);
            scored.push((entry.key().clone(), score));
        }
        // Iterator released; shard write locks are free again.

        scored.sort_unstable_by_key(|(_, score)| *score);

        let mut evicted = 0usize;
        for (key, _) in scored.into_iter().take(count) {
            if self.cache.remove(&key).is_some() {
                evicted += 1;
            }
        }

        if evicted > 0 {
            self.metrics
                .evictions
                .fetch_add(evicted as u64, AtomicOrdering::Relaxed);
            debug!(
                evicted,
                strategy = self.eviction_policy.strategy().as_str(),
                "Evicted cache entries"
            );
        }
    }
}

impl CacheStore for DnsCache {
    fn lookup(
        &self,
        key: &QueryKey,
        now: Instant,
    ) -> Result<Option<Arc<CachedEntry>>, DomainError> {
        let Some(record) = self.cache.get(key) else {
            CacheMetrics::bump(&self.metrics.misses);
            return Ok(None);
        };

        if !record.entry.is_consistent_with(key) {
            let stored = record.entry.key.clone();
            drop(record);
            self.cache.remove(key);
            CacheMetrics::bump(&self.metrics.corruptions);
            CacheMetrics::bump(&self.metrics.misses);
            warn!(key = %key, stored = %stored, "Discarded inconsistent cache entry");
            return Err(DomainError::CacheCorruption(format!(
                "entry for {} stored under {}",
                stored, key
            )));
        }

        if record.entry.is_expired(now) {
            drop(record);
            // A fresh entry may have replaced the expired one meanwhile.
            if self
                .cache
                .remove_if(key, |_, r| r.entry.is_expired(now))
                .is_some()
            {
                CacheMetrics::bump(&self.metrics.expired_removals);
            }
            CacheMetrics::bump(&self.metrics.misses);
            return Ok(None);
        }

        record.touch(self.ticks(now));
        CacheMetrics::bump(&self.metrics.hits);
        Ok(Some(Arc::clone(&record.entry)))
    }

    fn insert(
        &self,
        key: QueryKey,
        answer: Arc<DnsAnswer>,
        now: Instant,
    ) -> Option<Arc<CachedEntry>> {
        let Some(raw_ttl) = answer.cache_ttl() else {
            debug!(key = %key, rcode = %answer.rcode, "Answer not cacheable");
            return None;
        };

        let ttl = self.clamp_ttl(raw_ttl);
        if ttl == 0 {
            debug!(key = %key, "Zero TTL, not caching");
            return None;
        }

        if !self.cache.contains_key(&key) && self.is_full() {
            self.make_room(now);
        }

        let entry = Arc::new(CachedEntry::new(key.clone(), answer, now, ttl));
        let record = CachedRecord::new(Arc::clone(&entry), self.ticks(now));
        self.cache.insert(key, record);
        CacheMetrics::bump(&self.metrics.insertions);

        debug!(
            key = %entry.key,
            ttl,
            negative = entry.answer.is_negative(),
            "Inserted record into cache"
        );

        Some(entry)
    }

    fn remove(&self, key: &QueryKey) -> bool {
        self.cache.remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.cache.len()
    }

    fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            total_entries: self.cache.len(),
            hits: CacheMetrics::load(&self.metrics.hits),
            misses: CacheMetrics::load(&self.metrics.misses),
            insertions: CacheMetrics::load(&self.metrics.insertions),
            evictions: CacheMetrics::load(&self.metrics.evictions),
            expired_removals: CacheMetrics::load(&self.metrics.expired_removals),
            corruptions: CacheMetrics::load(&self.metrics.corruptions),
            hit_rate: self.metrics.hit_rate(),
        }
    }
}
