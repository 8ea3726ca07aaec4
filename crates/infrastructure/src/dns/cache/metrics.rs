use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

// align(64) keeps `hits` and `misses` on their own cache line, away from
// the colder counters touched only by inserts and evictions.
#[derive(Default)]
#[repr(align(64))]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    _hot_pad: [u64; 6],

    pub insertions: AtomicU64,
    pub evictions: AtomicU64,
    pub expired_removals: AtomicU64,
    pub corruptions: AtomicU64,
}

impl CacheMetrics {
    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, AtomicOrdering::Relaxed);
    }

    pub fn load(counter: &AtomicU64) -> u64 {
        counter.load(AtomicOrdering::Relaxed)
    }

    /// Percentage of lookups served from the cache.
    pub fn hit_rate(&self) -> f64 {
        let hits = Self::load(&self.hits) as f64;
        let total = hits + Self::load(&self.misses) as f64;

        if total > 0.0 {
            (hits / total) * 100.0
        } else {
            0.0
        }
    }
}
