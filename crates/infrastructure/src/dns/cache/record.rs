use relay_dns_domain::CachedEntry;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

/// Slot stored in the cache map. The entry itself is immutable and shared
/// with readers; only the access stamp changes after insertion.
#[derive(Debug)]
pub struct CachedRecord {
    pub entry: Arc<CachedEntry>,
    /// Nanoseconds since the owning cache's epoch.
    pub last_access: AtomicU64,
}

impl CachedRecord {
    pub fn new(entry: Arc<CachedEntry>, now_ticks: u64) -> Self {
        Self {
            entry,
            last_access: AtomicU64::new(now_ticks),
        }
    }

    #[inline]
    pub fn touch(&self, now_ticks: u64) {
        self.last_access.fetch_max(now_ticks, AtomicOrdering::Relaxed);
    }

    #[inline]
    pub fn last_access(&self) -> u64 {
        self.last_access.load(AtomicOrdering::Relaxed)
    }
}
