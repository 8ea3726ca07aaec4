use crate::dns::cache::record::CachedRecord;

/// Scores a cache slot for eviction. Lower scores are evicted first.
///
/// `expires_ticks` is the slot's expiry on the same nanosecond scale as
/// `CachedRecord::last_access`, computed once by the caller.
pub trait EvictionPolicy: Send + Sync {
    fn compute_score(&self, record: &CachedRecord, expires_ticks: u64) -> u64;
}
