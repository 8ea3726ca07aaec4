use super::policy::EvictionPolicy;
use crate::dns::cache::record::CachedRecord;

/// Evicts the entry with the least remaining lifetime.
pub struct ExpiryPolicy;

impl EvictionPolicy for ExpiryPolicy {
    fn compute_score(&self, _record: &CachedRecord, expires_ticks: u64) -> u64 {
        expires_ticks
    }
}
