use super::policy::EvictionPolicy;
use crate::dns::cache::record::CachedRecord;

pub struct LruPolicy;

impl EvictionPolicy for LruPolicy {
    fn compute_score(&self, record: &CachedRecord, _expires_ticks: u64) -> u64 {
        record.last_access()
    }
}
