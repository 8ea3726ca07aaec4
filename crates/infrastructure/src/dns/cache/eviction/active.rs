use super::expiry::ExpiryPolicy;
use super::lru::LruPolicy;
use super::policy::EvictionPolicy;
use crate::dns::cache::record::CachedRecord;
use relay_dns_domain::config::EvictionStrategy;

/// Eviction policy selected at construction, dispatched by match.
pub enum ActiveEvictionPolicy {
    Lru(LruPolicy),
    Expiry(ExpiryPolicy),
}

impl ActiveEvictionPolicy {
    pub fn from_config(strategy: EvictionStrategy) -> Self {
        match strategy {
            EvictionStrategy::Lru => Self::Lru(LruPolicy),
            EvictionStrategy::Expiry => Self::Expiry(ExpiryPolicy),
        }
    }

    #[inline(always)]
    pub fn compute_score(&self, record: &CachedRecord, expires_ticks: u64) -> u64 {
        match self {
            Self::Lru(p) => p.compute_score(record, expires_ticks),
            Self::Expiry(p) => p.compute_score(record, expires_ticks),
        }
    }

    pub fn strategy(&self) -> EvictionStrategy {
        match self {
            Self::Lru(_) => EvictionStrategy::Lru,
            Self::Expiry(_) => EvictionStrategy::Expiry,
        }
    }
}
