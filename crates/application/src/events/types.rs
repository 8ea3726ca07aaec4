use relay_dns_domain::{DomainError, QueryKey};

/// Observable outcome of one step in handling an inbound query.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    CacheHit { key: QueryKey },
    CacheMiss { key: QueryKey },
    /// A caller attached to a fetch already in flight for its key.
    CoalescedJoin { key: QueryKey },
    UpstreamFailure { key: QueryKey, error: DomainError },
    Malformed { reason: String },
    CacheCorruption { key: QueryKey, reason: String },
}

impl RelayEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            RelayEvent::CacheHit { .. } => "cache_hit",
            RelayEvent::CacheMiss { .. } => "cache_miss",
            RelayEvent::CoalescedJoin { .. } => "coalesced_join",
            RelayEvent::UpstreamFailure { .. } => "upstream_failure",
            RelayEvent::Malformed { .. } => "malformed",
            RelayEvent::CacheCorruption { .. } => "cache_corruption",
        }
    }

    pub fn key(&self) -> Option<&QueryKey> {
        match self {
            RelayEvent::CacheHit { key }
            | RelayEvent::CacheMiss { key }
            | RelayEvent::CoalescedJoin { key }
            | RelayEvent::UpstreamFailure { key, .. }
            | RelayEvent::CacheCorruption { key, .. } => Some(key),
            RelayEvent::Malformed { .. } => None,
        }
    }
}
