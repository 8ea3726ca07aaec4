use crate::dns_answer::DnsAnswer;
use crate::query_key::QueryKey;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub key: QueryKey,
    pub answer: Arc<DnsAnswer>,
    pub inserted_at: Instant,
    pub expires_at: Instant,
}

impl CachedEntry {
    pub fn new(key: QueryKey, answer: Arc<DnsAnswer>, inserted_at: Instant, ttl: u32) -> Self {
        Self {
            key,
            answer,
            inserted_at,
            expires_at: inserted_at + Duration::from_secs(ttl as u64),
        }
    }

    /// Expired at or after `expires_at`.
    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Whole seconds since insertion; zero if `now` precedes insertion.
    #[inline]
    pub fn age_secs(&self, now: Instant) -> u32 {
        now.saturating_duration_since(self.inserted_at)
            .as_secs()
            .min(u32::MAX as u64) as u32
    }

    /// False when the entry cannot have come from a well-formed insert.
    pub fn is_consistent_with(&self, key: &QueryKey) -> bool {
        self.key == *key && self.expires_at >= self.inserted_at
    }
}
