use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EvictionStrategy {
    /// Least recently read entry goes first.
    #[default]
    Lru,
    /// Entry closest to expiry goes first.
    Expiry,
}

impl EvictionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lru => "lru",
            Self::Expiry => "expiry",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// 0 disables the bound.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Floor for positive TTLs. Never raises a TTL of zero.
    #[serde(default)]
    pub min_ttl: u32,

    #[serde(default = "default_max_ttl")]
    pub max_ttl: u32,

    #[serde(default)]
    pub eviction_strategy: EvictionStrategy,

    #[serde(default = "default_eviction_sample_size")]
    pub eviction_sample_size: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
            min_ttl: 0,
            max_ttl: default_max_ttl(),
            eviction_strategy: EvictionStrategy::default(),
            eviction_sample_size: default_eviction_sample_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    10_000
}

fn default_max_ttl() -> u32 {
    86_400
}

fn default_eviction_sample_size() -> usize {
    8
}
