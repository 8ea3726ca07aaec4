pub mod eviction;
pub mod metrics;
pub mod record;
pub mod storage;

pub use eviction::{ActiveEvictionPolicy, EvictionPolicy};
pub use metrics::CacheMetrics;
pub use record::CachedRecord;
pub use storage::{DnsCache, DnsCacheConfig};
