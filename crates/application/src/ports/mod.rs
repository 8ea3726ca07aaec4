mod cache_store;
mod clock;
mod upstream_forwarder;

pub use cache_store::{CacheMetricsSnapshot, CacheStore};
pub use clock::{Clock, SystemClock};
pub use upstream_forwarder::{UpstreamForwarder, UpstreamReply};
