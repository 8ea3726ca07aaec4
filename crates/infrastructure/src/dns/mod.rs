pub mod cache;
pub mod forwarding;
pub mod transport;

pub use cache::{DnsCache, DnsCacheConfig};
pub use forwarding::FailoverForwarder;
