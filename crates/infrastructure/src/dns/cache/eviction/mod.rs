pub mod active;
pub mod expiry;
pub mod lru;
pub mod policy;

pub use active::ActiveEvictionPolicy;
pub use expiry::ExpiryPolicy;
pub use lru::LruPolicy;
pub use policy::EvictionPolicy;
