pub mod emitter;
pub mod metrics;
pub mod types;

pub use emitter::RelayEventEmitter;
pub use metrics::RelayMetrics;
pub use types::RelayEvent;
