mod relay_engine;

pub use relay_engine::{RelayEngine, RelayOptions, Resolution, ResolutionSource};
