pub mod cache;
pub mod errors;
pub mod logging;
pub mod relay;
pub mod root;
pub mod server;
pub mod upstream;

pub use cache::{CacheConfig, EvictionStrategy};
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use relay::{FailurePolicy, MalformedPolicy, RelayConfig};
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;
