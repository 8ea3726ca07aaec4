use serde::{Deserialize, Serialize};

/// What to send back when every upstream failed.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    #[default]
    Servfail,
    Drop,
}

/// What to send back for input that does not parse.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    #[default]
    FormatError,
    Drop,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelayConfig {
    #[serde(default = "default_true")]
    pub recursion_available: bool,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub malformed_policy: MalformedPolicy,

    /// Seconds between statistics log lines; 0 disables the report.
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            recursion_available: true,
            failure_policy: FailurePolicy::default(),
            malformed_policy: MalformedPolicy::default(),
            stats_interval_secs: default_stats_interval_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_stats_interval_secs() -> u64 {
    60
}
