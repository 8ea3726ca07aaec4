use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Malformed DNS message: {0}")]
    MalformedMessage(String),

    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Upstream {server} timed out")]
    UpstreamTimeout { server: String },

    #[error("Transport error talking to {server}: {reason}")]
    Transport { server: String, reason: String },

    #[error("Upstream {server} answered {rcode}")]
    UpstreamRefused { server: String, rcode: &'static str },

    #[error("Upstream response from {server} does not match the query: {reason}")]
    UpstreamMismatch { server: String, reason: String },

    #[error("Resolution deadline exceeded")]
    DeadlineExceeded,

    #[error("All {attempts} upstream attempts failed")]
    AllUpstreamsFailed { attempts: usize },

    #[error("No upstream servers configured")]
    NoUpstreams,

    #[error("Coalesced upstream fetch aborted before delivering a result")]
    UpstreamAborted,

    #[error("Cache entry corrupted: {0}")]
    CacheCorruption(String),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DomainError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        DomainError::MalformedMessage(reason.into())
    }

    /// True for failures of a single upstream attempt, which the forwarder
    /// answers by moving on to the next upstream.
    pub fn is_attempt_failure(&self) -> bool {
        matches!(
            self,
            DomainError::UpstreamTimeout { .. }
                | DomainError::Transport { .. }
                | DomainError::UpstreamRefused { .. }
                | DomainError::UpstreamMismatch { .. }
                | DomainError::MalformedMessage(_)
        )
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::IoError(e.to_string())
    }
}
