use async_trait::async_trait;
use relay_dns_domain::{DomainError, Message, Question};

#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub response: Message,
    /// Endpoint that produced `response`, for logging.
    pub server: String,
}

#[async_trait]
pub trait UpstreamForwarder: Send + Sync {
    /// Resolves `question` against the configured upstreams. Failures are
    /// final for this call; retry and failover happen inside.
    async fn forward(&self, question: &Question) -> Result<UpstreamReply, DomainError>;
}
