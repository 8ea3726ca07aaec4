use super::message_builder::MessageBuilder;
use crate::dns::transport::{create_transport, DnsTransport, TcpTransport, Transport};
use async_trait::async_trait;
use relay_dns_application::ports::{UpstreamForwarder, UpstreamReply};
use relay_dns_domain::config::ConfigError;
use relay_dns_domain::{Config, DnsProtocol, DomainError, Message, Question, ResponseCode};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

struct Upstream {
    endpoint: DnsProtocol,
    transport: Transport,
    /// TCP retry target for truncated UDP replies. `None` for TCP endpoints.
    tcp_fallback: Option<TcpTransport>,
}

impl Upstream {
    fn new(endpoint: DnsProtocol) -> Self {
        let tcp_fallback = match endpoint {
            DnsProtocol::Udp { addr } => Some(TcpTransport::new(addr)),
            DnsProtocol::Tcp { .. } => None,
        };
        Self {
            transport: create_transport(&endpoint),
            endpoint,
            tcp_fallback,
        }
    }
}

/// Forwards questions to a list of upstreams, trying them strictly in order.
///
/// Each attempt is bounded by the per-attempt timeout and by whatever is
/// left of the overall deadline, whichever is smaller.
pub struct FailoverForwarder {
    upstreams: Vec<Upstream>,
    attempt_timeout: Duration,
    total_timeout: Duration,
}

impl FailoverForwarder {
    pub fn new(endpoints: Vec<DnsProtocol>, attempt_timeout: Duration, total_timeout: Duration) -> Self {
        Self {
            upstreams: endpoints.into_iter().map(Upstream::new).collect(),
            attempt_timeout,
            total_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.upstream_endpoints()?,
            Duration::from_millis(config.upstream.attempt_timeout_ms),
            Duration::from_millis(config.upstream.total_timeout_ms),
        ))
    }

    fn attempt_budget(&self, deadline: Instant) -> Option<Duration> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            None
        } else {
            Some(remaining.min(self.attempt_timeout))
        }
    }

    async fn query_upstream(
        &self,
        upstream: &Upstream,
        question: &Question,
        deadline: Instant,
    ) -> Result<Message, DomainError> {
        let query = MessageBuilder::build_query(question);

        let budget = self.attempt_budget(deadline).ok_or(DomainError::DeadlineExceeded)?;
        let mut response = upstream.transport.exchange(&query, budget).await?;

        if response.header.tc {
            if let Some(tcp) = &upstream.tcp_fallback {
                debug!(server = %upstream.endpoint, "Truncated UDP reply, retrying over TCP");
                let budget = self.attempt_budget(deadline).ok_or(DomainError::DeadlineExceeded)?;
                response = tcp.exchange(&query, budget).await?;
            }
        }

        match response.header.rcode {
            ResponseCode::ServFail | ResponseCode::Refused => Err(DomainError::UpstreamRefused {
                server: upstream.endpoint.to_string(),
                rcode: response.header.rcode.as_str(),
            }),
            _ => Ok(response),
        }
    }
}

#[async_trait]
impl UpstreamForwarder for FailoverForwarder {
    async fn forward(&self, question: &Question) -> Result<UpstreamReply, DomainError> {
        if self.upstreams.is_empty() {
            return Err(DomainError::NoUpstreams);
        }

        let deadline = Instant::now() + self.total_timeout;
        debug!(
            strategy = "failover",
            servers = self.upstreams.len(),
            domain = %question.name,
            record_type = %question.qtype,
            "Forwarding query"
        );

        let mut attempts = 0usize;
        for (position, upstream) in self.upstreams.iter().enumerate() {
            if Instant::now() >= deadline {
                break;
            }
            attempts += 1;

            match self.query_upstream(upstream, question, deadline).await {
                Ok(response) => {
                    debug!(server = %upstream.endpoint, position, rcode = %response.header.rcode, "Upstream responded");
                    return Ok(UpstreamReply {
                        response,
                        server: upstream.endpoint.to_string(),
                    });
                }
                Err(DomainError::DeadlineExceeded) => break,
                Err(e) => {
                    warn!(server = %upstream.endpoint, error = %e, position, "Upstream attempt failed, failing over");
                }
            }
        }

        if Instant::now() >= deadline {
            warn!(domain = %question.name, attempts, "Resolution deadline exceeded");
            return Err(DomainError::DeadlineExceeded);
        }

        warn!(domain = %question.name, attempts, "All upstreams failed");
        Err(DomainError::AllUpstreamsFailed { attempts })
    }
}
