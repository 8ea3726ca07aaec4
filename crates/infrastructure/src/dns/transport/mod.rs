pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use relay_dns_domain::{DnsProtocol, DomainError, Message};
use std::net::SocketAddr;
use std::time::Duration;

pub use tcp::{read_with_length_prefix, send_with_length_prefix, TcpTransport};
pub use udp::UdpTransport;

/// One request/response exchange with an upstream resolver.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Sends `query` and returns the first reply that answers it. The whole
    /// exchange, connection setup included, is bounded by `timeout`.
    async fn exchange(&self, query: &Message, timeout: Duration) -> Result<Message, DomainError>;

    fn protocol_name(&self) -> &'static str;
}

pub enum Transport {
    Udp(UdpTransport),
    Tcp(TcpTransport),
}

impl Transport {
    pub async fn exchange(&self, query: &Message, timeout: Duration) -> Result<Message, DomainError> {
        match self {
            Self::Udp(t) => DnsTransport::exchange(t, query, timeout).await,
            Self::Tcp(t) => DnsTransport::exchange(t, query, timeout).await,
        }
    }

    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Udp(_) => "UDP",
            Self::Tcp(_) => "TCP",
        }
    }
}

pub fn create_transport(protocol: &DnsProtocol) -> Transport {
    match protocol {
        DnsProtocol::Udp { addr } => Transport::Udp(UdpTransport::new(*addr)),
        DnsProtocol::Tcp { addr } => Transport::Tcp(TcpTransport::new(*addr)),
    }
}

/// Checks that `response` is a reply to `query`: same ID, QR set, and the
/// same question (name compared case-insensitively).
pub(crate) fn validate_response(
    query: &Message,
    response: &Message,
    server: SocketAddr,
) -> Result<(), DomainError> {
    let mismatch = |reason: String| DomainError::UpstreamMismatch {
        server: server.to_string(),
        reason,
    };

    if response.header.id != query.header.id {
        return Err(mismatch(format!(
            "transaction ID mismatch: sent {:#06x}, got {:#06x}",
            query.header.id, response.header.id
        )));
    }

    if !response.header.qr {
        return Err(mismatch("reply is not a response".to_string()));
    }

    match (query.question(), response.question()) {
        (Some(sent), Some(got)) if sent.matches(got) && response.questions.len() == 1 => Ok(()),
        (Some(sent), Some(got)) => Err(mismatch(format!(
            "question mismatch: sent {} {}, got {} {}",
            sent.name, sent.qtype, got.name, got.qtype
        ))),
        (Some(_), None) => Err(mismatch("reply has no question section".to_string())),
        (None, _) => Err(mismatch("query has no question".to_string())),
    }
}

fn unspecified_for(server: SocketAddr) -> SocketAddr {
    if server.is_ipv4() {
        SocketAddr::from(([0, 0, 0, 0], 0))
    } else {
        SocketAddr::from(([0u16; 8], 0))
    }
}
