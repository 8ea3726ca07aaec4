use super::{validate_response, DnsTransport};
use async_trait::async_trait;
use relay_dns_domain::{DomainError, Message};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

/// DNS over TCP with the two-byte length prefix of RFC 1035 §4.2.2.
/// One connection per exchange.
pub struct TcpTransport {
    server_addr: SocketAddr,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn transport_error(&self, reason: impl Into<String>) -> DomainError {
        DomainError::Transport {
            server: self.server_addr.to_string(),
            reason: reason.into(),
        }
    }

    async fn round_trip(&self, query: &Message) -> Result<Message, DomainError> {
        let mut stream = TcpStream::connect(self.server_addr)
            .await
            .map_err(|e| self.transport_error(format!("connection failed: {}", e)))?;

        stream
            .set_nodelay(true)
            .map_err(|e| self.transport_error(format!("failed to set TCP_NODELAY: {}", e)))?;

        let bytes = query.encode();
        send_with_length_prefix(&mut stream, &bytes)
            .await
            .map_err(|e| self.transport_error(e.to_string()))?;

        debug!(server = %self.server_addr, message_len = bytes.len(), "TCP query sent");

        let response_bytes = read_with_length_prefix(&mut stream)
            .await
            .map_err(|e| self.transport_error(e.to_string()))?;

        debug!(server = %self.server_addr, response_len = response_bytes.len(), "TCP response received");

        let response = Message::decode(&response_bytes)?;
        validate_response(query, &response, self.server_addr)?;
        Ok(response)
    }
}

#[async_trait]
impl DnsTransport for TcpTransport {
    async fn exchange(&self, query: &Message, timeout: Duration) -> Result<Message, DomainError> {
        tokio::time::timeout(timeout, self.round_trip(query))
            .await
            .map_err(|_| DomainError::UpstreamTimeout {
                server: self.server_addr.to_string(),
            })?
    }

    fn protocol_name(&self) -> &'static str {
        "TCP"
    }
}

/// Writes one length-prefixed DNS message. Messages longer than 65535
/// bytes cannot be framed and are rejected.
pub async fn send_with_length_prefix<S>(
    stream: &mut S,
    message_bytes: &[u8],
) -> Result<(), DomainError>
where
    S: AsyncWriteExt + Unpin,
{
    let length = u16::try_from(message_bytes.len()).map_err(|_| {
        DomainError::IoError(format!(
            "DNS message too large for TCP framing: {} bytes",
            message_bytes.len()
        ))
    })?;

    let mut frame = Vec::with_capacity(message_bytes.len() + 2);
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(message_bytes);

    stream
        .write_all(&frame)
        .await
        .map_err(|e| DomainError::IoError(format!("failed to write DNS message: {}", e)))?;
    stream
        .flush()
        .await
        .map_err(|e| DomainError::IoError(format!("failed to flush stream: {}", e)))?;

    Ok(())
}

/// Reads one length-prefixed DNS message.
pub async fn read_with_length_prefix<S>(stream: &mut S) -> Result<Vec<u8>, DomainError>
where
    S: AsyncReadExt + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream
        .read_exact(&mut len_buf)
        .await
        .map_err(|e| DomainError::IoError(format!("failed to read message length: {}", e)))?;

    let message_len = u16::from_be_bytes(len_buf) as usize;

    let mut message = vec![0u8; message_len];
    stream
        .read_exact(&mut message)
        .await
        .map_err(|e| DomainError::IoError(format!("failed to read message body: {}", e)))?;

    Ok(message)
}
