//! UDP transport for upstream queries (RFC 1035 §4.2.1).
//!
//! Each exchange binds a fresh ephemeral socket. Datagrams that do not
//! answer the query (wrong source, wrong ID, wrong question, undecodable)
//! are dropped and the socket keeps listening until the timeout.
//! A truncated reply is returned as-is; retrying over TCP is the caller's
//! decision.

use super::{unspecified_for, validate_response, DnsTransport};
use async_trait::async_trait;
use relay_dns_domain::{DomainError, Message};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

/// Any UDP payload, regardless of the EDNS size we advertised.
const RECV_BUF_LEN: usize = u16::MAX as usize;

pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn transport_error(&self, reason: impl Into<String>) -> DomainError {
        DomainError::Transport {
            server: self.server_addr.to_string(),
            reason: reason.into(),
        }
    }

    async fn send_and_wait(&self, query: &Message) -> Result<Message, DomainError> {
        let socket = UdpSocket::bind(unspecified_for(self.server_addr))
            .await
            .map_err(|e| self.transport_error(format!("failed to bind UDP socket: {}", e)))?;

        let bytes = query.encode();
        let bytes_sent = socket
            .send_to(&bytes, self.server_addr)
            .await
            .map_err(|e| self.transport_error(format!("failed to send UDP query: {}", e)))?;

        debug!(server = %self.server_addr, bytes_sent, "UDP query sent");

        let mut recv_buf = vec![0u8; RECV_BUF_LEN];
        loop {
            let (len, from) = socket
                .recv_from(&mut recv_buf)
                .await
                .map_err(|e| self.transport_error(format!("failed to receive UDP response: {}", e)))?;

            if from != self.server_addr {
                debug!(expected = %self.server_addr, received_from = %from, "Ignoring datagram from unexpected source");
                continue;
            }

            let response = match Message::decode(&recv_buf[..len]) {
                Ok(m) => m,
                Err(e) => {
                    debug!(server = %self.server_addr, error = %e, "Ignoring undecodable datagram");
                    continue;
                }
            };

            if let Err(e) = validate_response(query, &response, self.server_addr) {
                debug!(server = %self.server_addr, error = %e, "Ignoring unrelated datagram");
                continue;
            }

            debug!(server = %self.server_addr, bytes_received = len, tc = response.header.tc, "UDP response received");
            return Ok(response);
        }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn exchange(&self, query: &Message, timeout: Duration) -> Result<Message, DomainError> {
        tokio::time::timeout(timeout, self.send_and_wait(query))
            .await
            .map_err(|_| DomainError::UpstreamTimeout {
                server: self.server_addr.to_string(),
            })?
    }

    fn protocol_name(&self) -> &'static str {
        "UDP"
    }
}
