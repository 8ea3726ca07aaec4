use relay_dns_application::use_cases::RelayEngine;
use relay_dns_domain::dns_message::MAX_UDP_PAYLOAD;
use relay_dns_domain::{Config, InboundTransport};
use relay_dns_infrastructure::dns::transport::{read_with_length_prefix, send_with_length_prefix};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct ListenerSettings {
    pub bind_addr: SocketAddr,
    /// 0 means one worker per available CPU.
    pub udp_workers: usize,
    pub tcp_enabled: bool,
    pub tcp_idle_timeout: Duration,
}

impl ListenerSettings {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: config.bind_socket_addr()?,
            udp_workers: config.server.udp_workers,
            tcp_enabled: config.server.tcp_enabled,
            tcp_idle_timeout: Duration::from_secs(config.server.tcp_idle_timeout_secs),
        })
    }

    fn worker_count(&self) -> usize {
        if self.udp_workers > 0 {
            return self.udp_workers;
        }
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Binds the UDP workers (and the TCP listener when enabled) and serves
/// until `shutdown` is cancelled. Every inbound message goes to
/// [`RelayEngine::handle`]; the engine never sees a socket.
pub async fn start_dns_server(
    settings: ListenerSettings,
    engine: Arc<RelayEngine>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let socket_addr = settings.bind_addr;
    let domain = if socket_addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };
    let num_workers = settings.worker_count();

    info!(bind_address = %socket_addr, num_workers, tcp = settings.tcp_enabled, "Starting DNS listener with SO_REUSEPORT");

    let mut join_set: JoinSet<()> = JoinSet::new();

    for i in 0..num_workers {
        let udp_socket = Arc::new(create_udp_socket(domain, socket_addr)?);
        join_set.spawn(run_udp_worker(udp_socket, engine.clone(), i, shutdown.clone()));
    }

    if settings.tcp_enabled {
        let tcp_listener = create_tcp_listener(domain, socket_addr)?;
        join_set.spawn(run_tcp_acceptor(
            tcp_listener,
            engine,
            settings.tcp_idle_timeout,
            shutdown.clone(),
        ));
    }

    info!("DNS listener ready: {} UDP workers on {}", num_workers, socket_addr);

    while let Some(result) = join_set.join_next().await {
        if let Err(e) = result {
            error!(error = %e, "DNS listener task failed");
        }
    }

    info!("DNS listener stopped");
    Ok(())
}

async fn run_udp_worker(
    socket: Arc<UdpSocket>,
    engine: Arc<RelayEngine>,
    worker_id: usize,
    shutdown: CancellationToken,
) {
    let mut recv_buf = vec![0u8; MAX_UDP_PAYLOAD as usize];

    loop {
        let received = tokio::select! {
            _ = shutdown.cancelled() => break,
            received = socket.recv_from(&mut recv_buf) => received,
        };

        let (n, from) = match received {
            Ok(r) => r,
            Err(e) => {
                error!(worker = worker_id, error = %e, "UDP recv error");
                continue;
            }
        };

        let query = recv_buf[..n].to_vec();
        let engine = engine.clone();
        let socket = socket.clone();
        tokio::spawn(async move {
            if let Some(response) = engine.handle(&query, InboundTransport::Udp).await {
                if let Err(e) = socket.send_to(&response, from).await {
                    debug!(client = %from, error = %e, "Failed to send UDP response");
                }
            }
        });
    }

    debug!(worker = worker_id, "UDP worker stopped");
}

async fn run_tcp_acceptor(
    listener: TcpListener,
    engine: Arc<RelayEngine>,
    idle_timeout: Duration,
    shutdown: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer)) => {
                tokio::spawn(serve_tcp_connection(
                    stream,
                    peer,
                    engine.clone(),
                    idle_timeout,
                    shutdown.clone(),
                ));
            }
            Err(e) => error!(error = %e, "TCP accept error"),
        }
    }
}

/// Answers length-prefixed queries on one connection, in order, until the
/// peer closes it or stays silent for `idle_timeout`.
async fn serve_tcp_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    engine: Arc<RelayEngine>,
    idle_timeout: Duration,
    shutdown: CancellationToken,
) {
    let _ = stream.set_nodelay(true);

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = tokio::time::timeout(idle_timeout, read_with_length_prefix(&mut stream)) => frame,
        };

        let query = match frame {
            Ok(Ok(query)) => query,
            Ok(Err(_)) => break,
            Err(_) => {
                debug!(client = %peer, "Closing idle TCP connection");
                break;
            }
        };

        if let Some(response) = engine.handle(&query, InboundTransport::Tcp).await {
            if let Err(e) = send_with_length_prefix(&mut stream, &response).await {
                debug!(client = %peer, error = %e, "Failed to send TCP response");
                break;
            }
        }
    }
}

fn create_udp_socket(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<UdpSocket> {
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_recv_buffer_size(512 * 1024)?;
    socket.set_send_buffer_size(512 * 1024)?;
    socket.bind(&socket_addr.into())?;
    socket.set_nonblocking(true)?;
    let std_socket: std::net::UdpSocket = socket.into();
    Ok(UdpSocket::from_std(std_socket)?)
}

fn create_tcp_listener(domain: Domain, socket_addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    if socket_addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;
    let std_listener: std::net::TcpListener = socket.into();
    Ok(TcpListener::from_std(std_listener)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_dns_application::events::RelayEventEmitter;
    use relay_dns_application::ports::SystemClock;
    use relay_dns_application::services::ResponseAssembler;
    use relay_dns_application::use_cases::RelayOptions;
    use relay_dns_domain::{
        DomainName, Message, Question, RData, RecordClass, RecordType, ResourceRecord,
    };
    use relay_dns_infrastructure::dns::{DnsCache, DnsCacheConfig, FailoverForwarder};
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    /// Upstream stub answering every A query with 192.0.2.1.
    async fn spawn_upstream() -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            while let Ok((n, peer)) = socket.recv_from(&mut buf).await {
                let Ok(query) = Message::decode(&buf[..n]) else { continue };
                let mut reply = Message::new(query.header);
                reply.header.qr = true;
                reply.questions = query.questions.clone();
                reply.answers.push(ResourceRecord::new(
                    query.questions[0].name.clone(),
                    RecordType::A,
                    RecordClass::IN,
                    60,
                    RData::A(Ipv4Addr::new(192, 0, 2, 1)),
                ));
                let _ = socket.send_to(&reply.encode(), peer).await;
            }
        });
        addr
    }

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    fn engine(upstream: SocketAddr) -> Arc<RelayEngine> {
        let forwarder = FailoverForwarder::new(
            vec![relay_dns_domain::DnsProtocol::Udp { addr: upstream }],
            Duration::from_millis(500),
            Duration::from_secs(2),
        );
        Arc::new(RelayEngine::new(
            Arc::new(DnsCache::new(DnsCacheConfig::default())),
            Arc::new(forwarder),
            Arc::new(SystemClock),
            ResponseAssembler::new(true),
            RelayEventEmitter::new_disabled(),
            RelayOptions::default(),
        ))
    }

    fn query_bytes(id: u16) -> Vec<u8> {
        Message::query(
            id,
            Question::new(
                DomainName::from_str("example.com").unwrap(),
                RecordType::A,
                RecordClass::IN,
            ),
        )
        .encode()
    }

    #[tokio::test]
    async fn test_listener_answers_over_udp_and_tcp() {
        let upstream = spawn_upstream().await;
        let bind_addr = SocketAddr::from(([127, 0, 0, 1], free_port()));
        let shutdown = CancellationToken::new();
        let settings = ListenerSettings {
            bind_addr,
            udp_workers: 1,
            tcp_enabled: true,
            tcp_idle_timeout: Duration::from_secs(2),
        };
        let server = tokio::spawn(start_dns_server(settings, engine(upstream), shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(&query_bytes(0x1111), bind_addr).await.unwrap();
        let mut buf = vec![0u8; 4096];
        let (n, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        let udp_reply = Message::decode(&buf[..n]).unwrap();
        assert_eq!(udp_reply.header.id, 0x1111);
        assert_eq!(udp_reply.answers.len(), 1);

        let mut stream = TcpStream::connect(bind_addr).await.unwrap();
        send_with_length_prefix(&mut stream, &query_bytes(0x2222))
            .await
            .unwrap();
        let frame = tokio::time::timeout(Duration::from_secs(2), read_with_length_prefix(&mut stream))
            .await
            .unwrap()
            .unwrap();
        let tcp_reply = Message::decode(&frame).unwrap();
        assert_eq!(tcp_reply.header.id, 0x2222);
        assert_eq!(tcp_reply.answers.len(), 1);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(2), server)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[test]
    fn test_zero_workers_means_one_per_cpu() {
        let settings = ListenerSettings {
            bind_addr: "127.0.0.1:53".parse().unwrap(),
            udp_workers: 0,
            tcp_enabled: false,
            tcp_idle_timeout: Duration::from_secs(10),
        };
        assert!(settings.worker_count() >= 1);
    }
}
