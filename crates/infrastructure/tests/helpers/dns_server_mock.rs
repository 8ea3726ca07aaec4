use relay_dns_domain::{Message, RData, RecordClass, RecordType, ResourceRecord, ResponseCode};
use relay_dns_infrastructure::dns::transport::{read_with_length_prefix, send_with_length_prefix};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;

/// How a mock endpoint replies to each query.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Answer { ip: [u8; 4], ttl: u32 },
    /// Receives and never replies.
    Silent,
    /// Empty answer section with TC set.
    Truncate,
    Rcode(ResponseCode),
    /// A reply with the wrong transaction ID first, then the real answer.
    SpoofThenAnswer { ip: [u8; 4], ttl: u32 },
}

#[derive(Default)]
struct Recorder {
    udp_queries: AtomicUsize,
    tcp_queries: AtomicUsize,
    last_query: Mutex<Option<Message>>,
}

impl Recorder {
    fn record(&self, counter: &AtomicUsize, query: &Message) {
        counter.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
    }
}

/// UDP (and optionally TCP) DNS server on 127.0.0.1 with an ephemeral port.
pub struct MockDnsServer {
    addr: SocketAddr,
    recorder: Arc<Recorder>,
    shutdown_tx: Vec<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn udp(behavior: Behavior) -> Self {
        Self::start(Some(behavior), None).await
    }

    pub async fn udp_and_tcp(udp: Behavior, tcp: Behavior) -> Self {
        Self::start(Some(udp), Some(tcp)).await
    }

    pub async fn tcp(behavior: Behavior) -> Self {
        Self::start(None, Some(behavior)).await
    }

    async fn start(udp: Option<Behavior>, tcp: Option<Behavior>) -> Self {
        let recorder = Arc::new(Recorder::default());
        let mut shutdown_tx = Vec::new();

        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        if let Some(behavior) = udp {
            let (tx, rx) = oneshot::channel();
            shutdown_tx.push(tx);
            tokio::spawn(serve_udp(socket, behavior, Arc::clone(&recorder), rx));
        } else {
            drop(socket);
        }

        if let Some(behavior) = tcp {
            let listener = TcpListener::bind(addr).await.unwrap();
            let (tx, rx) = oneshot::channel();
            shutdown_tx.push(tx);
            tokio::spawn(serve_tcp(listener, behavior, Arc::clone(&recorder), rx));
        }

        Self {
            addr,
            recorder,
            shutdown_tx,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn udp_endpoint(&self) -> String {
        format!("udp://{}", self.addr)
    }

    pub fn tcp_endpoint(&self) -> String {
        format!("tcp://{}", self.addr)
    }

    pub fn udp_queries(&self) -> usize {
        self.recorder.udp_queries.load(Ordering::SeqCst)
    }

    pub fn tcp_queries(&self) -> usize {
        self.recorder.tcp_queries.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<Message> {
        self.recorder.last_query.lock().unwrap().clone()
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        for tx in self.shutdown_tx.drain(..) {
            let _ = tx.send(());
        }
    }
}

async fn serve_udp(
    socket: UdpSocket,
    behavior: Behavior,
    recorder: Arc<Recorder>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let mut buf = vec![0u8; 4096];
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            result = socket.recv_from(&mut buf) => {
                let Ok((len, peer)) = result else { continue };
                let Ok(query) = Message::decode(&buf[..len]) else { continue };
                recorder.record(&recorder.udp_queries, &query);
                for reply in replies(&query, behavior) {
                    let _ = socket.send_to(&reply.encode(), peer).await;
                }
            }
        }
    }
}

async fn serve_tcp(
    listener: TcpListener,
    behavior: Behavior,
    recorder: Arc<Recorder>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            accepted = listener.accept() => {
                let Ok((mut stream, _)) = accepted else { continue };
                let recorder = Arc::clone(&recorder);
                tokio::spawn(async move {
                    let Ok(bytes) = read_with_length_prefix(&mut stream).await else { return };
                    let Ok(query) = Message::decode(&bytes) else { return };
                    recorder.record(&recorder.tcp_queries, &query);
                    if let Some(reply) = replies(&query, behavior).pop() {
                        let _ = send_with_length_prefix(&mut stream, &reply.encode()).await;
                    }
                    // Hold the connection open so silent peers look silent.
                    let _ = read_with_length_prefix(&mut stream).await;
                });
            }
        }
    }
}

fn reply_header(query: &Message) -> Message {
    let mut reply = Message::new(query.header);
    reply.header.qr = true;
    reply.header.ra = true;
    reply.questions = query.questions.clone();
    reply
}

fn answered(query: &Message, ip: [u8; 4], ttl: u32) -> Message {
    let mut reply = reply_header(query);
    if let Some(q) = query.question() {
        reply.answers.push(ResourceRecord::new(
            q.name.clone(),
            RecordType::A,
            RecordClass::IN,
            ttl,
            RData::A(Ipv4Addr::from(ip)),
        ));
    }
    reply
}

fn replies(query: &Message, behavior: Behavior) -> Vec<Message> {
    match behavior {
        Behavior::Answer { ip, ttl } => vec![answered(query, ip, ttl)],
        Behavior::Silent => vec![],
        Behavior::Truncate => {
            let mut reply = reply_header(query);
            reply.header.tc = true;
            vec![reply]
        }
        Behavior::Rcode(rcode) => {
            let mut reply = reply_header(query);
            reply.header.rcode = rcode;
            vec![reply]
        }
        Behavior::SpoofThenAnswer { ip, ttl } => {
            let mut spoofed = answered(query, [203, 0, 113, 66], ttl);
            spoofed.header.id = query.header.id ^ 0xFFFF;
            vec![spoofed, answered(query, ip, ttl)]
        }
    }
}
