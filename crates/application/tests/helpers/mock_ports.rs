#![allow(dead_code)]

use async_trait::async_trait;
use relay_dns_application::ports::{
    CacheMetricsSnapshot, CacheStore, Clock, UpstreamForwarder, UpstreamReply,
};
use relay_dns_domain::{
    CachedEntry, DnsAnswer, DomainError, Message, Question, RData, RecordClass, RecordType,
    ResourceRecord, ResponseCode,
};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use relay_dns_domain::QueryKey;

pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().unwrap()
    }
}

/// Plain map-backed store with the same cacheability rules as the real one.
#[derive(Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<QueryKey, Arc<CachedEntry>>>,
    inserts: AtomicUsize,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }

    /// Replaces the entry for `key` with one stored under a different key.
    pub fn corrupt(&self, key: &QueryKey) {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries.get(key).cloned() {
            let mut bad = (*entry).clone();
            bad.key = QueryKey::new("corrupted.invalid", bad.key.record_type, bad.key.record_class);
            entries.insert(key.clone(), Arc::new(bad));
        }
    }
}

impl CacheStore for InMemoryCacheStore {
    fn lookup(
        &self,
        key: &QueryKey,
        now: Instant,
    ) -> Result<Option<Arc<CachedEntry>>, DomainError> {
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.get(key).cloned() else {
            return Ok(None);
        };
        if !entry.is_consistent_with(key) {
            entries.remove(key);
            return Err(DomainError::CacheCorruption(format!("entry for {}", key)));
        }
        if entry.is_expired(now) {
            entries.remove(key);
            return Ok(None);
        }
        Ok(Some(entry))
    }

    fn insert(
        &self,
        key: QueryKey,
        answer: Arc<DnsAnswer>,
        now: Instant,
    ) -> Option<Arc<CachedEntry>> {
        let ttl = answer.cache_ttl().filter(|&ttl| ttl > 0)?;
        let entry = Arc::new(CachedEntry::new(key.clone(), answer, now, ttl));
        self.entries.lock().unwrap().insert(key, Arc::clone(&entry));
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Some(entry)
    }

    fn remove(&self, key: &QueryKey) -> bool {
        self.entries.lock().unwrap().remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            total_entries: self.len(),
            insertions: self.insert_count() as u64,
            ..Default::default()
        }
    }
}

/// Wraps [`InMemoryCacheStore`]; once armed, the next miss is returned only
/// after blocking the calling thread for `stall`.
pub struct StallingCacheStore {
    inner: InMemoryCacheStore,
    armed: AtomicBool,
    stall: Duration,
}

impl StallingCacheStore {
    pub fn new(stall: Duration) -> Self {
        Self {
            inner: InMemoryCacheStore::new(),
            armed: AtomicBool::new(false),
            stall,
        }
    }

    pub fn stall_next_miss(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl CacheStore for StallingCacheStore {
    fn lookup(
        &self,
        key: &QueryKey,
        now: Instant,
    ) -> Result<Option<Arc<CachedEntry>>, DomainError> {
        let result = self.inner.lookup(key, now);
        if matches!(result, Ok(None)) && self.armed.swap(false, Ordering::SeqCst) {
            std::thread::sleep(self.stall);
        }
        result
    }

    fn insert(
        &self,
        key: QueryKey,
        answer: Arc<DnsAnswer>,
        now: Instant,
    ) -> Option<Arc<CachedEntry>> {
        self.inner.insert(key, answer, now)
    }

    fn remove(&self, key: &QueryKey) -> bool {
        self.inner.remove(key)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.inner.metrics_snapshot()
    }
}

type Responder = Box<dyn Fn(&Question) -> Result<Message, DomainError> + Send + Sync>;

pub struct MockForwarder {
    call_count: Arc<AtomicUsize>,
    delay_ms: u64,
    responder: Mutex<Arc<Responder>>,
}

impl MockForwarder {
    pub fn new(responder: Responder) -> Self {
        Self {
            call_count: Arc::new(AtomicUsize::new(0)),
            delay_ms: 0,
            responder: Mutex::new(Arc::new(responder)),
        }
    }

    /// Answers every question with one A record.
    pub fn answering(ttl: u32, ip: [u8; 4]) -> Self {
        Self::new(Box::new(move |q: &Question| Ok(a_response(q, ttl, ip))))
    }

    pub fn failing(error: DomainError) -> Self {
        Self::new(Box::new(move |_: &Question| Err(error.clone())))
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn set_responder(&self, responder: Responder) {
        *self.responder.lock().unwrap() = Arc::new(responder);
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpstreamForwarder for MockForwarder {
    async fn forward(&self, question: &Question) -> Result<UpstreamReply, DomainError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
        let responder = Arc::clone(&self.responder.lock().unwrap());
        let response = responder(question)?;
        Ok(UpstreamReply {
            response,
            server: "mock://upstream".to_string(),
        })
    }
}

pub fn response_to(question: &Question) -> Message {
    let mut response = Message::query(0xFFFF, question.clone());
    response.header.qr = true;
    response.header.ra = true;
    response
}

pub fn a_response(question: &Question, ttl: u32, ip: [u8; 4]) -> Message {
    let mut response = response_to(question);
    response.answers.push(ResourceRecord::new(
        question.name.clone(),
        RecordType::A,
        RecordClass::IN,
        ttl,
        RData::A(Ipv4Addr::from(ip)),
    ));
    response
}

pub fn nxdomain_response(question: &Question, soa_ttl: u32, minimum: u32) -> Message {
    let mut response = response_to(question);
    response.header.rcode = ResponseCode::NXDomain;
    response.authorities.push(ResourceRecord::new(
        "example.com".parse().unwrap(),
        RecordType::SOA,
        RecordClass::IN,
        soa_ttl,
        RData::SOA(relay_dns_domain::SoaData {
            mname: "ns1.example.com".parse().unwrap(),
            rname: "hostmaster.example.com".parse().unwrap(),
            serial: 1,
            refresh: 3600,
            retry: 600,
            expire: 86400,
            minimum,
        }),
    ));
    response
}

pub fn query(id: u16, name: &str, qtype: RecordType) -> Message {
    Message::query(
        id,
        Question::new(name.parse().unwrap(), qtype, RecordClass::IN),
    )
}

pub fn key(name: &str, qtype: RecordType) -> QueryKey {
    QueryKey::new(name, qtype, RecordClass::IN)
}
