use crate::events::{RelayEvent, RelayEventEmitter};
use crate::ports::{CacheStore, Clock, UpstreamForwarder};
use crate::services::{QueryCoalescer, ResponseAssembler};
use relay_dns_domain::config::{FailurePolicy, MalformedPolicy};
use relay_dns_domain::{
    DnsAnswer, DomainError, InboundTransport, Message, Opcode, QueryKey, ResponseCode,
};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct RelayOptions {
    pub cache_enabled: bool,
    pub failure_policy: FailurePolicy,
    pub malformed_policy: MalformedPolicy,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            failure_policy: FailurePolicy::Servfail,
            malformed_policy: MalformedPolicy::FormatError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    Cache,
    /// This caller's own upstream fetch.
    Upstream,
    /// A fetch started by another caller for the same key.
    Coalesced,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub answer: Arc<DnsAnswer>,
    pub source: ResolutionSource,
    /// Seconds the answer spent in the cache; 0 unless served from it.
    pub age_secs: u32,
}

/// Per-query pipeline: decode, cache lookup, coalesced forward on miss,
/// assemble, encode.
pub struct RelayEngine {
    cache: Arc<dyn CacheStore>,
    forwarder: Arc<dyn UpstreamForwarder>,
    clock: Arc<dyn Clock>,
    coalescer: QueryCoalescer,
    assembler: ResponseAssembler,
    emitter: RelayEventEmitter,
    options: RelayOptions,
}

impl RelayEngine {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        forwarder: Arc<dyn UpstreamForwarder>,
        clock: Arc<dyn Clock>,
        assembler: ResponseAssembler,
        emitter: RelayEventEmitter,
        options: RelayOptions,
    ) -> Self {
        Self {
            cache,
            forwarder,
            clock,
            coalescer: QueryCoalescer::new(),
            assembler,
            emitter,
            options,
        }
    }

    pub fn in_flight(&self) -> usize {
        self.coalescer.in_flight()
    }

    /// Handles one inbound message and returns the bytes to send back, or
    /// `None` when the message gets no reply.
    pub async fn handle(&self, raw: &[u8], transport: InboundTransport) -> Option<Vec<u8>> {
        let request = match Message::decode(raw) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, len = raw.len(), transport = transport.as_str(), "Malformed query");
                self.emitter.emit(RelayEvent::Malformed {
                    reason: e.to_string(),
                });
                return match self.options.malformed_policy {
                    MalformedPolicy::FormatError => self.assembler.format_error(raw),
                    MalformedPolicy::Drop => None,
                };
            }
        };

        if request.header.qr {
            debug!(id = request.header.id, "Dropping response received as query");
            return None;
        }
        if request.header.opcode != Opcode::Query {
            debug!(opcode = ?request.header.opcode, "Unsupported opcode");
            return Some(self.error_bytes(&request, ResponseCode::NotImp, transport));
        }
        if request.questions.len() != 1 {
            debug!(count = request.questions.len(), "Query without exactly one question");
            return Some(self.error_bytes(&request, ResponseCode::FormErr, transport));
        }

        match self.resolve(&request).await {
            Ok(resolution) => {
                let response =
                    self.assembler
                        .assemble(&request, &resolution.answer, resolution.age_secs);
                Some(self.assembler.encode_for(&request, &response, transport))
            }
            Err(_) => match self.options.failure_policy {
                FailurePolicy::Servfail => {
                    Some(self.error_bytes(&request, ResponseCode::ServFail, transport))
                }
                FailurePolicy::Drop => None,
            },
        }
    }

    /// Resolves the first question of `request` from cache or upstream.
    pub async fn resolve(&self, request: &Message) -> Result<Resolution, DomainError> {
        let question = request
            .question()
            .ok_or_else(|| DomainError::malformed("query has no question"))?;
        let key = QueryKey::from_question(question);

        if self.options.cache_enabled {
            let now = self.clock.now();
            match self.cache.lookup(&key, now) {
                Ok(Some(entry)) => {
                    debug!(key = %key, "Cache HIT");
                    self.emitter.emit(RelayEvent::CacheHit { key });
                    return Ok(Resolution {
                        answer: Arc::clone(&entry.answer),
                        source: ResolutionSource::Cache,
                        age_secs: entry.age_secs(now),
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "Discarded corrupted cache entry");
                    self.emitter.emit(RelayEvent::CacheCorruption {
                        key: key.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(key = %key, "Cache MISS");
        self.emitter.emit(RelayEvent::CacheMiss { key: key.clone() });

        let fetch = {
            let forwarder = Arc::clone(&self.forwarder);
            let cache = Arc::clone(&self.cache);
            let clock = Arc::clone(&self.clock);
            let cache_enabled = self.options.cache_enabled;
            let question = question.clone();
            let key = key.clone();
            move || async move {
                // A previous leader may have filled the cache between our miss
                // and taking leadership.
                if cache_enabled {
                    if let Ok(Some(entry)) = cache.lookup(&key, clock.now()) {
                        debug!(key = %key, "Cache filled while registering, skipping upstream");
                        return Ok(Arc::clone(&entry.answer));
                    }
                }
                let reply = forwarder.forward(&question).await?;
                let answer = Arc::new(DnsAnswer::from_response(&reply.response));
                debug!(key = %key, server = %reply.server, rcode = %answer.rcode, "Upstream answered");
                if cache_enabled {
                    cache.insert(key, Arc::clone(&answer), clock.now());
                }
                Ok::<_, DomainError>(answer)
            }
        };

        let coalesced = self.coalescer.resolve(key.clone(), fetch).await;
        if coalesced.joined {
            self.emitter.emit(RelayEvent::CoalescedJoin { key: key.clone() });
        }

        match coalesced.result {
            Ok(answer) => Ok(Resolution {
                answer,
                source: if coalesced.joined {
                    ResolutionSource::Coalesced
                } else {
                    ResolutionSource::Upstream
                },
                age_secs: 0,
            }),
            Err(e) => {
                warn!(key = %key, error = %e, "Upstream resolution failed");
                self.emitter.emit(RelayEvent::UpstreamFailure {
                    key,
                    error: e.clone(),
                });
                Err(e)
            }
        }
    }

    fn error_bytes(
        &self,
        request: &Message,
        rcode: ResponseCode,
        transport: InboundTransport,
    ) -> Vec<u8> {
        let response = self.assembler.error_response(request, rcode);
        self.assembler.encode_for(request, &response, transport)
    }
}
