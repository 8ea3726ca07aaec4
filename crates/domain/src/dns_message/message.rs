use super::{Header, Question};
use crate::dns_record::ResourceRecord;
use crate::errors::DomainError;

/// Largest response accepted over UDP from a client without EDNS (RFC 1035 §4.2.1).
pub const MIN_UDP_PAYLOAD: u16 = 512;
pub const MAX_UDP_PAYLOAD: u16 = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl Message {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    /// Single-question recursive query.
    pub fn query(id: u16, question: Question) -> Self {
        let mut msg = Self::new(Header::query(id));
        msg.questions.push(question);
        msg
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DomainError> {
        super::decode(bytes)
    }

    pub fn encode(&self) -> Vec<u8> {
        super::encode(self)
    }

    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }

    pub fn opt(&self) -> Option<&ResourceRecord> {
        self.additionals.iter().find(|rr| rr.is_opt())
    }

    /// Requestor's advertised UDP payload size, if it sent an OPT record.
    pub fn edns_udp_size(&self) -> Option<u16> {
        self.opt().map(|rr| rr.class.to_u16())
    }

    /// Response size the requestor can take over UDP: its EDNS size clamped
    /// to `[512, 4096]`, or 512 without EDNS.
    pub fn max_udp_response_len(&self) -> usize {
        self.edns_udp_size()
            .map(|size| size.clamp(MIN_UDP_PAYLOAD, MAX_UDP_PAYLOAD))
            .unwrap_or(MIN_UDP_PAYLOAD) as usize
    }
}
