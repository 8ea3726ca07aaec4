use crate::dns_message::{Message, ResponseCode};
use crate::dns_record::ResourceRecord;

/// The replayable part of an upstream response: records and the flags a
/// relay passes through. Per-hop data (ID, OPT) is not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    pub rcode: ResponseCode,
    pub authoritative: bool,
    pub authentic_data: bool,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
}

impl DnsAnswer {
    pub fn from_response(response: &Message) -> Self {
        Self {
            rcode: response.header.rcode,
            authoritative: response.header.aa,
            authentic_data: response.header.ad,
            answers: response.answers.clone(),
            authorities: response.authorities.clone(),
            additionals: response
                .additionals
                .iter()
                .filter(|rr| !rr.is_opt())
                .cloned()
                .collect(),
        }
    }

    /// NXDOMAIN, or NOERROR with an empty answer section (NODATA).
    pub fn is_negative(&self) -> bool {
        self.answers.is_empty()
            && matches!(self.rcode, ResponseCode::NoError | ResponseCode::NXDomain)
    }

    pub fn records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.answers
            .iter()
            .chain(&self.authorities)
            .chain(&self.additionals)
            .filter(|rr| !rr.is_opt())
    }

    /// How long this answer may be cached, before any clamping.
    ///
    /// Positive answers live for the smallest record TTL. Negative answers are
    /// cacheable only with an SOA in the authority section, for
    /// `min(SOA TTL, SOA MINIMUM)` (RFC 2308 §5). Any other rcode is never
    /// cacheable.
    pub fn cache_ttl(&self) -> Option<u32> {
        if !matches!(self.rcode, ResponseCode::NoError | ResponseCode::NXDomain) {
            return None;
        }
        if self.is_negative() {
            return self
                .authorities
                .iter()
                .find_map(|rr| rr.rdata.as_soa().map(|soa| rr.ttl.min(soa.minimum)));
        }
        self.records().map(|rr| rr.ttl).min()
    }
}
