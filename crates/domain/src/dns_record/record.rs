use super::{RData, RecordClass, RecordType};
use crate::dns_message::DomainName;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRecord {
    pub name: DomainName,
    pub rtype: RecordType,
    pub class: RecordClass,
    pub ttl: u32,
    pub rdata: RData,
}

impl ResourceRecord {
    pub fn new(
        name: DomainName,
        rtype: RecordType,
        class: RecordClass,
        ttl: u32,
        rdata: RData,
    ) -> Self {
        Self {
            name,
            rtype,
            class,
            ttl,
            rdata,
        }
    }

    /// EDNS(0) OPT pseudo-record advertising `udp_size` (RFC 6891 §6.1.2).
    /// The CLASS field carries the payload size; TTL carries extended rcode,
    /// version and flags, all zero here.
    pub fn opt(udp_size: u16) -> Self {
        Self {
            name: DomainName::root(),
            rtype: RecordType::OPT,
            class: RecordClass::from_u16(udp_size),
            ttl: 0,
            rdata: RData::Opaque(Vec::new()),
        }
    }

    pub fn is_opt(&self) -> bool {
        self.rtype == RecordType::OPT
    }
}
