use crate::dns_message::DomainName;
use std::net::{Ipv4Addr, Ipv6Addr};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SoaData {
    pub mname: DomainName,
    pub rname: DomainName,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    /// Negative-caching TTL (RFC 2308).
    pub minimum: u32,
}

/// Record data. Types the relay has no reason to look inside stay `Opaque`
/// and are replayed exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    NS(DomainName),
    CNAME(DomainName),
    PTR(DomainName),
    MX {
        preference: u16,
        exchange: DomainName,
    },
    SOA(SoaData),
    TXT(Vec<Vec<u8>>),
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: DomainName,
    },
    Opaque(Vec<u8>),
}

impl RData {
    pub fn as_soa(&self) -> Option<&SoaData> {
        match self {
            RData::SOA(soa) => Some(soa),
            _ => None,
        }
    }
}
