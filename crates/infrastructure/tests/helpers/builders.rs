use relay_dns_domain::{
    DnsAnswer, DomainName, QueryKey, Question, RData, RecordClass, RecordType, ResourceRecord,
    ResponseCode, SoaData,
};
use std::net::Ipv4Addr;
use std::sync::Arc;

pub fn name(s: &str) -> DomainName {
    s.parse().unwrap()
}

pub fn question(qname: &str, qtype: RecordType) -> Question {
    Question::new(name(qname), qtype, RecordClass::IN)
}

pub fn key(qname: &str) -> QueryKey {
    QueryKey::new(qname, RecordType::A, RecordClass::IN)
}

pub fn a_record(owner: &str, ttl: u32, ip: [u8; 4]) -> ResourceRecord {
    ResourceRecord::new(
        name(owner),
        RecordType::A,
        RecordClass::IN,
        ttl,
        RData::A(Ipv4Addr::from(ip)),
    )
}

pub fn soa_record(zone: &str, ttl: u32, minimum: u32) -> ResourceRecord {
    ResourceRecord::new(
        name(zone),
        RecordType::SOA,
        RecordClass::IN,
        ttl,
        RData::SOA(SoaData {
            mname: name(&format!("ns1.{}", zone)),
            rname: name(&format!("hostmaster.{}", zone)),
            serial: 1,
            refresh: 7200,
            retry: 3600,
            expire: 1_209_600,
            minimum,
        }),
    )
}

fn answer_with(rcode: ResponseCode, answers: Vec<ResourceRecord>, authorities: Vec<ResourceRecord>) -> Arc<DnsAnswer> {
    Arc::new(DnsAnswer {
        rcode,
        authoritative: false,
        authentic_data: false,
        answers,
        authorities,
        additionals: vec![],
    })
}

pub fn positive(owner: &str, ttl: u32) -> Arc<DnsAnswer> {
    answer_with(ResponseCode::NoError, vec![a_record(owner, ttl, [192, 0, 2, 1])], vec![])
}

pub fn nxdomain(zone: &str, soa_ttl: u32, minimum: u32) -> Arc<DnsAnswer> {
    answer_with(ResponseCode::NXDomain, vec![], vec![soa_record(zone, soa_ttl, minimum)])
}

pub fn nxdomain_without_soa() -> Arc<DnsAnswer> {
    answer_with(ResponseCode::NXDomain, vec![], vec![])
}

pub fn servfail() -> Arc<DnsAnswer> {
    answer_with(ResponseCode::ServFail, vec![], vec![])
}
