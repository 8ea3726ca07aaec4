#![allow(dead_code)]
use relay_dns_domain::{
    DomainName, Message, Question, RData, RecordClass, RecordType, ResourceRecord, ResponseCode,
    SoaData,
};
use std::net::Ipv4Addr;

pub fn name(s: &str) -> DomainName {
    s.parse().unwrap()
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

pub fn cname_record(owner: &str, ttl: u32, target: &str) -> ResourceRecord {
    ResourceRecord::new(
        name(owner),
        RecordType::CNAME,
        RecordClass::IN,
        ttl,
        RData::CNAME(name(target)),
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
            serial: 2024010101,
            refresh: 7200,
            retry: 3600,
            expire: 1_209_600,
            minimum,
        }),
    )
}

pub fn query_message(id: u16, qname: &str, qtype: RecordType) -> Message {
    Message::query(id, Question::new(name(qname), qtype, RecordClass::IN))
}

pub struct ResponseBuilder {
    msg: Message,
}

impl ResponseBuilder {
    pub fn to(query: &Message) -> Self {
        let mut msg = query.clone();
        msg.header.qr = true;
        msg.header.ra = true;
        msg.additionals.clear();
        Self { msg }
    }

    pub fn rcode(mut self, rcode: ResponseCode) -> Self {
        self.msg.header.rcode = rcode;
        self
    }

    pub fn answer(mut self, rr: ResourceRecord) -> Self {
        self.msg.answers.push(rr);
        self
    }

    pub fn authority(mut self, rr: ResourceRecord) -> Self {
        self.msg.authorities.push(rr);
        self
    }

    pub fn additional(mut self, rr: ResourceRecord) -> Self {
        self.msg.additionals.push(rr);
        self
    }

    pub fn build(self) -> Message {
        self.msg
    }
}
