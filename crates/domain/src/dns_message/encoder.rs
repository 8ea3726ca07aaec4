use super::{DomainName, Message, HEADER_LEN};
use crate::dns_record::{RData, ResourceRecord};
use std::collections::HashMap;

/// Compression pointers carry a 14-bit offset.
const MAX_POINTER_OFFSET: usize = 0x3FFF;

pub fn encode(msg: &Message) -> Vec<u8> {
    encode_sections(msg).0
}

/// Encodes `msg` into at most `max_len` bytes when possible.
///
/// Records are dropped from the end (additional, then authority, then answer)
/// and TC is set. The OPT record is kept if it still fits; the question
/// section is always kept, so a message whose question alone exceeds
/// `max_len` comes back oversized.
pub fn encode_with_limit(msg: &Message, max_len: usize) -> Vec<u8> {
    let full = encode(msg);
    if full.len() <= max_len {
        return full;
    }

    let mut truncated = msg.clone();
    let opt = truncated
        .additionals
        .iter()
        .position(|rr| rr.is_opt())
        .map(|i| truncated.additionals.remove(i));
    let (_, ends) = encode_sections(&truncated);
    let fits = |extra: usize| ends.iter().rposition(|&end| end + extra <= max_len);

    let opt_len = opt.as_ref().map(opt_wire_len).unwrap_or(0);
    let (keep, opt) = match (opt, fits(opt_len)) {
        (Some(opt), Some(keep)) => (keep, Some(opt)),
        _ => (fits(0).unwrap_or(0), None),
    };

    let mut remaining = keep;
    for section in [
        &mut truncated.answers,
        &mut truncated.authorities,
        &mut truncated.additionals,
    ] {
        let n = section.len().min(remaining);
        section.truncate(n);
        remaining -= n;
    }
    truncated.additionals.extend(opt);
    truncated.header.tc = true;
    encode(&truncated)
}

fn opt_wire_len(rr: &ResourceRecord) -> usize {
    let rdata_len = match &rr.rdata {
        RData::Opaque(bytes) => bytes.len(),
        _ => 0,
    };
    rr.name.wire_len() + 10 + rdata_len
}

/// Returns the encoding plus the buffer length after the question section
/// and after each record, in section order.
fn encode_sections(msg: &Message) -> (Vec<u8>, Vec<usize>) {
    let mut w = Writer::default();
    let h = &msg.header;
    w.put_u16(h.id);
    w.put_u16(h.flags());
    for count in [
        msg.questions.len(),
        msg.answers.len(),
        msg.authorities.len(),
        msg.additionals.len(),
    ] {
        w.put_u16(count.min(u16::MAX as usize) as u16);
    }
    debug_assert_eq!(w.buf.len(), HEADER_LEN);

    for q in &msg.questions {
        w.put_name(&q.name, true);
        w.put_u16(q.qtype.to_u16());
        w.put_u16(q.qclass.to_u16());
    }

    let mut ends = Vec::with_capacity(1 + msg.answers.len() + msg.authorities.len() + msg.additionals.len());
    ends.push(w.buf.len());
    for rr in msg
        .answers
        .iter()
        .chain(&msg.authorities)
        .chain(&msg.additionals)
    {
        w.put_record(rr);
        ends.push(w.buf.len());
    }
    (w.buf, ends)
}

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
    /// Uncompressed suffix bytes → offset where that suffix was written.
    names: HashMap<Vec<u8>, u16>,
}

impl Writer {
    fn put_u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_be_bytes());
    }

    fn put_name(&mut self, name: &DomainName, compress: bool) {
        let labels = name.labels();
        for i in 0..labels.len() {
            let suffix = suffix_key(&labels[i..]);
            if compress {
                if let Some(&offset) = self.names.get(&suffix) {
                    self.put_u16(0xC000 | offset);
                    return;
                }
            }
            let here = self.buf.len();
            if here <= MAX_POINTER_OFFSET {
                self.names.entry(suffix).or_insert(here as u16);
            }
            self.buf.push(labels[i].len() as u8);
            self.buf.extend_from_slice(&labels[i]);
        }
        self.buf.push(0);
    }

    fn put_record(&mut self, rr: &ResourceRecord) {
        self.put_name(&rr.name, true);
        self.put_u16(rr.rtype.to_u16());
        self.put_u16(rr.class.to_u16());
        self.put_u32(rr.ttl);

        let len_at = self.buf.len();
        self.put_u16(0);
        self.put_rdata(&rr.rdata);
        let rdlength = (self.buf.len() - len_at - 2) as u16;
        self.buf[len_at..len_at + 2].copy_from_slice(&rdlength.to_be_bytes());
    }

    fn put_rdata(&mut self, rdata: &RData) {
        match rdata {
            RData::A(ip) => self.buf.extend_from_slice(&ip.octets()),
            RData::AAAA(ip) => self.buf.extend_from_slice(&ip.octets()),
            RData::NS(name) | RData::CNAME(name) | RData::PTR(name) => self.put_name(name, true),
            RData::MX {
                preference,
                exchange,
            } => {
                self.put_u16(*preference);
                self.put_name(exchange, true);
            }
            RData::SOA(soa) => {
                self.put_name(&soa.mname, true);
                self.put_name(&soa.rname, true);
                for v in [soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum] {
                    self.put_u32(v);
                }
            }
            RData::TXT(strings) => {
                for s in strings {
                    let len = s.len().min(255);
                    self.buf.push(len as u8);
                    self.buf.extend_from_slice(&s[..len]);
                }
            }
            RData::SRV {
                priority,
                weight,
                port,
                target,
            } => {
                self.put_u16(*priority);
                self.put_u16(*weight);
                self.put_u16(*port);
                self.put_name(target, false);
            }
            RData::Opaque(bytes) => self.buf.extend_from_slice(bytes),
        }
    }
}

fn suffix_key(labels: &[Vec<u8>]) -> Vec<u8> {
    let mut key = Vec::with_capacity(labels.iter().map(|l| l.len() + 1).sum());
    for label in labels {
        key.push(label.len() as u8);
        key.extend_from_slice(label);
    }
    key
}
