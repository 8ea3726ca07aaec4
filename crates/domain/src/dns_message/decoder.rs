use super::{DomainName, Header, Message, Question, HEADER_LEN};
use crate::dns_record::{RData, RecordClass, RecordType, ResourceRecord, SoaData};
use crate::errors::DomainError;
use smallvec::SmallVec;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Upper bound on compression pointers followed while reading one name.
pub const MAX_POINTER_HOPS: usize = 127;

pub fn decode(bytes: &[u8]) -> Result<Message, DomainError> {
    if bytes.len() < HEADER_LEN {
        return Err(DomainError::malformed("message shorter than header"));
    }
    let mut reader = Reader::new(bytes);
    let id = reader.read_u16()?;
    let flags = reader.read_u16()?;
    let qdcount = reader.read_u16()?;
    let ancount = reader.read_u16()?;
    let nscount = reader.read_u16()?;
    let arcount = reader.read_u16()?;

    let mut msg = Message::new(Header::from_parts(id, flags));
    msg.questions = (0..qdcount)
        .map(|_| reader.read_question())
        .collect::<Result<_, _>>()?;
    msg.answers = reader.read_records(ancount)?;
    msg.authorities = reader.read_records(nscount)?;
    msg.additionals = reader.read_records(arcount)?;
    Ok(msg)
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], DomainError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.buf.len())
            .ok_or_else(|| {
                DomainError::malformed(format!("truncated at offset {} (need {} bytes)", self.pos, n))
            })?;
        let buf = self.buf;
        let slice = &buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, DomainError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16, DomainError> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, DomainError> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_name(&mut self) -> Result<DomainName, DomainError> {
        let (name, end) = read_name_at(self.buf, self.pos)?;
        self.pos = end;
        Ok(name)
    }

    fn read_question(&mut self) -> Result<Question, DomainError> {
        let name = self.read_name()?;
        let qtype = RecordType::from_u16(self.read_u16()?);
        let qclass = RecordClass::from_u16(self.read_u16()?);
        Ok(Question::new(name, qtype, qclass))
    }

    fn read_records(&mut self, count: u16) -> Result<Vec<ResourceRecord>, DomainError> {
        (0..count).map(|_| self.read_record()).collect()
    }

    fn read_record(&mut self) -> Result<ResourceRecord, DomainError> {
        let name = self.read_name()?;
        let rtype = RecordType::from_u16(self.read_u16()?);
        let class = RecordClass::from_u16(self.read_u16()?);
        let ttl = self.read_u32()?;
        let rdlength = self.read_u16()? as usize;
        let start = self.pos;
        // Bounds-check the whole RDATA before interpreting any of it.
        self.read_bytes(rdlength)?;
        self.pos = start;
        let rdata = self.read_rdata(rtype, rdlength)?;
        if self.pos != start + rdlength {
            return Err(DomainError::malformed(format!(
                "{} RDATA length {} disagrees with its contents",
                rtype, rdlength
            )));
        }
        Ok(ResourceRecord::new(name, rtype, class, ttl, rdata))
    }

    fn read_rdata(&mut self, rtype: RecordType, rdlength: usize) -> Result<RData, DomainError> {
        // Empty RDATA is legal in UPDATE prerequisites for any type.
        if rdlength == 0 {
            return Ok(RData::Opaque(Vec::new()));
        }
        let end = self.pos + rdlength;
        let rdata = match rtype {
            RecordType::A => {
                let b = self.read_bytes(4)?;
                RData::A(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
            }
            RecordType::AAAA => {
                let b = self.read_bytes(16)?;
                let mut octets = [0u8; 16];
                octets.copy_from_slice(b);
                RData::AAAA(Ipv6Addr::from(octets))
            }
            RecordType::NS => RData::NS(self.read_name()?),
            RecordType::CNAME => RData::CNAME(self.read_name()?),
            RecordType::PTR => RData::PTR(self.read_name()?),
            RecordType::MX => RData::MX {
                preference: self.read_u16()?,
                exchange: self.read_name()?,
            },
            RecordType::SOA => RData::SOA(SoaData {
                mname: self.read_name()?,
                rname: self.read_name()?,
                serial: self.read_u32()?,
                refresh: self.read_u32()?,
                retry: self.read_u32()?,
                expire: self.read_u32()?,
                minimum: self.read_u32()?,
            }),
            RecordType::TXT => {
                let mut strings = Vec::new();
                while self.pos < end {
                    let len = self.read_u8()? as usize;
                    strings.push(self.read_bytes(len)?.to_vec());
                }
                RData::TXT(strings)
            }
            RecordType::SRV => RData::SRV {
                priority: self.read_u16()?,
                weight: self.read_u16()?,
                port: self.read_u16()?,
                target: self.read_name()?,
            },
            _ => RData::Opaque(self.read_bytes(rdlength)?.to_vec()),
        };
        Ok(rdata)
    }
}

/// Reads a possibly compressed name starting at `start`. Returns the name and
/// the offset just past its in-place encoding.
///
/// Every pointer must jump strictly backwards, before the label sequence it
/// terminates, and past the header. Visited targets are tracked so a cycle
/// is reported as such even before the hop limit trips.
fn read_name_at(buf: &[u8], start: usize) -> Result<(DomainName, usize), DomainError> {
    let mut name = DomainName::root();
    let mut pos = start;
    let mut seq_start = start;
    let mut end: Option<usize> = None;
    let mut visited: SmallVec<[usize; 8]> = SmallVec::new();

    loop {
        let len = *buf
            .get(pos)
            .ok_or_else(|| DomainError::malformed("name runs past end of message"))?;
        match len & 0xC0 {
            0x00 => {
                if len == 0 {
                    return Ok((name, end.unwrap_or(pos + 1)));
                }
                let label_len = len as usize;
                let label = buf
                    .get(pos + 1..pos + 1 + label_len)
                    .ok_or_else(|| DomainError::malformed("label runs past end of message"))?;
                name.push_label(label.to_vec())
                    .map_err(|e| DomainError::malformed(e.to_string()))?;
                pos += 1 + label_len;
            }
            0xC0 => {
                let low = *buf
                    .get(pos + 1)
                    .ok_or_else(|| DomainError::malformed("pointer runs past end of message"))?;
                let target = (((len & 0x3F) as usize) << 8) | low as usize;
                if end.is_none() {
                    end = Some(pos + 2);
                }
                if target < HEADER_LEN {
                    return Err(DomainError::malformed(format!(
                        "compression pointer into header ({})",
                        target
                    )));
                }
                if target >= seq_start {
                    return Err(DomainError::malformed(format!(
                        "forward compression pointer at {} to {}",
                        pos, target
                    )));
                }
                if visited.contains(&target) {
                    return Err(DomainError::malformed(format!(
                        "compression pointer cycle at {}",
                        target
                    )));
                }
                if visited.len() >= MAX_POINTER_HOPS {
                    return Err(DomainError::malformed("too many compression pointers"));
                }
                visited.push(target);
                pos = target;
                seq_start = target;
            }
            _ => {
                return Err(DomainError::malformed(format!(
                    "unsupported label type 0x{:02x}",
                    len & 0xC0
                )));
            }
        }
    }
}
