use relay_dns_domain::dns_message::{encode_with_limit, HEADER_LEN, MAX_UDP_PAYLOAD};
use relay_dns_domain::{
    DnsAnswer, Header, InboundTransport, Message, ResourceRecord, ResponseCode,
};

/// Largest message a 2-byte TCP length prefix can frame.
pub const MAX_TCP_MESSAGE_LEN: usize = u16::MAX as usize;

/// Builds the response for one caller from a shared answer.
///
/// Everything per-request (ID, opcode, RD, CD, question, EDNS presence) comes
/// from that caller's own request, so callers served by one coalesced fetch
/// never see each other's IDs.
#[derive(Debug, Clone)]
pub struct ResponseAssembler {
    recursion_available: bool,
    udp_payload_size: u16,
}

impl ResponseAssembler {
    pub fn new(recursion_available: bool) -> Self {
        Self {
            recursion_available,
            udp_payload_size: MAX_UDP_PAYLOAD,
        }
    }

    /// `age_secs` is subtracted from every record TTL; pass 0 for a fresh answer.
    pub fn assemble(&self, request: &Message, answer: &DnsAnswer, age_secs: u32) -> Message {
        let mut header = self.response_header(&request.header, answer.rcode);
        header.aa = answer.authoritative;
        header.ad = answer.authentic_data;

        let mut response = Message::new(header);
        response.questions = request.questions.clone();
        response.answers = aged(&answer.answers, age_secs);
        response.authorities = aged(&answer.authorities, age_secs);
        response.additionals = aged(&answer.additionals, age_secs);
        self.attach_opt(request, &mut response);
        response
    }

    pub fn error_response(&self, request: &Message, rcode: ResponseCode) -> Message {
        let mut response = Message::new(self.response_header(&request.header, rcode));
        response.questions = request.questions.clone();
        self.attach_opt(request, &mut response);
        response
    }

    /// FORMERR for bytes that did not decode. Only the header is echoed, and
    /// only when there is a whole header to echo. Undecodable responses (QR
    /// set) are never answered.
    pub fn format_error(&self, raw: &[u8]) -> Option<Vec<u8>> {
        if raw.len() < HEADER_LEN || raw[2] & 0x80 != 0 {
            return None;
        }
        let request = Header::from_parts(
            u16::from_be_bytes([raw[0], raw[1]]),
            u16::from_be_bytes([raw[2], raw[3]]),
        );
        let response = Message::new(self.response_header(&request, ResponseCode::FormErr));
        Some(response.encode())
    }

    /// Serializes `response` within what the requestor's transport can take,
    /// setting TC when records had to be dropped.
    pub fn encode_for(
        &self,
        request: &Message,
        response: &Message,
        transport: InboundTransport,
    ) -> Vec<u8> {
        let limit = match transport {
            InboundTransport::Udp => request.max_udp_response_len(),
            InboundTransport::Tcp => MAX_TCP_MESSAGE_LEN,
        };
        encode_with_limit(response, limit)
    }

    fn response_header(&self, request: &Header, rcode: ResponseCode) -> Header {
        Header {
            id: request.id,
            qr: true,
            opcode: request.opcode,
            aa: false,
            tc: false,
            rd: request.rd,
            ra: self.recursion_available,
            z: false,
            ad: false,
            cd: request.cd,
            rcode,
        }
    }

    fn attach_opt(&self, request: &Message, response: &mut Message) {
        if request.opt().is_some() {
            response
                .additionals
                .push(ResourceRecord::opt(self.udp_payload_size));
        }
    }
}

impl Default for ResponseAssembler {
    fn default() -> Self {
        Self::new(true)
    }
}

fn aged(records: &[ResourceRecord], age_secs: u32) -> Vec<ResourceRecord> {
    records
        .iter()
        .map(|rr| {
            let mut rr = rr.clone();
            rr.ttl = rr.ttl.saturating_sub(age_secs);
            rr
        })
        .collect()
}
