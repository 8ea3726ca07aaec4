//! Outbound query construction for upstream forwarding.

use relay_dns_domain::dns_message::MAX_UDP_PAYLOAD;
use relay_dns_domain::{Message, Question, ResourceRecord};

/// Builds the messages the relay sends upstream.
pub struct MessageBuilder;

impl MessageBuilder {
    /// Recursive query for `question` with:
    /// - a fresh random ID, unrelated to the client's
    /// - RD set
    /// - an OPT record advertising a 4096-byte UDP payload
    pub fn build_query(question: &Question) -> Message {
        Self::build_query_with_id(fastrand::u16(..), question)
    }

    pub fn build_query_with_id(id: u16, question: &Question) -> Message {
        let mut message = Message::query(id, question.clone());
        message.additionals.push(ResourceRecord::opt(MAX_UDP_PAYLOAD));
        message
    }
}
