//! Relay DNS Domain Layer
pub mod cached_entry;
pub mod config;
pub mod dns_answer;
pub mod dns_message;
pub mod dns_protocol;
pub mod dns_record;
pub mod errors;
pub mod query_key;

pub use cached_entry::CachedEntry;
pub use config::Config;
pub use dns_answer::DnsAnswer;
pub use dns_message::{DomainName, Header, Message, Opcode, Question, ResponseCode};
pub use dns_protocol::{DnsProtocol, InboundTransport};
pub use dns_record::{RData, RecordClass, RecordType, ResourceRecord, SoaData};
pub use errors::DomainError;
pub use query_key::QueryKey;
