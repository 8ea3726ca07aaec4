//! DNS wire format (RFC 1035 §4) with name compression.

mod decoder;
mod encoder;
mod header;
mod message;
mod name;
mod question;

pub use decoder::{decode, MAX_POINTER_HOPS};
pub use encoder::{encode, encode_with_limit};
pub use header::{Header, Opcode, ResponseCode, HEADER_LEN};
pub use message::{Message, MAX_UDP_PAYLOAD, MIN_UDP_PAYLOAD};
pub use name::{DomainName, MAX_LABEL_LEN, MAX_NAME_LEN};
pub use question::Question;
