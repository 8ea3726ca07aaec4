use crate::dns_message::{DomainName, Question};
use crate::dns_record::{RecordClass, RecordType};
use compact_str::CompactString;
use std::fmt;

/// Cache and coalescing identity of a question: the name is lowercased and
/// carries no trailing dot, so `WWW.Example.COM.` and `www.example.com` share
/// a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub name: CompactString,
    pub record_type: RecordType,
    pub record_class: RecordClass,
}

impl QueryKey {
    /// Builds the key from presentation text through [`DomainName`], so it
    /// matches the key [`QueryKey::from_question`] gives for the same name.
    /// Text that is not a valid name (never the case for a decoded question)
    /// is only lowercased.
    pub fn new(name: &str, record_type: RecordType, record_class: RecordClass) -> Self {
        let name = match name.parse::<DomainName>() {
            Ok(parsed) => parsed.to_key_string(),
            Err(_) => name.strip_suffix('.').unwrap_or(name).to_ascii_lowercase(),
        };
        Self {
            name: CompactString::from(name),
            record_type,
            record_class,
        }
    }

    pub fn from_question(question: &Question) -> Self {
        Self {
            name: CompactString::from(question.name.to_key_string()),
            record_type: question.qtype,
            record_class: question.qclass,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.record_class, self.record_type)
    }
}
