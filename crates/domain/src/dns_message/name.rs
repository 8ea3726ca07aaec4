use crate::errors::DomainError;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

pub const MAX_LABEL_LEN: usize = 63;
/// Maximum encoded length of a name, including length octets and the root label.
pub const MAX_NAME_LEN: usize = 255;

/// A domain name as a sequence of raw labels.
///
/// Labels are kept byte-for-byte as received so that replayed answers keep
/// the upstream's casing; comparisons for cache identity go through
/// [`DomainName::to_key_string`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DomainName {
    labels: SmallVec<[Vec<u8>; 4]>,
}

impl DomainName {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_labels<I, L>(labels: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        let mut name = Self::root();
        for label in labels {
            name.push_label(label.into())?;
        }
        Ok(name)
    }

    pub(crate) fn push_label(&mut self, label: Vec<u8>) -> Result<(), DomainError> {
        if label.is_empty() {
            return Err(DomainError::InvalidDomainName("empty label".into()));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(DomainError::InvalidDomainName(format!(
                "label of {} bytes exceeds {}",
                label.len(),
                MAX_LABEL_LEN
            )));
        }
        if self.wire_len() + label.len() + 1 > MAX_NAME_LEN {
            return Err(DomainError::InvalidDomainName(format!(
                "name exceeds {} bytes",
                MAX_NAME_LEN
            )));
        }
        self.labels.push(label);
        Ok(())
    }

    pub fn labels(&self) -> &[Vec<u8>] {
        &self.labels
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Uncompressed wire length.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// Lowercased presentation form without the trailing dot; the root name
    /// is the empty string.
    pub fn to_key_string(&self) -> String {
        let mut out = String::with_capacity(self.wire_len());
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            push_label_text(&mut out, label, true);
        }
        out
    }

    pub fn eq_ignore_case(&self, other: &DomainName) -> bool {
        self.labels.len() == other.labels.len()
            && self
                .labels
                .iter()
                .zip(other.labels.iter())
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

fn push_label_text(out: &mut String, label: &[u8], lowercase: bool) {
    for &b in label {
        let b = if lowercase { b.to_ascii_lowercase() } else { b };
        match b {
            b'.' | b'\\' => {
                out.push('\\');
                out.push(b as char);
            }
            0x21..=0x7E => out.push(b as char),
            _ => out.push_str(&format!("\\{:03}", b)),
        }
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        let mut out = String::with_capacity(self.wire_len());
        for label in &self.labels {
            push_label_text(&mut out, label, false);
            out.push('.');
        }
        f.write_str(&out)
    }
}

impl FromStr for DomainName {
    type Err = DomainError;

    /// Parses presentation form. Escapes are not interpreted; a trailing dot is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_suffix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        Self::from_labels(trimmed.split('.').map(|l| l.as_bytes().to_vec()))
    }
}
