//! Entry module consists of the per-record abstractions of the pipeline.
//!
//! Including to: `Contact`, the key normalizer and the fingerprint function.

use std::fmt::{self, Display};

use crc::{Crc, CRC_64_XZ};

/// CRC-64 over the ECMA-182 polynomial, reflected with all-ones init and xor-out.
const FINGERPRINT: Crc<u64> = Crc::<u64>::new(&CRC_64_XZ);

/// The transient value routed from a reader to a shard aggregator.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Contact {
    pub id: i64,
    pub fingerprint: u64,
}

impl Contact {
    pub fn new(id: i64, fingerprint: u64) -> Contact {
        Contact { id, fingerprint }
    }

    /// Parse one record line, without its line terminator.
    ///
    /// Returns `None` for anything that is not exactly `<id>\t<email>` with a
    /// non-empty email and an integer id.
    pub fn parse(line: &str) -> Option<Contact> {
        let mut fields = line.split('\t');

        let (id, email) = match (fields.next(), fields.next(), fields.next()) {
            (Some(id), Some(email), None) => (id, email),
            _ => return None,
        };

        if email.is_empty() {
            return None;
        }

        let id = id.parse::<i64>().ok()?;

        Some(Contact::new(id, fingerprint(&normalize(email))))
    }
}

impl Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}%{:016x}", self.id, self.fingerprint)
    }
}

/// Canonical key of a raw email: dots removed, ASCII lower-cased, whitespace trimmed.
///
/// Trimming happens last so that dots around whitespace can't leave a
/// leading or trailing space behind, which keeps the function idempotent.
pub fn normalize(raw: &str) -> String {
    let mut key: String = raw
        .chars()
        .filter(|c| *c != '.')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let trimmed = key.trim();
    if trimmed.len() != key.len() {
        key = trimmed.to_string();
    }

    key
}

#[inline]
pub fn fingerprint(key: &str) -> u64 {
    FINGERPRINT.checksum(key.as_bytes())
}
