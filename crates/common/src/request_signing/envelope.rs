//! Canonical encoding of the signed request tuple.

use base64::{engine::general_purpose, Engine};

use crate::constants::PERSONAL_MESSAGE_PREFIX;

use super::keys::keccak256;

/// The `(method, path, timestamp, body)` tuple covered by a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub method: &'a str,
    /// Request path including any query string.
    pub path: &'a str,
    /// Unix seconds.
    pub timestamp: i64,
    pub body: &'a [u8],
}

impl<'a> Envelope<'a> {
    #[must_use]
    pub fn new(method: &'a str, path: &'a str, timestamp: i64, body: &'a [u8]) -> Self {
        Self {
            method,
            path,
            timestamp,
            body,
        }
    }

    /// Newline separated method, path, timestamp and base64 Keccak-256 of
    /// the body. The method is taken byte for byte. An empty body contributes
    /// an empty hash field.
    #[must_use]
    pub fn canonical_string(&self) -> String {
        let body_hash = if self.body.is_empty() {
            String::new()
        } else {
            general_purpose::STANDARD.encode(keccak256(self.body))
        };

        format!(
            "{}\n{}\n{}\n{}",
            self.method,
            self.path,
            self.timestamp,
            body_hash
        )
    }

    /// Keccak-256 digest of the personal-message framed canonical string.
    #[must_use]
    pub fn signing_hash(&self) -> [u8; 32] {
        let canonical = self.canonical_string();
        let mut framed =
            Vec::with_capacity(PERSONAL_MESSAGE_PREFIX.len() + 20 + canonical.len());
        framed.extend_from_slice(PERSONAL_MESSAGE_PREFIX.as_bytes());
        framed.extend_from_slice(canonical.len().to_string().as_bytes());
        framed.extend_from_slice(canonical.as_bytes());
        keccak256(&framed)
    }
}
