//! Signing key parsing and identity address derivation.
//!
//! Keys are secp256k1 scalars supplied as hex. The public identity address is
//! the last 20 bytes of the Keccak-256 hash of the uncompressed public key.

use std::fmt;
use std::str::FromStr;

use error_stack::Report;
use k256::ecdsa::{SigningKey, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::SigningError;

/// Length of an identity address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

const PRIVATE_KEY_LENGTH: usize = 32;

/// Public identifier derived one-way from a signing key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    #[must_use]
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        // Drop the 0x04 SEC1 tag, hash the raw X || Y coordinates
        let hash = keccak256(&point.as_bytes()[1..]);

        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&hash[32 - ADDRESS_LENGTH..]);
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = Report<SigningError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(strip_hex_prefix(s.trim())).map_err(|e| {
            Report::new(SigningError::InvalidAddress {
                message: format!("Failed to decode address hex: {}", e),
            })
        })?;

        let bytes: [u8; ADDRESS_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
            Report::new(SigningError::InvalidAddress {
                message: format!(
                    "Invalid address length (expected {} bytes, got {})",
                    ADDRESS_LENGTH,
                    v.len()
                ),
            })
        })?;

        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(|e: Report<SigningError>| {
            serde::de::Error::custom(e.current_context().to_string())
        })
    }
}

/// Parses a hex encoded secp256k1 private key, with or without `0x` prefix.
///
/// # Errors
///
/// Returns [`SigningError::InvalidKey`] if the input is not hex, is not 32
/// bytes long, or is not a valid scalar (zero or above the curve order).
pub fn parse_signing_key(hex_key: &str) -> Result<SigningKey, Report<SigningError>> {
    let bytes = hex::decode(strip_hex_prefix(hex_key.trim())).map_err(|e| {
        Report::new(SigningError::InvalidKey {
            message: format!("Failed to decode hex key: {}", e),
        })
    })?;

    if bytes.len() != PRIVATE_KEY_LENGTH {
        return Err(Report::new(SigningError::InvalidKey {
            message: format!(
                "Invalid key length (expected {} bytes for secp256k1, got {})",
                PRIVATE_KEY_LENGTH,
                bytes.len()
            ),
        }));
    }

    SigningKey::from_slice(&bytes).map_err(|_| {
        Report::new(SigningError::InvalidKey {
            message: "Key is not a valid secp256k1 scalar".into(),
        })
    })
}

/// Derives the public identity address for a signing key.
#[must_use]
pub fn derive_address(signing_key: &SigningKey) -> Address {
    Address::from_verifying_key(signing_key.verifying_key())
}

#[must_use]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let digest = Keccak256::digest(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
