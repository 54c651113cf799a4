//! Request signing.
//!
//! Signatures are recoverable secp256k1 ECDSA over the Keccak-256 hash of the
//! personal-message framed canonical envelope. Nonces follow RFC 6979, so the
//! same key and envelope always produce the same signature.

use std::fmt;
use std::str::FromStr;

use error_stack::{Report, ResultExt};
use k256::ecdsa::{RecoveryId, Signature, SigningKey};

use crate::error::SigningError;
use crate::settings::Settings;

use super::envelope::Envelope;
use super::headers::SignedHeaders;
use super::keys::{derive_address, parse_signing_key, strip_hex_prefix, Address};

/// `r || s || v`
pub const SIGNATURE_LENGTH: usize = 65;

const RECOVERY_ID_OFFSET: u8 = 27;

/// A 65 byte recoverable signature, rendered as `0x` prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RequestSignature([u8; SIGNATURE_LENGTH]);

impl RequestSignature {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub(crate) fn to_parts(self) -> Result<(Signature, RecoveryId), Report<SigningError>> {
        let signature = Signature::from_slice(&self.0[..64]).map_err(|e| {
            Report::new(SigningError::InvalidSignature {
                message: format!("Malformed r/s values: {}", e),
            })
        })?;

        // Accept both raw (0/1) and offset (27/28) recovery ids
        let v = self.0[64];
        let recovery_byte = match v {
            0 | 1 => v,
            27 | 28 => v - RECOVERY_ID_OFFSET,
            _ => {
                return Err(Report::new(SigningError::InvalidSignature {
                    message: format!("Unsupported recovery id {}", v),
                }))
            }
        };
        let recovery_id = RecoveryId::from_byte(recovery_byte).ok_or_else(|| {
            Report::new(SigningError::InvalidSignature {
                message: format!("Unsupported recovery id {}", v),
            })
        })?;

        Ok((signature, recovery_id))
    }
}

impl fmt::Display for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestSignature({})", self)
    }
}

impl FromStr for RequestSignature {
    type Err = Report<SigningError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(strip_hex_prefix(s.trim())).map_err(|e| {
            Report::new(SigningError::InvalidSignature {
                message: format!("Failed to decode signature hex: {}", e),
            })
        })?;

        let bytes: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
            Report::new(SigningError::InvalidSignature {
                message: format!(
                    "Signature must be {} bytes, got {}",
                    SIGNATURE_LENGTH,
                    v.len()
                ),
            })
        })?;

        Ok(Self(bytes))
    }
}

/// Current unix time in seconds.
#[must_use]
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Signs an envelope with `signing_key`.
///
/// # Errors
///
/// Returns [`SigningError::InvalidKey`] if the ECDSA primitive rejects the key.
pub fn sign_envelope(
    signing_key: &SigningKey,
    envelope: &Envelope<'_>,
) -> Result<RequestSignature, Report<SigningError>> {
    let hash = envelope.signing_hash();
    let (signature, recovery_id) = signing_key.sign_prehash_recoverable(&hash).map_err(|e| {
        Report::new(SigningError::InvalidKey {
            message: format!("Failed to sign request: {}", e),
        })
    })?;

    let mut bytes = [0u8; SIGNATURE_LENGTH];
    bytes[..64].copy_from_slice(&signature.to_bytes());
    bytes[64] = recovery_id.to_byte() + RECOVERY_ID_OFFSET;

    Ok(RequestSignature(bytes))
}

/// Signs the `(method, path, timestamp, body)` tuple.
///
/// # Errors
///
/// Returns [`SigningError::InvalidKey`] if the ECDSA primitive rejects the key.
pub fn sign_request(
    signing_key: &SigningKey,
    method: &str,
    path: &str,
    timestamp: i64,
    body: &[u8],
) -> Result<RequestSignature, Report<SigningError>> {
    sign_envelope(signing_key, &Envelope::new(method, path, timestamp, body))
}

/// A parsed signing key paired with its identity address.
#[derive(Clone)]
pub struct RequestSigner {
    key: SigningKey,
    address: Address,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl RequestSigner {
    #[must_use]
    pub fn new(key: SigningKey) -> Self {
        let address = derive_address(&key);
        Self { key, address }
    }

    /// # Errors
    ///
    /// Returns [`SigningError::InvalidKey`] if `hex_key` is malformed.
    pub fn from_hex(hex_key: &str) -> Result<Self, Report<SigningError>> {
        Ok(Self::new(parse_signing_key(hex_key)?))
    }

    /// Builds a signer from the `[signing] private_key` setting.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no key is configured, or
    /// [`SigningError::InvalidKey`] if the configured key is malformed.
    pub fn from_settings(settings: &Settings) -> Result<Self, Report<SigningError>> {
        let key = settings.signing.private_key.as_deref().ok_or_else(|| {
            Report::new(SigningError::Configuration {
                message: "Missing [signing] private_key".into(),
            })
        })?;

        Self::from_hex(key).attach("while loading [signing] private_key")
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// # Errors
    ///
    /// Returns [`SigningError::InvalidKey`] if signing fails.
    pub fn sign(&self, envelope: &Envelope<'_>) -> Result<RequestSignature, Report<SigningError>> {
        sign_envelope(&self.key, envelope)
    }

    /// Signs a request and bundles the values to transmit as headers.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidKey`] if signing fails.
    pub fn sign_headers(
        &self,
        method: &str,
        path: &str,
        timestamp: i64,
        body: &[u8],
    ) -> Result<SignedHeaders, Report<SigningError>> {
        let signature = self.sign(&Envelope::new(method, path, timestamp, body))?;

        log::debug!(
            "Signed {} {} at {} for {}",
            method,
            path,
            timestamp,
            self.address
        );

        Ok(SignedHeaders {
            address: self.address,
            signature,
            timestamp,
        })
    }

    /// Like [`RequestSigner::sign_headers`], stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`SigningError::InvalidKey`] if signing fails.
    pub fn sign_headers_now(
        &self,
        method: &str,
        path: &str,
        body: &[u8],
    ) -> Result<SignedHeaders, Report<SigningError>> {
        self.sign_headers(method, path, unix_timestamp(), body)
    }
}
