//! Server side verification of signed requests.

use error_stack::{Report, ResultExt};
use http::header::{HeaderMap, HeaderName};
use k256::ecdsa::VerifyingKey;

use crate::error::SigningError;
use crate::settings::Settings;

use super::envelope::Envelope;
use super::headers::HeaderNames;
use super::keys::Address;
use super::signing::RequestSignature;

/// Recovers the address that produced `signature` over `envelope`.
///
/// # Errors
///
/// Returns [`SigningError::InvalidSignature`] if the signature is malformed
/// or no public key can be recovered from it.
pub fn recover_address(
    envelope: &Envelope<'_>,
    signature: &RequestSignature,
) -> Result<Address, Report<SigningError>> {
    let (signature, recovery_id) = signature.to_parts()?;
    let hash = envelope.signing_hash();

    let verifying_key = VerifyingKey::recover_from_prehash(&hash, &signature, recovery_id)
        .map_err(|e| {
            Report::new(SigningError::InvalidSignature {
                message: format!("Failed to recover public key: {}", e),
            })
        })?;

    Ok(Address::from_verifying_key(&verifying_key))
}

/// Checks that `signature_hex` was produced over `envelope` by `claimed`.
///
/// Returns `Ok(false)` for a well-formed signature from another key.
///
/// # Errors
///
/// Returns [`SigningError::InvalidSignature`] if the signature is malformed.
pub fn verify_signature(
    envelope: &Envelope<'_>,
    signature_hex: &str,
    claimed: &Address,
) -> Result<bool, Report<SigningError>> {
    let signature: RequestSignature = signature_hex.parse()?;
    let recovered = recover_address(envelope, &signature)?;

    Ok(&recovered == claimed)
}

/// Rejects timestamps further than `tolerance_secs` from `now` in either direction.
///
/// # Errors
///
/// Returns [`SigningError::InvalidTimestamp`] when the timestamp is out of range.
pub fn check_timestamp(
    timestamp: i64,
    now: i64,
    tolerance_secs: u64,
) -> Result<(), Report<SigningError>> {
    let skew = now.checked_sub(timestamp).map(i64::unsigned_abs);

    match skew {
        Some(skew) if skew <= tolerance_secs => Ok(()),
        _ => Err(Report::new(SigningError::InvalidTimestamp {
            message: format!(
                "The difference between the timestamp and the current time is too large \
                (timestamp {}, now {}, tolerance {}s)",
                timestamp, now, tolerance_secs
            ),
        })),
    }
}

/// Validates the authentication headers of incoming requests.
#[derive(Debug, Clone)]
pub struct RequestVerifier {
    header_names: HeaderNames,
    timestamp_tolerance_secs: u64,
}

impl RequestVerifier {
    #[must_use]
    pub fn new(header_names: HeaderNames, timestamp_tolerance_secs: u64) -> Self {
        Self {
            header_names,
            timestamp_tolerance_secs,
        }
    }

    /// # Errors
    ///
    /// Returns a configuration error if a configured header name is invalid.
    pub fn from_settings(settings: &Settings) -> Result<Self, Report<SigningError>> {
        Ok(Self::new(
            HeaderNames::from_settings(&settings.headers)?,
            settings.server.timestamp_tolerance_secs,
        ))
    }

    #[must_use]
    pub fn header_names(&self) -> &HeaderNames {
        &self.header_names
    }

    /// Verifies a request and returns the authenticated identity address.
    ///
    /// `path` must be the path and query exactly as the client signed it.
    ///
    /// # Errors
    ///
    /// - [`SigningError::MissingHeader`] if a header is absent
    /// - [`SigningError::InvalidTimestamp`] if the timestamp is unparsable or stale
    /// - [`SigningError::InvalidAddress`] if the address header is malformed
    /// - [`SigningError::InvalidSignature`] if the signature is malformed
    /// - [`SigningError::AddressMismatch`] if the signature belongs to another key
    pub fn verify(
        &self,
        method: &str,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
        now: i64,
    ) -> Result<Address, Report<SigningError>> {
        let address_header = required_header(headers, &self.header_names.address)?;
        let signature_header = required_header(headers, &self.header_names.signature)?;
        let timestamp_header = required_header(headers, &self.header_names.timestamp)?;

        let timestamp: i64 = timestamp_header.trim().parse().map_err(|_| {
            Report::new(SigningError::InvalidTimestamp {
                message: format!("Given {} is invalid", self.header_names.timestamp),
            })
        })?;
        check_timestamp(timestamp, now, self.timestamp_tolerance_secs)?;

        let claimed: Address = address_header.parse()?;
        let signature: RequestSignature = signature_header.parse()?;

        let envelope = Envelope::new(method, path, timestamp, body);
        let recovered = recover_address(&envelope, &signature)
            .attach(format!("while verifying request from {}", claimed))?;

        if recovered != claimed {
            log::warn!(
                "Signature for {} {} recovered to {}, expected {}",
                method,
                path,
                recovered,
                claimed
            );
            return Err(Report::new(SigningError::AddressMismatch {
                claimed: claimed.to_string(),
            }));
        }

        log::debug!("Verified {} {} from {}", method, path, claimed);

        Ok(claimed)
    }
}

fn required_header<'a>(
    headers: &'a HeaderMap,
    name: &HeaderName,
) -> Result<&'a str, Report<SigningError>> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            Report::new(SigningError::MissingHeader {
                header: name.to_string(),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request_signing::RequestSigner;
    use crate::test_support::tests::{
        create_test_settings, OTHER_PRIVATE_KEY, TEST_ADDRESS, TEST_PRIVATE_KEY,
    };

    const NOW: i64 = 1_514_764_800;

    fn test_verifier() -> RequestVerifier {
        RequestVerifier::from_settings(&create_test_settings()).unwrap()
    }

    fn signed_headers(method: &str, path: &str, timestamp: i64, body: &[u8]) -> HeaderMap {
        let signer = RequestSigner::from_hex(TEST_PRIVATE_KEY).unwrap();
        let signed = signer.sign_headers(method, path, timestamp, body).unwrap();

        let mut headers = HeaderMap::new();
        signed.apply(&HeaderNames::default(), &mut headers).unwrap();
        headers
    }

    fn rejection(result: Result<Address, Report<SigningError>>) -> Report<SigningError> {
        result.expect_err("expected request to be rejected")
    }

    #[test]
    fn test_verify_accepts_valid_request() {
        let headers = signed_headers("POST", "/", NOW, b"file contents");

        let address = test_verifier()
            .verify("POST", "/", &headers, b"file contents", NOW)
            .unwrap();
        assert_eq!(address.to_string(), TEST_ADDRESS);
    }

    #[test]
    fn test_verify_rejects_method_case_change() {
        let headers = signed_headers("POST", "/", NOW, b"");

        let err = rejection(test_verifier().verify("post", "/", &headers, b"", NOW));
        assert!(matches!(err.current_context(), SigningError::AddressMismatch { .. }));
    }

    #[test]
    fn test_verify_missing_headers() {
        let verifier = test_verifier();
        let full = signed_headers("GET", "/", NOW, b"");

        for name in ["toshi-id-address", "toshi-signature", "toshi-timestamp"] {
            let mut headers = full.clone();
            headers.remove(name);

            let err = rejection(verifier.verify("GET", "/", &headers, b"", NOW));
            assert!(
                matches!(
                    err.current_context(),
                    SigningError::MissingHeader { header } if header == name
                ),
                "unexpected error for missing {}: {:?}",
                name,
                err
            );
        }
    }

    #[test]
    fn test_verify_rejects_tampered_body() {
        let headers = signed_headers("POST", "/", NOW, b"original");

        let err = rejection(test_verifier().verify("POST", "/", &headers, b"tampered", NOW));
        assert!(matches!(err.current_context(), SigningError::AddressMismatch { .. }));
    }

    #[test]
    fn test_verify_rejects_tampered_path_and_method() {
        let verifier = test_verifier();
        let headers = signed_headers("POST", "/", NOW, b"");

        let err = rejection(verifier.verify("POST", "/admin", &headers, b"", NOW));
        assert!(matches!(err.current_context(), SigningError::AddressMismatch { .. }));

        let err = rejection(verifier.verify("PUT", "/", &headers, b"", NOW));
        assert!(matches!(err.current_context(), SigningError::AddressMismatch { .. }));
    }

    #[test]
    fn test_verify_rejects_replayed_timestamp_header() {
        let mut headers = signed_headers("GET", "/", NOW, b"");
        headers.insert("toshi-timestamp", (NOW + 1).to_string().parse().unwrap());

        let err = rejection(test_verifier().verify("GET", "/", &headers, b"", NOW));
        assert!(matches!(err.current_context(), SigningError::AddressMismatch { .. }));
    }

    #[test]
    fn test_verify_rejects_stale_and_future_timestamps() {
        let verifier = test_verifier();

        let stale = signed_headers("GET", "/", NOW - 181, b"");
        let err = rejection(verifier.verify("GET", "/", &stale, b"", NOW));
        assert!(matches!(err.current_context(), SigningError::InvalidTimestamp { .. }));

        let future = signed_headers("GET", "/", NOW + 181, b"");
        let err = rejection(verifier.verify("GET", "/", &future, b"", NOW));
        assert!(matches!(err.current_context(), SigningError::InvalidTimestamp { .. }));

        let edge = signed_headers("GET", "/", NOW - 180, b"");
        assert!(verifier.verify("GET", "/", &edge, b"", NOW).is_ok());
    }

    #[test]
    fn test_verify_rejects_non_numeric_timestamp() {
        let mut headers = signed_headers("GET", "/", NOW, b"");
        headers.insert("toshi-timestamp", "yesterday".parse().unwrap());

        let err = rejection(test_verifier().verify("GET", "/", &headers, b"", NOW));
        assert!(matches!(err.current_context(), SigningError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_verify_rejects_malformed_address_and_signature() {
        let verifier = test_verifier();

        let mut headers = signed_headers("GET", "/", NOW, b"");
        headers.insert("toshi-id-address", "0x1234".parse().unwrap());
        let err = rejection(verifier.verify("GET", "/", &headers, b"", NOW));
        assert!(matches!(err.current_context(), SigningError::InvalidAddress { .. }));

        let mut headers = signed_headers("GET", "/", NOW, b"");
        headers.insert("toshi-signature", "0xnothex".parse().unwrap());
        let err = rejection(verifier.verify("GET", "/", &headers, b"", NOW));
        assert!(matches!(err.current_context(), SigningError::InvalidSignature { .. }));
    }

    #[test]
    fn test_verify_rejects_foreign_key_claiming_address() {
        let other = RequestSigner::from_hex(OTHER_PRIVATE_KEY).unwrap();
        let signed = other.sign_headers("GET", "/", NOW, b"").unwrap();

        let mut headers = HeaderMap::new();
        signed.apply(&HeaderNames::default(), &mut headers).unwrap();
        headers.insert("toshi-id-address", TEST_ADDRESS.parse().unwrap());

        let err = rejection(test_verifier().verify("GET", "/", &headers, b"", NOW));
        assert!(matches!(err.current_context(), SigningError::AddressMismatch { .. }));
    }

    #[test]
    fn test_verify_signature_bool_result() {
        let signer = RequestSigner::from_hex(TEST_PRIVATE_KEY).unwrap();
        let envelope = Envelope::new("GET", "/", NOW, b"");
        let signature = signer.sign(&envelope).unwrap().to_string();

        let own: Address = TEST_ADDRESS.parse().unwrap();
        assert!(verify_signature(&envelope, &signature, &own).unwrap());

        let other = RequestSigner::from_hex(OTHER_PRIVATE_KEY).unwrap().address();
        assert!(!verify_signature(&envelope, &signature, &other).unwrap());

        assert!(verify_signature(&envelope, "not-a-signature", &own).is_err());
    }

    #[test]
    fn test_check_timestamp_handles_extremes() {
        assert!(check_timestamp(i64::MIN, i64::MAX, 180).is_err());
        assert!(check_timestamp(NOW, NOW, 180).is_ok());
    }
}
