//! Transport headers carrying the address, signature and timestamp.

use error_stack::Report;
use http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::constants::{HEADER_ID_ADDRESS, HEADER_SIGNATURE, HEADER_TIMESTAMP};
use crate::error::SigningError;
use crate::settings::Headers;

use super::keys::Address;
use super::signing::RequestSignature;

/// Configured wire names of the authentication headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderNames {
    pub address: HeaderName,
    pub signature: HeaderName,
    pub timestamp: HeaderName,
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            address: HEADER_ID_ADDRESS,
            signature: HEADER_SIGNATURE,
            timestamp: HEADER_TIMESTAMP,
        }
    }
}

impl HeaderNames {
    /// # Errors
    ///
    /// Returns a configuration error if any configured name is not a valid
    /// HTTP header name.
    pub fn from_settings(headers: &Headers) -> Result<Self, Report<SigningError>> {
        Ok(Self {
            address: parse_header_name(&headers.address)?,
            signature: parse_header_name(&headers.signature)?,
            timestamp: parse_header_name(&headers.timestamp)?,
        })
    }
}

fn parse_header_name(name: &str) -> Result<HeaderName, Report<SigningError>> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        Report::new(SigningError::Configuration {
            message: format!("Invalid header name '{}': {}", name, e),
        })
    })
}

/// Values to attach to one outgoing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub address: Address,
    pub signature: RequestSignature,
    pub timestamp: i64,
}

impl SignedHeaders {
    /// Header name/value pairs in address, signature, timestamp order.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a value cannot be encoded as a header.
    pub fn to_pairs(
        &self,
        names: &HeaderNames,
    ) -> Result<[(HeaderName, HeaderValue); 3], Report<SigningError>> {
        Ok([
            (names.address.clone(), header_value(self.address.to_string())?),
            (
                names.signature.clone(),
                header_value(self.signature.to_string())?,
            ),
            (
                names.timestamp.clone(),
                header_value(self.timestamp.to_string())?,
            ),
        ])
    }

    /// Sets the three headers on `headers`, replacing existing values.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a value cannot be encoded as a header.
    pub fn apply(
        &self,
        names: &HeaderNames,
        headers: &mut HeaderMap,
    ) -> Result<(), Report<SigningError>> {
        for (name, value) in self.to_pairs(names)? {
            headers.insert(name, value);
        }
        Ok(())
    }
}

fn header_value(value: String) -> Result<HeaderValue, Report<SigningError>> {
    HeaderValue::try_from(value).map_err(|e| {
        Report::new(SigningError::Configuration {
            message: format!("Invalid header value: {}", e),
        })
    })
}
