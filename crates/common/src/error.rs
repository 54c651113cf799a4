//! Error types shared by the signer, the verifier and their transports.
//!
//! Errors are propagated as [`error_stack::Report<SigningError>`] so callers can
//! attach context as they bubble up. The [`IntoHttpResponse`] trait maps each
//! variant onto the status code and error id the verifying server reports.

use derive_more::{Display, Error};
use http::StatusCode;

#[derive(Debug, Display, Error)]
pub enum SigningError {
    /// The private signing key could not be parsed.
    #[display("Invalid signing key: {message}")]
    InvalidKey { message: String },

    /// A required authentication header was absent or not valid UTF-8.
    #[display("Missing {header}")]
    MissingHeader { header: String },

    /// The timestamp header was unparsable or outside the accepted window.
    #[display("Invalid timestamp: {message}")]
    InvalidTimestamp { message: String },

    /// The identity address header was malformed.
    #[display("Invalid identity address: {message}")]
    InvalidAddress { message: String },

    /// The signature header was malformed or unrecoverable.
    #[display("Invalid signature: {message}")]
    InvalidSignature { message: String },

    /// The signature recovered to a different address than the one claimed.
    #[display("Signature does not match address {claimed}")]
    AddressMismatch { claimed: String },

    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// Transport-level failure reported by the HTTP client.
    #[display("HTTP error: {message}")]
    Http { message: String },
}

/// Maps an error onto the HTTP response the verifying server sends back.
pub trait IntoHttpResponse {
    /// Status code for the response.
    fn status_code(&self) -> StatusCode;

    /// Stable machine-readable error id.
    fn error_id(&self) -> &'static str;

    /// Message safe to show to the remote caller.
    fn user_message(&self) -> String;
}

impl IntoHttpResponse for SigningError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingHeader { .. }
            | Self::InvalidTimestamp { .. }
            | Self::InvalidAddress { .. } => StatusCode::BAD_REQUEST,
            Self::InvalidSignature { .. } | Self::AddressMismatch { .. } => {
                StatusCode::UNAUTHORIZED
            }
            Self::Http { .. } => StatusCode::BAD_GATEWAY,
            Self::InvalidKey { .. } | Self::Configuration { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_id(&self) -> &'static str {
        match self {
            Self::MissingHeader { .. } => "bad_arguments",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::InvalidAddress { .. } => "invalid_id_address",
            Self::InvalidSignature { .. } | Self::AddressMismatch { .. } => "invalid_signature",
            Self::Http { .. } => "bad_gateway",
            Self::InvalidKey { .. } | Self::Configuration { .. } => "internal_error",
        }
    }

    fn user_message(&self) -> String {
        match self {
            // Server-side details stay in the logs
            Self::InvalidKey { .. } | Self::Configuration { .. } => {
                "Internal server error".to_string()
            }
            Self::AddressMismatch { .. } => "Invalid signature".to_string(),
            _ => self.to_string(),
        }
    }
}
