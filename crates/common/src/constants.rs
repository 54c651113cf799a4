use http::header::HeaderName;

pub const HEADER_ID_ADDRESS: HeaderName = HeaderName::from_static("toshi-id-address");
pub const HEADER_SIGNATURE: HeaderName = HeaderName::from_static("toshi-signature");
pub const HEADER_TIMESTAMP: HeaderName = HeaderName::from_static("toshi-timestamp");

/// Maximum allowed clock skew between signer and verifier, in seconds.
pub const DEFAULT_TIMESTAMP_TOLERANCE_SECS: u64 = 180;

/// Framing prepended to the canonical string before hashing.
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";
