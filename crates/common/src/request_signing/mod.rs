//! Request signing utilities.
//!
//! This module provides secp256k1 signing of HTTP requests over a canonical
//! `(method, path, timestamp, body)` envelope, identity address derivation,
//! and the matching server side verification.

pub mod envelope;
pub mod headers;
pub mod keys;
pub mod signing;
pub mod verification;

pub use envelope::*;
pub use headers::*;
pub use keys::*;
pub use signing::*;
pub use verification::*;
