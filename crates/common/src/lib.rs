//! Common functionality for signed HTTP requests.
//!
//! This crate provides the signing primitive, the matching verifier and the
//! shared configuration used by the client, the verifying server and the CLI.
//!
//! # Modules
//!
//! - [`constants`]: Default header names and protocol constants
//! - [`error`]: Error types and HTTP status mapping
//! - [`logging`]: Logger initialisation
//! - [`request_signing`]: Key parsing, address derivation, signing and verification
//! - [`settings`]: Configuration management and validation
//! - [`test_support`]: Testing fixtures, also exported with the `test-support` feature

pub mod constants;
pub mod error;
pub mod logging;
pub mod request_signing;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
