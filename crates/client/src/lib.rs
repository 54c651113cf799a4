//! Signing HTTP client.
//!
//! - [`auth`]: attaches address, signature and timestamp headers to requests
//! - [`client`]: blocking client that signs everything it sends
//! - [`multipart`]: in-memory multipart rendering so uploads can be signed

pub mod auth;
pub mod client;
pub mod multipart;

pub use auth::SigningAuth;
pub use client::SignedClient;
