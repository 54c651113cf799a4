//! Configuration loading and validation commands.
//!
//! Configuration is loaded from TOML files and merged with environment variables
//! prefixed with `SIGNED_REQUEST__`. For example,
//! `SIGNED_REQUEST__SERVER__BIND_ADDRESS` will override `server.bind_address`.

use std::path::Path;

use signed_request_common::request_signing::{HeaderNames, RequestSigner};
use signed_request_common::settings::Settings;

use crate::error::CliError;

/// Loads `file` if given, otherwise the built-in configuration.
pub(crate) fn load_settings(file: Option<&Path>) -> Result<Settings, CliError> {
    match file {
        Some(path) => {
            log::debug!("Loading config from: {}", path.display());
            Ok(Settings::from_file(path)?)
        }
        None => Ok(Settings::new()?),
    }
}

/// Picks the signing key: `--key` / `SIGNED_REQUEST_KEY` first, then
/// `[signing] private_key`.
pub(crate) fn resolve_signer(
    key: Option<&str>,
    settings: &Settings,
) -> Result<RequestSigner, CliError> {
    let signer = match key {
        Some(hex_key) => RequestSigner::from_hex(hex_key)?,
        None => RequestSigner::from_settings(settings).map_err(|_| {
            CliError::Config(
                "No signing key: pass --key, set SIGNED_REQUEST_KEY or configure [signing] private_key"
                    .into(),
            )
        })?,
    };

    log::debug!("Using identity {}", signer.address());
    Ok(signer)
}

/// Validate configuration file.
///
/// Validates TOML syntax, required fields and header names after merging
/// environment variables.
pub fn validate(file: &Path, verbose: bool) -> Result<(), CliError> {
    let settings = load_settings(Some(file))?;
    HeaderNames::from_settings(&settings.headers)?;

    println!("Configuration is valid");
    println!("  File: {}", file.display());
    println!("  Bind address: {}", settings.server.bind_address);

    if verbose {
        println!("\nHeaders:");
        println!("  address: {}", settings.headers.address);
        println!("  signature: {}", settings.headers.signature);
        println!("  timestamp: {}", settings.headers.timestamp);
        println!("\nServer:");
        println!(
            "  timestamp tolerance: {}s",
            settings.server.timestamp_tolerance_secs
        );
        println!("  max body: {} bytes", settings.server.max_body_bytes);

        match RequestSigner::from_settings(&settings) {
            Ok(signer) => println!("\nSigning identity: {}", signer.address()),
            Err(_) => println!("\nSigning identity: not configured"),
        }
    }

    Ok(())
}
