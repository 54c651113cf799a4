//! Header generation for requests sent by other tools.

use std::fs;
use std::path::Path;

use signed_request_common::request_signing::{unix_timestamp, HeaderNames, RequestSigner};
use signed_request_common::settings::Settings;

use crate::error::CliError;
use crate::OutputFormat;

pub struct SignArgs<'a> {
    pub method: &'a str,
    pub path: &'a str,
    /// Current time when absent.
    pub timestamp: Option<i64>,
    pub body: &'a [u8],
}

/// Body from `--data` or `--body-file`; empty when neither is given.
pub fn read_body(data: Option<String>, body_file: Option<&Path>) -> Result<Vec<u8>, CliError> {
    match (data, body_file) {
        (Some(data), _) => Ok(data.into_bytes()),
        (None, Some(path)) => Ok(fs::read(path)?),
        (None, None) => Ok(Vec::new()),
    }
}

/// Signs the request described by `args` and renders the three headers.
///
/// Text output is one `Name: value` line per header, ready for `curl -H`.
pub fn render_signed_headers(
    signer: &RequestSigner,
    settings: &Settings,
    args: &SignArgs<'_>,
    format: OutputFormat,
) -> Result<String, CliError> {
    let names = HeaderNames::from_settings(&settings.headers)?;
    let method = args.method.to_ascii_uppercase();
    let timestamp = args.timestamp.unwrap_or_else(unix_timestamp);

    let signed = signer.sign_headers(&method, args.path, timestamp, args.body)?;
    let pairs = signed.to_pairs(&names)?;

    let mut rendered = Vec::with_capacity(pairs.len());
    for (name, value) in &pairs {
        let value = value
            .to_str()
            .map_err(|e| CliError::Signing(format!("Non-ASCII header value: {}", e)))?;
        rendered.push((name.as_str(), value));
    }

    match format {
        OutputFormat::Text => Ok(rendered
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join("\n")),
        OutputFormat::Json => {
            let object: serde_json::Map<String, serde_json::Value> = rendered
                .iter()
                .map(|(name, value)| ((*name).to_string(), serde_json::json!(value)))
                .collect();
            serde_json::to_string_pretty(&object)
                .map_err(|e| CliError::Signing(format!("Failed to render JSON: {}", e)))
        }
    }
}
