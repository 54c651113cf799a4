use std::fmt;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use http::header::HeaderName;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::error::SigningError;
use crate::request_signing::parse_signing_key;

pub const ENVIRONMENT_VARIABLE_PREFIX: &str = "SIGNED_REQUEST";
pub const ENVIRONMENT_VARIABLE_SEPARATOR: &str = "__";

/// Wire names of the three authentication headers.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Headers {
    #[validate(custom(function = "validate_header_name"))]
    pub address: String,
    #[validate(custom(function = "validate_header_name"))]
    pub signature: String,
    #[validate(custom(function = "validate_header_name"))]
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Server {
    #[validate(custom(function = "validate_socket_addr"))]
    pub bind_address: String,
    /// Accepted clock skew in either direction.
    #[validate(range(min = 1))]
    pub timestamp_tolerance_secs: u64,
    #[validate(range(min = 1))]
    pub max_body_bytes: usize,
}

#[derive(Clone, Default, Deserialize, Validate)]
pub struct Signing {
    #[validate(custom(function = "validate_private_key"))]
    pub private_key: Option<String>,
}

impl fmt::Debug for Signing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signing")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub headers: Headers,
    #[validate(nested)]
    pub server: Server,
    #[serde(default)]
    #[validate(nested)]
    pub signing: Signing,
}

impl Settings {
    /// Loads the embedded default configuration merged with environment overrides.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the merged settings fail to parse or validate.
    pub fn new() -> Result<Self, Report<SigningError>> {
        let toml_str = include_str!("../../../signed-request.toml");

        Self::from_toml(toml_str)
    }

    /// Parses settings from a TOML string, applying `SIGNED_REQUEST__*`
    /// environment overrides, then validates the result.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the TOML is invalid, required fields
    /// are missing, or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<SigningError>> {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_VARIABLE_PREFIX)
            .separator(ENVIRONMENT_VARIABLE_SEPARATOR);

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(SigningError::Configuration {
                message: "Failed to build configuration".into(),
            })?;

        let settings: Self =
            config
                .try_deserialize()
                .change_context(SigningError::Configuration {
                    message: "Failed to deserialize settings".into(),
                })?;

        settings.validate().map_err(|e| {
            Report::new(SigningError::Configuration {
                message: format!("Settings validation failed: {}", e),
            })
        })?;

        Ok(settings)
    }

    /// Reads and parses a TOML settings file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or its
    /// contents are rejected by [`Settings::from_toml`].
    pub fn from_file(path: &Path) -> Result<Self, Report<SigningError>> {
        let content = fs::read_to_string(path).change_context(SigningError::Configuration {
            message: format!("Failed to read settings file {}", path.display()),
        })?;

        Self::from_toml(&content).attach(format!("while loading {}", path.display()))
    }
}

fn validate_header_name(name: &str) -> Result<(), ValidationError> {
    HeaderName::from_bytes(name.as_bytes())
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_header_name"))
}

fn validate_socket_addr(addr: &str) -> Result<(), ValidationError> {
    addr.parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_socket_addr"))
}

fn validate_private_key(key: &str) -> Result<(), ValidationError> {
    parse_signing_key(key)
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_private_key"))
}
