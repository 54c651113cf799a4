//! CLI error types.

use std::fmt;

use error_stack::Report;
use signed_request_common::error::SigningError;

#[derive(Debug)]
pub enum CliError {
    /// Configuration file or key source error
    Config(String),
    /// Key parsing or signing error
    Signing(String),
    /// IO error
    Io(std::io::Error),
    /// HTTP transport error or rejected request
    Http(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Signing(msg) => write!(f, "Signing error: {}", msg),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Http(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<Report<SigningError>> for CliError {
    fn from(report: Report<SigningError>) -> Self {
        log::debug!("{:?}", report);

        match report.current_context() {
            SigningError::Configuration { message } => CliError::Config(message.clone()),
            SigningError::Http { message } => CliError::Http(message.clone()),
            other => CliError::Signing(other.to_string()),
        }
    }
}
