//! Attaches signing headers to outgoing `reqwest` requests.

use error_stack::Report;
use reqwest::blocking::Request;
use url::Url;

use signed_request_common::error::SigningError;
use signed_request_common::request_signing::{
    unix_timestamp, Address, HeaderNames, RequestSigner,
};
use signed_request_common::settings::Settings;

/// Signs requests with a fixed key, using the configured header names.
#[derive(Debug, Clone)]
pub struct SigningAuth {
    signer: RequestSigner,
    header_names: HeaderNames,
}

impl SigningAuth {
    #[must_use]
    pub fn new(signer: RequestSigner, header_names: HeaderNames) -> Self {
        Self {
            signer,
            header_names,
        }
    }

    /// # Errors
    ///
    /// Returns an error if no valid `[signing] private_key` is configured or a
    /// header name is invalid.
    pub fn from_settings(settings: &Settings) -> Result<Self, Report<SigningError>> {
        Ok(Self::new(
            RequestSigner::from_settings(settings)?,
            HeaderNames::from_settings(&settings.headers)?,
        ))
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Signs `request` with the current time.
    ///
    /// # Errors
    ///
    /// See [`SigningAuth::apply_at`].
    pub fn apply(&self, request: &mut Request) -> Result<(), Report<SigningError>> {
        self.apply_at(request, unix_timestamp())
    }

    /// Signs `request` as of `timestamp` and sets the three auth headers.
    ///
    /// The body must already be buffered; streaming bodies cannot be hashed
    /// without consuming them.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for streaming bodies, or a signing error
    /// if the signature cannot be produced.
    pub fn apply_at(
        &self,
        request: &mut Request,
        timestamp: i64,
    ) -> Result<(), Report<SigningError>> {
        let signed = {
            let body: &[u8] = match request.body() {
                None => &[],
                Some(body) => body.as_bytes().ok_or_else(|| {
                    Report::new(SigningError::Configuration {
                        message: "Cannot sign a streaming request body".into(),
                    })
                })?,
            };
            let path = request_path(request.url());

            self.signer
                .sign_headers(request.method().as_str(), &path, timestamp, body)?
        };

        signed.apply(&self.header_names, request.headers_mut())
    }
}

/// Path plus query string, as covered by the signature.
#[must_use]
pub fn request_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
