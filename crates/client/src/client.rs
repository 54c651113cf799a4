//! Blocking HTTP client that signs every request it sends.

use error_stack::{Report, ResultExt};
use reqwest::blocking::{Client, Request, Response};
use reqwest::header::CONTENT_TYPE;
use url::Url;

use signed_request_common::error::SigningError;
use signed_request_common::request_signing::Address;

use crate::auth::SigningAuth;
use crate::multipart::{buffer_form, file_part};

/// Sends signed requests to a single base URL.
///
/// Non-2xx responses are returned as-is; only transport failures are errors.
#[derive(Debug, Clone)]
pub struct SignedClient {
    http: Client,
    base_url: Url,
    auth: SigningAuth,
}

impl SignedClient {
    /// # Errors
    ///
    /// Returns a configuration error if `base_url` does not parse, or an HTTP
    /// error if the underlying client cannot be built.
    pub fn new(base_url: &str, auth: SigningAuth) -> Result<Self, Report<SigningError>> {
        let base_url = Url::parse(base_url).change_context(SigningError::Configuration {
            message: format!("Invalid base URL '{}'", base_url),
        })?;

        let http = Client::builder()
            .build()
            .change_context(SigningError::Http {
                message: "Failed to build HTTP client".into(),
            })?;

        Ok(Self {
            http,
            base_url,
            auth,
        })
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.auth.address()
    }

    /// # Errors
    ///
    /// Returns a configuration error if `path` cannot be joined onto the base URL.
    pub fn url(&self, path: &str) -> Result<Url, Report<SigningError>> {
        self.base_url
            .join(path)
            .change_context(SigningError::Configuration {
                message: format!("Invalid request path '{}'", path),
            })
    }

    /// Signs and sends a built request.
    ///
    /// # Errors
    ///
    /// Returns a signing error if the request cannot be signed, or an HTTP
    /// error if it cannot be sent.
    pub fn execute(&self, mut request: Request) -> Result<Response, Report<SigningError>> {
        self.auth.apply(&mut request)?;

        log::debug!(
            "Sending signed {} {} as {}",
            request.method(),
            request.url(),
            self.auth.address()
        );

        let url = request.url().to_string();
        self.http
            .execute(request)
            .change_context(SigningError::Http {
                message: format!("Request to {} failed", url),
            })
    }

    /// # Errors
    ///
    /// See [`SignedClient::execute`].
    pub fn get(&self, path: &str) -> Result<Response, Report<SigningError>> {
        let request = self
            .http
            .get(self.url(path)?)
            .build()
            .change_context(SigningError::Http {
                message: "Failed to build GET request".into(),
            })?;

        self.execute(request)
    }

    /// # Errors
    ///
    /// See [`SignedClient::execute`].
    pub fn post_bytes(
        &self,
        path: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<Response, Report<SigningError>> {
        let request = self
            .http
            .post(self.url(path)?)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .build()
            .change_context(SigningError::Http {
                message: "Failed to build POST request".into(),
            })?;

        self.execute(request)
    }

    /// Uploads `data` as a single-file `multipart/form-data` POST.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the form cannot be rendered, otherwise
    /// see [`SignedClient::execute`].
    pub fn upload_file(
        &self,
        path: &str,
        field: &str,
        file_name: &str,
        mime: &str,
        data: Vec<u8>,
    ) -> Result<Response, Report<SigningError>> {
        let size = data.len();
        let buffered = buffer_form(&[file_part(field, file_name, mime, data)?]);

        log::info!(
            "Uploading {} ({} bytes, {} byte body) to {}",
            file_name,
            size,
            buffered.body.len(),
            path
        );

        self.post_bytes(path, &buffered.content_type, buffered.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signed_request_common::test_support::tests::TEST_PRIVATE_KEY;
    use signed_request_common::request_signing::{HeaderNames, RequestSigner};

    fn test_auth() -> SigningAuth {
        SigningAuth::new(
            RequestSigner::from_hex(TEST_PRIVATE_KEY).unwrap(),
            HeaderNames::default(),
        )
    }

    #[test]
    fn test_new_rejects_invalid_base_url() {
        let err = SignedClient::new("not a url", test_auth()).expect_err("expected bad URL");
        assert!(matches!(
            err.current_context(),
            SigningError::Configuration { .. }
        ));
    }

    #[test]
    fn test_url_joins_paths() {
        let client = SignedClient::new("http://127.0.0.1:8080", test_auth()).unwrap();

        assert_eq!(client.url("/").unwrap().as_str(), "http://127.0.0.1:8080/");
        assert_eq!(
            client.url("/upload?x=1").unwrap().as_str(),
            "http://127.0.0.1:8080/upload?x=1"
        );
    }

    #[test]
    fn test_connection_refused_is_http_error() {
        // Bind then drop to get a port with no listener
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = SignedClient::new(&format!("http://127.0.0.1:{}", port), test_auth()).unwrap();

        let err = client.get("/").expect_err("expected connection failure");
        assert!(matches!(err.current_context(), SigningError::Http { .. }));
    }
}
