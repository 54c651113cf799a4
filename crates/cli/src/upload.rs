//! Signed multipart file upload.

use std::fs;
use std::path::Path;

use signed_request_client::{SignedClient, SigningAuth};
use signed_request_common::request_signing::{HeaderNames, RequestSigner};
use signed_request_common::settings::Settings;

use crate::error::CliError;

pub struct UploadArgs<'a> {
    /// Base URL of the verifying server.
    pub server: &'a str,
    pub path: &'a str,
    pub file: &'a Path,
    pub field: &'a str,
    pub mime: &'a str,
}

/// Uploads `args.file` and returns the response status line.
///
/// A non-2xx response is an error carrying the status and response body.
pub fn upload_file(
    signer: &RequestSigner,
    settings: &Settings,
    args: &UploadArgs<'_>,
) -> Result<String, CliError> {
    let data = fs::read(args.file)?;
    let file_name = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::Config(format!("Not a file: {}", args.file.display())))?;

    let auth = SigningAuth::new(
        signer.clone(),
        HeaderNames::from_settings(&settings.headers)?,
    );
    let client = SignedClient::new(args.server, auth)?;

    let response = client.upload_file(args.path, args.field, &file_name, args.mime, data)?;
    let status = response.status();

    if status.is_success() {
        Ok(status.to_string())
    } else {
        let body = response.text().unwrap_or_default();
        Err(CliError::Http(format!("Server responded {}: {}", status, body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signed_request_common::test_support::tests::TEST_PRIVATE_KEY;
    use signed_request_server::BackgroundServer;
    use tempfile::TempDir;

    fn test_settings() -> Settings {
        Settings::from_toml(
            r#"
            [headers]
            address = "Toshi-ID-Address"
            signature = "Toshi-Signature"
            timestamp = "Toshi-Timestamp"

            [server]
            bind_address = "127.0.0.1:0"
            timestamp_tolerance_secs = 180
            max_body_bytes = 65536
            "#,
        )
        .unwrap()
    }

    fn write_file(dir: &TempDir, len: usize) -> std::path::PathBuf {
        let path = dir.path().join("test.bin");
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn test_upload_file_accepted() {
        let settings = test_settings();
        let server = BackgroundServer::start(&settings).unwrap();
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, 2048);
        let base_url = server.base_url();

        let status = upload_file(
            &RequestSigner::from_hex(TEST_PRIVATE_KEY).unwrap(),
            &settings,
            &UploadArgs {
                server: &base_url,
                path: "/",
                file: &file,
                field: "file",
                mime: "application/octet-stream",
            },
        )
        .unwrap();

        assert_eq!(status, "204 No Content");
    }

    #[test]
    fn test_upload_rejected_is_http_error() {
        let settings = test_settings();
        let server = BackgroundServer::start(&settings).unwrap();
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, 128 * 1024);
        let base_url = server.base_url();

        let result = upload_file(
            &RequestSigner::from_hex(TEST_PRIVATE_KEY).unwrap(),
            &settings,
            &UploadArgs {
                server: &base_url,
                path: "/",
                file: &file,
                field: "file",
                mime: "application/octet-stream",
            },
        );

        assert!(matches!(result, Err(CliError::Http(_))));
    }

    #[test]
    fn test_upload_missing_file_is_io_error() {
        let settings = test_settings();
        let dir = TempDir::new().unwrap();

        let result = upload_file(
            &RequestSigner::from_hex(TEST_PRIVATE_KEY).unwrap(),
            &settings,
            &UploadArgs {
                server: "http://127.0.0.1:1",
                path: "/",
                file: &dir.path().join("missing.bin"),
                field: "file",
                mime: "application/octet-stream",
            },
        );

        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
