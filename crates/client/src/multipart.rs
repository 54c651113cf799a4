//! Buffered multipart bodies.
//!
//! `reqwest` streams multipart forms, which leaves nothing to hash. Forms are
//! rendered into memory here so the exact bytes on the wire are signed.

use error_stack::Report;
use rand::RngCore;
use reqwest::header::HeaderValue;

use signed_request_common::error::SigningError;

/// A fully rendered `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct BufferedMultipart {
    /// `multipart/form-data; boundary=...`
    pub content_type: String,
    pub body: Vec<u8>,
}

/// One file field of a form.
#[derive(Debug, Clone)]
pub struct FilePart {
    field: String,
    file_name: String,
    mime: String,
    data: Vec<u8>,
}

/// Builds a file part with a field name, file name and MIME type.
///
/// # Errors
///
/// Returns a configuration error if `mime` is not a `type/subtype` value.
pub fn file_part(
    field: &str,
    file_name: &str,
    mime: &str,
    data: Vec<u8>,
) -> Result<FilePart, Report<SigningError>> {
    let valid = match mime.split_once('/') {
        Some((kind, subtype)) => {
            !kind.is_empty()
                && !subtype.is_empty()
                && !mime.contains(char::is_whitespace)
                && HeaderValue::from_str(mime).is_ok()
        }
        None => false,
    };
    if !valid {
        return Err(Report::new(SigningError::Configuration {
            message: format!("Invalid MIME type '{}'", mime),
        }));
    }

    Ok(FilePart {
        field: field.to_string(),
        file_name: file_name.to_string(),
        mime: mime.to_string(),
        data,
    })
}

/// Random boundary, 32 hex characters.
#[must_use]
pub fn generate_boundary() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Renders `parts` into a single body delimited by `boundary`.
#[must_use]
pub fn render_form(boundary: &str, parts: &[FilePart]) -> BufferedMultipart {
    let mut body = Vec::with_capacity(parts.iter().map(|p| p.data.len() + 256).sum());

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                escape_quoted(&part.field),
                escape_quoted(&part.file_name)
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", part.mime).as_bytes());
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    BufferedMultipart {
        content_type: format!("multipart/form-data; boundary={}", boundary),
        body,
    }
}

/// Renders `parts` with a fresh random boundary.
#[must_use]
pub fn buffer_form(parts: &[FilePart]) -> BufferedMultipart {
    render_form(&generate_boundary(), parts)
}

fn escape_quoted(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
