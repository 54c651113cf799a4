//! Router and handlers for the signed endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::routing::get;
use axum::{Json, Router};
use error_stack::Report;
use serde::{Deserialize, Serialize};

use signed_request_common::error::SigningError;
use signed_request_common::request_signing::{unix_timestamp, Address, RequestVerifier};
use signed_request_common::settings::Settings;

use crate::error::ErrorResponse;

#[derive(Clone)]
pub struct AppState {
    verifier: Arc<RequestVerifier>,
}

impl AppState {
    #[must_use]
    pub fn new(verifier: RequestVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressResponse {
    pub address: Address,
}

/// Builds the application router.
///
/// - `GET /health`: unauthenticated liveness check
/// - `GET /`: returns the verified identity address
/// - `POST /`: accepts any signed body, including multipart uploads, with 204
///
/// # Errors
///
/// Returns a configuration error if the header names in `settings` are invalid.
pub fn create_router(settings: &Settings) -> Result<Router, Report<SigningError>> {
    let state = AppState::new(RequestVerifier::from_settings(settings)?);

    Ok(Router::new()
        .route("/", get(handle_identity).post(handle_upload))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(settings.server.max_body_bytes))
        .with_state(state))
}

fn authenticate(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Address, ErrorResponse> {
    let path = uri.path_and_query().map_or("/", |pq| pq.as_str());

    Ok(state
        .verifier
        .verify(method.as_str(), path, headers, body, unix_timestamp())?)
}

async fn handle_identity(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AddressResponse>, ErrorResponse> {
    let address = authenticate(&state, &method, &uri, &headers, &body)?;

    Ok(Json(AddressResponse { address }))
}

async fn handle_upload(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ErrorResponse> {
    let address = authenticate(&state, &method, &uri, &headers, &body)?;
    log::info!("Accepted {} byte upload from {}", body.len(), address);

    Ok(StatusCode::NO_CONTENT)
}

async fn handle_health() -> &'static str {
    "ok"
}
