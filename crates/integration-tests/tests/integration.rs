//! End-to-end tests: the real server on a background thread, the real client.

use rand::RngCore;
use reqwest::StatusCode;
use signed_request_client::{SignedClient, SigningAuth};
use signed_request_common::request_signing::{unix_timestamp, HeaderNames, RequestSigner};
use signed_request_common::settings::Settings;
use signed_request_common::test_support::tests::{
    OTHER_PRIVATE_KEY, TEST_ADDRESS, TEST_PRIVATE_KEY,
};
use signed_request_server::BackgroundServer;

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
        max_body_bytes = 1048576
        "#,
    )
    .expect("should parse test settings")
}

fn start_server() -> BackgroundServer {
    BackgroundServer::start(&test_settings()).expect("should start server")
}

fn client_for(server: &BackgroundServer, key: &str) -> SignedClient {
    let signer = RequestSigner::from_hex(key).expect("should parse key");
    SignedClient::new(&server.base_url(), SigningAuth::new(signer, HeaderNames::default()))
        .expect("should build client")
}

fn random_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut data);
    data
}

fn error_id(response: reqwest::blocking::Response) -> String {
    let body: serde_json::Value = response.json().expect("should be JSON error body");
    body["errors"][0]["id"]
        .as_str()
        .expect("should carry an error id")
        .to_string()
}

#[test]
fn test_multipart_upload_is_accepted() {
    let server = start_server();
    let client = client_for(&server, TEST_PRIVATE_KEY);

    let response = client
        .upload_file(
            "/",
            "file",
            "test.bin",
            "application/octet-stream",
            random_bytes(2048),
        )
        .expect("should send upload");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[test]
fn test_signed_get_reports_fixture_address() {
    let server = start_server();
    let client = client_for(&server, TEST_PRIVATE_KEY);

    let response = client.get("/").expect("should send request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().expect("should be JSON");
    assert_eq!(body["address"], TEST_ADDRESS);
}

#[test]
fn test_other_key_reports_its_own_address() {
    let server = start_server();
    let client = client_for(&server, OTHER_PRIVATE_KEY);

    let body: serde_json::Value = client
        .get("/")
        .expect("should send request")
        .json()
        .expect("should be JSON");

    assert_eq!(body["address"], client.address().to_string());
    assert_ne!(body["address"], TEST_ADDRESS);
}

#[test]
fn test_unsigned_upload_is_rejected() {
    let server = start_server();

    let response = reqwest::blocking::Client::new()
        .post(format!("{}/", server.base_url()))
        .body(random_bytes(2048))
        .send()
        .expect("should send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_id(response), "bad_arguments");
}

#[test]
fn test_foreign_signature_for_claimed_address_is_rejected() {
    let server = start_server();
    let names = HeaderNames::default();
    let foreign = RequestSigner::from_hex(OTHER_PRIVATE_KEY).expect("should parse key");
    let body = random_bytes(64);

    // Sign with one key while claiming the fixture identity
    let mut signed = foreign
        .sign_headers_now("POST", "/", &body)
        .expect("should sign");
    signed.address = TEST_ADDRESS.parse().expect("should parse address");

    let mut headers = reqwest::header::HeaderMap::new();
    signed.apply(&names, &mut headers).expect("should set headers");

    let response = reqwest::blocking::Client::new()
        .post(format!("{}/", server.base_url()))
        .headers(headers)
        .body(body)
        .send()
        .expect("should send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(error_id(response), "invalid_signature");
}

#[test]
fn test_future_timestamp_outside_tolerance_is_rejected() {
    let server = start_server();
    let signer = RequestSigner::from_hex(TEST_PRIVATE_KEY).expect("should parse key");

    let signed = signer
        .sign_headers("GET", "/", unix_timestamp() + 600, b"")
        .expect("should sign");
    let mut headers = reqwest::header::HeaderMap::new();
    signed
        .apply(&HeaderNames::default(), &mut headers)
        .expect("should set headers");

    let response = reqwest::blocking::Client::new()
        .get(format!("{}/", server.base_url()))
        .headers(headers)
        .send()
        .expect("should send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_id(response), "invalid_timestamp");
}

#[test]
fn test_server_stops_cleanly() {
    let server = start_server();
    let addr = server.local_addr();
    server.stop();

    let client = SignedClient::new(
        &format!("http://{}", addr),
        SigningAuth::new(
            RequestSigner::from_hex(TEST_PRIVATE_KEY).expect("should parse key"),
            HeaderNames::default(),
        ),
    )
    .expect("should build client");

    let err = client.get("/").expect_err("server should be gone");
    log::debug!("expected failure: {:?}", err);
    assert!(matches!(
        err.current_context(),
        signed_request_common::error::SigningError::Http { .. }
    ));
}
