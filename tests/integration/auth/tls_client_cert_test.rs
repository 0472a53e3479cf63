//! Integration tests for TLS client certificate configuration

use crate::integration::{fixtures, MockEstServer, PATH_SIMPLEENROLL};
use est_iot_client::{AuthMode, ClientIdentity, EstClient, EstError};
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_client_cert_and_basic_together() {
    let mock = MockEstServer::start().await;
    Mock::given(method("POST"))
        .and(path(PATH_SIMPLEENROLL))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fixtures::PKCS7_BASE64))
        .expect(1)
        .mount(mock.inner())
        .await;
    let (cert_pem, key_pem) = fixtures::device_identity();

    let config = mock
        .config_builder()
        .client_identity_pem(cert_pem, key_pem)
        .http_auth("iot-device", "device-password")
        .build()
        .expect("Valid config");
    let client = EstClient::new(config).expect("Client creation failed");

    let response = client
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .expect("enrollment succeeds");
    assert_eq!(response.auth_mode, AuthMode::Both);
}

#[tokio::test]
async fn test_client_cert_only() {
    let mock = MockEstServer::start().await;
    mock.mock_enroll_success(fixtures::PKCS7_BASE64).await;
    let (cert_pem, key_pem) = fixtures::device_identity();

    let config = mock
        .config_builder()
        .client_identity(ClientIdentity::new(cert_pem, key_pem))
        .build()
        .expect("Valid config");
    let client = EstClient::new(config).expect("Client creation failed");

    let response = client
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .expect("enrollment succeeds");
    assert_eq!(response.auth_mode, AuthMode::ClientCert);

    let requests = mock.received().await;
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_invalid_identity_rejected_up_front() {
    let mock = MockEstServer::start().await;

    let config = mock
        .config_builder()
        .client_identity_pem(b"not a certificate".to_vec(), b"not a key".to_vec())
        .build()
        .expect("Valid config");

    let err = EstClient::new(config).unwrap_err();
    assert!(matches!(err, EstError::InvalidPem(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_invalid_reenroll_key_fails_without_request() {
    let mock = MockEstServer::start().await;
    mock.mock_status("POST", "/.well-known/est/simplereenroll", 200, "unused").await;

    let err = mock
        .client()
        .simple_reenroll_with_key(b"garbage cert", b"garbage key", fixtures::CSR_BASE64)
        .await
        .unwrap_err();

    assert!(matches!(err, EstError::InvalidPem(_)));
    assert!(mock.received().await.is_empty());
}

#[test]
fn test_identity_files_missing() {
    let err = ClientIdentity::from_files("/nonexistent/device.pem", "/nonexistent/device.key")
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
