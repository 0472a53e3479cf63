//! Integration tests for HTTP Basic authentication

use crate::integration::{fixtures, MockEstServer, PATH_SIMPLEENROLL};
use base64::prelude::*;
use est_iot_client::AuthMode;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn basic_header(username: &str, password: &str) -> String {
    format!(
        "Basic {}",
        BASE64_STANDARD.encode(format!("{}:{}", username, password))
    )
}

#[tokio::test]
async fn test_basic_auth_header_sent() {
    let mock = MockEstServer::start().await;
    Mock::given(method("POST"))
        .and(path(PATH_SIMPLEENROLL))
        .and(header("authorization", basic_header("iot-device", "s3cret!").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fixtures::PKCS7_BASE64))
        .expect(1)
        .mount(mock.inner())
        .await;

    let response = mock
        .client_with_basic("iot-device", "s3cret!")
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .expect("enrollment succeeds");
    assert_eq!(response.auth_mode, AuthMode::Basic);
}

#[tokio::test]
async fn test_basic_auth_wrong_password_rejected() {
    let mock = MockEstServer::start().await;
    Mock::given(method("POST"))
        .and(path(PATH_SIMPLEENROLL))
        .and(header("authorization", basic_header("iot-device", "right").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fixtures::PKCS7_BASE64))
        .mount(mock.inner())
        .await;
    mock.mock_enroll_auth_required("bad credentials").await;

    let err = mock
        .client_with_basic("iot-device", "wrong")
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_no_auth_header_without_credentials() {
    let mock = MockEstServer::start().await;
    mock.mock_enroll_success(fixtures::PKCS7_BASE64).await;

    mock.client()
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .expect("enrollment succeeds");

    let requests = mock.received().await;
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}
