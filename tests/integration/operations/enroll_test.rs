//! Integration tests for the /simpleenroll operation

use crate::integration::{fixtures, MockEstServer, CONTENT_TYPE_PKCS10, PATH_SIMPLEENROLL};
use est_iot_client::{AuthMode, EstError, EstOperation};
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_simple_enroll_success() {
    let mock = MockEstServer::start().await;
    Mock::given(method("POST"))
        .and(path(PATH_SIMPLEENROLL))
        .and(header("content-type", CONTENT_TYPE_PKCS10))
        .and(header("content-transfer-encoding", "base64"))
        .and(body_bytes(fixtures::CSR_BASE64))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(fixtures::PKCS7_BASE64, "application/pkcs7-mime")
                .insert_header("Content-Transfer-Encoding", "base64"),
        )
        .expect(1)
        .mount(mock.inner())
        .await;

    let client = mock.client_with_basic("iot-device", "device-password");
    let response = client
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .expect("enrollment succeeds");

    assert_eq!(response.operation, EstOperation::SimpleEnroll);
    assert_eq!(response.body(), fixtures::PKCS7_BASE64);
    assert_eq!(response.auth_mode, AuthMode::Basic);
    assert_eq!(response.transfer_encoding.as_deref(), Some("base64"));
}

#[tokio::test]
async fn test_simple_enroll_without_credentials() {
    let mock = MockEstServer::start().await;
    mock.mock_enroll_success(fixtures::PKCS7_BASE64).await;

    let response = mock
        .client()
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .expect("enrollment succeeds");
    assert_eq!(response.auth_mode, AuthMode::None);
}

#[tokio::test]
async fn test_simple_enroll_unauthorized_keeps_body() {
    let mock = MockEstServer::start().await;
    mock.mock_enroll_auth_required("Authentication required").await;

    let err = mock
        .client_with_basic("iot-device", "wrong-password")
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.body(), Some(&b"Authentication required"[..]));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_simple_enroll_pending() {
    let mock = MockEstServer::start().await;
    mock.mock_enroll_pending(30).await;

    let err = mock
        .client()
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .unwrap_err();

    assert!(matches!(err, EstError::EnrollmentPending { retry_after: 30 }));
    assert!(err.is_retryable());
    assert_eq!(err.retry_after(), Some(30));
}

#[tokio::test]
async fn test_simple_enroll_pending_without_retry_after() {
    let mock = MockEstServer::start().await;
    Mock::given(method("POST"))
        .and(path(PATH_SIMPLEENROLL))
        .respond_with(ResponseTemplate::new(202))
        .mount(mock.inner())
        .await;

    let err = mock
        .client()
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .unwrap_err();
    assert_eq!(err.retry_after(), Some(60));
}

#[tokio::test]
async fn test_simple_enroll_server_error() {
    let mock = MockEstServer::start().await;
    mock.mock_status("POST", PATH_SIMPLEENROLL, 500, "CA unavailable").await;

    let err = mock
        .client()
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .unwrap_err();

    match err {
        EstError::Protocol { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, b"CA unavailable");
        }
        other => panic!("Expected Protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_simple_enroll_empty_csr_sends_nothing() {
    let mock = MockEstServer::start().await;
    mock.mock_enroll_success(fixtures::PKCS7_BASE64).await;

    let err = mock.client().simple_enroll(b"").await.unwrap_err();
    assert!(matches!(err, EstError::Csr(_)));
    assert!(mock.received().await.is_empty());
}

#[tokio::test]
async fn test_simple_enroll_response_over_limit() {
    let mock = MockEstServer::start().await;
    mock.mock_enroll_success(&vec![b'A'; 4096]).await;

    let config = mock
        .config_builder()
        .response_limit(1024)
        .build()
        .expect("Valid config");
    let client = est_iot_client::EstClient::new(config).expect("Client creation failed");

    let err = client
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .unwrap_err();
    match err {
        EstError::OutOfMemory { buffered, .. } => assert!(buffered <= 1024),
        other => panic!("Expected OutOfMemory, got {:?}", other),
    }
}

#[tokio::test]
async fn test_simple_enroll_additional_headers() {
    let mock = MockEstServer::start().await;
    Mock::given(method("POST"))
        .and(path(PATH_SIMPLEENROLL))
        .and(header("x-device-serial", "SN-0042"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fixtures::PKCS7_BASE64))
        .expect(1)
        .mount(mock.inner())
        .await;

    let config = mock
        .config_builder()
        .add_header("X-Device-Serial", "SN-0042")
        .build()
        .expect("Valid config");
    let client = est_iot_client::EstClient::new(config).expect("Client creation failed");

    client
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .expect("enrollment succeeds");
}
