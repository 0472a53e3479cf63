//! Integration tests for HTTP status handling

use crate::integration::{fixtures, MockEstServer, PATH_SIMPLEENROLL};
use est_iot_client::EstError;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_non_success_statuses_are_protocol_errors() {
    for status in [400u16, 401, 403, 404, 409, 500, 502, 503] {
        let mock = MockEstServer::start().await;
        mock.mock_status("POST", PATH_SIMPLEENROLL, status, "rejected").await;

        let err = mock
            .client()
            .simple_enroll(fixtures::CSR_BASE64)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(status), "status {}", status);
        assert!(!err.is_retryable(), "status {}", status);
        assert_eq!(err.body(), Some(&b"rejected"[..]), "status {}", status);
    }
}

#[tokio::test]
async fn test_binary_error_body_preserved() {
    let mock = MockEstServer::start().await;
    let body = vec![0x30, 0x82, 0xff, 0x00, 0xfe, 0x0a];
    Mock::given(method("POST"))
        .and(path(PATH_SIMPLEENROLL))
        .respond_with(ResponseTemplate::new(400).set_body_bytes(body.clone()))
        .mount(mock.inner())
        .await;

    let err = mock
        .client()
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .unwrap_err();

    match err {
        EstError::Protocol { status, body: received } => {
            assert_eq!(status, 400);
            assert_eq!(received, body);
        }
        other => panic!("Expected Protocol error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_error_message_includes_body_text() {
    let mock = MockEstServer::start().await;
    mock.mock_status("POST", PATH_SIMPLEENROLL, 400, "malformed CSR").await;

    let err = mock
        .client()
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("400"));
    assert!(message.contains("malformed CSR"));
}
