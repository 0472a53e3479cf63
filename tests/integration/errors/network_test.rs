//! Integration tests for transport failures

use std::time::Duration;

use crate::integration::{fixtures, MockEstServer, PATH_CACERTS};
use est_iot_client::{EstClient, EstClientConfig, EstError, TransportErrorKind};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn client_for(url: &str, timeout: Duration) -> EstClient {
    let config = EstClientConfig::builder()
        .server_url(url)
        .expect("Valid URL")
        .trust_any_insecure()
        .timeout(timeout)
        .build()
        .expect("Valid config");
    EstClient::new(config).expect("Client creation failed")
}

/// A local port with nothing listening on it.
fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

#[tokio::test]
async fn test_connection_refused() {
    let url = format!("http://127.0.0.1:{}", closed_port());
    let client = client_for(&url, Duration::from_secs(5));

    let err = client.get_ca_certs().await.unwrap_err();
    assert_eq!(err.transport_kind(), Some(TransportErrorKind::Connect));
    assert!(err.status().is_none());
}

#[tokio::test]
async fn test_request_timeout() {
    let mock = MockEstServer::start().await;
    Mock::given(method("GET"))
        .and(path(PATH_CACERTS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(fixtures::PKCS7_BASE64)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(mock.inner())
        .await;

    let client = client_for(&mock.url(), Duration::from_millis(200));
    let err = client.get_ca_certs().await.unwrap_err();
    assert_eq!(err.transport_kind(), Some(TransportErrorKind::Timeout));
}

#[tokio::test]
async fn test_cancel_by_dropping_future() {
    let mock = MockEstServer::start().await;
    Mock::given(method("GET"))
        .and(path(PATH_CACERTS))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(fixtures::PKCS7_BASE64)
                .set_delay(Duration::from_secs(5)),
        )
        .mount(mock.inner())
        .await;

    let client = client_for(&mock.url(), Duration::from_secs(30));
    let outcome = tokio::time::timeout(Duration::from_millis(100), client.get_ca_certs()).await;
    assert!(outcome.is_err());

    // the client stays usable after a cancelled exchange
    let other = MockEstServer::start().await;
    other.mock_cacerts(fixtures::PKCS7_BASE64).await;
    let client = client_for(&other.url(), Duration::from_secs(5));
    client.get_ca_certs().await.expect("cacerts succeeds");
}

#[tokio::test]
async fn test_https_against_plain_server() {
    let mock = MockEstServer::start().await;
    mock.mock_cacerts(fixtures::PKCS7_BASE64).await;
    let url = mock.url().replacen("http://", "https://", 1);

    let client = client_for(&url, Duration::from_secs(5));
    let err = client.get_ca_certs().await.unwrap_err();

    match err {
        EstError::Transport { kind, .. } => {
            assert!(
                matches!(kind, TransportErrorKind::Tls | TransportErrorKind::Connect),
                "unexpected kind {:?}",
                kind
            );
        }
        other => panic!("Expected Transport error, got {:?}", other),
    }
}
