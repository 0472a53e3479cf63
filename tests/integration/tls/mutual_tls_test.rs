//! Integration tests for TLS client certificate authentication

use std::time::Duration;

use super::{IssuedCert, MutualTlsServer, TestPki};
use crate::integration::fixtures;
use est_iot_client::{AuthMode, EstClient, EstClientConfig, EstError};

fn client(server: &MutualTlsServer, pki: &TestPki, identity: Option<&IssuedCert>) -> EstClient {
    let mut builder = EstClientConfig::builder()
        .server_url(server.url())
        .expect("Valid URL")
        .trust_explicit(vec![pki.ca_pem()])
        .timeout(Duration::from_secs(10));
    if let Some(identity) = identity {
        builder = builder.client_identity_pem(identity.cert_pem.clone(), identity.key_pem.clone());
    }
    EstClient::new(builder.build().expect("Valid config")).expect("Client creation failed")
}

#[tokio::test]
async fn test_enroll_presents_configured_certificate() {
    let pki = TestPki::new();
    let device = pki.issue("device", &["iot-device.example"]);
    let issued_body = fixtures::certs_only_base64(&device.cert_der);
    let server = MutualTlsServer::start(&pki, vec![(&device, "device")], issued_body.clone()).await;

    let response = client(&server, &pki, Some(&device))
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .expect("enrollment succeeds");

    assert_eq!(response.body(), issued_body.as_slice());
    assert_eq!(response.auth_mode, AuthMode::ClientCert);
    assert_eq!(server.presented(), vec!["device"]);
}

#[tokio::test]
async fn test_enroll_without_certificate_rejected() {
    let pki = TestPki::new();
    let device = pki.issue("device", &["iot-device.example"]);
    let server = MutualTlsServer::start(&pki, vec![(&device, "device")], Vec::new()).await;

    let err = client(&server, &pki, None)
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .unwrap_err();

    assert!(matches!(err, EstError::Transport { .. }), "{:?}", err);
    assert!(server.presented().is_empty());
}

#[tokio::test]
async fn test_enroll_with_foreign_certificate_rejected() {
    let pki = TestPki::new();
    let other_pki = TestPki::new();
    let device = pki.issue("device", &["iot-device.example"]);
    let stranger = other_pki.issue("stranger", &["iot-device.example"]);
    let server = MutualTlsServer::start(&pki, vec![(&device, "device")], Vec::new()).await;

    let err = client(&server, &pki, Some(&stranger))
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .unwrap_err();

    assert!(matches!(err, EstError::Transport { .. }), "{:?}", err);
    assert!(server.presented().is_empty());
}

#[tokio::test]
async fn test_reenroll_presents_previous_certificate() {
    let pki = TestPki::new();
    let bootstrap = pki.issue("bootstrap", &["iot-device.example"]);
    let issued = pki.issue("issued", &["iot-device.example"]);
    let server = MutualTlsServer::start(
        &pki,
        vec![(&bootstrap, "bootstrap"), (&issued, "issued")],
        fixtures::certs_only_base64(&issued.cert_der),
    )
    .await;
    let client = client(&server, &pki, Some(&bootstrap));

    let enrolled = client
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .expect("enrollment succeeds");

    // the enrollment response goes back unchanged as the prior certificate
    let renewed = client
        .simple_reenroll_with_key(enrolled.body(), issued.key_pem.as_bytes(), fixtures::CSR_BASE64)
        .await
        .expect("re-enrollment succeeds");
    assert_eq!(renewed.body(), b"issued");
    assert_eq!(renewed.auth_mode, AuthMode::ClientCert);

    // later requests go back to the configured identity
    client
        .simple_enroll(fixtures::CSR_BASE64)
        .await
        .expect("enrollment succeeds");

    assert_eq!(server.presented(), vec!["bootstrap", "issued", "bootstrap"]);
}

#[tokio::test]
async fn test_reenroll_with_configured_key() {
    let pki = TestPki::new();
    let device = pki.issue("device", &["iot-device.example"]);
    let server = MutualTlsServer::start(&pki, vec![(&device, "device")], Vec::new()).await;

    let response = client(&server, &pki, Some(&device))
        .simple_reenroll(device.cert_pem.as_bytes(), fixtures::CSR_BASE64)
        .await
        .expect("re-enrollment succeeds");

    assert_eq!(response.body(), b"device");
    assert_eq!(server.presented(), vec!["device"]);
}
