//! TLS configuration helpers for the EST client.
//!
//! This module builds the reqwest client used by
//! [`ReqwestTransport`](crate::transport::ReqwestTransport), applying the
//! RFC 7030 TLS requirements.

use rustls::pki_types::CertificateDer;

use crate::config::{ClientIdentity, EstClientConfig, TrustAnchors};
use crate::error::{error_chain, EstError, Result};
use crate::types::pkcs7::certificate_chain_pem;
use crate::USER_AGENT;

// RFC 7030 Section 3.3.1 requires TLS 1.1 or later. TLS 1.1 is deprecated,
// so TLS 1.2 is the floor.

/// Build a reqwest Client for the given configuration and optional identity.
///
/// The identity is passed separately because re-enrollment presents a
/// certificate other than the configured one.
pub fn build_http_client(
    config: &EstClientConfig,
    identity: Option<&ClientIdentity>,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.timeout)
        .user_agent(USER_AGENT)
        .use_rustls_tls()
        .min_tls_version(reqwest::tls::Version::TLS_1_2);

    match &config.trust_anchors {
        TrustAnchors::WebPki => {
            builder = builder.tls_built_in_root_certs(true);
        }
        TrustAnchors::Explicit(bundles) => {
            builder = builder.tls_built_in_root_certs(false);
            for bundle in bundles {
                for cert in parse_pem_certificates(bundle)? {
                    let cert = reqwest::Certificate::from_der(cert.as_ref()).map_err(|e| {
                        EstError::invalid_pem(format!(
                            "Failed to load CA certificate: {}",
                            error_chain(&e)
                        ))
                    })?;
                    builder = builder.add_root_certificate(cert);
                }
            }
        }
        TrustAnchors::InsecureAcceptAny => {
            tracing::warn!("Server certificate verification is disabled");
            builder = builder
                .tls_built_in_root_certs(false)
                .danger_accept_invalid_certs(true);
        }
    }

    if let Some(identity) = identity {
        builder = builder.identity(build_reqwest_identity(identity)?);
    }

    builder.build().map_err(|e| {
        EstError::config(format!("Failed to build HTTP client: {}", error_chain(&e)))
    })
}

/// Build a reqwest Identity from a certificate and PEM key.
///
/// The certificate may be PEM or the certs-only PKCS#7 body returned by an
/// enrollment. Failures here are local and repeat on every attempt, so they
/// are reported as [`EstError::InvalidPem`] rather than as transport errors.
fn build_reqwest_identity(identity: &ClientIdentity) -> Result<reqwest::Identity> {
    // reqwest wants certificate and key in a single PEM buffer
    let mut pem_data = certificate_chain_pem(&identity.cert_pem)?;
    pem_data.extend_from_slice(b"\n");
    pem_data.extend_from_slice(&identity.key_pem);

    reqwest::Identity::from_pem(&pem_data).map_err(|e| {
        EstError::invalid_pem(format!("Failed to create client identity: {}", error_chain(&e)))
    })
}

/// Parse PEM-encoded certificates.
pub fn parse_pem_certificates(pem_data: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
    let mut reader = std::io::BufReader::new(pem_data);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| EstError::invalid_pem(format!("Failed to parse PEM: {}", e)))?;

    if certs.is_empty() {
        return Err(EstError::invalid_pem("No certificates found in PEM data"));
    }

    Ok(certs)
}
