//! PKCS#7 certs-only handling for TLS client identities.
//!
//! Enrollment responses are base64 certs-only SignedData, while the TLS
//! stack wants PEM. A response handed back for re-enrollment is converted
//! here before it is presented in the handshake; the caller's bytes are
//! left untouched.

use base64::prelude::*;
use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::SignedData;
use der::{Decode, Encode};

use crate::error::{EstError, Result};
use crate::operations::cacerts::is_pem;

/// OID for SignedData: 1.2.840.113549.1.7.2
const SIGNED_DATA_OID: &str = "1.2.840.113549.1.7.2";

/// Return the certificate chain as PEM.
///
/// PEM input is returned as-is. Anything else is read as a certs-only
/// PKCS#7 structure, either raw DER or base64 as an EST server sends it.
pub fn certificate_chain_pem(data: &[u8]) -> Result<Vec<u8>> {
    if is_pem(data) {
        return Ok(data.to_vec());
    }

    // raw DER starts with a SEQUENCE tag, base64 text never does
    let der_bytes = if data.first() == Some(&0x30) {
        data.to_vec()
    } else {
        decode_base64(data)?
    };

    let certificates = parse_certs_only(&der_bytes)?;
    if certificates.is_empty() {
        return Err(EstError::invalid_pem("PKCS#7 response does not contain a certificate"));
    }

    tracing::debug!(
        certificates = certificates.len(),
        "Converted PKCS#7 certs-only response to PEM"
    );

    let mut pem = Vec::new();
    for der in &certificates {
        pem.extend_from_slice(&encode_pem(der));
    }
    Ok(pem)
}

/// Extract the DER certificates from a certs-only SignedData.
pub fn parse_certs_only(der_bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let content_info = ContentInfo::from_der(der_bytes)
        .map_err(|e| EstError::invalid_pem(format!("Failed to parse ContentInfo: {}", e)))?;

    let oid = content_info.content_type.to_string();
    if oid != SIGNED_DATA_OID {
        return Err(EstError::invalid_pem(format!(
            "Expected SignedData OID, got {}",
            oid
        )));
    }

    let content = content_info
        .content
        .to_der()
        .map_err(|e| EstError::invalid_pem(format!("Failed to encode content: {}", e)))?;
    let signed_data = SignedData::from_der(&content)
        .map_err(|e| EstError::invalid_pem(format!("Failed to parse SignedData: {}", e)))?;

    let Some(cert_set) = signed_data.certificates else {
        return Ok(Vec::new());
    };

    let mut certificates = Vec::new();
    for choice in cert_set.0.iter() {
        match choice {
            CertificateChoices::Certificate(cert) => {
                let der = cert.to_der().map_err(|e| {
                    EstError::invalid_pem(format!("Failed to encode certificate: {}", e))
                })?;
                certificates.push(der);
            }
            _ => tracing::warn!("Skipping non-X.509 certificate"),
        }
    }

    Ok(certificates)
}

/// Decode base64 data, handling various line ending formats.
fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();

    BASE64_STANDARD.decode(&cleaned).map_err(|e| {
        EstError::invalid_pem(format!("Certificate is neither PEM nor base64: {}", e))
    })
}

fn encode_pem(der: &[u8]) -> Vec<u8> {
    let encoded = BASE64_STANDARD.encode(der);
    let mut pem = b"-----BEGIN CERTIFICATE-----\n".to_vec();
    for line in encoded.as_bytes().chunks(64) {
        pem.extend_from_slice(line);
        pem.push(b'\n');
    }
    pem.extend_from_slice(b"-----END CERTIFICATE-----\n");
    pem
}
