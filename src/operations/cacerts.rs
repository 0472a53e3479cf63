//! CA Certificates operation (GET /cacerts).
//!
//! The client passes the trust anchor chain through untouched. These helpers
//! let a device operator compare what was received against a fingerprint
//! obtained out-of-band before installing it.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 fingerprint of a `/cacerts` response body.
///
/// The digest covers the bytes exactly as received, whatever their encoding.
pub fn fingerprint(body: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hasher.finalize().into()
}

/// Format a fingerprint as a colon-separated hex string.
///
/// Example output: "AB:CD:EF:01:23:45:..."
pub fn format_fingerprint(fp: &[u8; 32]) -> String {
    fp.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Returns true if the body looks like PEM text rather than base64 or DER.
pub fn is_pem(body: &[u8]) -> bool {
    let start = body
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(body.len());
    body[start..].starts_with(b"-----BEGIN ")
}
