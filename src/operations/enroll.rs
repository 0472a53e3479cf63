// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Simple Enrollment and Re-enrollment request bodies.
//!
//! `simpleenroll` and `simplereenroll` carry a base64 PKCS#10 body. The
//! client sends the CSR bytes it is given without re-encoding them; these
//! helpers exist for callers holding the CSR in another form.

use base64::prelude::*;

use crate::error::{EstError, Result};

/// Encode a DER CSR as an EST request body.
pub fn encode_csr(csr_der: &[u8]) -> Vec<u8> {
    BASE64_STANDARD.encode(csr_der).into_bytes()
}

/// Strip the PEM armor from a CSR, leaving the base64 payload.
///
/// Accepts both `CERTIFICATE REQUEST` and the legacy `NEW CERTIFICATE REQUEST`
/// labels. Line breaks inside the payload are kept.
pub fn pem_to_body(csr_pem: &[u8]) -> Result<Vec<u8>> {
    let text = std::str::from_utf8(csr_pem)
        .map_err(|_| EstError::invalid_pem("CSR is not valid UTF-8"))?;

    let mut lines = text.lines().map(str::trim);
    let begin = lines
        .by_ref()
        .find(|l| l.starts_with("-----BEGIN "))
        .ok_or_else(|| EstError::invalid_pem("missing BEGIN line"))?;

    if !begin.contains("CERTIFICATE REQUEST") {
        return Err(EstError::invalid_pem(format!(
            "expected a certificate request, found '{begin}'"
        )));
    }

    let mut payload = Vec::new();
    let mut terminated = false;
    for line in lines {
        if line.starts_with("-----END ") {
            terminated = true;
            break;
        }
        if line.is_empty() {
            continue;
        }
        if !payload.is_empty() {
            payload.push(b'\n');
        }
        payload.extend_from_slice(line.as_bytes());
    }

    if !terminated {
        return Err(EstError::invalid_pem("missing END line"));
    }
    if payload.is_empty() {
        return Err(EstError::invalid_pem("empty certificate request"));
    }

    Ok(payload)
}

/// Reject CSR bodies that cannot be a certificate request at all.
///
/// Only emptiness is checked; the content is forwarded as-is.
pub fn check_csr_body(csr: &[u8]) -> Result<()> {
    if csr.iter().all(u8::is_ascii_whitespace) {
        return Err(EstError::csr("Empty CSR"));
    }
    Ok(())
}
