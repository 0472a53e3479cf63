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

//! EST response types.
//!
//! Payloads are opaque: responses are handed back byte-for-byte together
//! with the metadata the server declared for them. [`pkcs7`] only comes into
//! play when an issued certificate is presented again for re-enrollment.

use std::fmt;

pub mod pkcs7;

use crate::operations::EstOperation;

/// Which credential layers were presented for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Anonymous request.
    None,
    /// HTTP Basic authentication.
    Basic,
    /// TLS client certificate.
    ClientCert,
    /// TLS client certificate with HTTP Basic layered on top.
    Both,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Basic => "basic",
            Self::ClientCert => "client-cert",
            Self::Both => "client-cert+basic",
        };
        f.write_str(name)
    }
}

/// Successful response from an EST operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstResponse {
    /// Operation that produced this response.
    pub operation: EstOperation,

    /// HTTP status code (always 200 for a successful exchange).
    pub status: u16,

    /// Content-Type declared by the server.
    pub content_type: Option<String>,

    /// Content-Transfer-Encoding declared by the server.
    pub transfer_encoding: Option<String>,

    /// Credential layers presented for the request.
    pub auth_mode: AuthMode,

    /// Response body exactly as received.
    pub body: Vec<u8>,
}

impl EstResponse {
    /// Response body.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Take ownership of the response body.
    pub fn into_body(self) -> Vec<u8> {
        self.body
    }

    /// Body length in bytes.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns true if the server sent an empty body.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Returns true if the server declared a base64 transfer encoding.
    pub fn is_base64(&self) -> bool {
        self.transfer_encoding
            .as_deref()
            .is_some_and(|enc| enc.trim().eq_ignore_ascii_case("base64"))
    }
}

/// Content types used in EST protocol.
pub mod content_types {
    /// PKCS#10 CSR content type.
    pub const PKCS10: &str = "application/pkcs10";

    /// PKCS#7/CMS content type.
    pub const PKCS7_MIME: &str = "application/pkcs7-mime";

    /// PKCS#7 certs-only content type with smime-type parameter.
    pub const PKCS7_CERTS_ONLY: &str = "application/pkcs7-mime; smime-type=certs-only";
}

/// Transfer encodings used in EST protocol.
pub mod transfer_encodings {
    /// Base64 transfer encoding required on enrollment bodies.
    pub const BASE64: &str = "base64";
}
