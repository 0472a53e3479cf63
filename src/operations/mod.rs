//! EST operation definitions.
//!
//! Each [`EstOperation`] fixes the wire surface of one RFC 7030 endpoint:
//!
//! | Operation | Method | Path suffix | Request Content-Type |
//! |---|---|---|---|
//! | [`GetCaCerts`](EstOperation::GetCaCerts) | GET | `cacerts` | none |
//! | [`SimpleEnroll`](EstOperation::SimpleEnroll) | POST | `simpleenroll` | `application/pkcs10` |
//! | [`SimpleReenroll`](EstOperation::SimpleReenroll) | POST | `simplereenroll` | `application/pkcs10` |
//!
//! The submodules hold helpers for preparing requests and inspecting
//! responses of the individual operations.

pub mod cacerts;
pub mod enroll;

use std::fmt;

use reqwest::Method;

use crate::types::{content_types, transfer_encodings};

/// CA certificates endpoint.
pub const CACERTS: &str = "cacerts";

/// Simple enrollment endpoint.
pub const SIMPLE_ENROLL: &str = "simpleenroll";

/// Simple re-enrollment endpoint.
pub const SIMPLE_REENROLL: &str = "simplereenroll";

/// One of the EST operations supported by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EstOperation {
    /// Distribution of CA certificates (RFC 7030 Section 4.1).
    GetCaCerts,
    /// Initial enrollment (RFC 7030 Section 4.2.1).
    SimpleEnroll,
    /// Re-enrollment with an existing certificate (RFC 7030 Section 4.2.2).
    SimpleReenroll,
}

impl EstOperation {
    /// Path segment appended to `/.well-known/est/`.
    pub fn path_suffix(self) -> &'static str {
        match self {
            Self::GetCaCerts => CACERTS,
            Self::SimpleEnroll => SIMPLE_ENROLL,
            Self::SimpleReenroll => SIMPLE_REENROLL,
        }
    }

    /// HTTP method.
    pub fn method(self) -> Method {
        match self {
            Self::GetCaCerts => Method::GET,
            Self::SimpleEnroll | Self::SimpleReenroll => Method::POST,
        }
    }

    /// Content-Type of the request body, if the operation sends one.
    pub fn content_type(self) -> Option<&'static str> {
        match self {
            Self::GetCaCerts => None,
            Self::SimpleEnroll | Self::SimpleReenroll => Some(content_types::PKCS10),
        }
    }

    /// Whether the request must carry a body.
    pub fn requires_body(self) -> bool {
        !matches!(self, Self::GetCaCerts)
    }

    /// Whether the server expects the client to authenticate with its
    /// previously issued certificate.
    pub fn expects_prior_certificate(self) -> bool {
        matches!(self, Self::SimpleReenroll)
    }

    /// Whether HTTP 202 (issuance deferred) is a legitimate answer.
    pub fn allows_pending(self) -> bool {
        matches!(self, Self::SimpleEnroll | Self::SimpleReenroll)
    }

    /// Fixed request headers for this operation, in send order.
    pub fn request_headers(self) -> Vec<(String, String)> {
        match self.content_type() {
            Some(content_type) => vec![
                ("Content-Type".to_string(), content_type.to_string()),
                (
                    "Content-Transfer-Encoding".to_string(),
                    transfer_encodings::BASE64.to_string(),
                ),
            ],
            None => Vec::new(),
        }
    }
}

impl fmt::Display for EstOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_suffix())
    }
}
