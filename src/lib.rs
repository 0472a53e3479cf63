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

//! # est-iot-client
//!
//! An RFC 7030 EST (Enrollment over Secure Transport) client for constrained
//! and IoT devices.
//!
//! A device uses it to fetch its trust anchors, obtain an initial certificate
//! and renew that certificate, over mutually-authenticated or
//! password-authenticated HTTPS.
//!
//! ## Features
//!
//! - **The three device operations**: cacerts, simpleenroll, simplereenroll
//! - **TLS client authentication** with certificate-based auth
//! - **HTTP Basic auth**, alone or layered over a client certificate
//! - **Opaque payloads**: CSRs and certificates pass through byte-for-byte
//! - **Bounded memory**: responses are streamed into a buffer with a
//!   configurable ceiling
//! - **Pluggable transport** through the [`Transport`] trait
//!
//! ## Quick Start
//!
//! ```no_run
//! use est_iot_client::{EstClient, EstClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EstClientConfig::builder()
//!         .server_url("https://est.example.com:8443")?
//!         .build()?;
//!
//!     let client = EstClient::new(config)?;
//!
//!     let ca_certs = client.get_ca_certs().await?;
//!     println!("Retrieved {} bytes of CA certificates", ca_certs.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Certificate Enrollment
//!
//! ```no_run
//! use est_iot_client::{EstClient, EstClientConfig, EstError};
//!
//! # async fn example(csr_base64: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let config = EstClientConfig::builder()
//!     .server_url("https://est.example.com:8443")?
//!     .http_auth("iot-device", "device-password")
//!     .build()?;
//!
//! let client = EstClient::new(config)?;
//!
//! match client.simple_enroll(csr_base64).await {
//!     Ok(response) => println!("Certificate issued ({} bytes)", response.len()),
//!     Err(EstError::EnrollmentPending { retry_after }) => {
//!         println!("Enrollment pending, retry in {} seconds", retry_after);
//!     }
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## RFC 7030 Compliance
//!
//! This library implements:
//! - Section 4.1: Distribution of CA Certificates (`get_ca_certs`)
//! - Section 4.2: Simple Enrollment (`simple_enroll`, `simple_reenroll`)
//!
//! TLS requirements per Section 3.3:
//! - TLS 1.2 or later required
//! - Client certificate authentication supported
//! - HTTP Basic auth supported

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod buffer;
pub mod client;
pub mod config;
pub mod error;
pub mod operations;
pub mod profile;
pub mod tls;
pub mod transport;
pub mod types;

// Re-export main types at crate root for convenience
pub use buffer::{ResponseBuffer, ResponseSink};
pub use client::EstClient;
pub use config::{Auth, ClientIdentity, EstClientConfig, EstClientConfigBuilder, HttpAuth, TrustAnchors};
pub use error::{EstError, Result, TransportErrorKind};
pub use operations::EstOperation;
pub use profile::ClientProfile;
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
pub use types::{AuthMode, EstResponse};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent string for HTTP requests.
pub const USER_AGENT: &str = concat!("est-iot-client/", env!("CARGO_PKG_VERSION"));
