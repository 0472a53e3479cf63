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

//! Configuration types for the EST client.
//!
//! This module provides configuration structures for setting up an EST client,
//! including server URL, authentication credentials, and TLS settings.
//!
//! Credentials are resolved into a single [`Auth`] value when the configuration
//! is built, so a username without a password, or a certificate without its
//! key, cannot be expressed.

use std::path::Path;
use std::time::Duration;

use url::Url;

use crate::error::{EstError, Result};
use crate::types::AuthMode;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default memory budget for a single response body (1 MiB).
pub const DEFAULT_RESPONSE_LIMIT: usize = 1024 * 1024;

/// Immutable per-session configuration for an EST client.
#[derive(Clone)]
pub struct EstClientConfig {
    /// EST server base URL (e.g., "https://est.example.com:8443").
    pub server_url: Url,

    /// Optional CA label for multi-CA deployments.
    ///
    /// When set, the EST path becomes `/.well-known/est/{ca_label}/{operation}`.
    pub ca_label: Option<String>,

    /// Credentials presented to the server.
    pub auth: Auth,

    /// Trust anchor configuration for server certificate verification.
    pub trust_anchors: TrustAnchors,

    /// Request timeout duration.
    pub timeout: Duration,

    /// Largest response body the client will buffer, in bytes.
    pub response_limit: usize,

    /// Additional HTTP headers to include in requests.
    pub additional_headers: Vec<(String, String)>,
}

impl std::fmt::Debug for EstClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EstClientConfig")
            .field("server_url", &self.server_url.as_str())
            .field("ca_label", &self.ca_label)
            .field("auth", &self.auth.mode())
            .field("trust_anchors", &self.trust_anchors)
            .field("timeout", &self.timeout)
            .field("response_limit", &self.response_limit)
            .finish()
    }
}

impl EstClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EstClientConfigBuilder {
        EstClientConfigBuilder::new()
    }

    /// Build the EST operation URL.
    ///
    /// Any path already present on the server URL is kept as a prefix, so a
    /// server mounted below `/est-proxy` still resolves correctly.
    pub fn build_url(&self, operation: &str) -> Url {
        let mut url = self.server_url.clone();
        let prefix = url.path().trim_end_matches('/').to_string();

        let path = match self.ca_label {
            Some(ref label) => format!("{prefix}/.well-known/est/{label}/{operation}"),
            None => format!("{prefix}/.well-known/est/{operation}"),
        };

        url.set_path(&path);
        url
    }

    /// HTTP Basic credentials, if configured.
    pub fn http_auth(&self) -> Option<&HttpAuth> {
        self.auth.basic()
    }

    /// TLS client identity, if configured.
    pub fn client_identity(&self) -> Option<&ClientIdentity> {
        self.auth.identity()
    }
}

/// Builder for [`EstClientConfig`].
#[derive(Default)]
pub struct EstClientConfigBuilder {
    server_url: Option<Url>,
    ca_label: Option<String>,
    client_identity: Option<ClientIdentity>,
    http_auth: Option<HttpAuth>,
    trust_anchors: Option<TrustAnchors>,
    timeout: Option<Duration>,
    response_limit: Option<usize>,
    additional_headers: Vec<(String, String)>,
}

impl EstClientConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the EST server URL.
    pub fn server_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.server_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Set the EST server URL from a pre-parsed URL.
    pub fn server_url_parsed(mut self, url: Url) -> Self {
        self.server_url = Some(url);
        self
    }

    /// Set the CA label for multi-CA deployments.
    pub fn ca_label(mut self, label: impl Into<String>) -> Self {
        self.ca_label = Some(label.into());
        self
    }

    /// Set the client identity for TLS client authentication.
    pub fn client_identity(mut self, identity: ClientIdentity) -> Self {
        self.client_identity = Some(identity);
        self
    }

    /// Set the client identity from PEM-encoded certificate and key.
    pub fn client_identity_pem(
        self,
        cert_pem: impl Into<Vec<u8>>,
        key_pem: impl Into<Vec<u8>>,
    ) -> Self {
        self.client_identity(ClientIdentity::new(cert_pem, key_pem))
    }

    /// Load the client identity from PEM files.
    pub fn client_identity_files(
        self,
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let identity = ClientIdentity::from_files(cert_path, key_path)?;
        Ok(self.client_identity(identity))
    }

    /// Set HTTP Basic authentication credentials.
    pub fn http_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.http_auth = Some(HttpAuth::new(username, password));
        self
    }

    /// Use Mozilla's root CA store (webpki-roots) for server verification.
    pub fn trust_webpki_roots(mut self) -> Self {
        self.trust_anchors = Some(TrustAnchors::WebPki);
        self
    }

    /// Use explicit PEM-encoded CA certificates for server verification.
    pub fn trust_explicit(mut self, ca_pem: Vec<Vec<u8>>) -> Self {
        self.trust_anchors = Some(TrustAnchors::Explicit(ca_pem));
        self
    }

    /// Accept any server certificate (insecure, for testing only).
    pub fn trust_any_insecure(mut self) -> Self {
        self.trust_anchors = Some(TrustAnchors::InsecureAcceptAny);
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the largest response body the client will buffer.
    pub fn response_limit(mut self, bytes: usize) -> Self {
        self.response_limit = Some(bytes);
        self
    }

    /// Add an additional HTTP header to all requests.
    pub fn add_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_headers.push((name.into(), value.into()));
        self
    }

    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the server URL is missing or is not `http`/`https`.
    pub fn build(self) -> Result<EstClientConfig> {
        let server_url = self
            .server_url
            .ok_or_else(|| EstError::config("server_url is required"))?;

        match server_url.scheme() {
            "https" | "http" => {}
            other => {
                return Err(EstError::config(format!(
                    "unsupported URL scheme '{other}', expected https"
                )))
            }
        }
        if server_url.host_str().is_none() {
            return Err(EstError::config("server_url has no host"));
        }
        if let Some(ref label) = self.ca_label {
            if label.is_empty() || label.contains('/') {
                return Err(EstError::config(format!("invalid CA label '{label}'")));
            }
        }

        Ok(EstClientConfig {
            server_url,
            ca_label: self.ca_label,
            auth: Auth::from_parts(self.http_auth, self.client_identity),
            trust_anchors: self.trust_anchors.unwrap_or(TrustAnchors::WebPki),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            response_limit: self.response_limit.unwrap_or(DEFAULT_RESPONSE_LIMIT),
            additional_headers: self.additional_headers,
        })
    }
}

/// Credentials presented to the EST server.
///
/// When both are present the certificate authenticates the TLS channel and
/// the Basic credentials are still attached to the HTTP request.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Auth {
    /// No credentials.
    #[default]
    None,
    /// HTTP Basic only.
    Basic(HttpAuth),
    /// TLS client certificate only.
    ClientCert(ClientIdentity),
    /// TLS client certificate plus HTTP Basic.
    Both {
        /// HTTP Basic credentials.
        basic: HttpAuth,
        /// TLS client identity.
        identity: ClientIdentity,
    },
}

impl Auth {
    /// Combine optional credential layers into one value.
    pub fn from_parts(basic: Option<HttpAuth>, identity: Option<ClientIdentity>) -> Self {
        match (basic, identity) {
            (None, None) => Self::None,
            (Some(basic), None) => Self::Basic(basic),
            (None, Some(identity)) => Self::ClientCert(identity),
            (Some(basic), Some(identity)) => Self::Both { basic, identity },
        }
    }

    /// HTTP Basic credentials, if any.
    pub fn basic(&self) -> Option<&HttpAuth> {
        match self {
            Self::Basic(basic) | Self::Both { basic, .. } => Some(basic),
            Self::None | Self::ClientCert(_) => None,
        }
    }

    /// TLS client identity, if any.
    pub fn identity(&self) -> Option<&ClientIdentity> {
        match self {
            Self::ClientCert(identity) | Self::Both { identity, .. } => Some(identity),
            Self::None | Self::Basic(_) => None,
        }
    }

    /// Replace the TLS identity, keeping any Basic credentials.
    pub fn with_identity(&self, identity: ClientIdentity) -> Self {
        Self::from_parts(self.basic().cloned(), Some(identity))
    }

    /// Which credential layers this value presents.
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::None => AuthMode::None,
            Self::Basic(_) => AuthMode::Basic,
            Self::ClientCert(_) => AuthMode::ClientCert,
            Self::Both { .. } => AuthMode::Both,
        }
    }
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Basic(basic) => f.debug_tuple("Basic").field(basic).finish(),
            Self::ClientCert(identity) => f.debug_tuple("ClientCert").field(identity).finish(),
            Self::Both { basic, identity } => f
                .debug_struct("Both")
                .field("basic", basic)
                .field("identity", identity)
                .finish(),
        }
    }
}

/// Client identity for TLS client certificate authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// PEM-encoded certificate chain.
    ///
    /// The client certificate should be first, followed by any intermediate certificates.
    pub cert_pem: Vec<u8>,

    /// PEM-encoded private key.
    pub key_pem: Vec<u8>,
}

impl ClientIdentity {
    /// Create a new client identity from PEM-encoded data.
    pub fn new(cert_pem: impl Into<Vec<u8>>, key_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            cert_pem: cert_pem.into(),
            key_pem: key_pem.into(),
        }
    }

    /// Create a client identity from file paths.
    pub fn from_files(
        cert_path: impl AsRef<Path>,
        key_path: impl AsRef<Path>,
    ) -> std::io::Result<Self> {
        let cert_pem = std::fs::read(cert_path)?;
        let key_pem = std::fs::read(key_path)?;
        Ok(Self { cert_pem, key_pem })
    }
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("cert_pem", &format_args!("{} bytes", self.cert_pem.len()))
            .field("key_pem", &"<redacted>")
            .finish()
    }
}

/// HTTP Basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct HttpAuth {
    /// Username (may be empty for password-only auth).
    pub username: String,

    /// Password.
    pub password: String,
}

impl HttpAuth {
    /// Create new HTTP auth credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Trust anchor configuration for server certificate verification.
#[derive(Clone, PartialEq, Eq)]
pub enum TrustAnchors {
    /// Use Mozilla's root CA store (webpki-roots).
    WebPki,

    /// Use explicit CA certificates (PEM-encoded, each entry may hold a bundle).
    Explicit(Vec<Vec<u8>>),

    /// Accept any server certificate (insecure, for testing only).
    ///
    /// **WARNING**: This disables all server certificate verification.
    InsecureAcceptAny,
}

impl std::fmt::Debug for TrustAnchors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WebPki => write!(f, "WebPki"),
            Self::Explicit(certs) => write!(f, "Explicit({} certs)", certs.len()),
            Self::InsecureAcceptAny => write!(f, "InsecureAcceptAny"),
        }
    }
}
