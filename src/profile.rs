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

//! Device profile files.
//!
//! A profile is a TOML document describing how a device reaches its EST
//! server:
//!
//! ```toml
//! [server]
//! url = "https://est.company.example:8443"
//! ca_label = "iot"
//! timeout_secs = 30
//!
//! [auth]
//! username = "iot-device"
//! password_source = "env:EST_PASSWORD"
//! cert_path = "/etc/est/device.pem"
//! key_path = "/etc/est/device.key"
//!
//! [trust]
//! mode = "explicit"
//! ca_bundle_path = "/etc/est/ca-bundle.pem"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ClientIdentity, EstClientConfig, EstClientConfigBuilder};
use crate::error::{EstError, Result};

/// Complete device profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientProfile {
    /// EST server configuration.
    pub server: ServerSection,

    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthSection,

    /// TLS trust configuration.
    #[serde(default)]
    pub trust: TrustSection,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// EST server base URL.
    pub url: String,

    /// Optional CA label.
    #[serde(default)]
    pub ca_label: Option<String>,

    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Largest response body to buffer, in bytes.
    #[serde(default)]
    pub response_limit_bytes: Option<usize>,
}

/// `[auth]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSection {
    /// Username for HTTP Basic authentication.
    #[serde(default)]
    pub username: Option<String>,

    /// Inline password. Prefer `password_source` outside of development.
    #[serde(default)]
    pub password: Option<String>,

    /// Password source: "env:VAR_NAME" or "file:/path/to/file".
    #[serde(default)]
    pub password_source: Option<String>,

    /// Path to client certificate file (PEM format).
    #[serde(default)]
    pub cert_path: Option<PathBuf>,

    /// Path to client private key file (PEM format).
    #[serde(default)]
    pub key_path: Option<PathBuf>,
}

/// `[trust]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrustSection {
    /// Trust verification mode.
    #[serde(default)]
    pub mode: TrustMode,

    /// Path to CA certificate bundle (PEM format).
    /// Required when mode is "explicit".
    #[serde(default)]
    pub ca_bundle_path: Option<PathBuf>,
}

/// Trust verification mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrustMode {
    /// Use Mozilla root CA certificates.
    #[default]
    Webpki,

    /// Use explicit CA certificates from a file.
    Explicit,

    /// Accept any certificate (INSECURE - testing only).
    Insecure,
}

impl ClientProfile {
    /// Parse a profile from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or missing required fields.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| EstError::config(format!("Invalid TOML: {e}")))
    }

    /// Read and parse a profile file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            EstError::config(format!("Failed to read profile {}: {e}", path.display()))
        })?;
        tracing::debug!("Loaded EST profile from {}", path.display());
        Self::from_toml(&content)
    }

    /// Serialize the profile to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EstError::config(format!("TOML serialize: {e}")))
    }

    /// Turn the profile into a config builder, reading any referenced files.
    ///
    /// The builder is returned so callers can layer overrides on top.
    pub fn into_builder(self) -> Result<EstClientConfigBuilder> {
        let mut builder = EstClientConfig::builder().server_url(&self.server.url)?;

        if let Some(label) = self.server.ca_label {
            builder = builder.ca_label(label);
        }
        if let Some(secs) = self.server.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(limit) = self.server.response_limit_bytes {
            builder = builder.response_limit(limit);
        }

        if let Some(password) = self.auth.resolve_password()? {
            let username = self.auth.username.clone().unwrap_or_default();
            builder = builder.http_auth(username, password);
        } else if self.auth.username.is_some() {
            return Err(EstError::config(
                "auth.username is set but no password or password_source",
            ));
        }

        match (&self.auth.cert_path, &self.auth.key_path) {
            (Some(cert), Some(key)) => {
                let identity = ClientIdentity::from_files(cert, key).map_err(|e| {
                    EstError::config(format!("Failed to read client certificate or key: {e}"))
                })?;
                builder = builder.client_identity(identity);
            }
            (None, None) => {}
            _ => {
                return Err(EstError::config(
                    "auth.cert_path and auth.key_path must be set together",
                ))
            }
        }

        builder = match self.trust.mode {
            TrustMode::Webpki => builder.trust_webpki_roots(),
            TrustMode::Explicit => {
                let path = self.trust.ca_bundle_path.as_ref().ok_or_else(|| {
                    EstError::config("trust.ca_bundle_path is required for explicit trust")
                })?;
                builder.trust_explicit(vec![std::fs::read(path)?])
            }
            TrustMode::Insecure => builder.trust_any_insecure(),
        };

        Ok(builder)
    }

    /// Build the client configuration described by this profile.
    pub fn into_config(self) -> Result<EstClientConfig> {
        self.into_builder()?.build()
    }
}

impl AuthSection {
    /// Resolve the password from the inline value or the password source.
    pub fn resolve_password(&self) -> Result<Option<String>> {
        if self.password.is_some() && self.password_source.is_some() {
            return Err(EstError::config(
                "auth.password and auth.password_source are mutually exclusive",
            ));
        }
        if let Some(ref password) = self.password {
            return Ok(Some(password.clone()));
        }
        let Some(ref source) = self.password_source else {
            return Ok(None);
        };

        if let Some(var) = source.strip_prefix("env:") {
            std::env::var(var)
                .map(Some)
                .map_err(|_| EstError::config(format!("environment variable {var} is not set")))
        } else if let Some(path) = source.strip_prefix("file:") {
            let content = std::fs::read_to_string(path)?;
            Ok(Some(content.trim_end_matches(['\r', '\n']).to_string()))
        } else {
            Err(EstError::config(format!(
                "unsupported password_source '{source}', expected env: or file:"
            )))
        }
    }
}
