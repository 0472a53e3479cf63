//! EST client implementation.
//!
//! This module provides the main `EstClient` struct for interacting with
//! EST servers according to RFC 7030.

use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::StatusCode;

use crate::buffer::ResponseBuffer;
use crate::config::{Auth, ClientIdentity, EstClientConfig};
use crate::error::{EstError, Result};
use crate::operations::enroll::check_csr_body;
use crate::operations::EstOperation;
use crate::transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
use crate::types::EstResponse;

/// Retry interval used when a 202 response carries no usable Retry-After.
pub const DEFAULT_RETRY_AFTER: u64 = 60;

/// EST client for certificate enrollment operations.
///
/// The `EstClient` provides the three EST operations a constrained device
/// needs:
/// - CA certificate retrieval
/// - Simple enrollment
/// - Simple re-enrollment
///
/// The client holds no per-device state. Each call owns its response buffer,
/// so independent calls may run concurrently on a shared client.
///
/// # Example
///
/// ```no_run
/// use est_iot_client::{EstClient, EstClientConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = EstClientConfig::builder()
///     .server_url("https://est.example.com:8443")?
///     .build()?;
///
/// let client = EstClient::new(config)?;
///
/// let ca_certs = client.get_ca_certs().await?;
/// println!("Got {} bytes of CA certificates", ca_certs.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EstClient<T = ReqwestTransport> {
    config: EstClientConfig,
    transport: T,
}

impl EstClient<ReqwestTransport> {
    /// Create a new EST client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if TLS configuration fails.
    pub fn new(config: EstClientConfig) -> Result<Self> {
        if config.server_url.scheme() == "http" {
            tracing::warn!(
                "EST server {} is not using TLS; credentials are sent in clear text",
                config.server_url
            );
        }
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self { config, transport })
    }
}

impl<T: Transport> EstClient<T> {
    /// Create an EST client on top of a custom transport.
    pub fn with_transport(config: EstClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &EstClientConfig {
        &self.config
    }

    /// Get the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Retrieve CA certificates from the EST server.
    ///
    /// The request is sent without credentials. The body is returned exactly
    /// as the server sent it, in whatever encoding it declared.
    ///
    /// # RFC Reference
    ///
    /// RFC 7030 Section 4.1: Distribution of CA Certificates
    pub async fn get_ca_certs(&self) -> Result<EstResponse> {
        self.exchange(EstOperation::GetCaCerts, None, &Auth::None).await
    }

    /// Enroll for a new certificate.
    ///
    /// # Arguments
    ///
    /// * `csr` - base64-encoded PKCS#10 request, sent without re-encoding
    ///
    /// # Errors
    ///
    /// Returns [`EstError::EnrollmentPending`] if the server deferred
    /// issuance (HTTP 202), and [`EstError::Protocol`] for any other
    /// non-200 status.
    ///
    /// # RFC Reference
    ///
    /// RFC 7030 Section 4.2.1: Simple Enrollment of Clients
    pub async fn simple_enroll(&self, csr: &[u8]) -> Result<EstResponse> {
        check_csr_body(csr)?;
        self.exchange(EstOperation::SimpleEnroll, Some(csr), &self.config.auth).await
    }

    /// Re-enroll (renew/rekey) an existing certificate.
    ///
    /// `old_certificate` is presented during the TLS handshake together with
    /// the configured client key. Configured Basic credentials are attached
    /// as well. It may be PEM or the body of an earlier enrollment response
    /// (base64 certs-only PKCS#7), passed back unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`EstError::Config`] if no client key is configured and
    /// [`EstError::InvalidPem`] if the certificate or key cannot be loaded,
    /// both before any request is sent. Otherwise the same errors as
    /// [`simple_enroll`](Self::simple_enroll).
    ///
    /// # RFC Reference
    ///
    /// RFC 7030 Section 4.2.2: Simple Re-enrollment of Clients
    pub async fn simple_reenroll(&self, old_certificate: &[u8], csr: &[u8]) -> Result<EstResponse> {
        let key = self
            .config
            .client_identity()
            .map(|identity| identity.key_pem.clone())
            .ok_or_else(|| {
                EstError::config("simplereenroll needs the private key of the prior certificate")
            })?;
        self.simple_reenroll_with_key(old_certificate, &key, csr).await
    }

    /// Re-enroll presenting `old_certificate` with an explicit private key.
    ///
    /// `old_key` is PEM. `old_certificate` is accepted in the same forms as
    /// for [`simple_reenroll`](Self::simple_reenroll).
    pub async fn simple_reenroll_with_key(
        &self,
        old_certificate: &[u8],
        old_key: &[u8],
        csr: &[u8],
    ) -> Result<EstResponse> {
        check_csr_body(csr)?;
        let identity = ClientIdentity::new(old_certificate, old_key);
        let auth = self.config.auth.with_identity(identity);
        self.exchange(EstOperation::SimpleReenroll, Some(csr), &auth).await
    }

    // =========================================================================
    // Helper Methods
    // =========================================================================

    /// Build the request for an operation.
    fn build_request(
        &self,
        operation: EstOperation,
        body: Option<&[u8]>,
        auth: &Auth,
    ) -> TransportRequest {
        let url = self.config.build_url(operation.path_suffix());
        let mut request = TransportRequest::new(operation.method(), url);

        request.headers = operation.request_headers();
        request
            .headers
            .extend(self.config.additional_headers.iter().cloned());
        request.body = body.map(<[u8]>::to_vec);
        request.basic_auth = auth.basic().cloned();
        request.client_identity = auth.identity().cloned();
        request
    }

    /// Run one operation and interpret the server's answer.
    async fn exchange(
        &self,
        operation: EstOperation,
        body: Option<&[u8]>,
        auth: &Auth,
    ) -> Result<EstResponse> {
        let request = self.build_request(operation, body, auth);
        let auth_mode = auth.mode();
        tracing::debug!(auth = %auth_mode, "{} {}", request.method, request.url);

        // dropped with any partial content if the transport fails
        let mut buffer = ResponseBuffer::with_limit(self.config.response_limit);
        let response = self.transport.execute(&request, &mut buffer).await?;
        let body = buffer.finalize();

        match response.status {
            StatusCode::OK => {
                tracing::info!(
                    operation = %operation,
                    bytes = body.len(),
                    auth = %auth_mode,
                    "EST operation succeeded"
                );
                Ok(EstResponse {
                    operation,
                    status: response.status.as_u16(),
                    content_type: response.header_str(CONTENT_TYPE.as_str()).map(str::to_string),
                    transfer_encoding: response
                        .header_str("content-transfer-encoding")
                        .map(str::to_string),
                    auth_mode,
                    body,
                })
            }
            StatusCode::ACCEPTED if operation.allows_pending() => {
                let retry_after = extract_retry_after(&response);
                tracing::info!(operation = %operation, retry_after, "EST enrollment pending");
                Err(EstError::enrollment_pending(retry_after))
            }
            status => {
                tracing::warn!(
                    operation = %operation,
                    status = status.as_u16(),
                    auth = %auth_mode,
                    "EST server rejected request"
                );
                Err(EstError::protocol(status.as_u16(), body))
            }
        }
    }
}

/// Extract the Retry-After delay in seconds.
fn extract_retry_after(response: &TransportResponse) -> u64 {
    match response.header_str(RETRY_AFTER.as_str()) {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(
                "Unsupported Retry-After value '{}', using {} seconds",
                value,
                DEFAULT_RETRY_AFTER
            );
            DEFAULT_RETRY_AFTER
        }),
        None => {
            tracing::warn!(
                "202 response without Retry-After, using {} seconds",
                DEFAULT_RETRY_AFTER
            );
            DEFAULT_RETRY_AFTER
        }
    }
}
