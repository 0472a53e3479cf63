//! HTTP transport for EST exchanges.
//!
//! A [`Transport`] performs exactly one HTTP(S) request and streams the
//! response body into a caller-supplied [`ResponseSink`]. It reports only
//! whether the exchange completed; interpreting the HTTP status is left to
//! [`EstClient`](crate::EstClient).

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use url::Url;

use crate::buffer::ResponseSink;
use crate::config::{ClientIdentity, EstClientConfig, HttpAuth};
use crate::error::Result;
use crate::tls::build_http_client;

/// A fully described HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute request URL.
    pub url: Url,
    /// Request headers, in send order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Option<Vec<u8>>,
    /// HTTP Basic credentials.
    pub basic_auth: Option<HttpAuth>,
    /// Certificate and key presented during the TLS handshake.
    pub client_identity: Option<ClientIdentity>,
}

impl TransportRequest {
    /// Create a request with no headers, body or credentials.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            basic_auth: None,
            client_identity: None,
        }
    }

    /// Look up the first header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Outcome of a completed exchange. The body went to the sink.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
}

impl TransportResponse {
    /// Header value as a string, if present and valid.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Performs a single HTTP request, streaming the body into a sink.
///
/// Implementations must hand each chunk to the sink before reading the next
/// one and must abort the exchange as soon as the sink returns an error.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `request`, writing the response body to `sink`.
    ///
    /// HTTP error statuses are a completed exchange, not a failure.
    async fn execute(
        &self,
        request: &TransportRequest,
        sink: &mut dyn ResponseSink,
    ) -> Result<TransportResponse>;
}

/// [`Transport`] backed by reqwest with rustls.
pub struct ReqwestTransport {
    config: EstClientConfig,
    anonymous: reqwest::Client,
    authenticated: Mutex<Option<(ClientIdentity, reqwest::Client)>>,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("trust_anchors", &self.config.trust_anchors)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

impl ReqwestTransport {
    /// Create a transport using the TLS settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the trust anchors or the configured client
    /// identity cannot be loaded.
    pub fn new(config: &EstClientConfig) -> Result<Self> {
        let anonymous = build_http_client(config, None)?;

        let authenticated = match config.client_identity() {
            Some(identity) => {
                let client = build_http_client(config, Some(identity))?;
                Some((identity.clone(), client))
            }
            None => None,
        };

        Ok(Self {
            config: config.clone(),
            anonymous,
            authenticated: Mutex::new(authenticated),
        })
    }

    /// HTTP client presenting `identity`, reusing the last one built.
    fn client_for(&self, identity: Option<&ClientIdentity>) -> Result<reqwest::Client> {
        let Some(identity) = identity else {
            return Ok(self.anonymous.clone());
        };

        let mut cached = self
            .authenticated
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some((cached_identity, client)) = cached.as_ref() {
            if cached_identity == identity {
                return Ok(client.clone());
            }
        }

        tracing::debug!("Building HTTP client for a new TLS client identity");
        let client = build_http_client(&self.config, Some(identity))?;
        *cached = Some((identity.clone(), client.clone()));
        Ok(client)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        request: &TransportRequest,
        sink: &mut dyn ResponseSink,
    ) -> Result<TransportResponse> {
        let client = self.client_for(request.client_identity.as_ref())?;

        let mut builder = client.request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref auth) = request.basic_auth {
            builder = builder.basic_auth(&auth.username, Some(&auth.password));
        }
        if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        let mut response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        let mut received = 0usize;
        while let Some(chunk) = response.chunk().await? {
            received += chunk.len();
            tracing::trace!(chunk = chunk.len(), received, "Response chunk");
            // returning drops `response`, which aborts the connection
            sink.write_chunk(&chunk)?;
        }

        tracing::debug!(%status, bytes = received, "{} {} completed", request.method, request.url);
        Ok(TransportResponse { status, headers })
    }
}
