//! Error types for the EST client.
//!
//! Every failure an EST exchange can produce is one of four kinds: the
//! transport never completed ([`EstError::Transport`]), the server answered
//! with something other than success ([`EstError::Protocol`]), the server
//! deferred issuance ([`EstError::EnrollmentPending`]), or the response did
//! not fit in memory ([`EstError::OutOfMemory`]). The remaining variants cover
//! local misconfiguration detected before any I/O.

use std::fmt;

use thiserror::Error;

/// Result type alias using [`EstError`].
pub type Result<T> = std::result::Result<T, EstError>;

/// Why a transport-level exchange failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// DNS resolution or TCP connect failure.
    Connect,
    /// TLS configuration or handshake failure.
    Tls,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// The request could not be built or sent.
    Request,
    /// The connection failed while the response body was being read.
    Body,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Tls => "tls",
            Self::Timeout => "timeout",
            Self::Request => "request",
            Self::Body => "body",
        };
        f.write_str(name)
    }
}

/// Errors that can occur during EST client operations.
#[derive(Debug, Error)]
pub enum EstError {
    /// Connectivity, TLS or timeout failure. Safe to retry with backoff.
    #[error("Transport error ({kind}): {message}")]
    Transport {
        /// Failure class.
        kind: TransportErrorKind,
        /// Full error chain from the transport.
        message: String,
    },

    /// The server responded, but not with the expected success status.
    #[error("EST server returned HTTP {status}: {}", String::from_utf8_lossy(.body))]
    Protocol {
        /// HTTP status code.
        status: u16,
        /// Response body exactly as received.
        body: Vec<u8>,
    },

    /// The server accepted the request but issuance is deferred (HTTP 202).
    ///
    /// Poll the same operation again after `retry_after` seconds.
    #[error("Enrollment pending, retry after {retry_after} seconds")]
    EnrollmentPending {
        /// Number of seconds to wait before retrying.
        retry_after: u64,
    },

    /// The response buffer could not grow to hold the next chunk.
    #[error("Out of memory: cannot grow response buffer of {buffered} bytes by {requested} bytes")]
    OutOfMemory {
        /// Size of the chunk that could not be appended.
        requested: usize,
        /// Bytes already buffered when growth failed.
        buffered: usize,
    },

    /// Missing or malformed CSR payload.
    #[error("CSR error: {0}")]
    Csr(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid PEM data.
    #[error("Invalid PEM data: {0}")]
    InvalidPem(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EstError {
    /// Create a transport error of the given kind.
    pub fn transport(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Create a TLS transport error with the given message.
    pub fn tls(msg: impl Into<String>) -> Self {
        Self::transport(TransportErrorKind::Tls, msg)
    }

    /// Create a protocol error carrying the server's status and body.
    pub fn protocol(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::Protocol {
            status,
            body: body.into(),
        }
    }

    /// Create an enrollment pending error.
    pub fn enrollment_pending(retry_after: u64) -> Self {
        Self::EnrollmentPending { retry_after }
    }

    /// Create an out-of-memory error.
    pub fn out_of_memory(requested: usize, buffered: usize) -> Self {
        Self::OutOfMemory {
            requested,
            buffered,
        }
    }

    /// Create a CSR error with the given message.
    pub fn csr(msg: impl Into<String>) -> Self {
        Self::Csr(msg.into())
    }

    /// Create a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid PEM error.
    pub fn invalid_pem(msg: impl Into<String>) -> Self {
        Self::InvalidPem(msg.into())
    }

    /// Returns true if retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::EnrollmentPending { .. } | Self::Transport { .. })
    }

    /// Returns the retry-after value if this is an EnrollmentPending error.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::EnrollmentPending { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Returns the HTTP status if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            Self::EnrollmentPending { .. } => Some(202),
            _ => None,
        }
    }

    /// Returns the server's error body for protocol failures.
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            Self::Protocol { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Returns the transport failure class, if any.
    pub fn transport_kind(&self) -> Option<TransportErrorKind> {
        match self {
            Self::Transport { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for EstError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if is_tls_failure(&err) {
            TransportErrorKind::Tls
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Request
        };

        Self::transport(kind, error_chain(&err))
    }
}

/// Walk the source chain looking for a rustls failure.
///
/// `io::Error::source` skips the wrapped error, so wrapped errors are
/// inspected through `get_ref` as well.
fn is_tls_failure(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        if let Some(inner) = e
            .downcast_ref::<std::io::Error>()
            .and_then(|io| io.get_ref())
        {
            if inner.downcast_ref::<rustls::Error>().is_some() {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// Render an error with every distinct message in its source chain.
pub(crate) fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        let text = e.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = e.source();
    }
    message
}
