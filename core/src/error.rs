//! Error types for the request client.
//!
//! # Design
//! Two layers. `TransportError` is what a `Transport` reports: a coarse
//! `TransportErrorKind` plus the underlying cause. `RequestError` is what
//! callers of `RequestClient` see: one variant per failure class, so callers
//! can branch without reading messages. `classify` is the single mapping
//! between the two; the client routes every transport failure through it.

use std::fmt;

use thiserror::Error;

use crate::decode::DecodeError;

/// Boxed error used to carry underlying causes across the transport seam.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Reason code reported by a `Transport` alongside a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request or connection timed out.
    TimedOut,
    /// No route to the host: DNS failure, refused connection, offline.
    NotConnected,
    /// The request could not be constructed before sending.
    InvalidRequest,
    /// A response arrived with a status outside 2xx.
    UnacceptableStatus(u16),
    /// A response arrived but failed a non-status check, e.g. content type.
    ResponseValidation,
    /// The caller cancelled the request while it was in flight.
    Cancelled,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::TimedOut => write!(f, "timed out"),
            TransportErrorKind::NotConnected => write!(f, "not connected"),
            TransportErrorKind::InvalidRequest => write!(f, "invalid request"),
            TransportErrorKind::UnacceptableStatus(status) => {
                write!(f, "unacceptable status {status}")
            }
            TransportErrorKind::ResponseValidation => write!(f, "response validation failed"),
            TransportErrorKind::Cancelled => write!(f, "cancelled"),
            TransportErrorKind::Other => write!(f, "transport failure"),
        }
    }
}

/// A failure reported by a `Transport` or by response validation.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn timed_out(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::TimedOut, message)
    }

    pub fn not_connected(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::NotConnected, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::InvalidRequest, message)
    }

    pub fn unacceptable_status(status: u16) -> Self {
        Self::new(
            TransportErrorKind::UnacceptableStatus(status),
            format!("response status code was unacceptable: {status}"),
        )
    }

    pub fn cancelled() -> Self {
        Self::new(TransportErrorKind::Cancelled, "request explicitly cancelled")
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Split into the message and the underlying cause.
    pub fn into_parts(self) -> (String, Option<BoxError>) {
        (self.message, self.source)
    }
}

/// Errors returned by `RequestClient`.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The response body could not be decoded into the requested type.
    #[error("failed to decode response")]
    Decoding(#[from] DecodeError),

    #[error("request timed out")]
    Timeout,

    #[error("no network connection")]
    NoConnection,

    /// The request could not be built or was rejected before sending.
    #[error("invalid request: {0}")]
    InvalidRequest(String, #[source] Option<BoxError>),

    /// The server answered with a 4xx status.
    #[error("client error: HTTP {0}")]
    Client(u16),

    /// The server answered with a 5xx status.
    #[error("server error: HTTP {0}")]
    Server(u16),

    /// Response validation failed for a reason outside the 4xx/5xx buckets.
    #[error("unexpected response")]
    UnexpectedResponse(#[source] TransportError),

    #[error("unknown error")]
    Unknown(#[source] TransportError),

    /// The validation hook rejected an otherwise well-formed response.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl RequestError {
    /// The HTTP status behind a `Client` or `Server` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Client(status) | RequestError::Server(status) => Some(*status),
            RequestError::UnexpectedResponse(e) => match e.kind() {
                TransportErrorKind::UnacceptableStatus(status) => Some(status),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<TransportError> for RequestError {
    fn from(error: TransportError) -> Self {
        classify(error)
    }
}

/// Render `err` followed by its chain of sources on one line.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

/// Map a transport failure onto the caller-facing taxonomy.
pub fn classify(error: TransportError) -> RequestError {
    match error.kind() {
        TransportErrorKind::TimedOut => RequestError::Timeout,
        TransportErrorKind::NotConnected => RequestError::NoConnection,
        TransportErrorKind::InvalidRequest => {
            let (message, source) = error.into_parts();
            RequestError::InvalidRequest(message, source)
        }
        TransportErrorKind::UnacceptableStatus(status @ 400..=499) => RequestError::Client(status),
        TransportErrorKind::UnacceptableStatus(status @ 500..=599) => RequestError::Server(status),
        TransportErrorKind::UnacceptableStatus(_) | TransportErrorKind::ResponseValidation => {
            RequestError::UnexpectedResponse(error)
        }
        TransportErrorKind::Cancelled | TransportErrorKind::Other => RequestError::Unknown(error),
    }
}
