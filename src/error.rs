//! Error types for request construction, dispatch and decoding.
//!
//! # Design Decisions
//! - One error enum for the whole client; callers match on `category()`
//! - Timeouts and cancellation are distinct from network failures
//! - Nothing here is logged; errors go back to the immediate caller

use std::error::Error as StdError;
use std::fmt;
use std::io;

use thiserror::Error;

use crate::transport::connector::ConnectTimeoutError;

/// Boxed error used at the transport seams.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Which budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    /// Dial or TLS handshake took longer than the connection budget.
    Connect,
    /// Response headers did not arrive within the response timeout.
    ResponseHeader,
    /// The whole call exceeded the client's overall timeout.
    Overall,
}

impl fmt::Display for TimeoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutKind::Connect => write!(f, "connect"),
            TimeoutKind::ResponseHeader => write!(f, "response header"),
            TimeoutKind::Overall => write!(f, "overall"),
        }
    }
}

/// Errors returned by the client.
#[derive(Debug, Error)]
pub enum Error {
    /// The target URL could not be parsed as an absolute request URI.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request could not be turned into a wire request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Structured body serialization failed.
    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// Response body did not match the requested shape.
    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),

    /// Dial, TLS or connection failure reported by the transport.
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),

    /// One of the configured timeouts fired.
    #[error("{0} timeout exceeded")]
    Timeout(TimeoutKind),

    /// The caller's context was cancelled.
    #[error("context canceled")]
    Canceled,

    /// The caller's context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Error category for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Raised while building a request, before any network activity.
    Construction,
    /// Raised while encoding a structured body.
    Encoding,
    /// Network-level failure.
    Transport,
    /// A timeout or context deadline.
    Timeout,
    /// Explicit cancellation by the caller.
    Canceled,
    /// Raised by `Response::unmarshal`.
    Decode,
}

impl Error {
    /// Categorize the error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidUrl(_) | Error::InvalidRequest(_) => ErrorCategory::Construction,
            Error::Encode(_) => ErrorCategory::Encoding,
            Error::Decode(_) => ErrorCategory::Decode,
            Error::Transport(_) => ErrorCategory::Transport,
            Error::Timeout(_) | Error::DeadlineExceeded => ErrorCategory::Timeout,
            Error::Canceled => ErrorCategory::Canceled,
        }
    }

    /// True for every timeout, including an expired context deadline.
    pub fn is_timeout(&self) -> bool {
        self.category() == ErrorCategory::Timeout
    }

    /// True only when the caller cancelled the context.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Error::Canceled)
    }

    /// The timeout budget that fired, if any.
    pub fn timeout_kind(&self) -> Option<TimeoutKind> {
        match self {
            Error::Timeout(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Classify an error coming out of the connection pool.
    pub(crate) fn from_transport<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        let err = err.into();
        if is_connect_timeout(err.as_ref()) {
            Error::Timeout(TimeoutKind::Connect)
        } else {
            Error::Transport(err)
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

/// Walk the source chain looking for a connection-phase timeout.
fn is_connect_timeout(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<ConnectTimeoutError>() {
            return true;
        }
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::TimedOut {
                return true;
            }
        }
        current = e.source();
    }
    false
}
