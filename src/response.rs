//! Buffered response.
//!
//! The body is fully drained before a `Response` exists, so every accessor is
//! a cheap view and `unmarshal` can be called any number of times.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// A completed HTTP exchange with its body in memory.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    reason: Option<String>,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            reason: None,
            headers,
            body,
        }
    }

    /// Keep the reason phrase the server sent on the status line.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Numeric status code.
    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Status line text as sent, e.g. `"200 OK"`.
    ///
    /// Falls back to the canonical reason when the server's phrase is unknown.
    pub fn status_text(&self) -> String {
        match self.reason.as_deref().or(self.status.canonical_reason()) {
            Some(reason) if !reason.is_empty() => format!("{} {}", self.status.as_str(), reason),
            _ => self.status.as_str().to_string(),
        }
    }

    /// The reason phrase, when the server sent a non-canonical one.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body as text; invalid UTF-8 is replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the JSON body into `T`.
    pub fn unmarshal<T>(&self) -> Result<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(&self.body).map_err(Error::Decode)
    }
}
