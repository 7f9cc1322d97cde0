//! Configuration schema definitions.
//!
//! `ClientConfig` is the single value object that drives the connection
//! pool. Zero means "unset" for every numeric field; `with_defaults` fills
//! the gaps and derives the response header budget.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Overall per-call deadline applied when none is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-host connection cap applied when none is given.
pub const DEFAULT_MAX_CONNS: usize = 1000;

/// Idle eviction delay applied when none is given.
pub const DEFAULT_IDLE_CONN_TIMEOUT: Duration = Duration::from_secs(90);

/// Dial + TLS handshake budget applied when none is given.
pub const DEFAULT_CONN_TIMEOUT: Duration = Duration::from_secs(5);

/// Client configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Maximum connections per destination host (idle and total).
    pub max_conns: usize,

    /// Overall per-call deadline. Should cover `conn_timeout + response_timeout`.
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,

    /// Dial and TLS handshake deadline.
    #[serde(rename = "conn_timeout_ms", with = "duration_ms")]
    pub conn_timeout: Duration,

    /// Deadline from request sent to response headers received.
    #[serde(rename = "response_timeout_ms", with = "duration_ms")]
    pub response_timeout: Duration,

    /// How long an unused pooled connection is kept.
    #[serde(rename = "idle_conn_timeout_ms", with = "duration_ms")]
    pub idle_conn_timeout: Duration,

    /// Never negotiate HTTP/2 when set.
    pub disable_http2: bool,
}

impl ClientConfig {
    /// Create an empty config; every field is unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the overall timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the per-host connection cap.
    pub fn max_conns(mut self, max: usize) -> Self {
        self.max_conns = max;
        self
    }

    /// Set the dial + handshake timeout.
    pub fn conn_timeout(mut self, timeout: Duration) -> Self {
        self.conn_timeout = timeout;
        self
    }

    /// Set the response header timeout.
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Set the idle connection timeout.
    pub fn idle_conn_timeout(mut self, timeout: Duration) -> Self {
        self.idle_conn_timeout = timeout;
        self
    }

    /// Disable HTTP/2 negotiation.
    pub fn disable_http2(mut self, disable: bool) -> Self {
        self.disable_http2 = disable;
        self
    }

    /// Fill unset fields with defaults and derive the response timeout.
    ///
    /// Order matters: `conn_timeout` has to be resolved before the response
    /// budget can be derived as `timeout - conn_timeout`. The derived value
    /// is only used when positive, so no negative budget is ever produced.
    pub fn with_defaults(mut self) -> Self {
        if self.timeout.is_zero() {
            self.timeout = DEFAULT_TIMEOUT;
        }
        if self.max_conns == 0 {
            self.max_conns = DEFAULT_MAX_CONNS;
        }
        if self.idle_conn_timeout.is_zero() {
            self.idle_conn_timeout = DEFAULT_IDLE_CONN_TIMEOUT;
        }
        if self.conn_timeout.is_zero() {
            self.conn_timeout = DEFAULT_CONN_TIMEOUT;
        }
        if self.response_timeout.is_zero() && self.timeout > self.conn_timeout {
            self.response_timeout = self.timeout - self.conn_timeout;
        }
        self
    }
}

/// Serde adapter storing a `Duration` as integer milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
