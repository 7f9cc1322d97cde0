//! Pure mapping from a resolved `ClientConfig` to pool settings.

use std::time::Duration;

use crate::config::ClientConfig;

/// Grace period for `Expect: 100-continue`; not user-configurable.
pub const EXPECT_CONTINUE_TIMEOUT: Duration = Duration::from_secs(1);

/// Concrete dial/handshake/idle/header behaviour of one connection pool.
///
/// There is no global idle cap across hosts; only the per-host limits apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportSettings {
    /// TCP connect budget. Zero disables it.
    pub dial_timeout: Duration,
    /// TLS handshake budget, spent after the dial completes. Zero disables it.
    pub tls_handshake_timeout: Duration,
    /// Wait for response headers; `None` leaves only the overall timeout.
    pub response_header_timeout: Option<Duration>,
    pub max_idle_conns_per_host: usize,
    /// Zero means unlimited.
    pub max_conns_per_host: usize,
    pub idle_conn_timeout: Duration,
    /// Offer `h2` during TLS ALPN.
    pub attempt_http2: bool,
    pub expect_continue_timeout: Duration,
}

impl TransportSettings {
    /// Derive settings from a config that already went through `with_defaults`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            dial_timeout: config.conn_timeout,
            tls_handshake_timeout: config.conn_timeout,
            response_header_timeout: (!config.response_timeout.is_zero())
                .then_some(config.response_timeout),
            max_idle_conns_per_host: config.max_conns,
            max_conns_per_host: config.max_conns,
            idle_conn_timeout: config.idle_conn_timeout,
            attempt_http2: !config.disable_http2,
            expect_continue_timeout: EXPECT_CONTINUE_TIMEOUT,
        }
    }

    /// Budget for getting a usable connection: dial plus handshake.
    ///
    /// `None` when either phase is unbounded.
    pub fn connect_budget(&self) -> Option<Duration> {
        if self.dial_timeout.is_zero() || self.tls_handshake_timeout.is_zero() {
            None
        } else {
            Some(self.dial_timeout.saturating_add(self.tls_handshake_timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_defaulted_config() {
        let settings = TransportSettings::from_config(&ClientConfig::default().with_defaults());
        assert_eq!(
            settings,
            TransportSettings {
                dial_timeout: Duration::from_secs(5),
                tls_handshake_timeout: Duration::from_secs(5),
                response_header_timeout: Some(Duration::from_secs(25)),
                max_idle_conns_per_host: 1000,
                max_conns_per_host: 1000,
                idle_conn_timeout: Duration::from_secs(90),
                attempt_http2: true,
                expect_continue_timeout: Duration::from_secs(1),
            }
        );
    }

    #[test]
    fn zero_response_timeout_means_unbounded_headers() {
        let config = ClientConfig::new()
            .timeout(Duration::from_secs(1))
            .with_defaults();
        let settings = TransportSettings::from_config(&config);
        assert_eq!(settings.response_header_timeout, None);
    }

    #[test]
    fn http2_toggle_and_caps() {
        let config = ClientConfig::new()
            .max_conns(7)
            .disable_http2(true)
            .with_defaults();
        let settings = TransportSettings::from_config(&config);
        assert!(!settings.attempt_http2);
        assert_eq!(settings.max_idle_conns_per_host, 7);
        assert_eq!(settings.max_conns_per_host, 7);
    }

    #[test]
    fn connect_budget_spans_dial_and_handshake() {
        let config = ClientConfig::new()
            .conn_timeout(Duration::from_millis(500))
            .with_defaults();
        let settings = TransportSettings::from_config(&config);
        assert_eq!(settings.connect_budget(), Some(Duration::from_secs(1)));

        let unbounded = TransportSettings {
            dial_timeout: Duration::ZERO,
            ..settings
        };
        assert_eq!(unbounded.connect_budget(), None);
    }
}
