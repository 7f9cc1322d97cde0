//! Connection pool subsystem.
//!
//! # Data Flow
//! ```text
//! ClientConfig (defaulted)
//!     → settings.rs (pure mapping to dial/handshake/header/idle/cap values)
//!     → PooledTransport::new
//!         HttpConnector (dial timeout, TCP_NODELAY)
//!         → hyper-rustls (TLS, ALPN h2 unless disabled)
//!         → connector.rs (dial + handshake budget)
//!         → hyper-util pool (idle timeout, idle per host)
//!         → limits.rs (total per host)
//!         → header timeout, started once a connection is handed over
//! ```
//!
//! # Design Decisions
//! - Every build yields an independent pool; nothing is cached globally
//! - The header timeout and host caps belong to the pooled transport, so a
//!   custom `RoundTrip` implementation replaces them wholesale
//! - No retries and no redirect following

pub mod connector;
pub mod limits;
pub mod settings;

use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper_util::client::legacy::connect::{capture_connection, HttpConnector};
use hyper_util::client::legacy::Client as PoolClient;
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::error::{BoxError, Error, Result, TimeoutKind};
use crate::observability::metrics;
use crate::transport::connector::TimedConnector;
use crate::transport::limits::HostLimiter;

pub use settings::TransportSettings;

/// Body type sent to a transport.
pub type RequestBody = UnsyncBoxBody<Bytes, BoxError>;

/// Body type handed back by a transport.
pub type ResponseBody = UnsyncBoxBody<Bytes, BoxError>;

type Connector = TimedConnector<hyper_rustls::HttpsConnector<HttpConnector>>;

/// A request body with no bytes.
pub fn empty_body() -> RequestBody {
    Empty::<Bytes>::new()
        .map_err(|never| -> BoxError { match never {} })
        .boxed_unsync()
}

/// A request body of fixed bytes.
pub fn full_body(bytes: Bytes) -> RequestBody {
    Full::new(bytes)
        .map_err(|never| -> BoxError { match never {} })
        .boxed_unsync()
}

/// Executes a single HTTP exchange.
///
/// The future resolves once response headers are available; the body is
/// streamed afterwards. Implementations must not retry.
pub trait RoundTrip: Send + Sync + 'static {
    fn round_trip(
        &self,
        request: http::Request<RequestBody>,
    ) -> BoxFuture<'static, Result<http::Response<ResponseBody>>>;
}

/// The default transport: a hyper-util connection pool.
#[derive(Clone)]
pub struct PooledTransport {
    client: PoolClient<Connector, RequestBody>,
    limiter: Arc<HostLimiter>,
    settings: TransportSettings,
}

impl PooledTransport {
    /// Build a fresh, independent pool.
    pub fn new(settings: TransportSettings) -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_nodelay(true);
        http.set_connect_timeout((!settings.dial_timeout.is_zero()).then_some(settings.dial_timeout));

        let tls = tls_roots().https_or_http().enable_http1();
        let https = if settings.attempt_http2 {
            tls.enable_http2().wrap_connector(http)
        } else {
            tls.wrap_connector(http)
        };
        let connector = TimedConnector::new(https, settings.connect_budget());

        let client = PoolClient::builder(TokioExecutor::new())
            .pool_timer(TokioTimer::new())
            .pool_idle_timeout(settings.idle_conn_timeout)
            .pool_max_idle_per_host(settings.max_idle_conns_per_host)
            .build(connector);

        tracing::debug!(
            dial_timeout = ?settings.dial_timeout,
            tls_handshake_timeout = ?settings.tls_handshake_timeout,
            response_header_timeout = ?settings.response_header_timeout,
            max_conns_per_host = settings.max_conns_per_host,
            idle_conn_timeout = ?settings.idle_conn_timeout,
            attempt_http2 = settings.attempt_http2,
            expect_continue_timeout = ?settings.expect_continue_timeout,
            "Connection pool built"
        );
        metrics::record_transport_rebuild();

        Self {
            client,
            limiter: Arc::new(HostLimiter::new(settings.max_conns_per_host)),
            settings,
        }
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }
}

impl RoundTrip for PooledTransport {
    fn round_trip(
        &self,
        request: http::Request<RequestBody>,
    ) -> BoxFuture<'static, Result<http::Response<ResponseBody>>> {
        let client = self.client.clone();
        let limiter = self.limiter.clone();
        let header_timeout = self.settings.response_header_timeout;

        Box::pin(async move {
            let slot = limiter.acquire(request.uri()).await;

            let mut request = request;
            let mut connection = capture_connection(&mut request);
            let mut pending = std::pin::pin!(client.request(request));

            // The header clock starts once the pool hands over a connection,
            // so dial and handshake stay under the connect budget.
            let response = match header_timeout {
                Some(limit) => {
                    let connected = async {
                        connection.wait_for_connection_metadata().await;
                    };
                    tokio::select! {
                        biased;
                        result = &mut pending => result,
                        _ = connected => tokio::time::timeout(limit, &mut pending)
                            .await
                            .map_err(|_| Error::Timeout(TimeoutKind::ResponseHeader))?,
                    }
                }
                None => pending.await,
            }
            .map_err(Error::from_transport)?;

            // The host slot lives as long as the body.
            Ok(response.map(move |body| {
                body.map_err(BoxError::from)
                    .map_frame(move |frame| {
                        let _held = &slot;
                        frame
                    })
                    .boxed_unsync()
            }))
        })
    }
}

impl std::fmt::Debug for PooledTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledTransport")
            .field("settings", &self.settings)
            .finish()
    }
}

/// Platform roots, or the bundled webpki set when the platform store is unreadable.
fn tls_roots() -> hyper_rustls::HttpsConnectorBuilder<hyper_rustls::builderstates::WantsSchemes> {
    match hyper_rustls::HttpsConnectorBuilder::new().with_native_roots() {
        Ok(builder) => builder,
        Err(e) => {
            tracing::warn!(error = %e, "Platform root certificates unavailable, using bundled roots");
            hyper_rustls::HttpsConnectorBuilder::new().with_webpki_roots()
        }
    }
}
