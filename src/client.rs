//! Client lifecycle and request execution.
//!
//! # Data Flow
//! ```text
//! Client::new(config, options)
//!     → with_defaults → TransportSettings → PooledTransport
//!     → options applied in order (each rebuilds, or swaps the transport)
//!
//! fetch(ctx, request)
//!     → request.to_http (query finalized, body selected)
//!     → transport.round_trip, raced against ctx and the overall timeout
//!     → body drained into memory → Response
//! ```
//!
//! # Design Decisions
//! - Config and transport are swapped together behind `ArcSwap`; a fetch
//!   keeps the snapshot it started with, so reconfiguring while fetches are
//!   in flight is safe and in-flight calls finish on the old pool
//! - Every field change rebuilds the pool from scratch; connections pooled
//!   under the previous config are dropped with it
//! - Non-positive adjustments are ignored rather than reported
//! - No retries; every failure goes straight back to the caller

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use http_body_util::BodyExt;
use hyper::ext::ReasonPhrase;

use crate::config::{validate_config, ClientConfig};
use crate::context::Context;
use crate::error::{Error, Result, TimeoutKind};
use crate::observability::metrics;
use crate::request::Request;
use crate::response::Response;
use crate::transport::{PooledTransport, RoundTrip, TransportSettings};

/// One adjustment applied on top of a client's config.
#[derive(Clone)]
pub enum ClientOption {
    /// Replace the transport wholesale. A later field adjustment rebuilds a
    /// pooled transport and discards this one.
    Transport(Arc<dyn RoundTrip>),
    /// Overall per-call timeout. Does not re-derive the response timeout.
    Timeout(Duration),
    /// Per-host connection cap.
    MaxConns(usize),
    /// Dial and TLS handshake timeout.
    ConnTimeout(Duration),
    /// Response header timeout.
    ResponseHeaderTimeout(Duration),
    /// Idle pooled connection timeout.
    IdleConnTimeout(Duration),
    /// Stop offering HTTP/2.
    DisableHttp2(bool),
}

impl fmt::Debug for ClientOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientOption::Transport(_) => f.write_str("Transport(..)"),
            ClientOption::Timeout(d) => f.debug_tuple("Timeout").field(d).finish(),
            ClientOption::MaxConns(n) => f.debug_tuple("MaxConns").field(n).finish(),
            ClientOption::ConnTimeout(d) => f.debug_tuple("ConnTimeout").field(d).finish(),
            ClientOption::ResponseHeaderTimeout(d) => {
                f.debug_tuple("ResponseHeaderTimeout").field(d).finish()
            }
            ClientOption::IdleConnTimeout(d) => f.debug_tuple("IdleConnTimeout").field(d).finish(),
            ClientOption::DisableHttp2(b) => f.debug_tuple("DisableHttp2").field(b).finish(),
        }
    }
}

struct ClientState {
    config: ClientConfig,
    transport: Arc<dyn RoundTrip>,
}

impl ClientState {
    fn build(config: ClientConfig) -> Self {
        let transport = PooledTransport::new(TransportSettings::from_config(&config));
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    /// The state after `option`, or `None` when it is a no-op.
    fn adjusted(&self, option: &ClientOption) -> Option<Self> {
        let mut config = self.config;
        match option {
            ClientOption::Transport(transport) => {
                return Some(Self {
                    config,
                    transport: transport.clone(),
                })
            }
            ClientOption::Timeout(d) if !d.is_zero() => config.timeout = *d,
            ClientOption::MaxConns(n) if *n > 0 => config.max_conns = *n,
            ClientOption::ConnTimeout(d) if !d.is_zero() => config.conn_timeout = *d,
            ClientOption::ResponseHeaderTimeout(d) if !d.is_zero() => config.response_timeout = *d,
            ClientOption::IdleConnTimeout(d) if !d.is_zero() => config.idle_conn_timeout = *d,
            ClientOption::DisableHttp2(disable) => config.disable_http2 = *disable,
            _ => return None,
        }
        Some(Self::build(config))
    }
}

struct Shared {
    state: ArcSwap<ClientState>,
    // Serializes reconfiguration; fetches never take it.
    writer: Mutex<()>,
}

/// HTTP client owning one connection pool.
///
/// Cloning is cheap and clones share the pool and configuration.
#[derive(Clone)]
pub struct Client {
    shared: Arc<Shared>,
}

impl Client {
    /// Apply defaults to `config`, build the pool, then apply `options` in order.
    pub fn new(config: ClientConfig, options: impl IntoIterator<Item = ClientOption>) -> Self {
        let config = resolve(config);
        let client = Self {
            shared: Arc::new(Shared {
                state: ArcSwap::from_pointee(ClientState::build(config)),
                writer: Mutex::new(()),
            }),
        };
        for option in options {
            client.apply(option);
        }
        client
    }

    /// Apply one adjustment.
    pub fn apply(&self, option: ClientOption) {
        tracing::debug!(option = ?option, "Adjusting client");
        self.update(|state| state.adjusted(&option));
    }

    /// Replace the whole config (defaults applied) and rebuild the pool.
    pub fn apply_config(&self, config: ClientConfig) {
        let config = resolve(config);
        self.update(|_| Some(ClientState::build(config)));
    }

    /// The config currently in effect.
    pub fn config(&self) -> ClientConfig {
        self.shared.state.load().config
    }

    /// The transport currently in effect.
    pub fn transport(&self) -> Arc<dyn RoundTrip> {
        self.shared.state.load().transport.clone()
    }

    /// Execute `request` and buffer the whole response.
    ///
    /// Blocks until the body is read, the caller's context ends, or the
    /// overall timeout fires, whichever is first. Streamed request bodies
    /// are consumed by the call.
    pub async fn fetch(&self, ctx: &Context, request: &mut Request) -> Result<Response> {
        if let Some(reason) = ctx.err() {
            return Err(reason.into());
        }

        let state = self.shared.state.load_full();
        let start = Instant::now();
        let method = request.method();
        let wire = request.to_http()?;

        tracing::debug!(method = %method, url = %wire.uri(), "Fetch started");

        let exchange = exchange(state.transport.as_ref(), wire);
        let outcome = tokio::select! {
            biased;
            reason = ctx.done() => Err(Error::from(reason)),
            result = within(state.config.timeout, exchange) => result,
        };

        match &outcome {
            Ok(response) => tracing::debug!(
                method = %method,
                status = response.status(),
                bytes = response.bytes().len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Fetch completed"
            ),
            Err(e) => tracing::debug!(
                method = %method,
                error = %e,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Fetch failed"
            ),
        }
        metrics::record_fetch(method, outcome.as_ref().map(Response::status), start);

        outcome
    }

    fn update(&self, next: impl FnOnce(&ClientState) -> Option<ClientState>) {
        let _writer = self.shared.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.shared.state.load();
        if let Some(state) = next(&current) {
            self.shared.state.store(Arc::new(state));
        }
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config())
            .finish()
    }
}

fn resolve(config: ClientConfig) -> ClientConfig {
    let config = config.with_defaults();
    if let Err(problems) = validate_config(&config) {
        for problem in problems {
            tracing::warn!(problem = %problem, "Client config fails validation");
        }
    }
    config
}

/// Dispatch and drain the body. Dropping this future releases the body.
async fn exchange(transport: &dyn RoundTrip, request: http::Request<crate::transport::RequestBody>) -> Result<Response> {
    let response = transport.round_trip(request).await?;
    let (parts, body) = response.into_parts();
    let body = body.collect().await.map_err(Error::from_transport)?.to_bytes();

    let response = Response::new(parts.status, parts.headers, body);
    Ok(match parts.extensions.get::<ReasonPhrase>() {
        Some(reason) => response.with_reason(String::from_utf8_lossy(reason.as_bytes())),
        None => response,
    })
}

/// Bound `work` by the overall timeout; zero means unbounded.
async fn within<F>(limit: Duration, work: F) -> Result<Response>
where
    F: Future<Output = Result<Response>>,
{
    if limit.is_zero() {
        return work.await;
    }
    tokio::time::timeout(limit, work)
        .await
        .unwrap_or(Err(Error::Timeout(TimeoutKind::Overall)))
}
