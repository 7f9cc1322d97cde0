//! Connection-pooled HTTP client with composable timeouts.
//!
//! # Architecture Overview
//!
//! ```text
//!   Request (builder)          Context (cancel / deadline)
//!          │                          │
//!          ▼                          ▼
//!   ┌──────────────────────────────────────────────┐
//!   │ Client::fetch                                │
//!   │   overall timeout ─┬─ context                │
//!   │                    ▼                         │
//!   │   ┌───────────────────────────────────────┐  │
//!   │   │ transport (RoundTrip)                 │  │
//!   │   │   per-host cap → header timeout       │  │
//!   │   │   pool: dial + TLS budget, idle, h2   │  │
//!   │   └───────────────────────────────────────┘  │
//!   │                    │                         │
//!   │        body drained into memory              │
//!   └────────────────────┼─────────────────────────┘
//!                        ▼
//!              Response (buffered, unmarshal)
//!
//!   ClientConfig ─ with_defaults ─ TransportSettings ─ PooledTransport
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use pooled_fetch::{Client, ClientConfig, ClientOption, Context, Request};
//!
//! # async fn run() -> pooled_fetch::Result<()> {
//! let client = Client::new(
//!     ClientConfig::new().timeout(Duration::from_secs(5)),
//!     [ClientOption::MaxConns(100)],
//! );
//!
//! let mut request = Request::get("https://httpbin.org/get")?;
//! request.add_query("q", "ping").set_header("Accept", "application/json");
//!
//! let response = client.fetch(&Context::background(), &mut request).await?;
//! println!("{} {}", response.status(), response.text());
//! # Ok(())
//! # }
//! ```

// Core subsystems
pub mod client;
pub mod config;
pub mod context;
pub mod request;
pub mod response;
pub mod transport;

// Cross-cutting concerns
pub mod error;
pub mod observability;

pub use client::{Client, ClientOption};
pub use config::ClientConfig;
pub use context::{Context, ContextError};
pub use error::{Error, ErrorCategory, Result, TimeoutKind};
pub use request::{Body, Method, Request};
pub use response::Response;
pub use transport::{PooledTransport, RoundTrip, TransportSettings};
