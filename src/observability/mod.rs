//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Client, transport and config produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!
//! Consumers:
//!     → whatever subscriber / recorder the host process installs
//! ```
//!
//! # Design Decisions
//! - The library never installs a metrics recorder; without one, updates are no-ops
//! - Returned errors are not logged here; the caller decides

pub mod logging;
pub mod metrics;
