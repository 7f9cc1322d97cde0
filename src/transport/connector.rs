//! Connector wrapper bounding connection establishment.
//!
//! The inner `HttpConnector` enforces the dial timeout on its own; this
//! wrapper caps the whole connect future (dial + TLS handshake) so a stalled
//! handshake cannot hold a pool slot past the connection budget.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use http::Uri;
use tower::Service;

use crate::error::BoxError;

/// Raised when establishing a connection exceeds its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectTimeoutError {
    budget: Duration,
}

impl ConnectTimeoutError {
    pub fn new(budget: Duration) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl fmt::Display for ConnectTimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection not established within {:?}", self.budget)
    }
}

impl std::error::Error for ConnectTimeoutError {}

/// A connector whose connect futures fail after `budget`.
#[derive(Debug, Clone)]
pub struct TimedConnector<C> {
    inner: C,
    budget: Option<Duration>,
}

impl<C> TimedConnector<C> {
    /// `None` leaves the inner connector unbounded.
    pub fn new(inner: C, budget: Option<Duration>) -> Self {
        Self { inner, budget }
    }
}

impl<C> Service<Uri> for TimedConnector<C>
where
    C: Service<Uri>,
    C::Future: Send + 'static,
    C::Error: Into<BoxError>,
    C::Response: Send + 'static,
{
    type Response = C::Response;
    type Error = BoxError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, dst: Uri) -> Self::Future {
        let connecting = self.inner.call(dst);
        let budget = self.budget;

        Box::pin(async move {
            match budget {
                Some(budget) => match tokio::time::timeout(budget, connecting).await {
                    Ok(result) => result.map_err(Into::into),
                    Err(_) => Err(Box::new(ConnectTimeoutError::new(budget)) as BoxError),
                },
                None => connecting.await.map_err(Into::into),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future;
    use tower::{service_fn, ServiceExt};

    #[tokio::test(start_paused = true)]
    async fn stalled_connect_times_out() {
        let stalled = service_fn(|_dst: Uri| future::pending::<Result<(), BoxError>>());
        let connector = TimedConnector::new(stalled, Some(Duration::from_millis(200)));

        let err = connector
            .oneshot(Uri::from_static("https://example.com"))
            .await
            .unwrap_err();
        let timeout = err.downcast_ref::<ConnectTimeoutError>().unwrap();
        assert_eq!(timeout.budget(), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn passes_through_results() {
        let ok = service_fn(|dst: Uri| async move { Ok::<_, BoxError>(dst.host().map(str::to_owned)) });
        let connector = TimedConnector::new(ok, Some(Duration::from_secs(1)));
        let host = connector
            .oneshot(Uri::from_static("http://localhost:1"))
            .await
            .unwrap();
        assert_eq!(host.as_deref(), Some("localhost"));

        let failing = service_fn(|_dst: Uri| async {
            Err::<(), BoxError>(Box::new(std::io::Error::from(std::io::ErrorKind::ConnectionRefused)))
        });
        let err = TimedConnector::new(failing, None)
            .oneshot(Uri::from_static("http://localhost:1"))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<ConnectTimeoutError>().is_none());
    }
}
