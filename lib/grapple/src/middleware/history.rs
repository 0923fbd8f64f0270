//! Exchange recording middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tower::{Layer, Service};

use crate::{Error, Request, Response, Result};

/// One recorded request together with its outcome.
#[derive(Debug, Clone)]
pub struct Exchange {
    request: Request,
    outcome: Result<Response>,
    timestamp: DateTime<Utc>,
    elapsed: Duration,
}

impl Exchange {
    /// The request as it reached the recording layer.
    #[must_use]
    pub const fn request(&self) -> &Request {
        &self.request
    }

    /// The response, if the exchange produced one.
    #[must_use]
    pub fn response(&self) -> Option<&Response> {
        self.outcome.as_ref().ok()
    }

    /// The error, if the exchange failed.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.outcome.as_ref().err()
    }

    /// Response or error.
    #[must_use]
    pub const fn outcome(&self) -> &Result<Response> {
        &self.outcome
    }

    /// When the request was sent.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// How long the exchange took.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Shared, append-only list of exchanges.
///
/// Clones share the same storage: the [`HistoryLayer`] appends, the owner reads.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Arc<Mutex<Vec<Exchange>>>,
}

impl History {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded exchanges, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<Exchange> {
        self.lock().clone()
    }

    /// Number of recorded exchanges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing was recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every recorded exchange.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn record(&self, exchange: Exchange) {
        self.lock().push(exchange);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Exchange>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Layer recording every exchange into a [`History`].
///
/// # Example
///
/// ```
/// use grapple::middleware::{History, HistoryLayer, Layer};
/// use grapple::transport::FakeTransport;
///
/// let history = History::new();
/// let service = HistoryLayer::new(history.clone()).layer(FakeTransport::new());
/// # let _ = service;
/// assert!(history.is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct HistoryLayer {
    history: History,
}

impl HistoryLayer {
    /// Record into the given history.
    #[must_use]
    pub const fn new(history: History) -> Self {
        Self { history }
    }
}

impl<S> Layer<S> for HistoryLayer {
    type Service = HistoryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HistoryService {
            inner,
            history: self.history.clone(),
        }
    }
}

/// Service recording exchanges.
#[derive(Debug, Clone)]
pub struct HistoryService<S> {
    inner: S,
    history: History,
}

impl<S> Service<Request> for HistoryService<S>
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let history = self.history.clone();

        Box::pin(async move {
            let recorded = request.clone();
            let timestamp = Utc::now();
            let start = Instant::now();

            let outcome = inner.call(request).await;

            history.record(Exchange {
                request: recorded,
                outcome: outcome.clone(),
                timestamp,
                elapsed: start.elapsed(),
            });

            outcome
        })
    }
}
