//! Exchange logging middleware.
//!
//! Unlike a plain `tracing` span, this layer renders one formatted line per
//! exchange, after the response (or error) is known, and hands it to a
//! [`Logger`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tower::{Layer, Service};
use tracing::{Instrument, Level, span};

use crate::{Error, Formatter, Logger, Request, Response, Result};

/// Layer that logs every exchange through a [`Logger`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use grapple::middleware::{LoggingLayer, ServiceBuilder};
/// use grapple::transport::FakeTransport;
/// use grapple::{Formatter, TracingLogger};
///
/// let service = ServiceBuilder::new()
///     .layer(LoggingLayer::new(Arc::new(TracingLogger), Formatter::new("{method} {uri} {code}")))
///     .service(FakeTransport::new());
/// # let _ = service;
/// ```
#[derive(Clone)]
pub struct LoggingLayer {
    logger: Arc<dyn Logger>,
    formatter: Arc<Formatter>,
    level: Level,
}

impl std::fmt::Debug for LoggingLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingLayer")
            .field("formatter", &self.formatter)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl LoggingLayer {
    /// Create a layer logging at `INFO` level.
    #[must_use]
    pub fn new(logger: Arc<dyn Logger>, formatter: Formatter) -> Self {
        Self {
            logger,
            formatter: Arc::new(formatter),
            level: Level::INFO,
        }
    }

    /// Log at another level.
    #[must_use]
    pub const fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// The formatter rendering log lines.
    #[must_use]
    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            logger: Arc::clone(&self.logger),
            formatter: Arc::clone(&self.formatter),
            level: self.level,
        }
    }
}

/// Service that logs requests and their outcome.
#[derive(Clone)]
pub struct Logging<S> {
    inner: S,
    logger: Arc<dyn Logger>,
    formatter: Arc<Formatter>,
    level: Level,
}

impl<S> std::fmt::Debug for Logging<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logging")
            .field("formatter", &self.formatter)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

impl<S> Service<Request> for Logging<S>
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
        let span = span!(Level::DEBUG, "http_exchange", method = %request.method(), uri = %request.uri());

        // the ready service goes into the future, a fresh clone stays behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let logger = Arc::clone(&self.logger);
        let formatter = Arc::clone(&self.formatter);
        let level = self.level;

        Box::pin(
            async move {
                let logged = request.clone();
                let result = inner.call(request).await;

                let line = formatter.format(&logged, result.as_ref().ok(), result.as_ref().err());
                logger.log(level, &line);

                result
            }
            .instrument(span),
        )
    }
}
