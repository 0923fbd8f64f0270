//! Client factory.
//!
//! A [`Factory`] accumulates request defaults and interceptors, then turns them
//! into a [`Client`] with [`Factory::build`]. Every build resets the factory to
//! a clean baseline, so one factory can hand out many independent clients:
//! middleware and options must be re-applied for each of them.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use tower::retry::RetryLayer;
use tower::util::BoxCloneService;
use tower::{Layer, Service};

use crate::client::{Client, ClientId};
use crate::config::TransportConfig;
use crate::middleware::{Exchange, History, HistoryLayer, LoggingLayer, RetryPolicy};
use crate::options::RequestOptions;
use crate::pipeline::{Pipeline, interceptor};
use crate::transport::{BoxedService, FakeTransport, HyperTransport};
use crate::{Error, Formatter, Logger, Request, Response, Result};

/// Name of the logging interceptor.
pub const LOG: &str = "log";
/// Name of the retry interceptor.
pub const RETRY: &str = "retry";
/// Name of the history interceptor installed in fake mode.
pub const FAKE_HISTORY: &str = "fake_history";

/// Retry delay base used in fake mode.
const FAKE_RETRY_DELAY: Duration = Duration::from_micros(100);

/// Builds [`Client`]s from accumulated options and middleware.
///
/// In fake mode no network I/O happens: every client answers with
/// [`FakeTransport`] responses and records each exchange, retries included,
/// into a history readable with [`Factory::get_history`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use grapple::middleware::RetryPolicy;
/// use grapple::{Factory, RequestOptions, TracingLogger};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> grapple::Result<()> {
/// let mut factory = Factory::new(true, Some(Arc::new(TracingLogger)));
/// let client = factory
///     .with_options(RequestOptions::new().with_base_uri("https://some.url"))
///     .enable_logging()?
///     .enable_retries(RetryPolicy::new(2))
///     .build();
///
/// client.get("health").await?;
///
/// let history = factory.get_history(&client);
/// assert_eq!(history.len(), 1);
/// assert_eq!(history[0].request().uri(), "https://some.url/health");
/// # Ok(())
/// # }
/// ```
pub struct Factory {
    fake_requests: bool,
    logger: Option<Arc<dyn Logger>>,
    transport: BoxedService,
    options: RequestOptions,
    pipeline: Pipeline,
    histories: HashMap<ClientId, History>,
}

impl std::fmt::Debug for Factory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Factory")
            .field("fake_requests", &self.fake_requests)
            .field("has_logger", &self.logger.is_some())
            .field("options", &self.options)
            .field("pipeline", &self.pipeline)
            .field("histories", &self.histories.len())
            .finish_non_exhaustive()
    }
}

impl Default for Factory {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Factory {
    /// Create a factory, faking every request when `fake_requests` is set.
    #[must_use]
    pub fn new(fake_requests: bool, logger: Option<Arc<dyn Logger>>) -> Self {
        let builder = Self::builder().fake_requests(fake_requests);
        match logger {
            Some(logger) => builder.logger(logger).build(),
            None => builder.build(),
        }
    }

    /// Create a factory builder.
    #[must_use]
    pub fn builder() -> FactoryBuilder {
        FactoryBuilder::default()
    }

    /// Returns `true` in fake mode.
    #[must_use]
    pub const fn is_faking(&self) -> bool {
        self.fake_requests
    }

    /// Request defaults for the next client.
    #[must_use]
    pub const fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Interceptors registered for the next client.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Replace the request defaults for the next client.
    pub fn with_options(&mut self, options: RequestOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Log every exchange with the default format.
    pub fn enable_logging(&mut self) -> Result<&mut Self> {
        self.enable_logging_with_format(crate::formatter::DEFAULT_FORMAT)
    }

    /// Log every exchange with a custom format.
    ///
    /// Fails with [`Error::Configuration`] when the factory has no logger.
    pub fn enable_logging_with_format(&mut self, format: impl Into<String>) -> Result<&mut Self> {
        let logger = self
            .logger
            .clone()
            .ok_or_else(|| Error::configuration("logging requires a logger instance"))?;

        let layer = LoggingLayer::new(logger, Formatter::new(format));
        self.pipeline.push(LOG, interceptor(layer));
        Ok(self)
    }

    /// Retry error statuses.
    ///
    /// In fake mode the policy's delay is replaced by a negligible one.
    pub fn enable_retries(&mut self, policy: RetryPolicy) -> &mut Self {
        let policy = if self.fake_requests {
            policy.with_delay(FAKE_RETRY_DELAY)
        } else {
            policy
        };

        self.pipeline.push(RETRY, interceptor(RetryLayer::new(policy)));
        self
    }

    /// Add an anonymous middleware, inside everything registered so far.
    pub fn with_middleware<L>(&mut self, layer: L) -> &mut Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.with_named_middleware("", layer)
    }

    /// Add a named middleware, inside everything registered so far.
    pub fn with_named_middleware<L>(&mut self, name: impl Into<String>, layer: L) -> &mut Self
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.pipeline.push(name, interceptor(layer));
        self
    }

    /// Add a named middleware just outside the one named `target`.
    pub fn with_middleware_before<L>(
        &mut self,
        target: &str,
        name: impl Into<String>,
        layer: L,
    ) -> Result<&mut Self>
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.pipeline.insert_before(target, name, interceptor(layer))?;
        Ok(self)
    }

    /// Add a named middleware just inside the one named `target`.
    pub fn with_middleware_after<L>(
        &mut self,
        target: &str,
        name: impl Into<String>,
        layer: L,
    ) -> Result<&mut Self>
    where
        L: Layer<BoxedService> + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.pipeline.insert_after(target, name, interceptor(layer))?;
        Ok(self)
    }

    /// Remove every middleware with the given name.
    pub fn without_middleware(&mut self, name: &str) -> &mut Self {
        self.pipeline.remove(name);
        self
    }

    /// Build a client from the accumulated options and middleware, then reset.
    pub fn build(&mut self) -> Client {
        let id = ClientId::next();

        if self.fake_requests {
            let history = History::new();
            self.histories.insert(id, history.clone());
            self.pipeline
                .push(FAKE_HISTORY, interceptor(HistoryLayer::new(history)));
        }

        let service = self.pipeline.compose();
        tracing::debug!(
            client = %id,
            fake = self.fake_requests,
            middleware = ?self.pipeline.names(),
            "built http client"
        );
        let client = Client::new(id, service, mem::take(&mut self.options));

        self.reset();
        client
    }

    /// Drop pending options and middleware.
    pub fn reset(&mut self) {
        self.options = RequestOptions::default();
        self.pipeline = Pipeline::from_boxed(self.transport.clone());
    }

    /// Exchanges recorded for a client built in fake mode, oldest first.
    ///
    /// Unknown clients (or clients built outside fake mode) have no history.
    #[must_use]
    pub fn get_history(&self, client: &Client) -> Vec<Exchange> {
        self.histories
            .get(&client.id())
            .map(History::entries)
            .unwrap_or_default()
    }

    /// Stop tracking a client's history.
    pub fn forget_history(&mut self, client: &Client) -> Option<History> {
        self.histories.remove(&client.id())
    }
}

/// Builder for [`Factory`].
#[derive(Default)]
pub struct FactoryBuilder {
    fake_requests: bool,
    logger: Option<Arc<dyn Logger>>,
    transport: Option<BoxedService>,
    transport_config: TransportConfig,
}

impl std::fmt::Debug for FactoryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryBuilder")
            .field("fake_requests", &self.fake_requests)
            .field("has_logger", &self.logger.is_some())
            .field("custom_transport", &self.transport.is_some())
            .field("transport_config", &self.transport_config)
            .finish()
    }
}

impl FactoryBuilder {
    /// Fake every request.
    #[must_use]
    pub const fn fake_requests(mut self, fake: bool) -> Self {
        self.fake_requests = fake;
        self
    }

    /// Logger used by [`Factory::enable_logging`].
    #[must_use]
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Base transport used outside fake mode, instead of [`HyperTransport`].
    ///
    /// Ignored when [`fake_requests`](Self::fake_requests) is set: fake
    /// factories always answer with [`FakeTransport`].
    #[must_use]
    pub fn transport<S>(mut self, transport: S) -> Self
    where
        S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        S::Future: Send + 'static,
    {
        self.transport = Some(BoxCloneService::new(transport));
        self
    }

    /// Configuration of the default [`HyperTransport`].
    #[must_use]
    pub fn transport_config(mut self, config: TransportConfig) -> Self {
        self.transport_config = config;
        self
    }

    /// Build the factory.
    #[must_use]
    pub fn build(self) -> Factory {
        let transport = if self.fake_requests {
            if self.transport.is_some() {
                tracing::debug!("fake requests enabled, ignoring the configured transport");
            }
            BoxCloneService::new(FakeTransport::new())
        } else {
            self.transport.unwrap_or_else(|| {
                BoxCloneService::new(HyperTransport::new(self.transport_config))
            })
        };

        Factory {
            fake_requests: self.fake_requests,
            logger: self.logger,
            pipeline: Pipeline::from_boxed(transport.clone()),
            transport,
            options: RequestOptions::default(),
            histories: HashMap::new(),
        }
    }
}
