//! Ordered, named interceptor pipeline.
//!
//! A [`Pipeline`] owns a base transport and a list of named interceptors. The
//! first interceptor in the list is the outermost one: it sees the request
//! first and the response last. [`Pipeline::push`] therefore adds a new
//! innermost interceptor, right above the transport, while
//! [`Pipeline::unshift`] wraps everything registered so far.

use std::sync::Arc;

use tower::util::BoxCloneService;
use tower::{Layer, Service};

use crate::transport::BoxedService;
use crate::{Error, Request, Response, Result};

/// Function wrapping a service into another one.
pub type Interceptor = Arc<dyn Fn(BoxedService) -> BoxedService + Send + Sync>;

/// Turn a tower [`Layer`] into an [`Interceptor`].
pub fn interceptor<L>(layer: L) -> Interceptor
where
    L: Layer<BoxedService> + Send + Sync + 'static,
    L::Service: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
    <L::Service as Service<Request>>::Future: Send + 'static,
{
    Arc::new(move |service| BoxCloneService::new(layer.layer(service)))
}

/// Base transport plus named interceptors, outermost first.
///
/// Names do not have to be unique; the empty name is used for anonymous
/// interceptors.
///
/// # Example
///
/// ```
/// use grapple::middleware::{History, HistoryLayer};
/// use grapple::pipeline::{Pipeline, interceptor};
/// use grapple::transport::FakeTransport;
///
/// let mut pipeline = Pipeline::new(FakeTransport::new());
/// pipeline.push("first", interceptor(HistoryLayer::new(History::new())));
/// pipeline.unshift("outer", interceptor(HistoryLayer::new(History::new())));
/// pipeline.push("inner", interceptor(HistoryLayer::new(History::new())));
///
/// assert_eq!(pipeline.names(), ["outer", "first", "inner"]);
/// ```
#[derive(Clone)]
pub struct Pipeline {
    transport: BoxedService,
    interceptors: Vec<(String, Interceptor)>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("interceptors", &self.names())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create an empty pipeline over a transport.
    #[must_use]
    pub fn new<S>(transport: S) -> Self
    where
        S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
        S::Future: Send + 'static,
    {
        Self::from_boxed(BoxCloneService::new(transport))
    }

    /// Create an empty pipeline over an already boxed transport.
    #[must_use]
    pub const fn from_boxed(transport: BoxedService) -> Self {
        Self {
            transport,
            interceptors: Vec::new(),
        }
    }

    /// Add an innermost interceptor.
    pub fn push(&mut self, name: impl Into<String>, interceptor: Interceptor) {
        self.interceptors.push((name.into(), interceptor));
    }

    /// Add an outermost interceptor.
    pub fn unshift(&mut self, name: impl Into<String>, interceptor: Interceptor) {
        self.interceptors.insert(0, (name.into(), interceptor));
    }

    /// Insert an interceptor just outside the first one named `target`.
    pub fn insert_before(
        &mut self,
        target: &str,
        name: impl Into<String>,
        interceptor: Interceptor,
    ) -> Result<()> {
        let index = self.position(target)?;
        self.interceptors.insert(index, (name.into(), interceptor));
        Ok(())
    }

    /// Insert an interceptor just inside the first one named `target`.
    pub fn insert_after(
        &mut self,
        target: &str,
        name: impl Into<String>,
        interceptor: Interceptor,
    ) -> Result<()> {
        let index = self.position(target)?;
        self.interceptors.insert(index + 1, (name.into(), interceptor));
        Ok(())
    }

    /// Remove every interceptor with the given name, returning how many were removed.
    pub fn remove(&mut self, name: &str) -> usize {
        let before = self.interceptors.len();
        self.interceptors.retain(|(existing, _)| existing != name);
        before - self.interceptors.len()
    }

    /// Interceptor names, outermost first.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.interceptors
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Returns `true` if an interceptor with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.interceptors.iter().any(|(existing, _)| existing == name)
    }

    /// Number of interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if only the transport is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Wrap the transport into a single service.
    #[must_use]
    pub fn compose(&self) -> BoxedService {
        self.interceptors
            .iter()
            .rev()
            .fold(self.transport.clone(), |service, (_, wrap)| wrap(service))
    }

    fn position(&self, target: &str) -> Result<usize> {
        self.interceptors
            .iter()
            .position(|(name, _)| name == target)
            .ok_or_else(|| Error::configuration(format!("no middleware named `{target}`")))
    }
}
