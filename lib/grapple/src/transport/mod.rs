//! Base transports.
//!
//! A transport is the innermost [`Service`](tower::Service) of a client
//! pipeline: it turns a [`Request`] into a [`Response`] (or an [`Error`]).
//!
//! - [`HyperTransport`] performs real network I/O with hyper-util and rustls.
//! - [`FakeTransport`] synthesizes a canned response for every request.

mod fake;
mod hyper;

use std::future::Future;
use std::pin::Pin;

use tower::util::BoxCloneService;

use crate::{Error, Request, Response, Result};

pub use fake::FakeTransport;
pub use hyper::HyperTransport;

/// Type-erased service for middleware composition.
///
/// Every interceptor consumes and produces a `BoxedService`, which keeps the
/// pipeline free of the nested generic types that tower layers would otherwise
/// build up.
pub type BoxedService = BoxCloneService<Request, Response, Error>;

/// Future type for Tower Service implementations.
pub type ServiceFuture = Pin<Box<dyn Future<Output = Result<Response>> + Send + 'static>>;
