//! Tower middleware for grapple clients.
//!
//! Every middleware here is a regular [`Layer`] over [`BoxedService`](crate::transport::BoxedService),
//! so it can be registered on a [`Pipeline`](crate::Pipeline) through
//! [`Factory::with_middleware`](crate::Factory::with_middleware) or stacked by
//! hand with a [`ServiceBuilder`].
//!
//! - [`LoggingLayer`] formats each exchange with a [`Formatter`](crate::Formatter)
//!   and hands the line to a [`Logger`](crate::Logger).
//! - [`RetryPolicy`] drives tower's [`RetryLayer`], retrying error statuses with
//!   a linearly growing delay.
//! - [`HistoryLayer`] records every exchange it sees into a shared [`History`].

mod history;
mod logging;
mod retry;

pub use history::{Exchange, History, HistoryLayer, HistoryService};
pub use logging::{Logging, LoggingLayer};
pub use retry::RetryPolicy;

pub use tower::retry::RetryLayer;
pub use tower::{Layer, ServiceBuilder};
