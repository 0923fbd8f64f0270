//! HTTP client factory with logging, retries, request history and a fake mode
//! for tests.
//!
//! A [`Factory`] collects request defaults ([`RequestOptions`]) and an ordered
//! [`Pipeline`] of tower middleware, then builds independent [`Client`]s from
//! them. Each build resets the factory, so nothing leaks from one client into
//! the next.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use grapple::middleware::RetryPolicy;
//! use grapple::{Factory, RequestOptions, TracingLogger};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> grapple::Result<()> {
//! // fake mode: no network, canned responses, recorded history
//! let mut factory = Factory::new(true, Some(Arc::new(TracingLogger)));
//!
//! let client = factory
//!     .with_options(RequestOptions::new().with_base_uri("https://api.example.com"))
//!     .enable_logging_with_format("{method} {uri} -> {code}")?
//!     .enable_retries(RetryPolicy::default())
//!     .build();
//!
//! let response = client.get("users/42").await?;
//! assert_eq!(response.status(), 200);
//! assert_eq!(factory.get_history(&client).len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! Exchange log lines are rendered by a [`Formatter`] template and emitted
//! through a [`Logger`]. Request and response bodies are only inlined when
//! their content type is textual (see [`ALLOWED_CONTENT_TYPES`]); other bodies
//! show up as `[stripped body: <content-type>]`.

mod client;
mod config;
mod factory;
mod formatter;
mod logger;
pub mod middleware;
mod options;
pub mod pipeline;
pub mod prelude;
pub mod transport;

pub use client::{Client, ClientId};
pub use config::{TransportConfig, TransportConfigBuilder};
pub use factory::{FAKE_HISTORY, Factory, FactoryBuilder, LOG, RETRY};
pub use formatter::{ALLOWED_CONTENT_TYPES, DEFAULT_FORMAT, Formatter};
pub use logger::{Logger, TracingLogger};
pub use options::RequestOptions;
pub use pipeline::{Interceptor, Pipeline};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use grapple_core::{
    Body, ContentType, Error, HttpClient, Method, Request, RequestBuilder, Response, Result,
    from_json, to_form, to_json,
};

// Re-export http types for status codes and headers
pub use grapple_core::{HeaderMap, StatusCode, Version, header};

pub use url;
