//! Prelude module for convenient imports.
//!
//! ```ignore
//! use grapple::prelude::*;
//! ```

pub use crate::middleware::{Exchange, RetryPolicy};
pub use crate::{
    Body, Client, ContentType, Error, Factory, Formatter, HttpClient, Logger, Method, Request,
    RequestBuilder, RequestOptions, Response, Result, StatusCode, TracingLogger, header,
};
pub use serde::{Deserialize, Serialize};
