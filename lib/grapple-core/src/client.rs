//! HTTP client trait.
//!
//! [`HttpClient`] is the low-level execution contract shared by built clients
//! and test doubles.

use std::future::Future;

use crate::{Request, Response, Result};

/// Core HTTP client trait.
///
/// This trait defines the interface for executing HTTP requests.
pub trait HttpClient: Send + Sync {
    /// Execute an HTTP request and return the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any reason:
    /// - Network errors
    /// - TLS errors
    /// - Timeouts
    /// - Error status codes, when the client is configured to reject them
    fn execute(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}
