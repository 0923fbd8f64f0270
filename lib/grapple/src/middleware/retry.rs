//! Retry policy for error statuses.
//!
//! Only exchanges that produced a response are retried: a status at or above
//! the policy's minimum error status triggers another attempt, after a delay
//! that grows linearly with the number of retries already made. Failures
//! without a response (connection refused, timeouts) are returned as-is.

use std::time::Duration;

use tokio::time::Sleep;
use tower::retry::Policy;

use crate::{Error, Request, Response};

/// Retry policy for [`RetryLayer`](tower::retry::RetryLayer).
///
/// Each request gets its own copy of the policy, so the attempt counter never
/// leaks between requests.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use grapple::middleware::RetryPolicy;
///
/// let policy = RetryPolicy::new(2)
///     .with_delay(Duration::from_millis(250))
///     .with_min_error_status(429);
///
/// assert_eq!(policy.max_retries(), 2);
/// assert_eq!(policy.delay_for(2), Duration::from_millis(500));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
    min_error_status: u16,
    attempts: u32,
}

impl Default for RetryPolicy {
    /// Three retries, one second apart (times the retry number), for statuses >= 500.
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(1),
            min_error_status: 500,
            attempts: 0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy allowing `max_retries` retries.
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Set the base delay; the n-th retry waits `n * delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the lowest status that is retried.
    #[must_use]
    pub const fn with_min_error_status(mut self, status: u16) -> Self {
        self.min_error_status = status;
        self
    }

    /// Maximum number of retries.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Base delay between retries.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Lowest retried status.
    #[must_use]
    pub const fn min_error_status(&self) -> u16 {
        self.min_error_status
    }

    /// Delay before the given retry (1-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.delay.saturating_mul(retry)
    }

    fn should_retry(&self, result: &Result<Response, Error>) -> bool {
        if self.attempts >= self.max_retries {
            return false;
        }

        match result {
            Ok(response) => response.status() >= self.min_error_status,
            Err(_) => false,
        }
    }
}

impl Policy<Request, Response, Error> for RetryPolicy {
    type Future = Sleep;

    fn retry(
        &mut self,
        request: &mut Request,
        result: &mut Result<Response, Error>,
    ) -> Option<Self::Future> {
        if !self.should_retry(result) {
            return None;
        }

        self.attempts += 1;
        let delay = self.delay_for(self.attempts);
        tracing::debug!(
            method = %request.method(),
            uri = %request.uri(),
            status = result.as_ref().map(Response::status).ok(),
            attempt = self.attempts,
            max_retries = self.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "retrying request"
        );

        Some(tokio::time::sleep(delay))
    }

    fn clone_request(&mut self, request: &Request) -> Option<Request> {
        Some(request.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::HeaderMap;
    use tower::retry::RetryLayer;
    use tower::{Layer, ServiceExt};

    use super::*;
    use crate::Method;

    fn request() -> Request {
        Request::new(Method::Get, url::Url::parse("https://some.url").expect("url"))
    }

    fn response(status: u16) -> Result<Response, Error> {
        Ok(Response::new(status, HeaderMap::new(), ""))
    }

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.delay(), Duration::from_secs(1));
        assert_eq!(policy.min_error_status(), 500);
    }

    #[test]
    fn delay_grows_linearly() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(3), Duration::from_secs(3));
    }

    #[test]
    fn retries_error_statuses_only() {
        let policy = RetryPolicy::new(1);
        assert!(policy.should_retry(&response(500)));
        assert!(policy.should_retry(&response(503)));
        assert!(!policy.should_retry(&response(404)));
        assert!(!policy.should_retry(&response(200)));
        assert!(!policy.should_retry(&Err(Error::connection("refused"))));
        assert!(!policy.should_retry(&Err(Error::Timeout)));
    }

    #[test]
    fn zero_retries_never_retry() {
        assert!(!RetryPolicy::new(0).should_retry(&response(500)));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_stops_after_max_retries() {
        let mut policy = RetryPolicy::new(2).with_min_error_status(200);
        let mut request = request();

        assert!(policy.retry(&mut request, &mut response(200)).is_some());
        assert!(policy.retry(&mut request, &mut response(200)).is_some());
        assert!(policy.retry(&mut request, &mut response(200)).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_layer_calls_inner_until_exhausted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let inner = tower::service_fn(move |_req: Request| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { response(503) }
        });

        let service = RetryLayer::new(RetryPolicy::new(2)).layer(inner);
        let response = service.oneshot(request()).await.expect("last response");

        assert_eq!(response.status(), 503);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_layer_stops_on_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let inner = tower::service_fn(move |_req: Request| {
            let call = counter.fetch_add(1, Ordering::SeqCst);
            async move { response(if call == 0 { 500 } else { 201 }) }
        });

        let service = RetryLayer::new(RetryPolicy::default()).layer(inner);
        let response = service.oneshot(request()).await.expect("response");

        assert_eq!(response.status(), 201);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
