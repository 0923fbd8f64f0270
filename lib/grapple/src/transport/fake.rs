//! Deterministic transport used in fake mode.

use std::future;
use std::task::{Context, Poll};

use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue};
use tower_service::Service;

use crate::{ContentType, Error, Request, Response, Result};

/// Transport that answers every request with a synthetic `200 OK`.
///
/// The response body echoes the request line:
/// `Fake test response for request: <METHOD> <URI>`. The answer is a pure
/// function of the request, so the transport can be called any number of
/// times (for instance by a retry interceptor) without running dry.
///
/// # Example
///
/// ```
/// use grapple::transport::FakeTransport;
/// use grapple::{Method, Request};
///
/// let request = Request::new(Method::Get, "https://some.url/path".parse().unwrap());
/// let response = FakeTransport::respond(&request);
///
/// assert_eq!(response.status(), 200);
/// assert_eq!(
///     response.body().text(),
///     "Fake test response for request: GET https://some.url/path"
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeTransport;

impl FakeTransport {
    /// Create a fake transport.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Build the canned response for a request.
    #[must_use]
    pub fn respond(request: &Request) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static(ContentType::PlainText.as_str()),
        );

        let body = format!(
            "Fake test response for request: {} {}",
            request.method(),
            request.uri()
        );

        Response::new(200, headers, body)
    }
}

impl Service<Request> for FakeTransport {
    type Response = Response;
    type Error = Error;
    type Future = future::Ready<Result<Response>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        future::ready(Ok(Self::respond(&request)))
    }
}

#[cfg(test)]
mod tests {
    use tower::ServiceExt;

    use super::*;
    use crate::Method;

    #[tokio::test]
    async fn fake_transport_echoes_request() {
        let request = Request::new(
            Method::Post,
            url::Url::parse("https://api.example.com/users?page=2").expect("url"),
        );

        let response = FakeTransport::new().oneshot(request).await.expect("response");

        assert_eq!(response.status(), 200);
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(
            response.body().text(),
            "Fake test response for request: POST https://api.example.com/users?page=2"
        );
    }

    #[tokio::test]
    async fn fake_transport_never_runs_dry() {
        let mut transport = FakeTransport::new();
        let url = url::Url::parse("https://some.url").expect("url");

        for _ in 0..10 {
            let response = transport
                .ready()
                .await
                .expect("ready")
                .call(Request::new(Method::Get, url.clone()))
                .await
                .expect("response");
            assert_eq!(
                response.body().text(),
                "Fake test response for request: GET https://some.url"
            );
        }
    }
}
