//! Clients produced by the [`Factory`](crate::Factory).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use derive_more::Display;
use serde::Serialize;
use serde_json::Value;
use tower::{Service, ServiceExt};

use crate::options::RequestOptions;
use crate::transport::{BoxedService, ServiceFuture};
use crate::{Error, HttpClient, Method, Request, RequestBuilder, Response, Result};

/// Process-unique client identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[display("client-{_0}")]
pub struct ClientId(u64);

impl ClientId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric value of the id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Thread-safe wrapper for `BoxedService`.
///
/// `BoxCloneService` is `Send` but not `Sync`; the mutex is only held long
/// enough to clone the service for one call.
#[derive(Clone)]
struct SyncService {
    inner: Arc<Mutex<BoxedService>>,
}

impl SyncService {
    fn new(service: BoxedService) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    fn call(&self, request: Request) -> ServiceFuture {
        let service = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        Box::pin(service.oneshot(request))
    }
}

/// HTTP client wrapping a composed pipeline and its request defaults.
///
/// Clients are cheap to clone; clones share the pipeline and keep the same
/// [`ClientId`].
///
/// # Example
///
/// ```
/// use grapple::{Factory, RequestOptions};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> grapple::Result<()> {
/// let mut factory = Factory::new(true, None);
/// let client = factory
///     .with_options(RequestOptions::new().with_base_uri("https://some.url"))
///     .build();
///
/// let response = client.get("users").await?;
/// assert_eq!(
///     response.body().text(),
///     "Fake test response for request: GET https://some.url/users"
/// );
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    id: ClientId,
    service: SyncService,
    options: RequestOptions,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub(crate) fn new(id: ClientId, service: BoxedService, options: RequestOptions) -> Self {
        Self {
            id,
            service: SyncService::new(service),
            options,
        }
    }

    /// Identity of this client, used as the history key.
    #[must_use]
    pub const fn id(&self) -> ClientId {
        self.id
    }

    /// The request defaults this client was built with.
    #[must_use]
    pub const fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// A single request default, as given to the factory.
    #[must_use]
    pub fn config(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// Start a request, resolving `uri` against the `base_uri` option.
    pub fn builder(&self, method: Method, uri: &str) -> Result<RequestBuilder> {
        Ok(Request::builder(method, self.options.resolve(uri)?))
    }

    /// Send a request without headers or body.
    pub async fn request(&self, method: Method, uri: &str) -> Result<Response> {
        let url = self.options.resolve(uri)?;
        self.send(Request::new(method, url)).await
    }

    /// Send a `GET` request.
    pub async fn get(&self, uri: &str) -> Result<Response> {
        self.request(Method::Get, uri).await
    }

    /// Send a `POST` request with a JSON body.
    pub async fn post_json<T: Serialize>(&self, uri: &str, body: &T) -> Result<Response> {
        let request = self.builder(Method::Post, uri)?.json(body)?.build()?;
        self.send(request).await
    }

    /// Send a request through the pipeline.
    ///
    /// Default headers and credentials are applied first. With the `timeout`
    /// option the whole call, retries included, must finish in time. With
    /// `http_errors` (the default) a final 4xx or 5xx response is returned as
    /// [`Error::Http`].
    pub async fn send(&self, mut request: Request) -> Result<Response> {
        self.options.apply(&mut request)?;
        let summary = format!("`{} {}`", request.method(), request.uri());

        let call = self.service.call(request);
        let response = match self.options.timeout() {
            Some(timeout) => tokio::time::timeout(timeout, call)
                .await
                .map_err(|_| Error::Timeout)??,
            None => call.await?,
        };

        if self.options.http_errors() && response.status() >= 400 {
            let kind = if response.status() >= 500 {
                "Server error"
            } else {
                "Client error"
            };
            let message = format!(
                "{kind}: {summary} resulted in a `{} {}` response",
                response.status(),
                response.reason().unwrap_or_default()
            );
            return Err(Error::http_with_body(
                response.status(),
                message,
                response.body().as_bytes().clone(),
            ));
        }

        Ok(response)
    }
}

impl HttpClient for Client {
    async fn execute(&self, request: Request) -> Result<Response> {
        self.send(request).await
    }
}

impl Service<Request> for Client {
    type Response = Response;
    type Error = Error;
    type Future = ServiceFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let client = self.clone();
        Box::pin(async move { client.send(request).await })
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderMap;
    use tower::util::BoxCloneService;

    use super::*;
    use crate::transport::FakeTransport;

    fn client(service: BoxedService, options: RequestOptions) -> Client {
        Client::new(ClientId::next(), service, options)
    }

    fn status(code: u16) -> BoxedService {
        BoxCloneService::new(tower::service_fn(move |_req: Request| async move {
            Ok::<_, Error>(Response::new(code, HeaderMap::new(), "oops"))
        }))
    }

    #[test]
    fn ids_are_unique() {
        let first = ClientId::next();
        let second = ClientId::next();
        assert_ne!(first, second);
        assert_eq!(first.to_string(), format!("client-{}", first.get()));
    }

    #[tokio::test]
    async fn relative_uri_uses_base_uri() {
        let client = client(
            BoxCloneService::new(FakeTransport::new()),
            RequestOptions::new().with_base_uri("https://some.url"),
        );

        let response = client.request(Method::Put, "items/1").await.expect("response");

        assert_eq!(
            response.body().text(),
            "Fake test response for request: PUT https://some.url/items/1"
        );
    }

    #[tokio::test]
    async fn error_status_becomes_http_error() {
        let client = client(status(503), RequestOptions::new());

        let err = client.get("https://some.url/down").await.expect_err("503");

        assert_eq!(err.status(), Some(503));
        assert_eq!(err.body().map(|body| body.as_ref()), Some(&b"oops"[..]));
        assert!(
            err.to_string()
                .contains("`GET https://some.url/down` resulted in a `503 Service Unavailable` response")
        );
    }

    #[tokio::test]
    async fn http_errors_can_be_disabled() {
        let client = client(status(404), RequestOptions::new().with_http_errors(false));

        let response = client.get("https://some.url").await.expect("404 passed through");

        assert_eq!(response.status(), 404);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_option_bounds_the_call() {
        let slow = BoxCloneService::new(tower::service_fn(|_req: Request| async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok::<_, Error>(Response::new(200, HeaderMap::new(), ""))
        }));
        let client = client(
            slow,
            RequestOptions::new().with_timeout(std::time::Duration::from_secs(1)),
        );

        let err = client.get("https://some.url").await.expect_err("timeout");

        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn post_json_sends_json_body() {
        let echo = BoxCloneService::new(tower::service_fn(|req: Request| async move {
            Ok::<_, Error>(Response::new(
                200,
                req.headers().clone(),
                req.body().as_bytes().clone(),
            ))
        }));
        let client = client(echo, RequestOptions::new());

        let response = client
            .post_json("https://some.url", &serde_json::json!({"name": "alice"}))
            .await
            .expect("response");

        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.body().text(), r#"{"name":"alice"}"#);
    }
}
