//! HTTP request building.
//!
//! Use [`Request::builder`] to construct requests with headers, query parameters, and bodies.
//!
//! # Example
//!
//! ```
//! use grapple_core::{Method, Request};
//!
//! let request = Request::builder(Method::Get, "https://api.example.com".parse().unwrap())
//!     .header("Accept", "application/json")
//!     .query("page", "1")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.uri(), "https://api.example.com/?page=1");
//! ```

use std::borrow::Cow;

use http::{HeaderMap, HeaderName, HeaderValue, Version};
use url::Url;

use crate::{Body, ContentType, Error, Method, Result};

/// An HTTP request with method, URL, protocol version, headers, and body.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    version: Version,
    headers: HeaderMap,
    body: Body,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Body::empty(),
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Request URI as written in logs and fake responses.
    ///
    /// A bare root path is rendered without its trailing slash, so
    /// `https://some.url/` reads as `https://some.url`.
    #[must_use]
    pub fn uri(&self) -> Cow<'_, str> {
        let url = self.url.as_str();
        let bare_root = self.url.path() == "/"
            && self.url.query().is_none()
            && self.url.fragment().is_none();

        match url.strip_suffix('/') {
            Some(trimmed) if bare_root => Cow::Borrowed(trimmed),
            _ => Cow::Borrowed(url),
        }
    }

    /// Path and query, as sent on the request line.
    #[must_use]
    pub fn target(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{query}", self.url.path()),
            None => self.url.path().to_string(),
        }
    }

    /// Protocol version.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to headers.
    #[must_use]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// First header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// All values of a header joined with `", "`, or an empty string.
    #[must_use]
    pub fn header_line(&self, name: &str) -> String {
        crate::response::join_header_values(&self.headers, name)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Mutable access to the body (and its read cursor).
    #[must_use]
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Replace the URL.
    pub fn set_url(&mut self, url: Url) {
        self.url = url;
    }

    /// Consume into (method, url, version, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, Version, HeaderMap, Body) {
        (self.method, self.url, self.version, self.headers, self.body)
    }
}

/// Builder for constructing [`Request`] instances.
///
/// Invalid header names or values are remembered and reported by [`RequestBuilder::build`].
#[derive(Debug)]
pub struct RequestBuilder {
    request: Request,
    error: Option<Error>,
}

impl RequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            request: Request::new(method, url),
            error: None,
        }
    }

    /// Appends a header value.
    #[must_use]
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        if self.error.is_some() {
            return self;
        }

        let header = HeaderName::try_from(name)
            .map_err(Into::<http::Error>::into)
            .and_then(|name| {
                HeaderValue::try_from(value)
                    .map(|value| (name, value))
                    .map_err(Into::into)
            });
        match header {
            Ok((name, value)) => {
                self.request.headers.append(name, value);
            }
            Err(err) => self.error = Some(Error::from(err)),
        }
        self
    }

    /// Appends multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in &headers {
            self.request.headers.append(name, value.clone());
        }
        self
    }

    /// Appends a query parameter to the URL.
    #[must_use]
    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.request.url.query_pairs_mut().append_pair(name, value);
        self
    }

    /// Sets the protocol version.
    #[must_use]
    pub fn version(mut self, version: Version) -> Self {
        self.request.version = version;
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.request.body = body.into();
        self
    }

    /// Set a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json<T: serde::Serialize>(self, value: &T) -> Result<Self> {
        let body = crate::to_json(value)?;
        Ok(self
            .header(http::header::CONTENT_TYPE, ContentType::Json.as_str())
            .body(body))
    }

    /// Set a form-urlencoded body.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn form<T: serde::Serialize>(self, value: &T) -> Result<Self> {
        let body = crate::to_form(value)?;
        Ok(self
            .header(http::header::CONTENT_TYPE, ContentType::FormUrlEncoded.as_str())
            .body(body))
    }

    /// Builds the [`Request`].
    ///
    /// # Errors
    ///
    /// Returns an error if a header name or value was invalid.
    pub fn build(self) -> Result<Request> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.request),
        }
    }
}
