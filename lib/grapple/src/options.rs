//! Request default options.
//!
//! Options are a free-form `string -> JSON value` map handed to every client a
//! [`Factory`](crate::Factory) builds. A few keys are understood by the client
//! itself:
//!
//! | Key | Value | Effect |
//! |-----|-------|--------|
//! | `base_uri` | string | relative request URIs are resolved against it |
//! | `headers` | object of string (or array of strings) | default headers |
//! | `auth` | `[user, password]` | `Authorization: Basic ...` header |
//! | `timeout` | seconds | deadline for the whole call (retries included) |
//! | `http_errors` | bool (default `true`) | 4xx/5xx responses become [`Error::Http`] |
//!
//! Every other key is kept verbatim and can be read back with
//! [`Client::config`](crate::Client::config).

use std::time::Duration;

use base64::Engine;
use http::header::AUTHORIZATION;
use http::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::{Error, Request, Result};

/// Request defaults applied by built clients.
///
/// # Example
///
/// ```
/// use grapple::RequestOptions;
///
/// let options = RequestOptions::new()
///     .with_base_uri("https://api.example.com")
///     .with_auth("user", "secret");
///
/// assert_eq!(options.get("base_uri"), Some(&serde_json::json!("https://api.example.com")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestOptions(Map<String, Value>);

impl RequestOptions {
    /// Create empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an arbitrary option.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set the `base_uri` option.
    #[must_use]
    pub fn with_base_uri(self, uri: impl Into<String>) -> Self {
        self.with("base_uri", uri.into())
    }

    /// Set the `auth` option to basic credentials.
    #[must_use]
    pub fn with_auth(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.with("auth", vec![username.into(), password.into()])
    }

    /// Add a default header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let headers = self
            .0
            .entry("headers")
            .or_insert_with(|| Value::Object(Map::new()));
        if !headers.is_object() {
            *headers = Value::Object(Map::new());
        }
        if let Value::Object(headers) = headers {
            headers.insert(name.into(), Value::String(value.into()));
        }
        self
    }

    /// Set the `timeout` option.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with("timeout", timeout.as_secs_f64())
    }

    /// Set the `http_errors` option.
    #[must_use]
    pub fn with_http_errors(self, enabled: bool) -> Self {
        self.with("http_errors", enabled)
    }

    /// Raw option value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over all options.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Parsed `base_uri` option.
    pub fn base_uri(&self) -> Result<Option<Url>> {
        match self.0.get("base_uri") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(uri)) => Ok(Some(Url::parse(uri)?)),
            Some(other) => Err(Error::configuration(format!(
                "`base_uri` must be a string, got {other}"
            ))),
        }
    }

    /// Parsed `timeout` option; zero or absent means no deadline.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.0
            .get("timeout")
            .and_then(Value::as_f64)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .filter(|timeout| !timeout.is_zero())
    }

    /// Whether error statuses are turned into [`Error::Http`] (default `true`).
    #[must_use]
    pub fn http_errors(&self) -> bool {
        self.0
            .get("http_errors")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Resolve a request URI, relative to `base_uri` when one is set.
    pub fn resolve(&self, uri: &str) -> Result<Url> {
        match Url::parse(uri) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => match self.base_uri()? {
                Some(base) => Ok(base.join(uri)?),
                None => Err(url::ParseError::RelativeUrlWithoutBase.into()),
            },
            Err(err) => Err(err.into()),
        }
    }

    /// Apply default headers and credentials to a request.
    ///
    /// Headers already present on the request win over default headers.
    pub(crate) fn apply(&self, request: &mut Request) -> Result<()> {
        if let Some(headers) = self.0.get("headers") {
            let Value::Object(headers) = headers else {
                return Err(Error::configuration("`headers` must be an object"));
            };
            for (name, value) in headers {
                let name = HeaderName::try_from(name.as_str()).map_err(http::Error::from)?;
                if request.headers().contains_key(&name) {
                    continue;
                }
                for value in header_values(value)? {
                    request.headers_mut().append(name.clone(), value);
                }
            }
        }

        if let Some(credentials) = self.basic_credentials()? {
            let value = HeaderValue::try_from(format!("Basic {credentials}"))
                .map_err(http::Error::from)?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        Ok(())
    }

    /// Base64-encoded `user:password` from the `auth` option.
    fn basic_credentials(&self) -> Result<Option<String>> {
        let Some(auth) = self.0.get("auth") else {
            return Ok(None);
        };

        let parts = auth
            .as_array()
            .map(|parts| parts.iter().map(Value::as_str).collect::<Option<Vec<_>>>());
        match parts.flatten().as_deref() {
            Some([username, password]) | Some([username, password, "basic"]) => {
                let credentials = format!("{username}:{password}");
                Ok(Some(
                    base64::engine::general_purpose::STANDARD.encode(credentials),
                ))
            }
            _ => Err(Error::configuration(
                "`auth` must be [username, password] using basic authentication",
            )),
        }
    }
}

fn header_values(value: &Value) -> Result<Vec<HeaderValue>> {
    let to_header = |value: &Value| match value {
        Value::String(value) => HeaderValue::try_from(value.as_str())
            .map_err(|err| Error::from(http::Error::from(err))),
        other => HeaderValue::try_from(other.to_string())
            .map_err(|err| Error::from(http::Error::from(err))),
    };

    match value {
        Value::Array(values) => values.iter().map(to_header).collect(),
        value => Ok(vec![to_header(value)?]),
    }
}

impl From<Map<String, Value>> for RequestOptions {
    fn from(options: Map<String, Value>) -> Self {
        Self(options)
    }
}

impl TryFrom<Value> for RequestOptions {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(options) => Ok(Self(options)),
            Value::Null => Ok(Self::default()),
            other => Err(Error::configuration(format!(
                "options must be a JSON object, got {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Method;

    fn options(value: Value) -> RequestOptions {
        RequestOptions::try_from(value).expect("options")
    }

    #[test]
    fn options_keep_unknown_keys() {
        let options = options(json!({"base_uri": "https://some.url", "custom": [1, 2]}));

        assert_eq!(options.get("custom"), Some(&json!([1, 2])));
        assert_eq!(options.len(), 2);
    }

    #[test]
    fn options_must_be_an_object() {
        let err = RequestOptions::try_from(json!(["a"])).expect_err("not an object");
        assert!(err.is_configuration());
        assert!(RequestOptions::try_from(Value::Null).expect("null").is_empty());
    }

    #[test]
    fn resolve_relative_against_base() {
        let options = RequestOptions::new().with_base_uri("https://some.url");

        let url = options.resolve("path").expect("resolve");
        assert_eq!(url.as_str(), "https://some.url/path");

        let url = options.resolve("https://other.url/x").expect("absolute");
        assert_eq!(url.as_str(), "https://other.url/x");
    }

    #[test]
    fn resolve_relative_without_base_fails() {
        let err = RequestOptions::new().resolve("path").expect_err("no base");
        assert!(matches!(err, Error::InvalidUrl(url::ParseError::RelativeUrlWithoutBase)));
    }

    #[test]
    fn timeout_and_http_errors() {
        let options = RequestOptions::new()
            .with_timeout(Duration::from_millis(1500))
            .with_http_errors(false);

        assert_eq!(options.timeout(), Some(Duration::from_millis(1500)));
        assert!(!options.http_errors());

        assert!(RequestOptions::new().http_errors());
        assert_eq!(options.clone().with("timeout", 0).timeout(), None);
    }

    #[test]
    fn apply_headers_and_auth() {
        let options = options(json!({
            "headers": {"Accept": "application/json", "X-Tag": ["a", "b"], "X-Keep": "default"},
            "auth": ["user", "secret"],
        }));
        let mut request = Request::builder(Method::Get, Url::parse("https://some.url").expect("url"))
            .header("X-Keep", "explicit")
            .build()
            .expect("request");

        options.apply(&mut request).expect("apply");

        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(request.header_line("x-tag"), "a, b");
        assert_eq!(request.header_line("x-keep"), "explicit");
        assert_eq!(request.header("authorization"), Some("Basic dXNlcjpzZWNyZXQ="));
    }

    #[test]
    fn apply_rejects_unsupported_auth() {
        let options = options(json!({"auth": ["user", "secret", "digest"]}));
        let mut request = Request::new(Method::Get, Url::parse("https://some.url").expect("url"));

        let err = options.apply(&mut request).expect_err("digest");
        assert!(err.is_configuration());
    }

    #[test]
    fn with_header_builds_headers_object() {
        let options = RequestOptions::new()
            .with_header("Accept", "text/plain")
            .with_header("X-Id", "7");

        assert_eq!(
            options.get("headers"),
            Some(&json!({"Accept": "text/plain", "X-Id": "7"}))
        );
    }
}
