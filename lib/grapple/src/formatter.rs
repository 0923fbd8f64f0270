//! Template-based formatting of HTTP exchanges.
//!
//! A template mixes literal text with `{placeholder}` substitutions:
//!
//! | Placeholder | Value |
//! |-------------|-------|
//! | `{request}`, `{response}` | full HTTP message |
//! | `{req_headers}`, `{res_headers}` | start line and headers |
//! | `{req_body}`, `{res_body}` | raw body text |
//! | `{\req_body}`, `{\res_body}` | body text if its content type is allow-listed |
//! | `{ts}`, `{date_iso_8601}` | current UTC time (RFC 3339) |
//! | `{date_common_log}` | current local time, Apache common log style |
//! | `{method}`, `{uri}`, `{url}`, `{target}`, `{host}` | request line parts |
//! | `{version}`, `{req_version}`, `{res_version}` | protocol versions |
//! | `{code}`, `{phrase}` | response status |
//! | `{error}` | error message |
//! | `{req_header_<Name>}`, `{res_header_<Name>}` | header values, comma-joined |
//!
//! Response placeholders render `NULL` when there is no response, and `{error}`
//! renders `NULL` without an error. Unknown placeholders render as an empty string.

use std::sync::LazyLock;

use chrono::{Local, SecondsFormat, Utc};
use http::header::{CONTENT_TYPE, HOST};
use http::{HeaderMap, Version};
use regex::{Captures, Regex};

use crate::{Body, Error, Request, Response};

/// Default log line template.
pub const DEFAULT_FORMAT: &str = r#"{method} {uri} HTTP/{version} {code} ({res_header_Content-Length} {res_header_Content-Type}) {"request": {\req_body}, "response": {\res_body}}"#;

/// Content types whose bodies `{\req_body}` and `{\res_body}` inline.
pub const ALLOWED_CONTENT_TYPES: [&str; 7] = [
    "application/json",
    "application/ld+json",
    "application/xml",
    "multipart/form-data",
    "text/plain",
    "text/xml",
    "text/html",
];

const NULL: &str = "NULL";

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\s*(\\?[A-Za-z0-9_.\-]+)\s*\}").expect("placeholder pattern is valid")
});

/// Renders requests, responses and errors into log lines.
///
/// All placeholders are replaced in a single pass: text coming from a message
/// (a body containing `{code}`, say) is never interpreted as a placeholder.
///
/// Formatting only borrows the messages, and bodies are read independently of
/// their cursor, so a body that was partially read before formatting can be
/// read on from the same position afterwards.
///
/// # Example
///
/// ```
/// use grapple::{Formatter, Method, Request};
///
/// let request = Request::builder(Method::Post, "https://api.example.com/users".parse().unwrap())
///     .header("Content-Type", "application/json")
///     .body(r#"{"name":"alice"}"#)
///     .build()
///     .unwrap();
///
/// let line = Formatter::new("{method} {target} {\\req_body}").format(&request, None, None);
/// assert_eq!(line, r#"POST /users {"name":"alice"}"#);
/// ```
#[derive(Debug, Clone)]
pub struct Formatter {
    template: String,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(DEFAULT_FORMAT)
    }
}

impl Formatter {
    /// Create a formatter for the given template.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// The template this formatter renders.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render the template for an exchange.
    #[must_use]
    pub fn format(
        &self,
        request: &Request,
        response: Option<&Response>,
        error: Option<&Error>,
    ) -> String {
        PLACEHOLDER
            .replace_all(&self.template, |caps: &Captures<'_>| {
                let name = caps.get(1).map_or("", |m| m.as_str());
                substitute(name, request, response, error)
            })
            .into_owned()
    }
}

fn substitute(
    name: &str,
    request: &Request,
    response: Option<&Response>,
    error: Option<&Error>,
) -> String {
    match name {
        r"\req_body" => inline_body(request.headers(), request.body()),
        r"\res_body" => response.map_or_else(String::new, |res| inline_body(res.headers(), res.body())),
        "request" => request_message(request),
        "response" => response.map(response_message).unwrap_or_default(),
        "req_headers" => request_head(request),
        "res_headers" => or_null(response, response_head),
        "req_body" => request.body().text().into_owned(),
        "res_body" => or_null(response, |res| res.body().text().into_owned()),
        "ts" | "date_iso_8601" => Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        "date_common_log" => Local::now().format("%d/%b/%Y:%H:%M:%S %z").to_string(),
        "method" => request.method().to_string(),
        "version" | "req_version" => protocol(request.version()).to_string(),
        "res_version" => or_null(response, |res| protocol(res.version()).to_string()),
        "uri" | "url" => request.uri().into_owned(),
        "target" => request.target(),
        "host" => host(request),
        "code" => or_null(response, |res| res.status().to_string()),
        "phrase" => or_null(response, |res| res.reason().unwrap_or_default().to_string()),
        "error" => error.map_or_else(|| NULL.to_string(), ToString::to_string),
        other => {
            if let Some(header) = other.strip_prefix("req_header_") {
                request.header_line(header)
            } else if let Some(header) = other.strip_prefix("res_header_") {
                or_null(response, |res| res.header_line(header))
            } else {
                String::new()
            }
        }
    }
}

fn or_null(response: Option<&Response>, render: impl FnOnce(&Response) -> String) -> String {
    response.map_or_else(|| NULL.to_string(), render)
}

/// Body text when its content type is allow-listed, a marker otherwise.
fn inline_body(headers: &HeaderMap, body: &Body) -> String {
    if body.is_empty() {
        return String::new();
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let normalized = content_type.to_ascii_lowercase();

    if ALLOWED_CONTENT_TYPES
        .iter()
        .any(|allowed| normalized.contains(allowed))
    {
        body.text().into_owned()
    } else {
        format!("[stripped body: {content_type}]")
    }
}

fn protocol(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2.0",
        Version::HTTP_3 => "3.0",
        _ => "1.1",
    }
}

fn host(request: &Request) -> String {
    if let Some(host) = request.header(HOST.as_str()) {
        return host.to_string();
    }

    let url = request.url();
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

fn header_block(headers: &HeaderMap) -> String {
    headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect::<Vec<_>>();
            format!("{name}: {}", values.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}

fn status_line(response: &Response) -> String {
    format!(
        "HTTP/{} {} {}",
        protocol(response.version()),
        response.status(),
        response.reason().unwrap_or_default()
    )
}

/// Request line, a `host` line unless the request carries one, and headers.
fn request_head(request: &Request) -> String {
    let mut head = format!(
        "{} {} HTTP/{}",
        request.method(),
        request.target(),
        protocol(request.version())
    );
    if !request.headers().contains_key(HOST) {
        head.push_str("\r\nhost: ");
        head.push_str(&host(request));
    }
    with_headers(head, request.headers())
}

fn response_head(response: &Response) -> String {
    with_headers(status_line(response), response.headers())
}

fn with_headers(mut head: String, headers: &HeaderMap) -> String {
    if !headers.is_empty() {
        head.push_str("\r\n");
        head.push_str(&header_block(headers));
    }
    head
}

fn request_message(request: &Request) -> String {
    with_body(request_head(request), request.body())
}

fn response_message(response: &Response) -> String {
    with_body(response_head(response), response.body())
}

fn with_body(head: String, body: &Body) -> String {
    format!("{head}\r\n\r\n{}", body.text())
}
