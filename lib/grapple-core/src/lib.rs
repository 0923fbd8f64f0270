//! Core types and traits for the grapple HTTP client factory.
//!
//! This crate provides the message types shared by transports and middleware:
//! - [`Method`] - HTTP method enum
//! - [`Request`] and [`RequestBuilder`] - HTTP request types
//! - [`Response`] - HTTP response type
//! - [`Body`] - Message body with a rewindable read cursor
//! - [`Error`] and [`Result`] - Error handling
//! - [`HttpClient`] - Core client trait for HTTP execution
//! - [`header`] - HTTP header names (re-exported from `http` crate)

mod body;
mod client;
mod error;
mod method;
pub mod prelude;
mod request;
mod response;

pub use body::{Body, ContentType, from_json, to_form, to_json};
pub use client::HttpClient;
pub use error::{Error, Result};
pub use method::Method;
pub use request::{Request, RequestBuilder};
pub use response::Response;

// Re-export http crate types for headers and protocol versions
pub use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version, header};
