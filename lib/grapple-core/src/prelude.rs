//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use grapple_core::prelude::*;
//! ```

pub use crate::{
    Body, ContentType, Error, HttpClient, Method, Request, RequestBuilder, Response, Result,
    from_json, to_form, to_json,
};
