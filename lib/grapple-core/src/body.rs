//! Message bodies and serialization utilities.

use std::borrow::Cow;
use std::io::{self, Read, Seek, SeekFrom};

use bytes::Bytes;

use crate::Result;

/// Content type for message bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
    /// Plain text content type (`text/plain`).
    PlainText,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
            Self::PlainText => "text/plain",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A fully buffered message body with a read cursor.
///
/// The body behaves like a seekable stream: [`Read`] consumes bytes from the
/// cursor and [`Seek`] (or [`Body::rewind`]) moves it. Inspection through
/// [`Body::as_bytes`] or [`Body::text`] only needs a shared borrow and never moves
/// the cursor, so observers such as log formatters cannot disturb later readers.
///
/// # Example
///
/// ```
/// use std::io::Read;
/// use grapple_core::Body;
///
/// let mut body = Body::from("hello world");
/// let mut word = [0; 5];
/// body.read_exact(&mut word).expect("read");
///
/// assert_eq!(body.position(), 5);
/// assert_eq!(body.text(), "hello world");
/// assert_eq!(body.contents(), " world");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Body {
    data: Bytes,
    position: usize,
}

impl Body {
    /// Creates a body positioned at its first byte.
    #[must_use]
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }

    /// Creates an empty body.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            data: Bytes::new(),
            position: 0,
        }
    }

    /// Total body length, independent of the cursor.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the body holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All body bytes, independent of the cursor.
    #[must_use]
    pub const fn as_bytes(&self) -> &Bytes {
        &self.data
    }

    /// All body bytes as text (lossy UTF-8), independent of the cursor.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Current cursor position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Moves the cursor back to the first byte.
    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Bytes between the cursor and the end of the body.
    #[must_use]
    pub fn remaining(&self) -> &[u8] {
        self.data.get(self.position..).unwrap_or_default()
    }

    /// Reads everything from the cursor to the end as text (lossy UTF-8),
    /// leaving the cursor at the end.
    pub fn contents(&mut self) -> String {
        let text = String::from_utf8_lossy(self.remaining()).into_owned();
        self.position = self.position.max(self.data.len());
        text
    }

    /// Consume into the underlying bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut rest = self.remaining();
        let read = rest.read(buf)?;
        self.position += read;
        Ok(read)
    }
}

impl Seek for Body {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(offset) => (self.data.len() as u64).checked_add_signed(offset),
            SeekFrom::Current(offset) => (self.position as u64).checked_add_signed(offset),
        }
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )
        })?;

        self.position = usize::try_from(target)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "seek position too large"))?;
        Ok(target)
    }
}

impl PartialEq for Body {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Body {}

impl From<Bytes> for Body {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}

impl From<Vec<u8>> for Body {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<String> for Body {
    fn from(data: String) -> Self {
        Self::new(data)
    }
}

impl From<&'static str> for Body {
    fn from(data: &'static str) -> Self {
        Self::new(data)
    }
}

/// Serialize a value to JSON bytes.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
///
/// # Example
///
/// ```
/// use grapple_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { name: String }
///
/// let user = User { name: "Alice".to_string() };
/// let bytes = to_json(&user).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"name":"Alice"}"#);
/// ```
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(Into::into)
}

/// Serialize a value to form URL-encoded bytes.
///
/// # Errors
///
/// Returns an error if form serialization fails.
pub fn to_form<T: serde::Serialize>(value: &T) -> Result<Bytes> {
    serde_urlencoded::to_string(value)
        .map(|s| Bytes::from(s.into_bytes()))
        .map_err(Into::into)
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Errors
///
/// Returns an error if JSON deserialization fails, with the error message
/// including the path to the problematic field (e.g., "user.address.city").
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        crate::Error::json_deserialization(e.path().to_string(), e.inner().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_as_str() {
        assert_eq!(ContentType::Json.as_str(), "application/json");
        assert_eq!(ContentType::PlainText.to_string(), "text/plain");
    }

    #[test]
    fn body_read_advances_cursor() {
        let mut body = Body::from("abcdef");
        let mut buf = [0; 4];

        let read = body.read(&mut buf).expect("read");
        assert_eq!(read, 4);
        assert_eq!(&buf, b"abcd");
        assert_eq!(body.position(), 4);
        assert_eq!(body.remaining(), b"ef");
    }

    #[test]
    fn body_read_past_end_returns_zero() {
        let mut body = Body::from("ab");
        assert_eq!(body.contents(), "ab");

        let mut buf = [0; 4];
        assert_eq!(body.read(&mut buf).expect("read"), 0);
        assert_eq!(body.contents(), "");
    }

    #[test]
    fn body_seek_and_rewind() {
        let mut body = Body::from("0123456789");

        assert_eq!(body.seek(SeekFrom::End(-3)).expect("seek"), 7);
        assert_eq!(body.contents(), "789");

        assert_eq!(body.seek(SeekFrom::Start(2)).expect("seek"), 2);
        assert_eq!(body.seek(SeekFrom::Current(1)).expect("seek"), 3);
        assert_eq!(body.remaining(), b"3456789");

        body.rewind();
        assert_eq!(body.position(), 0);
        assert!(body.seek(SeekFrom::Current(-1)).is_err());
    }

    #[test]
    fn body_inspection_ignores_cursor() {
        let mut body = Body::from(r#"{"one":"two"}"#);
        let _ = body.contents();

        assert_eq!(body.text(), r#"{"one":"two"}"#);
        assert_eq!(body.as_bytes().len(), 13);
        assert_eq!(body.position(), 13);
    }

    #[test]
    fn body_equality_ignores_cursor() {
        let mut read = Body::from("same");
        let _ = read.contents();
        assert_eq!(read, Body::from("same"));
    }

    #[test]
    fn to_json_serialize() {
        #[derive(serde::Serialize)]
        struct User {
            name: String,
            age: u32,
        }

        let user = User {
            name: "Alice".to_string(),
            age: 30,
        };

        let bytes = to_json(&user).expect("serialize");
        assert_eq!(bytes.as_ref(), br#"{"name":"Alice","age":30}"#);
    }

    #[test]
    fn to_form_serialize() {
        #[derive(serde::Serialize)]
        struct Login {
            username: String,
            password: String,
        }

        let login = Login {
            username: "alice".to_string(),
            password: "secret".to_string(),
        };

        let bytes = to_form(&login).expect("serialize");
        assert_eq!(bytes.as_ref(), b"username=alice&password=secret");
    }

    #[test]
    fn from_json_missing_field_error_with_path() {
        #[derive(Debug, serde::Deserialize)]
        struct Address {
            #[allow(dead_code)]
            city: String,
        }

        #[derive(Debug, serde::Deserialize)]
        struct User {
            #[allow(dead_code)]
            address: Address,
        }

        let result: Result<User> = from_json(br#"{"address":{}}"#);
        let msg = result.expect_err("should fail").to_string();
        assert!(msg.contains("address"), "Expected path 'address' in error: {msg}");
        assert!(msg.contains("city"), "Expected field 'city' in error: {msg}");
    }
}
