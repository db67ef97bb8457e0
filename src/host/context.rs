//! Per-request context.
//!
//! # Responsibilities
//! - Immutable view of the inbound request (method, path, query, negotiation inputs, body)
//! - Mutable response state (status, headers, deferred body writer)
//!
//! # Design Decisions
//! - One `Context` per dispatch, never shared across requests
//! - Headers stay absent until first set, so the host can tell "none set" from "empty"
//! - The body writer can be set once

use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::HeaderMap;
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::host::body::WriteBody;

/// Readable request body stream.
pub type RequestBody = Box<dyn AsyncRead + Send + Unpin>;

/// Errors raised while populating a response.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("response body writer was already set")]
    BodyAlreadySet,

    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("invalid value for header '{name}': '{value}'")]
    InvalidHeaderValue { name: String, value: String },
}

/// Response status: code plus reason phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: u16,
    reason: Cow<'static, str>,
}

impl Status {
    pub const OK: Status = Status::from_static(200, "OK");
    pub const CREATED: Status = Status::from_static(201, "Created");
    pub const NO_CONTENT: Status = Status::from_static(204, "No Content");
    pub const BAD_REQUEST: Status = Status::from_static(400, "Bad Request");
    pub const NOT_FOUND: Status = Status::from_static(404, "Not Found");
    pub const INTERNAL_SERVER_ERROR: Status = Status::from_static(500, "Internal Server Error");

    pub const fn from_static(code: u16, reason: &'static str) -> Self {
        Self {
            code,
            reason: Cow::Borrowed(reason),
        }
    }

    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: Cow::Owned(reason.into()),
        }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::OK
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason)
    }
}

/// Ordered, multi-valued query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    /// Parse `application/x-www-form-urlencoded` text, keeping order and duplicates.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let pairs = url::form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        Self { pairs }
    }

    /// All values for `key`, in order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryString {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Immutable view of an inbound request.
pub struct RequestContext {
    method: String,
    path: String,
    query: QueryString,
    content_type: Option<String>,
    accept: Option<Vec<String>>,
    body: RequestBody,
}

impl RequestContext {
    /// Create a request with an empty body, no query and no negotiation headers.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: QueryString::default(),
            content_type: None,
            accept: None,
            body: Box::new(tokio::io::empty()),
        }
    }

    pub fn with_query(mut self, query: QueryString) -> Self {
        self.query = query;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_accept<I, S>(mut self, accept: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accept = Some(accept.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Absolute URL path.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &QueryString {
        &self.query
    }

    /// Declared request content type.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Acceptable response types in header order; `None` when no Accept header was sent.
    pub fn accept(&self) -> Option<&[String]> {
        self.accept.as_deref()
    }

    /// Body stream, for reading.
    pub fn body_mut(&mut self) -> &mut RequestBody {
        &mut self.body
    }

    pub fn into_body(self) -> RequestBody {
        self.body
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("content_type", &self.content_type)
            .field("accept", &self.accept)
            .finish_non_exhaustive()
    }
}

/// Split every Accept header value on `,` and keep the trimmed entries.
pub fn accept_types(headers: &HeaderMap) -> Option<Vec<String>> {
    let mut values = headers.get_all(axum::http::header::ACCEPT).iter().peekable();
    values.peek()?;

    Some(
        values
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// First Content-Type header value.
pub fn declared_content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Mutable response state owned by one dispatch.
#[derive(Default)]
pub struct ResponseContext {
    status: Status,
    headers: Option<HeaderMap>,
    body: Option<Box<dyn WriteBody>>,
}

impl ResponseContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Headers, if any were set.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.headers.as_ref()
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        self.headers.get_or_insert_with(HeaderMap::new)
    }

    /// Set a header, replacing any previous value (names are case-insensitive).
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), ContextError> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ContextError::InvalidHeaderName(name.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|_| ContextError::InvalidHeaderValue {
            name: name.to_string(),
            value: value.to_string(),
        })?;
        self.headers_mut().insert(header_name, header_value);
        Ok(())
    }

    pub fn set_content_type(&mut self, content_type: &str) -> Result<(), ContextError> {
        self.set_header(CONTENT_TYPE.as_str(), content_type)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|h| h.get(CONTENT_TYPE))
            .and_then(|v| v.to_str().ok())
    }

    /// Set the deferred body writer. Fails if one was already set.
    pub fn set_body(&mut self, body: impl WriteBody + 'static) -> Result<(), ContextError> {
        if self.body.is_some() {
            return Err(ContextError::BodyAlreadySet);
        }
        self.body = Some(Box::new(body));
        Ok(())
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Final status, headers (empty when none were set) and body writer.
    pub fn into_parts(self) -> (Status, HeaderMap, Option<Box<dyn WriteBody>>) {
        (self.status, self.headers.unwrap_or_default(), self.body)
    }
}

impl fmt::Debug for ResponseContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseContext")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// Request and response for one dispatch.
#[derive(Debug)]
pub struct Context {
    pub request: RequestContext,
    pub response: ResponseContext,
}

impl Context {
    pub fn new(request: RequestContext) -> Self {
        Self {
            request,
            response: ResponseContext::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::body::BytesBody;

    #[test]
    fn test_status_display() {
        assert_eq!(Status::OK.to_string(), "200 OK");
        assert_eq!(Status::new(418, "I'm a teapot").code(), 418);
    }

    #[test]
    fn test_query_string_keeps_order_and_duplicates() {
        let query = QueryString::parse("?id=6&tag=a&id=7&name=a%20b");
        assert_eq!(query.len(), 4);
        assert_eq!(query.get_all("id").collect::<Vec<_>>(), vec!["6", "7"]);
        assert_eq!(query.get_all("name").collect::<Vec<_>>(), vec!["a b"]);
        assert!(QueryString::parse("").is_empty());
    }

    #[test]
    fn test_accept_types() {
        let mut headers = HeaderMap::new();
        assert_eq!(accept_types(&headers), None);

        headers.append("accept", HeaderValue::from_static("text/html, application/json;q=0.9"));
        headers.append("accept", HeaderValue::from_static("*/*"));
        assert_eq!(
            accept_types(&headers),
            Some(vec![
                "text/html".to_string(),
                "application/json;q=0.9".to_string(),
                "*/*".to_string(),
            ])
        );
    }

    #[test]
    fn test_empty_accept_header_is_empty_list() {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static(""));
        assert_eq!(accept_types(&headers), Some(Vec::new()));
    }

    #[test]
    fn test_headers_absent_until_set() {
        let mut response = ResponseContext::new();
        assert!(response.headers().is_none());

        response.set_content_type("text/css").unwrap();
        response.set_header("CONTENT-TYPE", "text/plain").unwrap();
        assert_eq!(response.content_type(), Some("text/plain"));
        assert_eq!(response.headers().unwrap().len(), 1);
    }

    #[test]
    fn test_body_set_once() {
        let mut response = ResponseContext::new();
        response.set_body(BytesBody::new("a")).unwrap();
        let err = response.set_body(BytesBody::new("b")).unwrap_err();
        assert!(matches!(err, ContextError::BodyAlreadySet));
    }

    #[test]
    fn test_into_parts_defaults_headers() {
        let (status, headers, body) = ResponseContext::new().into_parts();
        assert_eq!(status, Status::OK);
        assert!(headers.is_empty());
        assert!(body.is_none());
    }

    #[test]
    fn test_invalid_header_value() {
        let mut response = ResponseContext::new();
        let err = response.set_header("x-test", "bad\nvalue").unwrap_err();
        assert!(matches!(err, ContextError::InvalidHeaderValue { .. }));
    }
}
