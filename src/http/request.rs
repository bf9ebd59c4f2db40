//! Request description types
//!
//! A [`PendingRequest`] is the snapshot of one logical call. The retry path
//! consumes it at most once: [`PendingRequest::mark_retried`] flips a
//! one-shot flag that the auth interceptor checks before refreshing.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Per-call options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Query string parameters, in order
    pub query: Vec<(String, String)>,
    /// Extra headers
    pub headers: BTreeMap<String, String>,
    /// Send `path` as-is, without the API prefix
    pub unprefixed: bool,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Adds a query parameter if `value` is present
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Adds a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Marks the path as outside the API prefix (e.g. `/health`)
    pub fn unprefixed(mut self) -> Self {
        self.unprefixed = true;
        self
    }
}

/// Snapshot of an in-flight call
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub method: Method,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub unprefixed: bool,
    retried: bool,
}

impl PendingRequest {
    pub const AUTHORIZATION: &'static str = "Authorization";

    /// Creates a request with no body and default options
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            query: Vec::new(),
            body: None,
            unprefixed: false,
            retried: false,
        }
    }

    /// Sets the JSON body
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Applies per-call options
    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.query.extend(options.query);
        self.headers.extend(options.headers);
        self.unprefixed |= options.unprefixed;
        self
    }

    /// Sets `Authorization: Bearer <token>`
    pub fn set_bearer(&mut self, token: &str) {
        self.headers
            .insert(Self::AUTHORIZATION.to_string(), format!("Bearer {}", token));
    }

    /// Removes any `Authorization` header
    pub fn clear_bearer(&mut self) {
        self.headers.remove(Self::AUTHORIZATION);
    }

    /// The bearer token currently attached, if any
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(Self::AUTHORIZATION)
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    /// Whether this request has already been replayed after a refresh
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Consumes the one-shot retry flag
    ///
    /// Returns false if the flag was already set, meaning the request must
    /// not be replayed again.
    pub fn mark_retried(&mut self) -> bool {
        !std::mem::replace(&mut self.retried, true)
    }
}
