//! Declarative request descriptions and the environment they resolve against.
//!
//! # Design
//! `Endpoint` says what to call; `Environment` says where. Neither holds
//! behaviour beyond small builder helpers, so both can be constructed per
//! call or kept in statics and reused.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::http::{set_header, HttpMethod};

/// Insertion-ordered JSON object used for request bodies.
pub type JsonMap = serde_json::Map<String, Value>;

/// Deployment-specific configuration injected into a client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub base_url: Url,
    #[serde(default)]
    pub api_key: String,
}

impl Environment {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            api_key: api_key.into(),
        })
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .finish()
    }
}

/// Description of one logical request.
///
/// `query` distinguishes "leave the URL's query alone" (`None`) from
/// "replace it with exactly these pairs" (`Some`, possibly empty).
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// Overrides `Environment::base_url` for this endpoint when set.
    pub base_url: Option<Url>,
    pub path: String,
    pub method: HttpMethod,
    pub headers: Vec<(String, String)>,
    pub query: Option<Vec<(String, String)>>,
    /// Sent only for POST, PUT and PATCH.
    pub body: Option<JsonMap>,
}

impl Endpoint {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            base_url: None,
            path: path.into(),
            method,
            headers: Vec::new(),
            query: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Set a header; a later call with the same name replaces the earlier one.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    /// Append a query pair, keeping the order of calls.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(Vec::new)
            .push((name.into(), value.into()));
        self
    }

    /// Replace the query with exactly `pairs`. An empty iterator clears any
    /// query already present on the base URL or path.
    pub fn with_query_pairs<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query = Some(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    pub fn with_body(mut self, body: JsonMap) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_body_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.body
            .get_or_insert_with(JsonMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Join a base URL and a path with exactly one `/` between them.
///
/// Only the path component of `base` is extended. A `?query` carried by
/// `path` replaces the base query; otherwise the base query is kept. The
/// fragment is always dropped.
pub fn resolve_url(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    if base.cannot_be_a_base() {
        return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
    }
    let path = path.split('#').next().unwrap_or_default();
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    url.set_path(&joined);
    if query.is_some() {
        url.set_query(query);
    }
    url.set_fragment(None);
    Ok(url)
}

/// Replace the query component of `url` with `pairs`, form-url-encoded and
/// in order.
pub fn apply_query(url: &mut Url, pairs: &[(String, String)]) {
    url.set_query(None);
    if pairs.is_empty() {
        return;
    }
    url.query_pairs_mut()
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
}
