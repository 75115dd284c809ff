use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};

/// Query parameters the dispatcher interprets itself; they never become field filters
pub const RESERVED_PARAMS: &[&str] = &["query", "single", "limit"];

/// An inbound data-service call, independent of the HTTP framework that received it
#[derive(Debug, Clone)]
pub struct DataServiceRequest {
    pub method: Method,
    pub key: Option<String>,
    /// Decoded query parameters in request order
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl DataServiceRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            key: None,
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Replace the query with the pairs decoded from a raw `a=b&c=d` string
    pub fn with_raw_query(mut self, raw: Option<&str>) -> Self {
        self.query = raw
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// First value of parameter `name`
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    /// Parameters other than the reserved ones, i.e. candidate field filters
    pub fn filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.query
            .iter()
            .filter(|(k, _)| !RESERVED_PARAMS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn query_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for (k, v) in &self.query {
            map.entry(k.clone()).or_insert_with(|| v.clone());
        }
        map
    }
}
