//! Declarative description of one HTTP call.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::ApiError;
use crate::http::HttpMethod;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// What to call and how.
///
/// Either `request_url` is set, or `path` is resolved against the active
/// environment scope by the `RestClient`. Header values may be any JSON
/// value; non-strings are sent as their JSON text.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestModel {
    pub method: HttpMethod,
    pub path: String,
    pub timeout: Duration,
    pub request_url: Option<Url>,
    pub headers: BTreeMap<String, Value>,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
}

impl RequestModel {
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            path: String::new(),
            timeout: DEFAULT_TIMEOUT,
            request_url: None,
            headers: BTreeMap::new(),
            body: None,
            query: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get).with_path(path)
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.request_url = Some(url);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` into the request. Fails if `body` cannot be
    /// represented as JSON (e.g. a map with non-string keys).
    pub fn with_json_body<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Encoding(e.to_string()))?;
        Ok(self.with_body(value))
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn new_applies_defaults() {
        let model = RequestModel::new(HttpMethod::Post);
        assert_eq!(model.method, HttpMethod::Post);
        assert_eq!(model.path, "");
        assert_eq!(model.timeout, Duration::from_secs(10));
        assert!(model.request_url.is_none());
        assert!(model.headers.is_empty());
        assert!(model.body.is_none());
        assert!(model.query.is_empty());
    }

    #[test]
    fn query_keeps_insertion_order() {
        let model = RequestModel::get("user_interests")
            .with_query("z", "1")
            .with_query("a", "2")
            .with_query("z", "3");
        assert_eq!(
            model.query,
            vec![
                ("z".to_string(), "1".to_string()),
                ("a".to_string(), "2".to_string()),
                ("z".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn headers_accept_non_string_values() {
        let model = RequestModel::get("author")
            .with_header("x-mocks", true)
            .with_header("x-lab-scope", "test3");
        assert_eq!(model.headers["x-mocks"], Value::Bool(true));
        assert_eq!(model.headers["x-lab-scope"], Value::from("test3"));
    }

    #[test]
    fn json_body_encodes_serializable_values() {
        #[derive(Serialize)]
        struct Interest {
            id: u64,
            title: String,
        }
        let model = RequestModel::new(HttpMethod::Post)
            .with_json_body(&Interest {
                id: 7,
                title: "rust".to_string(),
            })
            .unwrap();
        assert_eq!(model.body, Some(serde_json::json!({"id": 7, "title": "rust"})));
    }

    #[test]
    fn json_body_reports_encoding_failure() {
        let mut body = HashMap::new();
        body.insert(vec![1u8], "bytes are not a JSON key");
        let err = RequestModel::new(HttpMethod::Post).with_json_body(&body).unwrap_err();
        assert!(matches!(err, ApiError::Encoding(_)));
    }
}
