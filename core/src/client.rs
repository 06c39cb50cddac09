//! Executes one `RequestModel` and interprets the response.
//!
//! # Design
//! `ApiClient` owns exactly one request, the transport configuration for that
//! call, and a transport. Building (`build_request`) and interpreting
//! (`parse_response`) are plain functions over `HttpRequest`/`HttpResponse`,
//! so a host that performs its own I/O can use them directly. `execute` is
//! the single routine that sends the request and classifies the outcome;
//! `send`, `send_stream` and `send_raw` are thin shapes over it.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use reqwest::header::{HeaderName, HeaderValue};
use tracing::{debug, field, instrument, warn, Span};

use crate::classifier::{classify_request_error, classify_response_error, HttpError, StatusCodes};
use crate::config::TransportConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, HttpTransport, Transport};
use crate::request::RequestModel;
use crate::stream::ResponseStream;

const JSON: &str = "application/json";

/// Headers every request carries with a JSON value; callers cannot change them.
const JSON_HEADERS: [&str; 2] = ["Content-Type", "Accept"];

/// Runs one request: builds it, sends it through `Tr` and classifies the
/// outcome. Created per call by `RestClient::prepare`.
#[derive(Debug, Clone)]
pub struct ApiClient<Tr = HttpTransport> {
    request: RequestModel,
    config: TransportConfig,
    transport: Tr,
}

impl<Tr: Transport> ApiClient<Tr> {
    pub fn new(request: RequestModel, config: TransportConfig, transport: Tr) -> Self {
        Self {
            request,
            config,
            transport,
        }
    }

    pub fn request(&self) -> &RequestModel {
        &self.request
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Turn the request model into a concrete `HttpRequest`.
    ///
    /// Fails with `InvalidUrl` when the model carries no URL and with
    /// `Encoding` when the body cannot be written as JSON or a caller header
    /// is not a valid HTTP header.
    pub fn build_request(&self) -> Result<HttpRequest, ApiError> {
        let url = self
            .request
            .request_url
            .clone()
            .ok_or_else(|| ApiError::InvalidUrl("request has no URL".to_string()))?;

        let body = self
            .request
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Encoding(e.to_string()))?;

        let request = HttpRequest {
            method: self.request.method,
            url,
            headers: self.headers()?,
            body,
        };
        debug!(
            headers = request.headers.len(),
            has_body = request.body.is_some(),
            "built {} {}",
            request.method,
            request.url
        );
        Ok(request)
    }

    /// JSON defaults, cache directives, then caller headers in key order.
    /// Caller entries named like a JSON default are dropped; any other
    /// collision replaces the earlier value in place.
    fn headers(&self) -> Result<Vec<(String, String)>, ApiError> {
        let mut headers: Vec<(String, String)> = JSON_HEADERS
            .iter()
            .map(|name| (name.to_string(), JSON.to_string()))
            .collect();
        if self.config.bypass_cache {
            headers.push(("Cache-Control".to_string(), "no-cache".to_string()));
            headers.push(("Pragma".to_string(), "no-cache".to_string()));
        }

        for (name, value) in &self.request.headers {
            if JSON_HEADERS.iter().any(|fixed| fixed.eq_ignore_ascii_case(name)) {
                debug!(header = %name, "ignoring caller override of JSON header");
                continue;
            }
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Encoding(format!("invalid header name {name:?}: {e}")))?;
            HeaderValue::from_str(&value)
                .map_err(|e| ApiError::Encoding(format!("invalid value for header {name}: {e}")))?;
            match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                Some(existing) => existing.1 = value,
                None => headers.push((name.clone(), value)),
            }
        }
        Ok(headers)
    }

    fn domain(&self) -> String {
        self.request
            .request_url
            .as_ref()
            .and_then(|url| url.host_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Send the request and classify the outcome. Only 2xx responses come
    /// back as `Ok`.
    #[instrument(
        name = "api_request",
        skip(self),
        fields(
            http.method = %self.request.method,
            http.url = field::Empty,
            http.status_code = field::Empty,
        )
    )]
    pub async fn execute(&self) -> Result<HttpResponse, ApiError> {
        let request = self.build_request()?;
        Span::current().record("http.url", request.url.as_str());
        let domain = self.domain();

        let outcome = self.transport.execute(request, &self.config).await;
        if let Some(classified) = classify_request_error(&domain, outcome.as_ref().err()) {
            warn!(code = classified.code, "{}", classified.message);
            return Err(ApiError::Transport(classified));
        }

        let response = outcome.ok();
        if let Some(response) = &response {
            Span::current().record("http.status_code", response.status);
        }
        if let Some(classified) = classify_response_error(&domain, response.as_ref()) {
            warn!(code = classified.code, "{}", classified.message);
            return Err(ApiError::Status(classified));
        }

        response.ok_or_else(|| {
            ApiError::Transport(HttpError::new(
                &domain,
                StatusCodes::INTERNAL_SERVER_ERROR,
                "transport returned no response",
            ))
        })
    }

    /// Check the status of a response obtained elsewhere and decode its body.
    pub fn parse_response<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        if let Some(classified) = classify_response_error(&self.domain(), Some(&response)) {
            return Err(ApiError::Status(classified));
        }
        decode_body(&response.body)
    }

    /// Perform the exchange and decode the JSON body into `T`.
    pub async fn send<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        let response = self.execute().await?;
        decode_body(&response.body)
    }
}

impl<Tr: Transport + 'static> ApiClient<Tr> {
    /// Like `send`, delivered as a `ResponseStream`.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn send_stream<T>(self) -> ResponseStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        ResponseStream::spawn(async move { self.send::<T>().await })
    }

    /// Perform the exchange and stream the raw body without decoding it.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime.
    pub fn send_raw(self) -> ResponseStream<Bytes> {
        ResponseStream::spawn(async move { self.execute().await.map(|response| response.body) })
    }
}

/// Decode a success body. The body must be a JSON object or array; every
/// failure along the way is reported as `Decoding`.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    if body.is_empty() {
        return Err(ApiError::Decoding("response body is empty".to_string()));
    }
    let value: Value = serde_json::from_slice(body).map_err(|e| ApiError::Decoding(e.to_string()))?;
    if !(value.is_object() || value.is_array()) {
        return Err(ApiError::Decoding(
            "response body is not a JSON object or array".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| ApiError::Decoding(e.to_string()))
}
