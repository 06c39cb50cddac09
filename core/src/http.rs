//! HTTP plain-data types and the transport seam.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe an exchange as owned data. The
//! `ApiClient` builds the former and interprets the latter; a `Transport`
//! performs the I/O in between. `HttpTransport` is the reqwest-backed
//! implementation; tests plug in stubs that answer from memory.
//!
//! `HttpTransport` builds a fresh `reqwest::Client` for every call from that
//! call's `TransportConfig`, so no connection state is shared between calls.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::{TransportConfig, TrustPolicy};

/// Upper bound on the connect phase when the caller does not want to wait for
/// connectivity.
const FAIL_FAST_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An HTTP request described as plain data.
///
/// Built by `ApiClient::build_request`. Headers are in the order they will be
/// sent.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Failures that happen before an HTTP response is available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    /// The request could not be sent as built (bad header, bad certificate).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

/// Executes one `HttpRequest` under the given configuration.
///
/// Any status code is a successful exchange at this level; status
/// interpretation belongs to the caller.
pub trait Transport: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
        config: &TransportConfig,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// reqwest-backed transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTransport;

impl HttpTransport {
    fn client(config: &TransportConfig) -> Result<reqwest::Client, TransportError> {
        let connect_timeout = if config.wait_for_connectivity {
            config.timeout
        } else {
            config.timeout.min(FAIL_FAST_CONNECT_TIMEOUT)
        };

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .read_timeout(config.timeout)
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(0);

        builder = match &config.trust_policy {
            TrustPolicy::Platform => builder,
            TrustPolicy::AcceptAll => builder.danger_accept_invalid_certs(true),
            TrustPolicy::CustomRoots(roots) => {
                if roots.is_empty() {
                    return Err(TransportError::InvalidRequest(
                        "custom trust policy has no root certificates".to_string(),
                    ));
                }
                let mut builder = builder.tls_built_in_root_certs(false);
                for (index, pem) in roots.iter().enumerate() {
                    for cert in parse_roots(index, pem)? {
                        builder = builder.add_root_certificate(cert);
                    }
                }
                builder
            }
        };

        builder
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("transport setup failed: {e}")))
    }
}

/// Every certificate in one PEM entry; an entry holding none is rejected.
fn parse_roots(index: usize, pem: &str) -> Result<Vec<reqwest::Certificate>, TransportError> {
    let certs = reqwest::Certificate::from_pem_bundle(pem.as_bytes())
        .map_err(|e| TransportError::InvalidRequest(format!("invalid root certificate #{index}: {e}")))?;
    if certs.is_empty() {
        return Err(TransportError::InvalidRequest(format!(
            "root certificate #{index} contains no PEM certificate"
        )));
    }
    Ok(certs)
}

impl Transport for HttpTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        config: &TransportConfig,
    ) -> Result<HttpResponse, TransportError> {
        let client = Self::client(config)?;
        debug!(
            trust_policy = ?config.trust_policy,
            allows_cellular_access = config.allows_cellular_access,
            "sending {} {}",
            request.method,
            request.url
        );

        let mut builder = client.request(request.method.to_reqwest(), request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
