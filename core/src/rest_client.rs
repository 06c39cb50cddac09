//! Facade resolving request URLs and dispatching to a per-call `ApiClient`.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::client::ApiClient;
use crate::config::TransportConfig;
use crate::environment::Environment;
use crate::error::ApiError;
use crate::http::{HttpTransport, Transport};
use crate::request::RequestModel;
use crate::stream::ResponseStream;

/// Reusable entry point for executing `RequestModel`s.
///
/// Holds the environment resolver, the transport and a configuration
/// template. Every call gets its own `ApiClient` and its own derived
/// `TransportConfig`; nothing else is kept between calls.
#[derive(Debug, Clone)]
pub struct RestClient<E, Tr = HttpTransport> {
    environment: E,
    transport: Tr,
    config: TransportConfig,
}

impl<E: Environment> RestClient<E> {
    pub fn new(environment: E) -> Self {
        Self::with_transport(environment, HttpTransport)
    }
}

impl<E: Environment, Tr: Transport + Clone> RestClient<E, Tr> {
    pub fn with_transport(environment: E, transport: Tr) -> Self {
        Self {
            environment,
            transport,
            config: TransportConfig::default(),
        }
    }

    /// Replace the configuration template applied to every call.
    pub fn with_config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }

    pub fn environment_mut(&mut self) -> &mut E {
        &mut self.environment
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Final URL for `request`: the explicit `request_url` if present,
    /// otherwise the environment's URL for `path`, with query parameters
    /// appended in order.
    pub fn resolve_url(&self, request: &RequestModel) -> Result<Url, ApiError> {
        let mut url = match &request.request_url {
            Some(url) => url.clone(),
            None => self.environment.url(&request.path)?,
        };
        if !request.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(request.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    /// Build the `ApiClient` that will run `request`.
    pub fn prepare(&self, request: &RequestModel) -> Result<ApiClient<Tr>, ApiError> {
        let url = self.resolve_url(request)?;
        debug!(path = %request.path, "resolved {} {}", request.method, url);

        let mut resolved = request.clone();
        resolved.request_url = Some(url);
        let config = self.config.for_request(request);
        Ok(ApiClient::new(resolved, config, self.transport.clone()))
    }

    /// Execute `request` and decode the JSON response into `T`.
    pub async fn execute<T: DeserializeOwned>(&self, request: &RequestModel) -> Result<T, ApiError> {
        self.prepare(request)?.send().await
    }
}

impl<E: Environment, Tr: Transport + Clone + 'static> RestClient<E, Tr> {
    /// Execute `request` and deliver the decoded value as a stream of
    /// lifecycle events.
    ///
    /// # Panics
    /// Panics when called outside a tokio runtime, unless the URL fails to
    /// resolve (that failure is streamed without spawning).
    pub fn execute_stream<T>(&self, request: &RequestModel) -> ResponseStream<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        match self.prepare(request) {
            Ok(client) => client.send_stream(),
            Err(err) => ResponseStream::failed(err),
        }
    }

    /// Execute `request` and stream the raw response body.
    ///
    /// # Panics
    /// Same as `execute_stream`: requires a tokio runtime.
    pub fn execute_raw(&self, request: &RequestModel) -> ResponseStream<Bytes> {
        match self.prepare(request) {
            Ok(client) => client.send_raw(),
            Err(err) => ResponseStream::failed(err),
        }
    }
}
