//! Per-call transport configuration.
//!
//! # Design
//! Transport behaviour (timeouts, cache bypass, connectivity waiting, TLS
//! trust) is spelled out in `TransportConfig` and handed to every `ApiClient`
//! explicitly. The `RestClient` keeps one template and derives a fresh copy
//! per request, overriding the timeout with the request's own.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::request::{RequestModel, DEFAULT_TIMEOUT};

/// How server certificates are validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustPolicy {
    /// Validate against the built-in root store.
    #[default]
    Platform,
    /// Accept any server certificate, including self-signed and expired
    /// ones. Only for development backends.
    AcceptAll,
    /// Validate against these PEM-encoded roots only.
    CustomRoots(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Applied to the whole exchange and to each read.
    #[serde(deserialize_with = "duration_from_secs")]
    pub timeout: Duration,
    /// Ask every cache along the way to revalidate.
    pub bypass_cache: bool,
    /// Let the connect phase use the whole timeout instead of failing fast.
    pub wait_for_connectivity: bool,
    /// Advisory; honoured by transports that can tell network types apart.
    pub allows_cellular_access: bool,
    pub trust_policy: TrustPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            bypass_cache: true,
            wait_for_connectivity: true,
            allows_cellular_access: true,
            trust_policy: TrustPolicy::Platform,
        }
    }
}

impl TransportConfig {
    /// Copy of this template carrying the request's timeout.
    pub fn for_request(&self, request: &RequestModel) -> Self {
        Self {
            timeout: request.timeout,
            ..self.clone()
        }
    }
}

fn duration_from_secs<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}
