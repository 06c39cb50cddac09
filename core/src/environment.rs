//! Deployment scopes and endpoint URL resolution.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Named deployment environment selecting a base URL template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Develop,
    Test,
    Mock,
    Release,
    Debug,
    Production,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Develop => "develop",
            Scope::Test => "test",
            Scope::Mock => "mock",
            Scope::Release => "release",
            Scope::Debug => "debug",
            Scope::Production => "production",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentError {
    #[error("invalid URL: no scope is set")]
    ScopeNotSet,

    #[error("invalid URL: no base URL configured for scope {0}")]
    MissingBaseUrl(Scope),

    #[error("invalid URL {url:?}: {source}")]
    Malformed { url: String, source: url::ParseError },
}

/// Resolves endpoint names to absolute URLs for the active scope.
///
/// The REST client depends only on this contract; how scopes and templates
/// are stored is up to the implementor.
pub trait Environment: Send + Sync {
    fn scope(&self) -> Option<Scope>;

    fn set_scope(&mut self, scope: Option<Scope>);

    fn url(&self, endpoint: &str) -> Result<Url, EnvironmentError>;
}

/// Environment backed by a fixed base URL per scope.
///
/// The resolved URL is the base template followed directly by the endpoint,
/// so templates normally end with `/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScopedEnvironment {
    #[serde(default)]
    scope: Option<Scope>,
    #[serde(default)]
    base_urls: BTreeMap<Scope, String>,
}

impl ScopedEnvironment {
    pub fn new(scope: Option<Scope>) -> Self {
        Self {
            scope,
            base_urls: BTreeMap::new(),
        }
    }

    pub fn with_base_url(mut self, scope: Scope, base_url: impl Into<String>) -> Self {
        self.base_urls.insert(scope, base_url.into());
        self
    }

    pub fn base_url(&self, scope: Scope) -> Option<&str> {
        self.base_urls.get(&scope).map(String::as_str)
    }
}

impl Environment for ScopedEnvironment {
    fn scope(&self) -> Option<Scope> {
        self.scope
    }

    fn set_scope(&mut self, scope: Option<Scope>) {
        self.scope = scope;
    }

    fn url(&self, endpoint: &str) -> Result<Url, EnvironmentError> {
        let scope = self.scope.ok_or(EnvironmentError::ScopeNotSet)?;
        let base = self
            .base_url(scope)
            .ok_or(EnvironmentError::MissingBaseUrl(scope))?;
        let raw = format!("{base}{endpoint}");
        Url::parse(&raw).map_err(|source| EnvironmentError::Malformed { url: raw, source })
    }
}
