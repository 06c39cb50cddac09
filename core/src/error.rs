//! Error types for the REST client.
//!
//! # Design
//! Callers that only care about *what kind* of failure happened match on
//! `NetworkError`, a closed four-kind enumeration with no payload. `ApiError`
//! carries the detail (status code, server message, serde diagnostics) and
//! maps onto the closed set through `ApiError::kind`. HTTP failures keep their
//! status in `ApiError::Status` and always classify as `BadServerResponse`.

use thiserror::Error;

use crate::classifier::HttpError;
use crate::environment::EnvironmentError;

/// The closed set of failure kinds surfaced to generic callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum NetworkError {
    /// The request URL was missing or could not be resolved.
    #[error("bad URL")]
    BadUrl,
    /// No response arrived: connection failure or timeout.
    #[error("no data")]
    NoData,
    /// A body could not be encoded or the response could not be decoded.
    #[error("decoding error")]
    DecodingError,
    /// The server answered outside the success range.
    #[error("bad server response")]
    BadServerResponse,
}

/// Errors returned by `ApiClient` and `RestClient`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// No request URL was supplied and none could be resolved from the path.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request body or a caller header could not be encoded.
    #[error("request body encoding failed: {0}")]
    Encoding(String),

    /// The transport failed before any HTTP response was received.
    #[error("transport failed: {0}")]
    Transport(HttpError),

    /// The server answered with a status outside the success range.
    #[error("server responded with an error: {0}")]
    Status(HttpError),

    /// The response body was missing or could not be decoded.
    #[error("response decoding failed: {0}")]
    Decoding(String),
}

impl ApiError {
    pub fn kind(&self) -> NetworkError {
        match self {
            ApiError::InvalidUrl(_) => NetworkError::BadUrl,
            ApiError::Encoding(_) | ApiError::Decoding(_) => NetworkError::DecodingError,
            ApiError::Transport(_) => NetworkError::NoData,
            ApiError::Status(_) => NetworkError::BadServerResponse,
        }
    }

    /// Status code of the classified HTTP or transport failure, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Transport(e) | ApiError::Status(e) => Some(e.code),
            _ => None,
        }
    }
}

impl From<EnvironmentError> for ApiError {
    fn from(err: EnvironmentError) -> Self {
        ApiError::InvalidUrl(err.to_string())
    }
}

impl From<ApiError> for NetworkError {
    fn from(err: ApiError) -> Self {
        err.kind()
    }
}
