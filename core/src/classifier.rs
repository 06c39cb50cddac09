//! Maps transport outcomes and HTTP statuses onto `HttpError` values.
//!
//! Both functions are pure: they inspect what the transport produced and
//! return `None` when there is nothing to report.

use std::fmt;

use crate::http::{HttpResponse, TransportError};

/// Status codes the classifier assigns or recognises.
pub struct StatusCodes;

impl StatusCodes {
    pub const TIMEOUT: u16 = 408;
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}

/// Successful statuses. The upper bound is exclusive, so 299 is a failure.
const SUCCESS_CODES: std::ops::Range<u16> = 200..299;

/// A classified failure: the host it came from, a status code and a
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    pub domain: String,
    pub code: u16,
    pub message: String,
}

impl HttpError {
    pub(crate) fn new(domain: &str, code: u16, message: impl Into<String>) -> Self {
        Self {
            domain: domain.to_string(),
            code,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.code == StatusCodes::TIMEOUT
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {} ({}): {}", self.code, self.domain, self.message)
    }
}

impl std::error::Error for HttpError {}

/// Classify a transport-level failure. Timeouts get their own code; every
/// other failure is reported as an internal error.
pub fn classify_request_error(domain: &str, error: Option<&TransportError>) -> Option<HttpError> {
    let error = error?;
    if error.is_timeout() {
        return Some(HttpError::new(domain, StatusCodes::TIMEOUT, "request timeout"));
    }
    Some(HttpError::new(
        domain,
        StatusCodes::INTERNAL_SERVER_ERROR,
        format!("Error calling {error}"),
    ))
}

/// Classify an HTTP response by status code.
pub fn classify_response_error(domain: &str, response: Option<&HttpResponse>) -> Option<HttpError> {
    let status = response?.status;
    if SUCCESS_CODES.contains(&status) {
        return None;
    }
    if status == StatusCodes::TIMEOUT {
        return Some(HttpError::new(domain, status, "Error: Request timeout"));
    }
    Some(HttpError::new(domain, status, "Error: HTTP request failed"))
}
