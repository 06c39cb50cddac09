//! REST client core: declarative requests, environment-scoped URLs and
//! classified network errors.
//!
//! # Overview
//! A caller describes a call with a `RequestModel` and hands it to a
//! `RestClient`. The facade resolves the final URL through an `Environment`
//! (or uses the model's explicit URL), appends query parameters, and runs the
//! call through a per-call `ApiClient` over a `Transport`. Results come back
//! as a decoded value, a stream of lifecycle events, or raw bytes.
//!
//! # Design
//! - `ApiClient` splits building (`build_request`) and interpreting
//!   (`parse_response`) from I/O, which lives behind the `Transport` trait.
//! - `HttpTransport` (reqwest) builds a fresh client per call from an
//!   explicit `TransportConfig`; nothing is pooled or shared.
//! - `ApiError` carries detail; `ApiError::kind` maps it onto the closed
//!   `NetworkError` set.
//! - TLS validation follows `TrustPolicy`, platform roots by default.

pub mod classifier;
pub mod client;
pub mod config;
pub mod environment;
pub mod error;
pub mod http;
pub mod request;
pub mod rest_client;
pub mod stream;

pub use classifier::{classify_request_error, classify_response_error, HttpError, StatusCodes};
pub use client::ApiClient;
pub use config::{TransportConfig, TrustPolicy};
pub use environment::{Environment, EnvironmentError, Scope, ScopedEnvironment};
pub use error::{ApiError, NetworkError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, Transport, TransportError};
pub use request::RequestModel;
pub use rest_client::RestClient;
pub use stream::{RequestEvent, ResponseStream};
