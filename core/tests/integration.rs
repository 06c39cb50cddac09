//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, points a `ScopedEnvironment` at
//! it, and drives every `RestClient` result shape over real HTTP through the
//! reqwest-backed transport.

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use restfire_core::{
    ApiError, HttpMethod, NetworkError, RequestEvent, RequestModel, RestClient, Scope,
    ScopedEnvironment, StatusCodes,
};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize, PartialEq)]
struct LibVersion {
    #[serde(rename = "type")]
    kind: String,
    lib: String,
    author: String,
}

#[derive(Debug, Deserialize, PartialEq)]
struct Interest {
    id: u64,
    title: String,
}

#[derive(Debug, Deserialize)]
struct Echo {
    method: String,
    query: Option<String>,
    headers: std::collections::BTreeMap<String, String>,
    body: Option<serde_json::Value>,
}

/// Start the mock server on a random port in its own runtime.
fn spawn_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn client(addr: SocketAddr) -> RestClient<ScopedEnvironment> {
    let environment =
        ScopedEnvironment::new(Some(Scope::Mock)).with_base_url(Scope::Mock, format!("http://{addr}/"));
    RestClient::new(environment)
}

#[tokio::test]
async fn decodes_object_response() {
    let client = client(spawn_server());

    let version: LibVersion = client.execute(&RequestModel::get("author")).await.unwrap();
    assert_eq!(version.kind, "library");
    assert_eq!(version.lib, "restfire");
    assert!(!version.author.is_empty());
}

#[tokio::test]
async fn decodes_list_with_query_parameters() {
    let client = client(spawn_server());

    let request = RequestModel::get("user_interests").with_query("limit", "2");
    let interests: Vec<Interest> = client.execute(&request).await.unwrap();
    assert_eq!(interests.len(), 2);
    assert_eq!(interests[0].id, 1);
}

#[tokio::test]
async fn interest_lifecycle() {
    let client = client(spawn_server());

    let create = RequestModel::new(HttpMethod::Post)
        .with_path("user_interests")
        .with_json_body(&serde_json::json!({ "title": "Integration" }))
        .unwrap();
    let created: Interest = client.execute(&create).await.unwrap();
    assert_eq!(created.title, "Integration");

    let fetched: Interest = client
        .execute(&RequestModel::get(format!("user_interests/{}", created.id)))
        .await
        .unwrap();
    assert_eq!(fetched, created);

    // 204 with an empty body: the exchange succeeds, only the raw shape applies.
    let delete = RequestModel::new(HttpMethod::Delete).with_path(format!("user_interests/{}", created.id));
    let body = client.execute_raw(&delete).into_result().await.unwrap();
    assert!(body.is_empty());

    let err = client
        .execute::<Interest>(&RequestModel::get(format!("user_interests/{}", created.id)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), NetworkError::BadServerResponse);
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn server_error_is_bad_server_response() {
    let client = client(spawn_server());

    let err = client
        .execute::<serde_json::Value>(&RequestModel::get("status/500"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), NetworkError::BadServerResponse);
    assert!(matches!(err, ApiError::Status(ref e) if e.code == 500));
}

#[tokio::test]
async fn slow_response_times_out() {
    let client = client(spawn_server());

    let request = RequestModel::get("slow/2000").with_timeout(Duration::from_millis(200));
    let err = client.execute::<serde_json::Value>(&request).await.unwrap_err();
    assert_eq!(err.kind(), NetworkError::NoData);
    assert_eq!(err.status_code(), Some(StatusCodes::TIMEOUT));
}

#[tokio::test]
async fn sends_one_merged_header_list() {
    let client = client(spawn_server());

    let request = RequestModel::new(HttpMethod::Put)
        .with_path("echo")
        .with_header("x-lab-scope", "test3")
        .with_header("x-mocks", true)
        .with_query("b", "2")
        .with_query("a", "1")
        .with_body(serde_json::json!({ "title": "sent" }));
    let echo: Echo = client.execute(&request).await.unwrap();

    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.query.as_deref(), Some("b=2&a=1"));
    assert_eq!(echo.headers["content-type"], "application/json");
    assert_eq!(echo.headers["accept"], "application/json");
    assert_eq!(echo.headers["cache-control"], "no-cache");
    assert_eq!(echo.headers["x-lab-scope"], "test3");
    assert_eq!(echo.headers["x-mocks"], "true");
    assert_eq!(echo.body.unwrap()["title"], "sent");
}

#[tokio::test]
async fn explicit_url_skips_environment() {
    let addr = spawn_server();
    // Unset scope: any environment lookup would fail.
    let client = RestClient::new(ScopedEnvironment::new(None));

    let request = RequestModel::get("").with_url(Url::parse(&format!("http://{addr}/author")).unwrap());
    let version: LibVersion = client.execute(&request).await.unwrap();
    assert_eq!(version.lib, "restfire");
}

#[tokio::test]
async fn stream_delivers_lifecycle() {
    let client = client(spawn_server());

    let mut stream = client.execute_stream::<LibVersion>(&RequestModel::get("author"));
    assert_eq!(stream.next_event().await, Some(RequestEvent::Started));
    assert!(matches!(stream.next_event().await, Some(RequestEvent::Value(ref v)) if v.lib == "restfire"));
    assert_eq!(stream.next_event().await, Some(RequestEvent::Completed));
    assert_eq!(stream.next_event().await, None);
}

#[tokio::test]
async fn raw_bytes_match_decoded_value() {
    let client = client(spawn_server());

    let raw: Bytes = client
        .execute_raw(&RequestModel::get("author"))
        .into_result()
        .await
        .unwrap();
    let from_raw: LibVersion = serde_json::from_slice(&raw).unwrap();
    let decoded: LibVersion = client.execute(&RequestModel::get("author")).await.unwrap();
    assert_eq!(from_raw, decoded);
}

#[tokio::test]
async fn repeated_get_is_idempotent() {
    let client = client(spawn_server());

    let request = RequestModel::get("user_interests");
    let first: Vec<Interest> = client.execute(&request).await.unwrap();
    let second: Vec<Interest> = client.execute(&request).await.unwrap();
    assert_eq!(first, second);
}
