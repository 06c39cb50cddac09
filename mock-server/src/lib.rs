use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::{HeaderMap, Method, StatusCode},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LibVersion {
    #[serde(rename = "type")]
    pub kind: String,
    pub lib: String,
    pub author: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Interest {
    pub id: u64,
    pub title: String,
}

#[derive(Deserialize)]
pub struct CreateInterest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

/// What `/echo` saw, so clients can check exactly what they sent.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
}

pub struct Db {
    interests: RwLock<BTreeMap<u64, Interest>>,
    next_id: AtomicU64,
}

pub type SharedDb = Arc<Db>;

impl Db {
    fn seeded() -> Self {
        let interests: BTreeMap<u64, Interest> = ["Networking", "Rust", "Testing"]
            .iter()
            .enumerate()
            .map(|(i, title)| {
                let id = i as u64 + 1;
                (
                    id,
                    Interest {
                        id,
                        title: title.to_string(),
                    },
                )
            })
            .collect();
        let next_id = AtomicU64::new(interests.len() as u64 + 1);
        Self {
            interests: RwLock::new(interests),
            next_id,
        }
    }
}

pub fn app() -> Router {
    let db: SharedDb = Arc::new(Db::seeded());
    Router::new()
        .route("/author", get(author))
        .route("/user_interests", get(list_interests).post(create_interest))
        .route(
            "/user_interests/{id}",
            get(get_interest).delete(delete_interest),
        )
        .route("/status/{code}", get(status))
        .route("/slow/{millis}", get(slow))
        .route("/echo", any(echo))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn author() -> Json<LibVersion> {
    Json(LibVersion {
        kind: "library".to_string(),
        lib: "restfire".to_string(),
        author: "restfire contributors".to_string(),
    })
}

async fn list_interests(
    State(db): State<SharedDb>,
    Query(params): Query<ListParams>,
) -> Json<Vec<Interest>> {
    let interests = db.interests.read().await;
    let limit = params.limit.unwrap_or(usize::MAX);
    Json(interests.values().take(limit).cloned().collect())
}

async fn create_interest(
    State(db): State<SharedDb>,
    Json(input): Json<CreateInterest>,
) -> (StatusCode, Json<Interest>) {
    let interest = Interest {
        id: db.next_id.fetch_add(1, Ordering::SeqCst),
        title: input.title,
    };
    db.interests
        .write()
        .await
        .insert(interest.id, interest.clone());
    info!(id = interest.id, "created interest");
    (StatusCode::CREATED, Json(interest))
}

async fn get_interest(
    State(db): State<SharedDb>,
    Path(id): Path<u64>,
) -> Result<Json<Interest>, StatusCode> {
    let interests = db.interests.read().await;
    interests
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn delete_interest(
    State(db): State<SharedDb>,
    Path(id): Path<u64>,
) -> Result<StatusCode, StatusCode> {
    let mut interests = db.interests.write().await;
    interests
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Respond with the requested status code.
async fn status(Path(code): Path<u16>) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, Json(serde_json::json!({ "status": code }))))
}

/// Respond after a delay, for exercising client timeouts.
async fn slow(Path(millis): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(millis)).await;
    Json(serde_json::json!({ "delayed_ms": millis }))
}

async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: String) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = if body.is_empty() {
        None
    } else {
        serde_json::from_str(&body).ok()
    };
    Json(Echo {
        method: method.to_string(),
        query,
        headers,
        body,
    })
}
