#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// What the mock saw on its last `/api/search` hit.
#[derive(Debug, Clone, Default)]
pub struct Captured {
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub body: String,
}

#[derive(Clone)]
struct MockState {
    status: StatusCode,
    body: &'static str,
    hits: Arc<Mutex<Vec<Captured>>>,
}

pub struct MockUpstream {
    pub origin: String,
    pub base_url: String,
    hits: Arc<Mutex<Vec<Captured>>>,
}

impl MockUpstream {
    pub fn hits(&self) -> Vec<Captured> {
        self.hits.lock().unwrap().clone()
    }
}

async fn search(
    State(state): State<MockState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    state.hits.lock().unwrap().push(Captured {
        content_type: header_str(header::CONTENT_TYPE),
        accept: header_str(header::ACCEPT),
        body: String::from_utf8_lossy(&body).into_owned(),
    });
    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body,
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "online", "message": "Stratos API is running" }))
}

/// Answer service stand-in: every `/api/search` gets `status` + `body`.
pub async fn spawn_upstream(status: StatusCode, body: &'static str) -> MockUpstream {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        status,
        body,
        hits: hits.clone(),
    };
    let app = Router::new()
        .route("/", get(health))
        .route("/api/search", post(search))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream {
        origin: format!("http://{addr}"),
        base_url: format!("http://{addr}/api"),
        hits,
    }
}

/// A base URL nothing is listening on. Port 1 is privileged and unused.
pub fn dead_base_url() -> String {
    "http://127.0.0.1:1/api".to_string()
}
