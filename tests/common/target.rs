use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// How long `/slow` takes to answer
pub const SLOW_DELAY: Duration = Duration::from_millis(1500);

#[derive(Clone, Default)]
struct TargetState {
    items: Arc<Mutex<HashMap<u64, Value>>>,
}

/// A live HTTP API for suites to run against
pub struct TargetApi {
    pub addr: SocketAddr,
}

impl TargetApi {
    pub async fn spawn() -> Self {
        let app = Router::new()
            .route("/api/users", get(list_users))
            .route("/api/products", get(list_products).post(create_product))
            .route("/api/items", post(create_item))
            .route("/api/items/{id}", get(get_item))
            .route("/api/echo", post(echo))
            .route("/slow", get(slow))
            .with_state(TargetState::default());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Base URL of a port with nothing listening on it
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

async fn list_users() -> impl IntoResponse {
    (
        [("x-request-id", "req-42")],
        Json(json!({ "data": { "total": 2, "first": { "name": "Ada" } } })),
    )
}

async fn list_products() -> Json<Value> {
    Json(json!({ "data": [{ "id": 1, "name": "Widget" }] }))
}

async fn create_product(body: Bytes) -> (StatusCode, Json<Value>) {
    let payload: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    match payload.get("name").and_then(Value::as_str) {
        Some(name) => (StatusCode::CREATED, Json(json!({ "name": name }))),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "name is required" })),
        ),
    }
}

async fn create_item(State(state): State<TargetState>, Json(payload): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut items = state.items.lock().unwrap();
    let id = items.len() as u64 + 1;
    items.insert(id, payload);

    (StatusCode::CREATED, Json(json!({ "id": id })))
}

async fn get_item(State(state): State<TargetState>, Path(id): Path<u64>) -> Result<Json<Value>, StatusCode> {
    let items = state.items.lock().unwrap();
    items.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// Reflect the `x-` headers and the JSON body back
async fn echo(headers: HeaderMap, body: Bytes) -> Json<Value> {
    let echoed: HashMap<String, String> = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-"))
        .map(|(name, value)| (name.to_string(), value.to_str().unwrap_or("").to_string()))
        .collect();
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    Json(json!({
        "headers": echoed,
        "contentType": content_type,
        "body": serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null),
    }))
}

async fn slow() -> &'static str {
    tokio::time::sleep(SLOW_DELAY).await;
    "finally"
}
