//! HTTP fixture for exercising the request client end to end.
//!
//! Routes:
//! - `GET /items?q=` lists catalogue items whose name contains `q`, with a
//!   trailing plural `s` ignored.
//! - `POST /items` creates an item, `GET|DELETE /items/{id}` reads or removes one.
//! - `ANY /echo` describes the request it received.
//! - `ANY /status/{code}` answers with the given status.
//! - `GET /slow?ms=` answers after a delay.
//! - `GET /malformed` and `GET /html` return bodies no item decoder accepts.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: String,
}

#[derive(Deserialize)]
pub struct Search {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct Delay {
    #[serde(default)]
    pub ms: u64,
}

/// What `/echo` saw.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

pub type Db = Arc<RwLock<Vec<Item>>>;

/// Items every fresh server starts with.
pub fn seed() -> Vec<Item> {
    vec![
        Item {
            id: "1".to_string(),
            name: "Shoe".to_string(),
        },
        Item {
            id: "2".to_string(),
            name: "Hat".to_string(),
        },
    ]
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(seed()));
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).delete(delete_item))
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/slow", get(slow))
        .route("/malformed", get(malformed))
        .route("/html", get(html))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "mock server listening");
    }
    axum::serve(listener, app()).await
}

async fn list_items(State(db): State<Db>, Query(search): Query<Search>) -> Json<Vec<Item>> {
    let items = db.read().await;
    let needle = search
        .q
        .map(|q| q.to_lowercase().trim_end_matches('s').to_string());
    Json(
        items
            .iter()
            .filter(|item| match &needle {
                Some(q) => item.name.to_lowercase().contains(q.as_str()),
                None => true,
            })
            .cloned()
            .collect(),
    )
}

async fn create_item(
    State(db): State<Db>,
    Json(input): Json<CreateItem>,
) -> (StatusCode, Json<Item>) {
    let item = Item {
        id: Uuid::new_v4().to_string(),
        name: input.name,
    };
    db.write().await.push(item.clone());
    (StatusCode::CREATED, Json(item))
}

async fn get_item(State(db): State<Db>, Path(id): Path<String>) -> Result<Json<Item>, StatusCode> {
    let items = db.read().await;
    items
        .iter()
        .find(|item| item.id == id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn delete_item(State(db): State<Db>, Path(id): Path<String>) -> StatusCode {
    let mut items = db.write().await;
    let before = items.len();
    items.retain(|item| item.id != id);
    if items.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn echo(method: Method, uri: Uri, headers: HeaderMap, body: String) -> Json<Echo> {
    Json(Echo {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers: headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect(),
        body: if body.is_empty() { None } else { Some(body) },
    })
}

async fn status(Path(code): Path<u16>) -> impl IntoResponse {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(serde_json::json!({ "status": status.as_u16() })))
}

async fn slow(Query(delay): Query<Delay>) -> Json<Vec<Item>> {
    tokio::time::sleep(Duration::from_millis(delay.ms)).await;
    Json(Vec::new())
}

async fn malformed() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"unexpected":true}"#,
    )
}

async fn html() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        "<html><body>maintenance</body></html>",
    )
}
