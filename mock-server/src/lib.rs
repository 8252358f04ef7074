use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const MAX_PAGE_SIZE: usize = 50;
pub const MAX_BATCH_SIZE: usize = 10;

/// Tokens the server accepts. The read token may read any feed; the write
/// token may read too, but only writes to `write_feed_id`.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub read_token: String,
    pub write_token: String,
    pub write_feed_id: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            read_token: "read-token".to_string(),
            write_token: "write-token".to_string(),
            write_feed_id: "feed-1".to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedItem {
    pub feed_id: String,
    pub item_id: String,
    pub input_id: String,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
    pub item_time: String,
    pub item_time_ms: u64,
    pub deleted: bool,
}

#[derive(Deserialize)]
pub struct InputItem {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub canonical_url: Option<String>,
}

#[derive(Deserialize)]
pub struct NewItems {
    pub items: Vec<InputItem>,
}

#[derive(Deserialize)]
pub struct ReadQuery {
    pub max_items: Option<usize>,
    pub cursor: Option<String>,
    pub item_time_after: Option<String>,
    pub item_time_before: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemsPage {
    pub items: Vec<FeedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

enum Scope {
    Read,
    Write,
}

#[derive(Default)]
struct Store {
    /// Items per feed, newest first.
    feeds: HashMap<String, Vec<FeedItem>>,
    last_ms: u64,
    next_slot: u32,
}

impl Store {
    /// Next item time, strictly after every time handed out before.
    fn next_time(&mut self, now_ms: u64) -> (u64, u32) {
        if now_ms > self.last_ms {
            self.last_ms = now_ms;
            self.next_slot = 0;
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        (self.last_ms, slot)
    }
}

pub struct AppState {
    config: MockConfig,
    store: RwLock<Store>,
}

pub type Db = Arc<AppState>;

type ApiResult<T> = Result<T, (StatusCode, Json<Value>)>;

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let mut store = Store::default();
    store.feeds.insert(config.write_feed_id.clone(), Vec::new());
    let db: Db = Arc::new(AppState {
        config,
        store: RwLock::new(store),
    });
    Router::new()
        .route("/ping/", get(ping))
        .route("/feeds/{feed_id}/items/", get(read_items))
        .route("/items/", post(new_items))
        .with_state(db)
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

fn reject(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message })))
}

fn authorize(db: &AppState, headers: &HeaderMap) -> ApiResult<Scope> {
    let token = headers
        .get("x-auth-token")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        });
    match token {
        Some(t) if t == db.config.write_token => Ok(Scope::Write),
        Some(t) if t == db.config.read_token => Ok(Scope::Read),
        Some(_) => {
            tracing::warn!("rejected unknown token");
            Err(reject(StatusCode::UNAUTHORIZED, "invalid token"))
        }
        None => Err(reject(StatusCode::UNAUTHORIZED, "missing token")),
    }
}

async fn ping(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let scope = authorize(&db, &headers)?;
    let scope = match scope {
        Scope::Read => "read",
        Scope::Write => "write",
    };
    Ok(Json(json!({ "message": "pong", "scope": scope })))
}

async fn read_items(
    State(db): State<Db>,
    Path(feed_id): Path<String>,
    Query(query): Query<ReadQuery>,
    headers: HeaderMap,
) -> ApiResult<Json<ItemsPage>> {
    authorize(&db, &headers)?;

    let max_items = query.max_items.unwrap_or(MAX_PAGE_SIZE);
    if max_items == 0 || max_items > MAX_PAGE_SIZE {
        return Err(reject(StatusCode::BAD_REQUEST, "max_items out of range"));
    }
    let offset = match query.cursor.as_deref() {
        None => 0,
        Some(c) => c
            .parse::<usize>()
            .map_err(|_| reject(StatusCode::BAD_REQUEST, "invalid cursor"))?,
    };

    let store = db.store.read().await;
    let items = store
        .feeds
        .get(&feed_id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "feed not found"))?;

    // Normalized item times compare correctly as strings.
    let matching: Vec<&FeedItem> = items
        .iter()
        .filter(|i| query.item_time_after.as_ref().map_or(true, |t| i.item_time > *t))
        .filter(|i| query.item_time_before.as_ref().map_or(true, |t| i.item_time < *t))
        .collect();

    let page: Vec<FeedItem> = matching
        .iter()
        .skip(offset)
        .take(max_items)
        .map(|i| (*i).clone())
        .collect();
    let end = offset + page.len();
    let cursor = (end < matching.len()).then(|| end.to_string());

    Ok(Json(ItemsPage {
        items: page,
        cursor,
    }))
}

async fn new_items(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<NewItems>,
) -> ApiResult<Json<Value>> {
    match authorize(&db, &headers)? {
        Scope::Write => {}
        Scope::Read => {
            return Err(reject(StatusCode::FORBIDDEN, "token cannot write"));
        }
    }
    if input.items.is_empty() || input.items.len() > MAX_BATCH_SIZE {
        return Err(reject(StatusCode::BAD_REQUEST, "batch size out of range"));
    }
    if input.items.iter().any(|i| i.title.trim().is_empty()) {
        return Err(reject(StatusCode::BAD_REQUEST, "title is required"));
    }

    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let feed_id = db.config.write_feed_id.clone();
    let mut store = db.store.write().await;
    let count = input.items.len();
    for item in input.items {
        let (ms, slot) = store.next_time(now_ms);
        let stored = FeedItem {
            feed_id: feed_id.clone(),
            item_id: Uuid::new_v4().to_string(),
            input_id: Uuid::new_v4().to_string(),
            title: item.title,
            content: item.content,
            canonical_url: item.canonical_url,
            item_time: format!("{ms:013}.{slot:05}"),
            item_time_ms: ms,
            deleted: false,
        };
        store.feeds.entry(feed_id.clone()).or_default().insert(0, stored);
    }
    tracing::info!(feed_id = %feed_id, count, "stored items");
    Ok(Json(json!({ "message": "ok", "count": count })))
}
