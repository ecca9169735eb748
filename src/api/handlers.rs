//! API Handlers
//!
//! HTTP request handlers for each store endpoint. Store calls block on
//! storage I/O, so they run on the blocking thread pool.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::{KvStore, MemoryBackend, SqliteBackend};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, KeysResponse, PopResponse,
    SetRequest, SetResponse, StatsResponse, TagQuery,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared store handle
    pub store: KvStore,
}

impl AppState {
    /// Creates a new AppState with the given store.
    pub fn new(store: KvStore) -> Self {
        Self { store }
    }

    /// Creates a new AppState from configuration.
    ///
    /// `:memory:` selects a SQLite in-memory database; anything else is a file path.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = if config.is_in_memory() {
            KvStore::new(SqliteBackend::open_in_memory()?)
        } else {
            KvStore::open_sqlite(&config.database_path, config.create_schema)?
        };
        Ok(Self::new(store))
    }

    /// State over a process-local map, for tests and embedding.
    pub fn in_memory() -> Self {
        Self::new(KvStore::new(MemoryBackend::new()))
    }

    /// Runs `op` against the store on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(KvStore) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(store))
            .await
            .map_err(|e| Error::Internal(format!("store task failed: {e}")))?
    }
}

/// Handler for PUT /set
///
/// Stores any JSON value under a key/tag with optional expiration.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    let expire = req.check()?;

    let SetRequest { key, value, tag, .. } = req;
    let (key, tag) = state
        .run(move |store| {
            store.set(&key, &value, &tag, expire)?;
            Ok((key, tag))
        })
        .await?;

    Ok(Json(SetResponse::new(key, tag)))
}

/// Handler for GET /get/:key
///
/// Retrieves a live value and its expiration.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<TagQuery>,
) -> Result<Json<GetResponse>> {
    let TagQuery { tag } = query;
    let response = state
        .run(move |store| {
            let (value, expire) = store.get_with_expiration::<Value>(&key, &tag)?;
            Ok(GetResponse::new(key, tag, value, expire))
        })
        .await?;

    Ok(Json(response))
}

/// Handler for DELETE /del/:key
///
/// Deleting an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<TagQuery>,
) -> Result<Json<DeleteResponse>> {
    let TagQuery { tag } = query;
    let response = state
        .run(move |store| {
            store.delete(&key, &tag)?;
            Ok(DeleteResponse::new(key, tag))
        })
        .await?;

    Ok(Json(response))
}

/// Handler for POST /pop/:key
///
/// Returns the live value and removes it.
pub async fn pop_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<TagQuery>,
) -> Result<Json<PopResponse>> {
    let TagQuery { tag } = query;
    let response = state
        .run(move |store| {
            let value = store.pop::<Value>(&key, &tag)?;
            Ok(PopResponse::new(key, tag, value))
        })
        .await?;

    Ok(Json(response))
}

/// Handler for DELETE /clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    state.run(|store| store.clear()).await?;
    Ok(Json(ClearResponse::cleared()))
}

/// Handler for GET /keys
///
/// Lists live keys ordered by key, then tag.
pub async fn keys_handler(State(state): State<AppState>) -> Result<Json<KeysResponse>> {
    let keys = state
        .run(|store| Ok(store.keys()?.collect::<Vec<_>>()))
        .await?;
    Ok(Json(KeysResponse::new(keys)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let entries = state.run(|store| store.len()).await?;
    Ok(Json(StatsResponse::new(entries)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
