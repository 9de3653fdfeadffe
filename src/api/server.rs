//! HTTP server implementation for the task API.
//!
//! This module provides the axum-based server that exposes the REST
//! endpoints. Validation and status-code shaping happen here; persistence
//! happens in [`crate::db`].

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::types::{NewTask, Priority, StatusFilter, TaskPatch};

/// Server state shared across handlers.
#[derive(Clone)]
pub struct ApiServer {
    /// Reference to the task database.
    db: Arc<Database>,
}

impl ApiServer {
    /// Create a new server instance.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get the database reference.
    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

/// Coerce a path id. An unparseable id reads as not-found, not a server error.
fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::task_not_found(raw))
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

/// Query parameters for task listing.
#[derive(Debug, serde::Deserialize)]
struct ListParams {
    q: Option<String>,
    status: Option<StatusFilter>,
    priority: Option<Priority>,
    tag: Option<String>,
}

async fn list_todos(
    State(state): State<ApiServer>,
    Query(params): Query<ListParams>,
) -> ApiResult<impl IntoResponse> {
    let q = params.q.filter(|s| !s.is_empty());
    let tag = params.tag.filter(|s| !s.is_empty());

    let tasks = state.db().list_tasks(
        q.as_deref(),
        params.status.unwrap_or_default(),
        params.priority,
        tag.as_deref(),
    )?;

    Ok(Json(tasks))
}

async fn create_todo(
    State(state): State<ApiServer>,
    Json(input): Json<NewTask>,
) -> ApiResult<impl IntoResponse> {
    // Reject blank titles before touching the store.
    if input.title.as_deref().unwrap_or("").trim().is_empty() {
        return Err(ApiError::missing_field("title"));
    }

    let task = state.db().create_task(input)?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_todo(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let task = state
        .db()
        .get_task(id)?
        .ok_or_else(|| ApiError::task_not_found(id))?;
    Ok(Json(task))
}

async fn update_todo(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let task = state.db().update_task(id, patch)?;
    Ok(Json(task))
}

async fn delete_todo(
    State(state): State<ApiServer>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    state.db().soft_delete_task(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reorder endpoint. The payload must be `{ "ids": [n, ...] }`; anything
/// else is a client error and the store is never invoked.
async fn reorder_todos(
    State(state): State<ApiServer>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let ids = body
        .get("ids")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::invalid_value("ids", "ids must be an array of task ids"))?;

    let mut parsed = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id
            .as_i64()
            .ok_or_else(|| ApiError::invalid_value("ids", "ids must be numeric"))?;
        parsed.push(id);
    }

    state.db().reorder_tasks(&parsed)?;
    Ok(Json(json!({ "ok": true })))
}

async fn purge_todos(State(state): State<ApiServer>) -> ApiResult<impl IntoResponse> {
    let removed = state.db().purge_tasks()?;
    debug!(removed, "purged soft-deleted tasks");
    Ok(Json(json!({ "ok": true })))
}

/// Build the router with all routes.
pub fn build_router(state: ApiServer) -> Router {
    // Permissive CORS so a locally served frontend can talk to the API
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/todos", get(list_todos).post(create_todo))
        .route("/api/todos/reorder", post(reorder_todos))
        .route("/api/todos/purge", post(purge_todos))
        .route(
            "/api/todos/{id}",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the HTTP server in the foreground until interrupted.
pub async fn serve(db: Arc<Database>, port: u16) -> anyhow::Result<()> {
    let state = ApiServer::new(db);
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Task API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_accepts_numeric_ids() {
        assert_eq!(parse_id("42").unwrap(), 42);
    }

    #[test]
    fn parse_id_maps_garbage_to_not_found() {
        let err = parse_id("abc").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
