//! HTTP route handlers for the server.
//!
//! Every store call runs on tokio's blocking pool. A panic there comes back
//! as a join error and is answered with a 500 instead of killing the server.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;

use super::error::ApiError;
use super::request::{parse_json, BatchBody, IterateParams, SnapshotBody};
use super::response::IterateResponse;
use crate::engine::Engine;
use crate::error::{KvError, Result};
use crate::ops;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

/// Run a store call on the blocking pool.
async fn blocking<T, F>(state: &AppState, call: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce(&Engine) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let engine = Arc::clone(&state.engine);
    match tokio::task::spawn_blocking(move || call(&engine)).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(e) => Err(ApiError(KvError::Unexpected(format!("request task failed: {e}")))),
    }
}

fn plain_text(body: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "text/plain")], body).into_response()
}

/// Handle GET /key/{*name}
pub async fn get_key(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> std::result::Result<Response, ApiError> {
    let value = blocking(&state, move |engine| engine.get(name.as_bytes())).await?;
    match value {
        Some(value) => Ok(plain_text(value)),
        None => Err(ApiError(KvError::KeyNotFound)),
    }
}

/// Handle PUT /key/{*name}
pub async fn put_key(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> std::result::Result<StatusCode, ApiError> {
    blocking(&state, move |engine| engine.put(name.as_bytes(), &body)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle DELETE /key/{*name}
pub async fn delete_key(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> std::result::Result<StatusCode, ApiError> {
    blocking(&state, move |engine| engine.delete(name.as_bytes())).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /iterate
pub async fn iterate(
    State(state): State<AppState>,
    Query(params): Query<IterateParams>,
) -> std::result::Result<Json<IterateResponse>, ApiError> {
    let request = params.to_request()?;
    let result = blocking(&state, move |engine| ops::paginate(engine, &request)).await?;
    Ok(Json(IterateResponse::from(result)))
}

/// Handle POST /batch
pub async fn batch(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<StatusCode, ApiError> {
    let body: BatchBody = parse_json(&body)?;
    blocking(&state, move |engine| ops::apply(engine, body.ops)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /property/{name}
pub async fn property(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> std::result::Result<Response, ApiError> {
    let value = blocking(&state, move |engine| {
        engine
            .property(&name)
            .filter(|value| !value.is_empty())
            .ok_or(KvError::PropertyNotFound(name))
    })
    .await?;
    Ok(plain_text(value.into_bytes()))
}

/// Handle POST /snapshot
pub async fn snapshot(
    State(state): State<AppState>,
    body: Bytes,
) -> std::result::Result<StatusCode, ApiError> {
    let body: SnapshotBody = parse_json(&body)?;
    let destination = PathBuf::from(body.destination);
    blocking(&state, move |engine| ops::export(engine, &destination)).await?;
    Ok(StatusCode::NO_CONTENT)
}
