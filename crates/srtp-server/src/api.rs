//! API handlers for the random-teleport server.

use crate::commands::{self, CommandError, CommandReply};
use crate::host;
use crate::AppState;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::ErrorCode;
use serde::Deserialize;
use serde_json::{json, Value};
use srtp_core::PortError;
use srtp_types::{Location, Requester, SubjectId};
use std::sync::Arc;
use thiserror::Error;

/// Request body for `POST /api/commands`.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub sender: Requester,
    pub command: String,
}

/// Request body for `PUT /api/players/{id}`.
#[derive(Debug, Deserialize)]
pub struct PlayerBody {
    pub name: String,
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Request body for `PUT /api/players/{id}/grants`.
#[derive(Debug, Deserialize)]
pub struct GrantsBody {
    pub grants: Vec<String>,
}

/// Request body for `PUT /api/accounts/{id}`.
#[derive(Debug, Deserialize)]
pub struct AccountBody {
    pub balance: f64,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<CommandError> for ApiError {
    fn from(e: CommandError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl From<PortError> for ApiError {
    fn from(e: PortError) -> Self {
        match &e {
            PortError::Database(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                ApiError::Conflict(e.to_string())
            }
            _ => ApiError::InternalServerError(e.to_string()),
        }
    }
}

fn parse_subject(raw: &str) -> Result<SubjectId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid subject id: {}", raw)))
}

/// Runs `f` with a pooled connection on the blocking pool.
async fn with_conn<T, F>(state: Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut rusqlite::Connection) -> Result<T, PortError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {}", e)))?;
        f(&mut *conn).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
}

/// Handler for `GET /health`.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Handler for `POST /api/commands`.
pub async fn command_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<CommandRequest>,
) -> Result<Json<CommandReply>, ApiError> {
    let command = commands::parse(&payload.command)?;
    tracing::debug!(sender = ?payload.sender, ?command, "dispatching command");
    let reply = commands::execute(&state, payload.sender, command).await?;
    Ok(Json(reply))
}

/// Handler for `PUT /api/players/{id}`. Brings the player online.
pub async fn put_player_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<PlayerBody>,
) -> Result<StatusCode, ApiError> {
    let id = parse_subject(&id)?;
    if body.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    let location = Location::new(body.world, body.x, body.y, body.z);
    with_conn(state, move |conn| {
        host::upsert_player(conn, id, &body.name, &location)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `DELETE /api/players/{id}`. Takes the player offline.
pub async fn delete_player_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let subject = parse_subject(&id)?;
    let known = with_conn(state, move |conn| host::set_offline(conn, subject)).await?;
    if !known {
        return Err(ApiError::NotFound(format!("player not found: {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `PUT /api/players/{id}/grants`. Replaces the grant set.
pub async fn put_grants_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<GrantsBody>,
) -> Result<StatusCode, ApiError> {
    let id = parse_subject(&id)?;
    with_conn(state, move |conn| host::replace_grants(conn, id, &body.grants)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for `PUT /api/accounts/{id}`. Sets the ledger balance.
pub async fn put_account_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AccountBody>,
) -> Result<StatusCode, ApiError> {
    let id = parse_subject(&id)?;
    if !body.balance.is_finite() || body.balance < 0.0 {
        return Err(ApiError::BadRequest(format!(
            "balance must be a non-negative number, got {}",
            body.balance
        )));
    }
    with_conn(state, move |conn| host::set_balance(conn, id, body.balance)).await?;
    Ok(StatusCode::NO_CONTENT)
}
