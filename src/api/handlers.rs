//! HTTP handlers for the todos API.
//!
//! Every todo route runs the same sequence: authenticate the caller, check
//! the route scope, parse the id, load the todo, evaluate the conditional
//! headers, then read or mutate. Request bodies are inspected only after
//! the preconditions pass.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;

use super::auth::{Caller, TokenService};
use super::dto::{DataEnvelope, TitleRule, TodoRequest, TodoResource, self_link};
use super::error::{ApiErrorResponse, ErrorKind, ValidationError};
use crate::conditional::{ConditionalRequest, Outcome, Validators, evaluate_read, evaluate_write};
use crate::domain::scope::{CREATE_TODO, DELETE_TODO, LIST_TODOS, READ_TODO, UPDATE_TODO};
use crate::domain::{Resource, Timestamp, Todo, TodoId, collection_validators};
use crate::infrastructure::{AppConfig, TodoRepository};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn TodoRepository>,
    pub tokens: Arc<TokenService>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Creates the state, deriving the token verifier from the configured
    /// secret.
    #[must_use]
    pub fn new(repository: Arc<dyn TodoRepository>, config: AppConfig) -> Self {
        Self {
            repository,
            tokens: Arc::new(TokenService::new(config.jwt_secret.as_bytes())),
            config: Arc::new(config),
        }
    }
}

type Body = Result<Json<TodoRequest>, JsonRejection>;

// =============================================================================
// GET /todos
// =============================================================================

/// Lists todos, most recently updated first.
///
/// The collection carries the validators of its most recently updated
/// member; an empty collection carries none and is never answered with 304.
///
/// # Errors
///
/// 401, 403 or 500 as described in [`ApiErrorResponse`].
pub async fn list_todos(
    State(state): State<AppState>,
    caller: Caller,
    headers: HeaderMap,
) -> Result<Response, ApiErrorResponse> {
    caller.require(LIST_TODOS)?;

    let todos = state.repository.list().await?;
    let validators = collection_validators(&todos);

    let outcome = evaluate_read(
        &ConditionalRequest::from_headers(&headers),
        validators.as_ref(),
        Utc::now(),
    );
    if let Some(response) = read_outcome(outcome)? {
        return Ok(response);
    }

    let resources: Vec<TodoResource> = todos
        .iter()
        .map(|todo| TodoResource::from_todo(todo, &state.config.base_url))
        .collect();
    let mut response = Json(DataEnvelope::new(resources)).into_response();
    if let Some(validators) = validators {
        validators.apply_to(response.headers_mut());
    }
    Ok(response)
}

// =============================================================================
// POST /todos
// =============================================================================

/// Creates a todo.
///
/// # Request Body
///
/// ```json
/// { "title": "buy milk", "order": 1, "completed": false }
/// ```
///
/// # Response
///
/// - **201 Created** with `ETag`, `Last-Modified` and `Location`
/// - **400 Bad Request**: malformed body or invalid title
///
/// # Errors
///
/// 400, 401, 403 or 500.
pub async fn create_todo(
    State(state): State<AppState>,
    caller: Caller,
    body: Body,
) -> Result<Response, ApiErrorResponse> {
    caller.require(CREATE_TODO)?;

    let Json(request) = body?;
    let changes = request.into_changes(TitleRule::Required)?;
    let todo = Todo::new(TodoId::generate_v7(), String::new(), Timestamp::now()).apply(changes);

    let saved = state.repository.save(todo).await?;
    tracing::info!(todo_id = %saved.todo_id, subject = %caller.subject, "Todo created");

    let mut response = represent(StatusCode::CREATED, &saved, &state.config);
    if let Ok(location) = HeaderValue::from_str(&self_link(&state.config.base_url, &saved)) {
        response.headers_mut().insert(header::LOCATION, location);
    }
    Ok(response)
}

// =============================================================================
// GET /todos/{uid}
// =============================================================================

/// Reads one todo, honouring `If-None-Match` and `If-Modified-Since`.
///
/// # Errors
///
/// 400, 401, 403, 404 or 500.
pub async fn get_todo(
    State(state): State<AppState>,
    caller: Caller,
    Path(uid): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiErrorResponse> {
    caller.require(READ_TODO)?;

    let todo = load(&state, &uid).await?;
    let validators = todo.validators();

    let outcome = evaluate_read(
        &ConditionalRequest::from_headers(&headers),
        Some(&validators),
        Utc::now(),
    );
    if let Some(response) = read_outcome(outcome)? {
        return Ok(response);
    }

    Ok(represent(StatusCode::OK, &todo, &state.config))
}

// =============================================================================
// PATCH /todos/{uid}
// =============================================================================

/// Updates the fields present in the body. Must be conditional.
///
/// # Errors
///
/// 400, 401, 403, 404, 412, 428 or 500.
pub async fn patch_todo(
    State(state): State<AppState>,
    caller: Caller,
    Path(uid): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ApiErrorResponse> {
    caller.require(UPDATE_TODO)?;

    let current = load(&state, &uid).await?;
    write_outcome(evaluate_write(
        &ConditionalRequest::from_headers(&headers),
        &current.validators(),
        &Method::PATCH,
    ))?;

    let Json(request) = body?;
    let changes = request.into_changes(TitleRule::Optional)?;

    let saved = state
        .repository
        .save(current.apply(changes).next_revision())
        .await?;
    tracing::info!(todo_id = %saved.todo_id, version = saved.version, "Todo patched");

    Ok(represent(StatusCode::OK, &saved, &state.config))
}

// =============================================================================
// PUT /todos/{uid}
// =============================================================================

/// Replaces the todo. Omitted optional fields fall back to their defaults.
/// Must be conditional.
///
/// # Errors
///
/// 400, 401, 403, 404, 412, 428 or 500.
pub async fn put_todo(
    State(state): State<AppState>,
    caller: Caller,
    Path(uid): Path<String>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response, ApiErrorResponse> {
    caller.require(UPDATE_TODO)?;

    let current = load(&state, &uid).await?;
    write_outcome(evaluate_write(
        &ConditionalRequest::from_headers(&headers),
        &current.validators(),
        &Method::PUT,
    ))?;

    let Json(request) = body?;
    let changes = request.into_changes(TitleRule::Required)?;

    let saved = state
        .repository
        .save(current.cleared().apply(changes).next_revision())
        .await?;
    tracing::info!(todo_id = %saved.todo_id, version = saved.version, "Todo replaced");

    Ok(represent(StatusCode::OK, &saved, &state.config))
}

// =============================================================================
// DELETE /todos/{uid}
// =============================================================================

/// Deletes a todo.
///
/// Unconditional unless `CONDITIONAL_DELETE` is enabled, in which case the
/// write preconditions apply and the delete is version checked.
///
/// # Errors
///
/// 400, 401, 403, 404, 500, and 412 or 428 for conditional deletes.
pub async fn delete_todo(
    State(state): State<AppState>,
    caller: Caller,
    Path(uid): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiErrorResponse> {
    caller.require(DELETE_TODO)?;

    let current = load(&state, &uid).await?;
    let expected_version = if state.config.conditional_delete {
        write_outcome(evaluate_write(
            &ConditionalRequest::from_headers(&headers),
            &current.validators(),
            &Method::DELETE,
        ))?;
        Some(current.version)
    } else {
        None
    };

    if !state
        .repository
        .delete(&current.todo_id, expected_version)
        .await?
    {
        return Err(todo_not_found());
    }
    tracing::info!(todo_id = %current.todo_id, subject = %caller.subject, "Todo deleted");

    Ok(StatusCode::NO_CONTENT.into_response())
}

// =============================================================================
// GET /health
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint. Unauthenticated.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

fn todo_not_found() -> ApiErrorResponse {
    ApiErrorResponse::new(ErrorKind::NotFound, "Todo not found")
}

/// Parses the path id and loads the todo.
async fn load(state: &AppState, uid: &str) -> Result<Todo, ApiErrorResponse> {
    let todo_id: TodoId = uid
        .parse()
        .map_err(|_| ValidationError::single("uid", "Invalid todo id"))?;

    state
        .repository
        .find_by_id(&todo_id)
        .await?
        .ok_or_else(todo_not_found)
}

/// Renders a todo with its validators.
fn represent(status: StatusCode, todo: &Todo, config: &AppConfig) -> Response {
    let body = DataEnvelope::new(TodoResource::from_todo(todo, &config.base_url));
    let mut response = (status, Json(body)).into_response();
    todo.validators().apply_to(response.headers_mut());
    response
}

/// 304 with validators and no body.
fn not_modified(validators: &Validators) -> Response {
    (StatusCode::NOT_MODIFIED, validators.to_headers()).into_response()
}

/// Maps a read outcome: `Some` short-circuits the handler, `None` serves
/// the representation.
fn read_outcome(outcome: Outcome) -> Result<Option<Response>, ApiErrorResponse> {
    match outcome {
        Outcome::Proceed => Ok(None),
        Outcome::NotModified(validators) => Ok(Some(not_modified(&validators))),
        Outcome::PreconditionFailed { reason } => {
            Err(ApiErrorResponse::new(ErrorKind::PreconditionFailed, reason))
        }
        Outcome::PreconditionRequired { reason } => {
            Err(ApiErrorResponse::new(ErrorKind::PreconditionRequired, reason))
        }
    }
}

/// Maps a write outcome to `Ok(())` or the rejection to send.
fn write_outcome(outcome: Outcome) -> Result<(), ApiErrorResponse> {
    match outcome {
        Outcome::Proceed => Ok(()),
        Outcome::PreconditionRequired { reason } => {
            tracing::info!(%reason, "Unconditional write rejected");
            Err(ApiErrorResponse::new(ErrorKind::PreconditionRequired, reason))
        }
        Outcome::PreconditionFailed { reason } => {
            tracing::info!(%reason, "Stale write rejected");
            Err(ApiErrorResponse::new(ErrorKind::PreconditionFailed, reason))
        }
        // A cache hit is not a green light for a state change.
        Outcome::NotModified(_) => Err(ApiErrorResponse::new(
            ErrorKind::PreconditionFailed,
            "Todo has not been modified",
        )),
    }
}

// =============================================================================
// Tests
// =============================================================================
