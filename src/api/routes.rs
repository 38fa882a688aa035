//! Route configuration for the todos API.
//!
//! # Routes
//!
//! | Method | Path | Handler | Scope (any of) |
//! |--------|------|---------|----------------|
//! | GET | /todos | `list_todos` | `todo.all`, `todo.list` |
//! | POST | /todos | `create_todo` | `todo.all`, `todo.create` |
//! | GET | /todos/{uid} | `get_todo` | `todo.all`, `todo.read` |
//! | PATCH | /todos/{uid} | `patch_todo` | `todo.all`, `todo.update` |
//! | PUT | /todos/{uid} | `put_todo` | `todo.all`, `todo.update` |
//! | DELETE | /todos/{uid} | `delete_todo` | `todo.all`, `todo.delete` |
//! | GET | /health | `health_check` | none |

use axum::Router;
use axum::http::header::{ETAG, LAST_MODIFIED, LOCATION};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_todo, delete_todo, get_todo, health_check, list_todos, patch_todo, put_todo,
};

/// Creates the router with every route, tracing and CORS.
pub fn create_router(state: AppState) -> Router {
    // Validators must be readable by browser clients.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([ETAG, LAST_MODIFIED, LOCATION]);

    Router::new()
        .route("/health", get(health_check))
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/{uid}",
            get(get_todo)
                .patch(patch_todo)
                .put(put_todo)
                .delete(delete_todo),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
