//! HTTP layer: authentication, handlers, DTOs and routing.

pub mod auth;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;

pub use auth::{AuthError, Caller, Claims, TokenService};
pub use dto::{DataEnvelope, TodoRequest, TodoResource};
pub use error::{ApiError, ApiErrorResponse, ErrorKind, FieldError, ValidationError};
pub use handlers::{
    AppState, create_todo, delete_todo, get_todo, health_check, list_todos, patch_todo, put_todo,
};
pub use routes::create_router;
