//! Data Transfer Objects for API requests and responses.
//!
//! Responses wrap their payload in a `data` member, for single todos and
//! collections alike.

use serde::{Deserialize, Serialize};

use super::error::{FieldError, ValidationError};
use crate::domain::{Resource, Todo, TodoChanges};

/// Upper bound on title length, counted in characters after trimming.
pub const MAX_TITLE_LENGTH: usize = 255;

// =============================================================================
// Requests
// =============================================================================

/// Body accepted by POST, PATCH and PUT.
///
/// Every field is optional on the wire; which ones are required depends on
/// the method (see [`TodoRequest::into_changes`]).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub completed: Option<bool>,
}

/// Whether the request replaces the whole representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleRule {
    /// POST and PUT.
    Required,
    /// PATCH.
    Optional,
}

impl TodoRequest {
    /// Validates the body and turns it into domain changes.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming every invalid field.
    pub fn into_changes(self, rule: TitleRule) -> Result<TodoChanges, ValidationError> {
        let mut errors = Vec::new();

        let title = match (self.title, rule) {
            (Some(title), _) => match validate_title(&title) {
                Ok(title) => Some(title),
                Err(error) => {
                    errors.push(error);
                    None
                }
            },
            (None, TitleRule::Required) => {
                errors.push(FieldError::new("title", "Title is required"));
                None
            }
            (None, TitleRule::Optional) => None,
        };

        if errors.is_empty() {
            Ok(TodoChanges {
                title,
                order: self.order,
                completed: self.completed,
            })
        } else {
            Err(ValidationError::new(errors))
        }
    }
}

/// Trims a title and checks its length.
fn validate_title(title: &str) -> Result<String, FieldError> {
    let trimmed = title.trim();
    let length = trimmed.chars().count();

    if length == 0 {
        Err(FieldError::new("title", "Title must not be empty"))
    } else if length > MAX_TITLE_LENGTH {
        Err(FieldError::new(
            "title",
            format!("Title must be at most {MAX_TITLE_LENGTH} characters"),
        ))
    } else {
        Ok(trimmed.to_string())
    }
}

// =============================================================================
// Responses
// =============================================================================

/// `{"data": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub const fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(rename = "self")]
    pub self_link: String,
}

/// Public representation of a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoResource {
    pub uid: String,
    pub order: i64,
    pub title: String,
    pub completed: bool,
    /// Opaque entity-tag value, without quotes.
    pub etag: String,
    pub created_at: String,
    pub updated_at: String,
    pub links: Links,
}

impl TodoResource {
    /// Builds the representation, resolving `links.self` against `base_url`.
    #[must_use]
    pub fn from_todo(todo: &Todo, base_url: &str) -> Self {
        Self {
            uid: todo.todo_id.to_string(),
            order: todo.order,
            title: todo.title.clone(),
            completed: todo.completed,
            etag: todo.entity_tag().opaque().to_string(),
            created_at: todo.created_at.to_string(),
            updated_at: todo.updated_at.to_string(),
            links: Links {
                self_link: self_link(base_url, todo),
            },
        }
    }
}

/// Absolute (or root relative, with an empty base) URL of a todo.
#[must_use]
pub fn self_link(base_url: &str, todo: &Todo) -> String {
    format!("{base_url}/todos/{}", todo.todo_id)
}
