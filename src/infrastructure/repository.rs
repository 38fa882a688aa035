//! Repository trait for todos.
//!
//! Methods return boxed futures so the trait stays object safe and handlers
//! can hold an `Arc<dyn TodoRepository>`.

use futures::future::BoxFuture;
use thiserror::Error;

use crate::domain::{Todo, TodoId};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Optimistic locking conflict.
    #[error("Version conflict: expected {expected}, found {found}")]
    VersionConflict { expected: u64, found: u64 },

    /// The backing store failed.
    #[error("Storage error: {0}")]
    StorageError(String),
}

// =============================================================================
// Todo Repository
// =============================================================================

/// Storage for [`Todo`] values with optimistic concurrency.
pub trait TodoRepository: Send + Sync {
    /// Finds a todo by its ID.
    fn find_by_id(&self, id: &TodoId) -> BoxFuture<'static, Result<Option<Todo>, RepositoryError>>;

    /// Lists every todo, most recently updated first. Ties are ordered by
    /// ascending ID.
    fn list(&self) -> BoxFuture<'static, Result<Vec<Todo>, RepositoryError>>;

    /// Inserts or updates a todo and returns the stored value.
    ///
    /// The repository stamps `updated_at`; the value is strictly greater
    /// than the previous one for the same todo. A new todo must carry
    /// version 1 and an update must carry the stored version plus one,
    /// otherwise [`RepositoryError::VersionConflict`] is returned and
    /// nothing is written.
    fn save(&self, todo: Todo) -> BoxFuture<'static, Result<Todo, RepositoryError>>;

    /// Deletes a todo. When `expected_version` is given the todo is only
    /// removed if it still has that version.
    ///
    /// Returns `Ok(true)` if a todo was deleted, `Ok(false)` if none existed.
    fn delete(
        &self,
        id: &TodoId,
        expected_version: Option<u64>,
    ) -> BoxFuture<'static, Result<bool, RepositoryError>>;
}
