//! In-memory repository implementation.
//!
//! Todos live in a `HashMap` behind `Arc<RwLock<...>>`. Writers are
//! serialized by the write lock, so the version check and the insert happen
//! atomically.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::domain::{Timestamp, Todo, TodoId};
use crate::infrastructure::{RepositoryError, TodoRepository};

/// In-memory implementation of `TodoRepository`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTodoRepository {
    todos: Arc<RwLock<HashMap<TodoId, Todo>>>,
}

impl InMemoryTodoRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Returns a timestamp for a save whose HTTP-date is strictly later than
/// that of `previous`, so `Last-Modified` moves on every write.
fn next_timestamp(previous: Option<&Timestamp>) -> Timestamp {
    let now = Timestamp::now();
    match previous {
        // Same second, or the clock went backwards: start the next second.
        Some(previous) if now.to_http_date() <= previous.to_http_date() => {
            Timestamp::from_datetime(*previous.to_http_date().as_datetime() + Duration::seconds(1))
        }
        _ => now,
    }
}

#[allow(clippy::significant_drop_tightening)]
impl TodoRepository for InMemoryTodoRepository {
    fn find_by_id(&self, id: &TodoId) -> BoxFuture<'static, Result<Option<Todo>, RepositoryError>> {
        let todos = Arc::clone(&self.todos);
        let id = *id;
        Box::pin(async move {
            let guard = todos.read().await;
            Ok(guard.get(&id).cloned())
        })
    }

    fn list(&self) -> BoxFuture<'static, Result<Vec<Todo>, RepositoryError>> {
        let todos = Arc::clone(&self.todos);
        Box::pin(async move {
            let guard = todos.read().await;
            let mut listed: Vec<Todo> = guard.values().cloned().collect();
            listed.sort_by(|left, right| {
                right
                    .updated_at
                    .cmp(&left.updated_at)
                    .then_with(|| left.todo_id.cmp(&right.todo_id))
            });
            Ok(listed)
        })
    }

    fn save(&self, todo: Todo) -> BoxFuture<'static, Result<Todo, RepositoryError>> {
        let todos = Arc::clone(&self.todos);
        Box::pin(async move {
            let mut guard = todos.write().await;

            let existing = guard.get(&todo.todo_id);
            let expected = existing.map_or(1, |existing| existing.version.saturating_add(1));
            if todo.version != expected {
                return Err(RepositoryError::VersionConflict {
                    expected,
                    found: todo.version,
                });
            }

            let updated_at = next_timestamp(existing.map(|existing| &existing.updated_at));
            let stored = todo.with_updated_at(updated_at);
            guard.insert(stored.todo_id, stored.clone());

            tracing::debug!(todo_id = %stored.todo_id, version = stored.version, "Todo saved");
            Ok(stored)
        })
    }

    fn delete(
        &self,
        id: &TodoId,
        expected_version: Option<u64>,
    ) -> BoxFuture<'static, Result<bool, RepositoryError>> {
        let todos = Arc::clone(&self.todos);
        let id = *id;
        Box::pin(async move {
            let mut guard = todos.write().await;

            let Some(existing) = guard.get(&id) else {
                return Ok(false);
            };
            if let Some(expected) = expected_version
                && existing.version != expected
            {
                return Err(RepositoryError::VersionConflict {
                    expected,
                    found: existing.version,
                });
            }

            guard.remove(&id);
            tracing::debug!(todo_id = %id, "Todo deleted");
            Ok(true)
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Resource;
    use rstest::rstest;

    // -------------------------------------------------------------------------
    // Helper functions for tests
    // -------------------------------------------------------------------------

    fn test_todo(title: &str) -> Todo {
        Todo::new(TodoId::generate_v7(), title, Timestamp::now())
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let repository = InMemoryTodoRepository::new();

        let result = repository.find_by_id(&TodoId::generate_v7()).await;

        assert_eq!(result, Ok(None));
    }

    #[rstest]
    #[tokio::test]
    async fn test_save_and_find() {
        let repository = InMemoryTodoRepository::new();
        let todo = test_todo("buy milk");
        let todo_id = todo.todo_id;

        let saved = repository.save(todo).await.unwrap();
        let found = repository.find_by_id(&todo_id).await.unwrap();

        assert_eq!(found, Some(saved));
    }

    // -------------------------------------------------------------------------
    // Versioning
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_insert_requires_version_one() {
        let repository = InMemoryTodoRepository::new();
        let todo = test_todo("buy milk").next_revision();

        let result = repository.save(todo).await;

        assert_eq!(
            result,
            Err(RepositoryError::VersionConflict {
                expected: 1,
                found: 2
            })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_update_bumps_version_and_timestamp() {
        let repository = InMemoryTodoRepository::new();
        let first = repository.save(test_todo("buy milk")).await.unwrap();

        let second = repository
            .save(first.clone().with_completed(true).next_revision())
            .await
            .unwrap();

        assert_eq!(second.version, 2);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.created_at, first.created_at);
    }

    #[rstest]
    #[tokio::test]
    async fn test_stale_writer_gets_version_conflict() {
        let repository = InMemoryTodoRepository::new();
        let original = repository.save(test_todo("buy milk")).await.unwrap();

        repository
            .save(original.clone().with_title("writer a").next_revision())
            .await
            .unwrap();
        let result = repository
            .save(original.with_title("writer b").next_revision())
            .await;

        assert_eq!(
            result,
            Err(RepositoryError::VersionConflict {
                expected: 3,
                found: 2
            })
        );
    }

    #[rstest]
    fn test_next_timestamp_is_strictly_increasing() {
        let future = Timestamp::from_datetime(*Timestamp::now().as_datetime() + Duration::hours(1));

        let next = next_timestamp(Some(&future));

        assert!(next > future);
    }

    #[rstest]
    fn test_next_timestamp_moves_last_modified_within_one_second() {
        let previous = Timestamp::now();

        let next = next_timestamp(Some(&previous));

        assert!(next.to_http_date() > previous.to_http_date());
    }

    #[rstest]
    #[tokio::test]
    async fn test_back_to_back_saves_change_last_modified() {
        let repository = InMemoryTodoRepository::new();
        let first = repository.save(test_todo("buy milk")).await.unwrap();

        let second = repository
            .save(first.clone().with_title("buy bread").next_revision())
            .await
            .unwrap();
        let third = repository
            .save(second.clone().with_completed(true).next_revision())
            .await
            .unwrap();

        assert!(second.validators().last_modified > first.validators().last_modified);
        assert!(third.validators().last_modified > second.validators().last_modified);
    }

    // -------------------------------------------------------------------------
    // Listing
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let repository = InMemoryTodoRepository::new();
        let older = repository.save(test_todo("first")).await.unwrap();
        let newer = repository.save(test_todo("second")).await.unwrap();
        let touched = repository
            .save(older.with_completed(true).next_revision())
            .await
            .unwrap();

        let listed = repository.list().await.unwrap();

        assert_eq!(listed, vec![touched, newer]);
    }

    #[rstest]
    #[tokio::test]
    async fn test_list_empty() {
        let repository = InMemoryTodoRepository::new();
        assert_eq!(repository.list().await, Ok(Vec::new()));
    }

    // -------------------------------------------------------------------------
    // Deletion
    // -------------------------------------------------------------------------

    #[rstest]
    #[tokio::test]
    async fn test_delete_existing_and_missing() {
        let repository = InMemoryTodoRepository::new();
        let saved = repository.save(test_todo("buy milk")).await.unwrap();

        assert_eq!(repository.delete(&saved.todo_id, None).await, Ok(true));
        assert_eq!(repository.delete(&saved.todo_id, None).await, Ok(false));
        assert_eq!(repository.find_by_id(&saved.todo_id).await, Ok(None));
    }

    #[rstest]
    #[case(Some(1), Ok(true))]
    #[case(Some(2), Err(RepositoryError::VersionConflict { expected: 2, found: 1 }))]
    #[case(None, Ok(true))]
    #[tokio::test]
    async fn test_delete_checks_expected_version(
        #[case] expected_version: Option<u64>,
        #[case] expected: Result<bool, RepositoryError>,
    ) {
        let repository = InMemoryTodoRepository::new();
        let saved = repository.save(test_todo("buy milk")).await.unwrap();

        let result = repository.delete(&saved.todo_id, expected_version).await;

        assert_eq!(result, expected);
    }
}
