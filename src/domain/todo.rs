//! Todo domain model.
//!
//! A [`Todo`] is an immutable value; every change produces a new value which
//! the repository stamps and stores.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conditional::HttpDate;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TodoId(Uuid);

impl TodoId {
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Generates a new time-ordered identifier (UUID v7).
    #[must_use]
    pub fn generate_v7() -> Self {
        Self(Uuid::now_v7())
    }
}

impl FromStr for TodoId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw).map(Self)
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A timestamp wrapper for `DateTime<Utc>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    #[must_use]
    pub const fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// The timestamp as sent in `Last-Modified`, truncated to whole seconds.
    #[must_use]
    pub fn to_http_date(&self) -> HttpDate {
        HttpDate::from_datetime(self.0)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.to_rfc3339())
    }
}

// =============================================================================
// Todo
// =============================================================================

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub todo_id: TodoId,
    pub title: String,
    /// Client supplied position; not interpreted by the server.
    pub order: i64,
    pub completed: bool,
    pub created_at: Timestamp,
    /// Set by the repository on every save.
    pub updated_at: Timestamp,
    /// Optimistic locking counter. Starts at 1 and grows by one per save.
    pub version: u64,
}

impl Todo {
    /// Creates a todo with `order` 0, not completed, at version 1.
    #[must_use]
    pub fn new(todo_id: TodoId, title: impl Into<String>, timestamp: Timestamp) -> Self {
        Self {
            todo_id,
            title: title.into(),
            order: 0,
            completed: false,
            created_at: timestamp,
            updated_at: timestamp,
            version: 1,
        }
    }

    #[must_use]
    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }

    #[must_use]
    pub fn with_order(self, order: i64) -> Self {
        Self { order, ..self }
    }

    #[must_use]
    pub fn with_completed(self, completed: bool) -> Self {
        Self { completed, ..self }
    }

    #[must_use]
    pub fn with_updated_at(self, timestamp: Timestamp) -> Self {
        Self {
            updated_at: timestamp,
            ..self
        }
    }

    /// Applies the fields present in `changes`, leaving the others intact.
    #[must_use]
    pub fn apply(self, changes: TodoChanges) -> Self {
        let TodoChanges {
            title,
            order,
            completed,
        } = changes;

        Self {
            title: title.unwrap_or(self.title),
            order: order.unwrap_or(self.order),
            completed: completed.unwrap_or(self.completed),
            ..self
        }
    }

    /// Resets the optional fields to their defaults. Used by full
    /// replacement before the new body is applied.
    #[must_use]
    pub fn cleared(self) -> Self {
        Self {
            order: 0,
            completed: false,
            ..self
        }
    }

    /// The version the next save of this todo must carry.
    #[must_use]
    pub fn next_revision(self) -> Self {
        Self {
            version: self.version.saturating_add(1),
            ..self
        }
    }
}

/// Field updates carried by PATCH and PUT bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub order: Option<i64>,
    pub completed: Option<bool>,
}

// =============================================================================
// Tests
// =============================================================================
