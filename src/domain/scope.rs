//! Scope gate.
//!
//! A credential carries a set of scope strings; each route names the scopes
//! that may call it. A route is allowed when the two sets intersect, where
//! `<namespace>.all` stands for every scope in that namespace.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

const WILDCARD_ACTION: &str = "all";

// =============================================================================
// Scope Set
// =============================================================================

/// The scopes granted to the caller of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSet(BTreeSet<String>);

impl ScopeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a space separated `scope` claim.
    #[must_use]
    pub fn from_delimited(raw: &str) -> Self {
        raw.split_whitespace().collect()
    }

    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    /// `true` if `scope` is granted directly or through `<namespace>.all`.
    #[must_use]
    pub fn grants(&self, scope: &str) -> bool {
        if self.contains(scope) {
            return true;
        }
        scope
            .split_once('.')
            .is_some_and(|(namespace, _)| self.contains(&format!("{namespace}.{WILDCARD_ACTION}")))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ScopeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iterator: I) -> Self {
        Self(
            iterator
                .into_iter()
                .map(Into::into)
                .filter(|scope: &String| !scope.is_empty())
                .collect(),
        )
    }
}

/// Returns `true` iff at least one required scope is granted.
///
/// `todo.all` grants every `todo.*` scope. An empty requirement is never
/// satisfied.
#[must_use]
pub fn authorize<S: AsRef<str>>(granted: &ScopeSet, required: &[S]) -> bool {
    required.iter().any(|scope| granted.grants(scope.as_ref()))
}

// =============================================================================
// Route Requirements
// =============================================================================

/// Scopes accepted by a route and the message used when none is granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeRequirement {
    pub any_of: &'static [&'static str],
    pub denial: &'static str,
}

impl ScopeRequirement {
    #[must_use]
    pub fn is_satisfied_by(&self, granted: &ScopeSet) -> bool {
        authorize(granted, self.any_of)
    }
}

pub const LIST_TODOS: ScopeRequirement = ScopeRequirement {
    any_of: &["todo.all", "todo.list"],
    denial: "Token not allowed to list todos",
};

pub const CREATE_TODO: ScopeRequirement = ScopeRequirement {
    any_of: &["todo.all", "todo.create"],
    denial: "Token not allowed to create todos",
};

pub const READ_TODO: ScopeRequirement = ScopeRequirement {
    any_of: &["todo.all", "todo.read"],
    denial: "Token not allowed to read todos",
};

pub const UPDATE_TODO: ScopeRequirement = ScopeRequirement {
    any_of: &["todo.all", "todo.update"],
    denial: "Token not allowed to update todos",
};

pub const DELETE_TODO: ScopeRequirement = ScopeRequirement {
    any_of: &["todo.all", "todo.delete"],
    denial: "Token not allowed to delete todos",
};
