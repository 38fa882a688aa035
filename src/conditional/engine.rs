//! Precondition evaluation for safe and unsafe requests.
//!
//! Both entry points are total: every combination of headers yields an
//! [`Outcome`]. Headers that fail to parse have already been dropped by
//! [`ConditionalRequest`], so they behave exactly like absent ones.

use axum::http::header::{IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH, IF_UNMODIFIED_SINCE};
use axum::http::{HeaderMap, HeaderName, Method};
use chrono::{DateTime, Utc};

use super::{HttpDate, TagCondition, Validators};

// =============================================================================
// Outcome
// =============================================================================

/// Decision returned to the route handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Serve or apply the request normally.
    Proceed,
    /// Answer `304 Not Modified` carrying the current validators.
    NotModified(Validators),
    /// Answer `412 Precondition Failed`.
    PreconditionFailed { reason: String },
    /// Answer `428 Precondition Required`.
    PreconditionRequired { reason: String },
}

impl Outcome {
    #[must_use]
    pub const fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

// =============================================================================
// Conditional Request
// =============================================================================

/// The conditional headers of one request, already parsed.
///
/// A field is `None` when the header is missing or unusable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalRequest {
    pub if_match: Option<TagCondition>,
    pub if_none_match: Option<TagCondition>,
    pub if_modified_since: Option<HttpDate>,
    pub if_unmodified_since: Option<HttpDate>,
}

impl ConditionalRequest {
    /// Reads the four `If-*` headers. Repeated tag-list headers are joined
    /// as one list; for date headers the first value wins.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            if_match: joined_values(headers, &IF_MATCH)
                .as_deref()
                .and_then(TagCondition::parse),
            if_none_match: joined_values(headers, &IF_NONE_MATCH)
                .as_deref()
                .and_then(TagCondition::parse),
            if_modified_since: first_value(headers, &IF_MODIFIED_SINCE)
                .and_then(HttpDate::parse),
            if_unmodified_since: first_value(headers, &IF_UNMODIFIED_SINCE)
                .and_then(HttpDate::parse),
        }
    }

    #[must_use]
    pub fn with_if_match(mut self, raw: &str) -> Self {
        self.if_match = TagCondition::parse(raw);
        self
    }

    #[must_use]
    pub fn with_if_none_match(mut self, raw: &str) -> Self {
        self.if_none_match = TagCondition::parse(raw);
        self
    }

    #[must_use]
    pub fn with_if_modified_since(mut self, raw: &str) -> Self {
        self.if_modified_since = HttpDate::parse(raw);
        self
    }

    #[must_use]
    pub fn with_if_unmodified_since(mut self, raw: &str) -> Self {
        self.if_unmodified_since = HttpDate::parse(raw);
        self
    }

    /// `true` iff a usable `If-Match` or `If-Unmodified-Since` is present.
    #[must_use]
    pub const fn has_state_validator(&self) -> bool {
        self.if_match.is_some() || self.if_unmodified_since.is_some()
    }

    /// Checks the write preconditions against the current validators.
    /// `If-Match` takes precedence over `If-Unmodified-Since`.
    ///
    /// Returns `false` when neither header is present; callers check
    /// [`has_state_validator`](Self::has_state_validator) first.
    #[must_use]
    pub fn has_current_state(&self, current: &Validators) -> bool {
        match (&self.if_match, self.if_unmodified_since) {
            (Some(condition), _) => condition.matches(&current.entity_tag),
            (None, Some(since)) => current.last_modified <= since,
            (None, None) => false,
        }
    }

    /// Checks the read preconditions. `If-None-Match` overrides
    /// `If-Modified-Since` whenever it is present, matching or not.
    #[must_use]
    pub fn is_not_modified(&self, current: &Validators, now: HttpDate) -> bool {
        if let Some(condition) = &self.if_none_match {
            return condition.matches(&current.entity_tag);
        }

        match self.if_modified_since {
            // A date in the future says nothing about the resource.
            Some(since) if since > now => false,
            Some(since) => current.last_modified <= since,
            None => false,
        }
    }
}

fn header_values<'a>(
    headers: &'a HeaderMap,
    name: &HeaderName,
) -> impl Iterator<Item = &'a str> + 'a {
    headers
        .get_all(name)
        .iter()
        .filter_map(|value| value.to_str().ok())
}

fn joined_values(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<&str> = header_values(headers, name).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

fn first_value<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    header_values(headers, name).next()
}

// =============================================================================
// Evaluation
// =============================================================================

/// Evaluates a safe request (GET) against the current validators.
///
/// `current` is `None` when there is nothing to validate against, such as
/// an empty collection; the request then always proceeds.
#[must_use]
pub fn evaluate_read(
    request: &ConditionalRequest,
    current: Option<&Validators>,
    now: DateTime<Utc>,
) -> Outcome {
    let Some(current) = current else {
        return Outcome::Proceed;
    };

    if request.is_not_modified(current, HttpDate::from(now)) {
        tracing::debug!(entity_tag = %current.entity_tag, "Representation not modified");
        Outcome::NotModified(current.clone())
    } else {
        Outcome::Proceed
    }
}

/// Evaluates an unsafe request (PATCH, PUT, conditional DELETE) against the
/// current validators, which must be freshly loaded.
#[must_use]
pub fn evaluate_write(
    request: &ConditionalRequest,
    current: &Validators,
    method: &Method,
) -> Outcome {
    if !request.has_state_validator() {
        return Outcome::PreconditionRequired {
            reason: format!("{method} request is required to be conditional"),
        };
    }

    if request.has_current_state(current) {
        return Outcome::Proceed;
    }

    let reason = if request.if_match.is_some() {
        "If-Match does not match the current entity-tag"
    } else {
        "Resource has been modified since If-Unmodified-Since"
    };
    tracing::debug!(entity_tag = %current.entity_tag, reason, "Write precondition failed");

    Outcome::PreconditionFailed {
        reason: reason.to_string(),
    }
}
