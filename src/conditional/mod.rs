//! HTTP conditional requests.
//!
//! This module decides, for a single request, whether a GET can be answered
//! with `304 Not Modified` and whether a PATCH/PUT may be applied. It holds no
//! state and performs no I/O; handlers load the resource, compute its
//! [`Validators`] and act on the returned [`Outcome`].
//!
//! # Read path
//!
//! `If-None-Match` is evaluated when present and fully overrides
//! `If-Modified-Since`. Validators are attached to 304 responses too.
//!
//! # Write path
//!
//! Unsafe requests must carry `If-Match` or `If-Unmodified-Since`
//! (otherwise `428`), and the supplied validator must still describe the
//! current state (otherwise `412`).

pub mod engine;
pub mod entity_tag;
pub mod http_date;
pub mod validators;

pub use engine::{ConditionalRequest, Outcome, evaluate_read, evaluate_write};
pub use entity_tag::{CandidateTag, EntityTag, InvalidEntityTag, TagCondition};
pub use http_date::HttpDate;
pub use validators::Validators;
