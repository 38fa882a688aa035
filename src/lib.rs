//! # todo-api
//!
//! A todos REST API whose reads and writes are governed by HTTP
//! conditional requests.
//!
//! - [`conditional`]: entity-tags, HTTP-dates and the precondition engine
//!   deciding between 200, 304, 412 and 428.
//! - [`domain`]: the `Todo` entity, the scope gate and validator derivation.
//! - [`infrastructure`]: the repository with optimistic concurrency and
//!   environment configuration.
//! - [`api`]: bearer authentication, axum handlers and the router.

pub mod api;
pub mod conditional;
pub mod domain;
pub mod infrastructure;
