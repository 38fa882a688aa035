//! Infrastructure module.
//!
//! Storage and configuration.

pub mod config;
pub mod in_memory;
pub mod repository;

pub use config::{AppConfig, ConfigError, LogFormat};
pub use in_memory::InMemoryTodoRepository;
pub use repository::{RepositoryError, TodoRepository};
