/// Post Service Library
///
/// Serves the post resource of the Memories app: paginated listing, search,
/// single fetch, create, update, delete, like toggling and comments.
///
/// # Modules
///
/// - `handlers`: Post and health HTTP request handlers
/// - `models`: Post and request/response structures
/// - `services`: Business logic layer
/// - `db`: Document store access layer
/// - `middleware`: User context and request timing middleware
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Observability and metrics collection
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
