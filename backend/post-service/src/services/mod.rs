/// Business logic layer for post-service
///
/// This module provides high-level operations:
/// - Post service: listing, search, create/update/delete, likes and comments
pub mod posts;

// Re-export commonly used services
pub use posts::{PostService, PAGE_LIMIT};
