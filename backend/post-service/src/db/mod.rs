/// Database access layer
///
/// This module provides:
/// - `PostStore`: the document-store operations the post endpoints rely on
/// - `MongoPostRepository`: MongoDB-backed implementation
/// - `InMemoryPostStore`: process-local implementation for tests and local runs
use crate::models::{NewPost, Post, PostChanges, SearchFilter};
use async_trait::async_trait;
use bson::oid::ObjectId;
use thiserror::Error;

pub mod memory;
pub mod post_repo;

pub use memory::InMemoryPostStore;
pub use post_repo::MongoPostRepository;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Backend(#[from] mongodb::error::Error),

    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Malformed post document: {0}")]
    MalformedDocument(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Operations on the post collection.
///
/// Mutations that touch `likes` and `comments` are single atomic store
/// operations; implementations never load, modify and write back a whole
/// document.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Number of posts in the collection.
    async fn count(&self) -> StoreResult<u64>;

    /// Newest-first slice of the collection.
    async fn find_page(&self, skip: u64, limit: i64) -> StoreResult<Vec<Post>>;

    /// Posts whose title matches `filter.title_pattern` (case-insensitive)
    /// or which carry any of `filter.tags`.
    async fn search(&self, filter: &SearchFilter) -> StoreResult<Vec<Post>>;

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Post>>;

    async fn insert(&self, post: NewPost) -> StoreResult<Post>;

    /// Rewrites the mutable fields, returning the post after the write or
    /// `None` if no post has this id.
    async fn update_fields(&self, id: ObjectId, changes: PostChanges)
        -> StoreResult<Option<Post>>;

    /// Returns whether a post was removed.
    async fn remove(&self, id: ObjectId) -> StoreResult<bool>;

    /// Adds `user_id` to `likes` if absent, removes it if present.
    async fn toggle_like(&self, id: ObjectId, user_id: &str) -> StoreResult<Option<Post>>;

    async fn push_comment(&self, id: ObjectId, value: &str) -> StoreResult<Option<Post>>;

    /// Connectivity check for readiness probes.
    async fn ping(&self) -> StoreResult<()>;
}
