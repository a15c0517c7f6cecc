/// Post service - listing, search, and the post lifecycle
use crate::db::PostStore;
use crate::error::{AppError, Result};
use crate::metrics;
use crate::middleware::UserId;
use crate::models::{
    CreatePostRequest, NewPost, PaginatedPosts, Post, SearchFilter, UpdatePostRequest,
};
use bson::oid::ObjectId;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Page size for the paginated listing.
pub const PAGE_LIMIT: u64 = 8;

/// Parses a path id, rejecting anything that is not a store identifier.
pub fn parse_post_id(raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| AppError::no_post(raw))
}

/// Offset of the first post on a 1-based page.
pub fn page_start(page: i64) -> Result<u64> {
    if page < 1 {
        return Err(AppError::NotFound(format!(
            "Invalid page: {} (pages start at 1)",
            page
        )));
    }

    (page as u64 - 1)
        .checked_mul(PAGE_LIMIT)
        .filter(|start| *start <= i64::MAX as u64)
        .ok_or_else(|| AppError::NotFound(format!("Invalid page: {}", page)))
}

pub fn page_count(total: u64) -> u64 {
    total.div_ceil(PAGE_LIMIT)
}

/// Builds the search criteria from the raw query parameters.
///
/// A missing or empty `searchQuery` becomes the empty pattern, which matches
/// every title. `tags` is split on commas and empty labels are dropped.
pub fn search_filter(search_query: Option<&str>, tags: Option<&str>) -> SearchFilter {
    SearchFilter {
        title_pattern: Some(search_query.unwrap_or_default().to_string()),
        tags: tags
            .map(|raw| {
                raw.split(',')
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn PostStore>,
}

impl PostService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    /// Newest-first page of posts plus paging metadata
    pub async fn list_posts(&self, page: i64) -> Result<PaginatedPosts> {
        let started = Instant::now();
        let result = self.list_posts_inner(page).await;
        metrics::observe("list", started, &result);
        result
    }

    async fn list_posts_inner(&self, page: i64) -> Result<PaginatedPosts> {
        let start = page_start(page)?;

        let total = self
            .store
            .count()
            .await
            .map_err(|e| AppError::NotFound(e.to_string()))?;
        let data = self
            .store
            .find_page(start, PAGE_LIMIT as i64)
            .await
            .map_err(|e| AppError::NotFound(e.to_string()))?;

        tracing::debug!(page, total, returned = data.len(), "listed posts");

        Ok(PaginatedPosts {
            data,
            current_page: page,
            number_of_pages: page_count(total),
        })
    }

    /// Posts matching the title pattern or any of the tags
    pub async fn search_posts(
        &self,
        search_query: Option<&str>,
        tags: Option<&str>,
    ) -> Result<Vec<Post>> {
        let started = Instant::now();
        let filter = search_filter(search_query, tags);

        let result = self
            .store
            .search(&filter)
            .await
            .map_err(|e| AppError::NotFound(e.to_string()));

        metrics::observe("search", started, &result);
        result
    }

    /// Single post; `Ok(None)` when no post has this id
    pub async fn get_post(&self, raw_id: &str) -> Result<Option<Post>> {
        let started = Instant::now();
        let result = match parse_post_id(raw_id) {
            Ok(id) => self
                .store
                .find_by_id(id)
                .await
                .map_err(|e| AppError::NotFound(e.to_string())),
            Err(e) => Err(e),
        };

        metrics::observe("get", started, &result);
        result
    }

    /// Create a new post owned by `creator`
    pub async fn create_post(&self, creator: &UserId, req: CreatePostRequest) -> Result<Post> {
        let started = Instant::now();
        let new_post = NewPost {
            title: req.title,
            message: req.message,
            creator: creator.0.clone(),
            tags: req.tags,
            selected_file: req.selected_file,
            created_at: Utc::now(),
        };

        let result = self
            .store
            .insert(new_post)
            .await
            .map_err(|e| AppError::Conflict(e.to_string()));

        if let Ok(post) = &result {
            tracing::info!(post_id = %post.id, user_id = %creator.0, "post created");
        }

        metrics::observe("create", started, &result);
        result
    }

    /// Rewrite title, message, tags and attachment of an existing post
    pub async fn update_post(&self, raw_id: &str, req: UpdatePostRequest) -> Result<Post> {
        let started = Instant::now();
        let result = self.update_post_inner(raw_id, req).await;
        metrics::observe("update", started, &result);
        result
    }

    async fn update_post_inner(&self, raw_id: &str, req: UpdatePostRequest) -> Result<Post> {
        let id = parse_post_id(raw_id)?;

        let updated = self
            .store
            .update_fields(id, req.into())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        match updated {
            Some(post) => {
                tracing::info!(post_id = %id, "post updated");
                Ok(post)
            }
            None => Err(AppError::no_post(raw_id)),
        }
    }

    /// Remove a post. Succeeds whether or not the post existed.
    pub async fn delete_post(&self, raw_id: &str) -> Result<()> {
        let started = Instant::now();
        let result = self.delete_post_inner(raw_id).await;
        metrics::observe("delete", started, &result);
        result
    }

    async fn delete_post_inner(&self, raw_id: &str) -> Result<()> {
        let id = parse_post_id(raw_id)?;

        let removed = self
            .store
            .remove(id)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        tracing::info!(post_id = %id, removed, "post delete requested");
        Ok(())
    }

    /// Toggle `user`'s like on a post
    pub async fn like_post(&self, raw_id: &str, user: &UserId) -> Result<Post> {
        let started = Instant::now();
        let result = self.like_post_inner(raw_id, user).await;
        metrics::observe("like", started, &result);
        result
    }

    async fn like_post_inner(&self, raw_id: &str, user: &UserId) -> Result<Post> {
        let id = parse_post_id(raw_id)?;

        let post = self
            .store
            .toggle_like(id, user.as_str())
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .ok_or_else(|| AppError::no_post(raw_id))?;

        tracing::debug!(
            post_id = %id,
            user_id = %user.0,
            liked = post.is_liked_by(user.as_str()),
            "like toggled"
        );
        Ok(post)
    }

    /// Append a comment to a post
    pub async fn comment_post(&self, raw_id: &str, value: &str) -> Result<Post> {
        let started = Instant::now();
        let result = self.comment_post_inner(raw_id, value).await;
        metrics::observe("comment", started, &result);
        result
    }

    async fn comment_post_inner(&self, raw_id: &str, value: &str) -> Result<Post> {
        let id = parse_post_id(raw_id)?;

        self.store
            .push_comment(id, value)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .ok_or_else(|| AppError::no_post(raw_id))
    }
}
