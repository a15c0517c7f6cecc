/// Data models for post-service
///
/// This module defines:
/// - Post: the stored post document as returned to clients
/// - Request bodies and query strings accepted by the post endpoints
/// - Response envelopes for listing, search and plain messages
use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as stored in the document store.
///
/// Serialized with the field names existing clients expect (`_id`,
/// `selectedFile`, `createdAt`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(
        rename = "_id",
        serialize_with = "bson::serde_helpers::serialize_object_id_as_hex_string"
    )]
    pub id: ObjectId,
    pub title: String,
    pub message: String,
    pub creator: String,
    pub tags: Vec<String>,
    pub selected_file: Option<String>,
    pub likes: Vec<String>,
    pub comments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }
}

/// Fields of a post that does not exist yet. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub message: String,
    pub creator: String,
    pub tags: Vec<String>,
    pub selected_file: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    pub fn into_post(self, id: ObjectId) -> Post {
        Post {
            id,
            title: self.title,
            message: self.message,
            creator: self.creator,
            tags: self.tags,
            selected_file: self.selected_file,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: self.created_at,
        }
    }
}

/// The mutable subset of a post rewritten by an update.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub message: String,
    pub tags: Vec<String>,
    pub selected_file: Option<String>,
}

/// Title/tag criteria for search. Matches are OR-ed.
///
/// `title_pattern: None` adds no title clause; `Some("")` matches every
/// title.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    pub title_pattern: Option<String>,
    pub tags: Vec<String>,
}

impl SearchFilter {
    pub fn is_empty(&self) -> bool {
        self.title_pattern.is_none() && self.tags.is_empty()
    }
}

// ============================================
// Requests
// ============================================

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchPostsQuery {
    #[serde(rename = "searchQuery")]
    pub search_query: Option<String>,
    /// Comma-separated labels
    pub tags: Option<String>,
}

/// Body of a create request. A `creator` sent by the client is not read.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePostRequest {
    pub title: String,
    pub message: String,
    pub tags: Vec<String>,
    pub selected_file: Option<String>,
}

/// Body of an update request. `creator` and `_id` may be present and are
/// ignored; neither is rewritten.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdatePostRequest {
    pub title: String,
    pub message: String,
    pub tags: Vec<String>,
    pub selected_file: Option<String>,
}

impl From<UpdatePostRequest> for PostChanges {
    fn from(req: UpdatePostRequest) -> Self {
        Self {
            title: req.title,
            message: req.message,
            tags: req.tags,
            selected_file: req.selected_file,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub value: String,
}

// ============================================
// Responses
// ============================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedPosts {
    pub data: Vec<Post>,
    pub current_page: i64,
    pub number_of_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub data: Vec<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
