use super::{PostStore, StoreResult};
use crate::models::{NewPost, Post, PostChanges, SearchFilter};
use async_trait::async_trait;
use bson::oid::ObjectId;
use regex::RegexBuilder;
use tokio::sync::RwLock;

/// Process-local post collection.
///
/// Posts are kept in insertion order, which is creation order. Every
/// operation runs under one lock acquisition, so toggles and appends are
/// atomic with respect to each other.
///
/// Title patterns use the `regex` crate dialect, while MongoDB evaluates
/// `$regex` with PCRE. Lookaround and backreferences are rejected here as
/// invalid patterns even though the MongoDB backend accepts them.
#[derive(Default)]
pub struct InMemoryPostStore {
    posts: RwLock<Vec<Post>>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify<F>(&self, id: ObjectId, f: F) -> Option<Post>
    where
        F: FnOnce(&mut Post),
    {
        let mut posts = self.posts.write().await;
        let post = posts.iter_mut().find(|p| p.id == id)?;
        f(post);
        Some(post.clone())
    }
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn count(&self) -> StoreResult<u64> {
        Ok(self.posts.read().await.len() as u64)
    }

    async fn find_page(&self, skip: u64, limit: i64) -> StoreResult<Vec<Post>> {
        let posts = self.posts.read().await;
        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(0);

        Ok(posts.iter().rev().skip(skip).take(limit).cloned().collect())
    }

    async fn search(&self, filter: &SearchFilter) -> StoreResult<Vec<Post>> {
        if filter.is_empty() {
            return Ok(Vec::new());
        }

        let title = filter
            .title_pattern
            .as_deref()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .transpose()?;

        let posts = self.posts.read().await;
        Ok(posts
            .iter()
            .filter(|post| {
                title.as_ref().is_some_and(|re| re.is_match(&post.title))
                    || post.tags.iter().any(|tag| filter.tags.contains(tag))
            })
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Post>> {
        Ok(self.posts.read().await.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, post: NewPost) -> StoreResult<Post> {
        let post = post.into_post(ObjectId::new());
        self.posts.write().await.push(post.clone());
        Ok(post)
    }

    async fn update_fields(
        &self,
        id: ObjectId,
        changes: PostChanges,
    ) -> StoreResult<Option<Post>> {
        Ok(self
            .modify(id, |post| {
                post.title = changes.title;
                post.message = changes.message;
                post.tags = changes.tags;
                post.selected_file = changes.selected_file;
            })
            .await)
    }

    async fn remove(&self, id: ObjectId) -> StoreResult<bool> {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.id != id);
        Ok(posts.len() < before)
    }

    async fn toggle_like(&self, id: ObjectId, user_id: &str) -> StoreResult<Option<Post>> {
        Ok(self
            .modify(id, |post| {
                if post.is_liked_by(user_id) {
                    post.likes.retain(|liker| liker != user_id);
                } else {
                    post.likes.push(user_id.to_string());
                }
            })
            .await)
    }

    async fn push_comment(&self, id: ObjectId, value: &str) -> StoreResult<Option<Post>> {
        Ok(self
            .modify(id, |post| post.comments.push(value.to_string()))
            .await)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::StoreError;
    use chrono::Utc;

    fn new_post(title: &str, tags: &[&str]) -> NewPost {
        NewPost {
            title: title.to_string(),
            message: String::new(),
            creator: "creator".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            selected_file: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_page_is_newest_first() {
        let store = InMemoryPostStore::new();
        for i in 0..5 {
            store.insert(new_post(&format!("p{i}"), &[])).await.unwrap();
        }

        let page = store.find_page(1, 2).await.unwrap();
        let titles: Vec<_> = page.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["p3", "p2"]);
    }

    #[tokio::test]
    async fn test_search_is_union_of_title_and_tags() {
        let store = InMemoryPostStore::new();
        store.insert(new_post("Hello world", &["a"])).await.unwrap();
        store.insert(new_post("Other", &["b"])).await.unwrap();
        store.insert(new_post("Unrelated", &["c"])).await.unwrap();

        let filter = SearchFilter {
            title_pattern: Some("hello".to_string()),
            tags: vec!["b".to_string()],
        };
        let found = store.search(&filter).await.unwrap();
        let titles: Vec<_> = found.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Hello world", "Other"]);
    }

    #[tokio::test]
    async fn test_search_empty_pattern_matches_every_title() {
        let store = InMemoryPostStore::new();
        store.insert(new_post("Hello", &["a"])).await.unwrap();
        store.insert(new_post("Other", &[])).await.unwrap();

        let filter = SearchFilter {
            title_pattern: Some(String::new()),
            tags: vec!["a".to_string()],
        };
        assert_eq!(store.search(&filter).await.unwrap().len(), 2);

        assert!(store.search(&SearchFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_rejects_invalid_pattern() {
        let store = InMemoryPostStore::new();
        let filter = SearchFilter {
            title_pattern: Some("(".to_string()),
            tags: Vec::new(),
        };

        assert!(matches!(
            store.search(&filter).await,
            Err(StoreError::InvalidPattern(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_like_adds_then_removes() {
        let store = InMemoryPostStore::new();
        let post = store.insert(new_post("p", &[])).await.unwrap();

        let liked = store.toggle_like(post.id, "u1").await.unwrap().unwrap();
        assert_eq!(liked.likes, vec!["u1".to_string()]);

        let unliked = store.toggle_like(post.id, "u1").await.unwrap().unwrap();
        assert!(unliked.likes.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_likes_are_not_lost() {
        let store = std::sync::Arc::new(InMemoryPostStore::new());
        let post = store.insert(new_post("p", &[])).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.toggle_like(post.id, &format!("user-{i}")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = store.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(stored.likes.len(), 20);
    }

    #[tokio::test]
    async fn test_mutations_on_missing_post_return_none() {
        let store = InMemoryPostStore::new();
        let id = ObjectId::new();

        assert!(store.toggle_like(id, "u1").await.unwrap().is_none());
        assert!(store.push_comment(id, "hi").await.unwrap().is_none());
        assert!(!store.remove(id).await.unwrap());
    }
}
