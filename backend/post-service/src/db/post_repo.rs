use super::{PostStore, StoreError, StoreResult};
use crate::models::{NewPost, Post, PostChanges, SearchFilter};
use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};

/// BSON shape of a post in the collection.
///
/// Every field except `createdAt` defaults so documents written by older
/// clients (missing `comments`, carrying `__v`, ...) still load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    creator: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    selected_file: Option<String>,
    #[serde(default)]
    likes: Vec<String>,
    #[serde(default)]
    comments: Vec<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<NewPost> for PostDocument {
    fn from(post: NewPost) -> Self {
        Self {
            id: None,
            title: post.title,
            message: post.message,
            creator: post.creator,
            tags: post.tags,
            selected_file: post.selected_file,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: post.created_at,
        }
    }
}

impl TryFrom<PostDocument> for Post {
    type Error = StoreError;

    fn try_from(doc: PostDocument) -> Result<Self, Self::Error> {
        let id = doc
            .id
            .ok_or_else(|| StoreError::MalformedDocument("missing _id".to_string()))?;

        Ok(Post {
            id,
            title: doc.title,
            message: doc.message,
            creator: doc.creator,
            tags: doc.tags,
            selected_file: doc.selected_file,
            likes: doc.likes,
            comments: doc.comments,
            created_at: doc.created_at,
        })
    }
}

fn return_updated() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

fn into_post(doc: Option<PostDocument>) -> StoreResult<Option<Post>> {
    doc.map(Post::try_from).transpose()
}

/// `$or` of the title and tag clauses; `None` when the filter has neither.
fn search_document(filter: &SearchFilter) -> Option<Document> {
    let mut clauses: Vec<Document> = Vec::new();
    if let Some(pattern) = &filter.title_pattern {
        clauses.push(doc! { "title": { "$regex": pattern.as_str(), "$options": "i" } });
    }
    if !filter.tags.is_empty() {
        clauses.push(doc! { "tags": { "$in": filter.tags.clone() } });
    }

    (!clauses.is_empty()).then(|| doc! { "$or": clauses })
}

/// Only the content fields; `creator`, `createdAt` and `_id` stay untouched.
fn update_document(changes: PostChanges) -> Document {
    doc! {
        "$set": {
            "title": changes.title,
            "message": changes.message,
            "tags": changes.tags,
            "selectedFile": changes.selected_file,
        }
    }
}

/// Filter and update that add `user_id` only while it is not yet a liker.
fn add_like(id: ObjectId, user_id: &str) -> (Document, Document) {
    (
        doc! { "_id": id, "likes": { "$ne": user_id } },
        doc! { "$addToSet": { "likes": user_id } },
    )
}

/// Filter and update that remove `user_id` only while it is a liker.
fn remove_like(id: ObjectId, user_id: &str) -> (Document, Document) {
    (
        doc! { "_id": id, "likes": user_id },
        doc! { "$pull": { "likes": user_id } },
    )
}

/// Repository for posts stored in MongoDB
#[derive(Clone)]
pub struct MongoPostRepository {
    db: Database,
    posts: Collection<PostDocument>,
}

impl MongoPostRepository {
    /// Connect to `uri` and bind to `database`.`collection`.
    pub async fn connect(uri: &str, database: &str, collection: &str) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some("post-service".to_string());

        let client = Client::with_options(options)?;
        Ok(Self::new(client.database(database), collection))
    }

    pub fn new(db: Database, collection: &str) -> Self {
        let posts = db.collection::<PostDocument>(collection);
        Self { db, posts }
    }

    async fn find_all(&self, filter: Document, options: Option<FindOptions>) -> StoreResult<Vec<Post>> {
        let cursor = self.posts.find(filter, options).await?;
        let docs: Vec<PostDocument> = cursor.try_collect().await?;
        docs.into_iter().map(Post::try_from).collect()
    }
}

#[async_trait]
impl PostStore for MongoPostRepository {
    async fn count(&self) -> StoreResult<u64> {
        Ok(self.posts.count_documents(None, None).await?)
    }

    async fn find_page(&self, skip: u64, limit: i64) -> StoreResult<Vec<Post>> {
        let options = FindOptions::builder()
            .sort(doc! { "_id": -1 })
            .skip(skip)
            .limit(limit)
            .build();

        self.find_all(doc! {}, Some(options)).await
    }

    async fn search(&self, filter: &SearchFilter) -> StoreResult<Vec<Post>> {
        match search_document(filter) {
            Some(query) => self.find_all(query, None).await,
            None => Ok(Vec::new()),
        }
    }

    async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Post>> {
        let doc = self.posts.find_one(doc! { "_id": id }, None).await?;
        into_post(doc)
    }

    async fn insert(&self, post: NewPost) -> StoreResult<Post> {
        let result = self.posts.insert_one(PostDocument::from(post.clone()), None).await?;
        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            StoreError::MalformedDocument(format!(
                "inserted id is not an ObjectId: {}",
                result.inserted_id
            ))
        })?;

        Ok(post.into_post(id))
    }

    async fn update_fields(
        &self,
        id: ObjectId,
        changes: PostChanges,
    ) -> StoreResult<Option<Post>> {
        let doc = self
            .posts
            .find_one_and_update(doc! { "_id": id }, update_document(changes), return_updated())
            .await?;
        into_post(doc)
    }

    async fn remove(&self, id: ObjectId) -> StoreResult<bool> {
        let result = self.posts.delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn toggle_like(&self, id: ObjectId, user_id: &str) -> StoreResult<Option<Post>> {
        // Each branch only matches when the membership it expects holds, so
        // the add and the remove are both single-document atomic updates.
        let (filter, update) = add_like(id, user_id);
        let added = self
            .posts
            .find_one_and_update(filter, update, return_updated())
            .await?;
        if added.is_some() {
            return into_post(added);
        }

        let (filter, update) = remove_like(id, user_id);
        let removed = self
            .posts
            .find_one_and_update(filter, update, return_updated())
            .await?;
        if removed.is_some() {
            return into_post(removed);
        }

        // A concurrent toggle by the same user landed between the two
        // updates, or the post does not exist.
        self.find_by_id(id).await
    }

    async fn push_comment(&self, id: ObjectId, value: &str) -> StoreResult<Option<Post>> {
        let doc = self
            .posts
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$push": { "comments": value } },
                return_updated(),
            )
            .await?;
        into_post(doc)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_without_id_is_rejected() {
        let doc = PostDocument::from(NewPost {
            title: "t".to_string(),
            message: "m".to_string(),
            creator: "u1".to_string(),
            tags: Vec::new(),
            selected_file: None,
            created_at: Utc::now(),
        });

        assert!(matches!(
            Post::try_from(doc),
            Err(StoreError::MalformedDocument(_))
        ));
    }

    #[test]
    fn test_legacy_document_loads_with_defaults() {
        let id = ObjectId::new();
        let raw = doc! {
            "_id": id,
            "title": "Hello",
            "message": "World",
            "tags": ["x"],
            "createdAt": bson::DateTime::now(),
            "__v": 0,
        };

        let doc: PostDocument = bson::from_document(raw).unwrap();
        let post = Post::try_from(doc).unwrap();

        assert_eq!(post.id, id);
        assert_eq!(post.tags, vec!["x".to_string()]);
        assert!(post.likes.is_empty());
        assert!(post.comments.is_empty());
        assert!(post.creator.is_empty());
    }

    #[test]
    fn test_new_document_omits_id() {
        let doc = PostDocument::from(NewPost {
            title: "t".to_string(),
            message: "m".to_string(),
            creator: "u1".to_string(),
            tags: vec!["a".to_string()],
            selected_file: Some("data:image/png;base64,AAAA".to_string()),
            created_at: Utc::now(),
        });

        let raw = bson::to_document(&doc).unwrap();
        assert!(!raw.contains_key("_id"));
        assert_eq!(raw.get_str("selectedFile").unwrap(), "data:image/png;base64,AAAA");
        assert!(raw.get_datetime("createdAt").is_ok());
    }

    #[test]
    fn test_search_document_ors_title_and_tags() {
        let filter = SearchFilter {
            title_pattern: Some("hello".to_string()),
            tags: vec!["a".to_string(), "b".to_string()],
        };

        let query = search_document(&filter).unwrap();
        let clauses = query.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(
            clauses[0],
            bson::Bson::Document(doc! { "title": { "$regex": "hello", "$options": "i" } })
        );
        assert_eq!(
            clauses[1],
            bson::Bson::Document(doc! { "tags": { "$in": ["a", "b"] } })
        );
    }

    #[test]
    fn test_search_document_empty_pattern_and_no_criteria() {
        let filter = SearchFilter {
            title_pattern: Some(String::new()),
            tags: Vec::new(),
        };
        let query = search_document(&filter).unwrap();
        let clauses = query.get_array("$or").unwrap();
        assert_eq!(
            clauses[0],
            bson::Bson::Document(doc! { "title": { "$regex": "", "$options": "i" } })
        );

        assert!(search_document(&SearchFilter::default()).is_none());
    }

    #[test]
    fn test_update_document_sets_content_fields_only() {
        let update = update_document(PostChanges {
            title: "t".to_string(),
            message: "m".to_string(),
            tags: vec!["x".to_string()],
            selected_file: None,
        });

        assert_eq!(update.len(), 1);
        let set = update.get_document("$set").unwrap();
        let mut keys: Vec<_> = set.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["message", "selectedFile", "tags", "title"]);
        for key in ["creator", "createdAt", "_id", "likes", "comments"] {
            assert!(!set.contains_key(key));
        }
        assert_eq!(set.get("selectedFile"), Some(&bson::Bson::Null));
    }

    #[test]
    fn test_like_guards_are_complementary() {
        let id = ObjectId::new();

        let (filter, update) = add_like(id, "u1");
        assert_eq!(filter, doc! { "_id": id, "likes": { "$ne": "u1" } });
        assert_eq!(update, doc! { "$addToSet": { "likes": "u1" } });

        let (filter, update) = remove_like(id, "u1");
        assert_eq!(filter, doc! { "_id": id, "likes": "u1" });
        assert_eq!(update, doc! { "$pull": { "likes": "u1" } });
    }
}
