/// Post handlers - HTTP endpoints for post operations
use crate::error::Result;
use crate::middleware::UserId;
use crate::models::{
    CommentRequest, CreatePostRequest, ListPostsQuery, MessageResponse, SearchPostsQuery,
    SearchResults, UpdatePostRequest,
};
use crate::services::PostService;
use actix_web::{web, HttpResponse};

/// List posts, newest first, 8 per page
/// GET /api/v1/posts?page=N
pub async fn get_posts(
    service: web::Data<PostService>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse> {
    let page = query.page.unwrap_or(1);
    let posts = service.list_posts(page).await?;

    Ok(HttpResponse::Ok().json(posts))
}

/// Search posts by title pattern or tags
/// GET /api/v1/posts/search?searchQuery=...&tags=a,b
pub async fn get_posts_by_search(
    service: web::Data<PostService>,
    query: web::Query<SearchPostsQuery>,
) -> Result<HttpResponse> {
    let data = service
        .search_posts(query.search_query.as_deref(), query.tags.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(SearchResults { data }))
}

/// Get a post by ID. An unknown id answers `null`, not 404.
pub async fn get_post(
    service: web::Data<PostService>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    let post = service.get_post(&post_id).await?;

    Ok(HttpResponse::Ok().json(post))
}

/// Create a new post
pub async fn create_post(
    service: web::Data<PostService>,
    user_id: UserId,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let post = service.create_post(&user_id, req.into_inner()).await?;

    Ok(HttpResponse::Created().json(post))
}

/// Update a post's title, message, tags and attachment
pub async fn update_post(
    service: web::Data<PostService>,
    post_id: web::Path<String>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let post = service.update_post(&post_id, req.into_inner()).await?;

    Ok(HttpResponse::Ok().json(post))
}

/// Delete a post
pub async fn delete_post(
    service: web::Data<PostService>,
    post_id: web::Path<String>,
) -> Result<HttpResponse> {
    service.delete_post(&post_id).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Post deleted successfully.")))
}

/// Toggle the caller's like on a post
///
/// Anonymous callers get a 200 with an `Unauthenticated` message rather
/// than an error status.
pub async fn like_post(
    service: web::Data<PostService>,
    post_id: web::Path<String>,
    user_id: Option<UserId>,
) -> Result<HttpResponse> {
    let Some(user_id) = user_id else {
        return Ok(HttpResponse::Ok().json(MessageResponse::new("Unauthenticated")));
    };

    let post = service.like_post(&post_id, &user_id).await?;

    Ok(HttpResponse::Ok().json(post))
}

/// Append a comment to a post
pub async fn comment_post(
    service: web::Data<PostService>,
    post_id: web::Path<String>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let post = service.comment_post(&post_id, &req.value).await?;

    Ok(HttpResponse::Ok().json(post))
}
