/// HTTP handlers for post-service endpoints
///
/// This module contains handlers for:
/// - Posts: list, search, get, create, update, delete, like and comment
/// - Health: summary, readiness and liveness probes
pub mod health;
pub mod posts;

use crate::error::extractor_error;
use actix_web::web;

// Re-export handler functions at module level
pub use health::{health_summary, liveness_check, readiness_summary};
pub use posts::{
    comment_post, create_post, delete_post, get_post, get_posts, get_posts_by_search,
    like_post, update_post,
};

/// Registers the post and health routes on a scope (mounted at `/api/v1`).
///
/// `/posts/search` is registered ahead of `/posts/{id}` so it is not taken
/// for an id.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(extractor_error))
        .app_data(web::JsonConfig::default().error_handler(extractor_error))
        .app_data(web::PathConfig::default().error_handler(extractor_error))
        .route("/health", web::get().to(health_summary))
        .route("/health/ready", web::get().to(readiness_summary))
        .route("/health/live", web::get().to(liveness_check))
        .service(
            web::scope("/posts")
                .service(
                    web::resource("")
                        .route(web::get().to(get_posts))
                        .route(web::post().to(create_post)),
                )
                .service(web::resource("/search").route(web::get().to(get_posts_by_search)))
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(get_post))
                        .route(web::patch().to(update_post))
                        .route(web::put().to(update_post))
                        .route(web::delete().to(delete_post)),
                )
                .route("/{id}/likePost", web::patch().to(like_post))
                .route("/{id}/commentPost", web::post().to(comment_post)),
        );
}
