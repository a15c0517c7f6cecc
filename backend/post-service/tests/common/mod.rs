//! Shared fixtures for post-service integration tests
//!
//! Builds the same `/api/v1` scope the binary serves, backed by the
//! in-memory store, and provides request helpers.

use actix_web::{test, web, App};
use post_service::db::{InMemoryPostStore, PostStore};
use post_service::handlers;
use post_service::middleware::{RequestTiming, UserContext};
use post_service::services::PostService;
use serde_json::{json, Value};
use std::sync::Arc;

pub const USER_HEADER: &str = "x-user-id";

pub fn store() -> Arc<dyn PostStore> {
    Arc::new(InMemoryPostStore::new())
}

pub async fn setup_test_app(
    store: Arc<dyn PostStore>,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = actix_web::dev::ServiceResponse,
    Error = actix_web::Error,
> {
    let service = web::Data::new(PostService::new(store.clone()));
    let store_data: web::Data<dyn PostStore> = web::Data::from(store);

    test::init_service(
        App::new()
            .app_data(service)
            .app_data(store_data)
            .service(
                web::scope("/api/v1")
                    .wrap(RequestTiming)
                    .wrap(UserContext::new(USER_HEADER))
                    .configure(handlers::configure),
            ),
    )
    .await
}

pub fn post_body(title: &str, tags: &[&str]) -> Value {
    json!({
        "title": title,
        "message": format!("{} message", title),
        "tags": tags,
        "selectedFile": "data:image/png;base64,AAAA",
    })
}

pub async fn create_post<S>(app: &S, user: &str, body: Value) -> Value
where
    S: actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/posts")
        .insert_header((USER_HEADER, user))
        .set_json(body)
        .to_request();

    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201);
    test::read_body_json(resp).await
}

pub fn post_id(post: &Value) -> String {
    post["_id"]
        .as_str()
        .expect("post should carry an _id")
        .to_string()
}
