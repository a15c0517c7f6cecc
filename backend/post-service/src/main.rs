use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use post_service::config::StoreBackend;
use post_service::db::{InMemoryPostStore, MongoPostRepository, PostStore};
use post_service::handlers;
use post_service::metrics;
use post_service::middleware::{RequestTiming, UserContext};
use post_service::services::PostService;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    }
}

/// `post-service healthcheck` probes the local liveness endpoint and exits.
async fn run_healthcheck() -> io::Result<()> {
    let port = std::env::var("POST_SERVICE_PORT").unwrap_or_else(|_| "5000".to_string());
    let url = format!("http://127.0.0.1:{}/api/v1/health/live", port);

    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            eprintln!("healthcheck HTTP status: {}", resp.status());
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck failed"))
        }
        Err(e) => {
            eprintln!("healthcheck HTTP error: {}", e);
            Err(io::Error::new(io::ErrorKind::Other, "healthcheck error"))
        }
    }
}

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,mongodb=warn".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

/// Post Service
///
/// Serves the post resource of the Memories app.
///
/// # Routes
///
/// - `/api/v1/posts` - List (paged) and create posts
/// - `/api/v1/posts/search` - Search by title pattern or tags
/// - `/api/v1/posts/{id}` - Get, update, delete a post
/// - `/api/v1/posts/{id}/likePost` - Toggle the caller's like
/// - `/api/v1/posts/{id}/commentPost` - Append a comment
/// - `/api/v1/health*`, `/metrics` - Probes and Prometheus metrics
#[actix_web::main]
async fn main() -> io::Result<()> {
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        return run_healthcheck().await;
    }

    dotenvy::dotenv().ok();
    init_tracing();

    // Load configuration
    let config = match post_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {:#}", e);
            eprintln!("ERROR: Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting post-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let store: Arc<dyn PostStore> = match config.database.backend {
        StoreBackend::Mongodb => {
            let repo = MongoPostRepository::connect(
                &config.database.uri,
                &config.database.database,
                &config.database.collection,
            )
            .await
            .map_err(|e| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to initialize MongoDB client: {e}"),
                )
            })?;
            tracing::info!(
                database = %config.database.database,
                collection = %config.database.collection,
                "MongoDB client initialized"
            );
            Arc::new(repo)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory post store; data is lost on restart");
            Arc::new(InMemoryPostStore::new())
        }
    };

    match store.ping().await {
        Ok(()) => tracing::info!("Document store connection validated"),
        Err(e) => tracing::warn!("Document store ping failed at startup: {}", e),
    }

    let post_service = web::Data::new(PostService::new(store.clone()));
    let store_data: web::Data<dyn PostStore> = web::Data::from(store);

    let bind_address = config.bind_address();
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let user_id_header = config.auth.user_id_header.clone();

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(post_service.clone())
            .app_data(store_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .service(
                web::scope("/api/v1")
                    .wrap(RequestTiming)
                    .wrap(UserContext::new(&user_id_header))
                    .configure(handlers::configure),
            )
    })
    .workers(config.app.workers)
    .disable_signals()
    .bind(&bind_address)?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            match result {
                Ok(Ok(())) => tracing::info!("HTTP server stopped"),
                Ok(Err(e)) => {
                    tracing::error!("HTTP server error: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::error!("HTTP server task join error: {}", e);
                    return Err(io::Error::new(io::ErrorKind::Other, e.to_string()));
                }
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, draining connections");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("post-service shutting down");
    Ok(())
}
