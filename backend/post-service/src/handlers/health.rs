/// Health endpoints for container probes
use crate::db::PostStore;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

pub async fn health_summary(store: web::Data<dyn PostStore>) -> HttpResponse {
    match store.ping().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "post-service",
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("Document store ping failed: {}", e),
            "service": "post-service"
        })),
    }
}

pub async fn readiness_summary(store: web::Data<dyn PostStore>) -> HttpResponse {
    let start = Instant::now();
    let result = store.ping().await;
    let latency_ms = Some(start.elapsed().as_millis() as u64);

    let (ready, check) = match result {
        Ok(_) => (
            true,
            ComponentCheck {
                status: ComponentStatus::Healthy,
                message: "Document store ping successful".to_string(),
                latency_ms,
            },
        ),
        Err(e) => (
            false,
            ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("Document store ping failed: {}", e),
                latency_ms,
            },
        ),
    };

    let mut checks = HashMap::new();
    checks.insert("document_store".to_string(), check);

    let response = ReadinessResponse {
        ready,
        status: if ready {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        },
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
