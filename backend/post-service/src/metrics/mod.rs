//! Prometheus metrics for post-service.
//!
//! Exposes per-operation collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::time::Instant;

lazy_static! {
    /// Post operations by name and outcome (success/error).
    pub static ref POST_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "post_operations_total",
        "Post operations segmented by operation and outcome",
        &["operation", "outcome"]
    )
    .expect("failed to register post_operations_total");

    /// Duration of post operations including the store round trip.
    pub static ref POST_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "post_operation_duration_seconds",
        "Post operation duration segmented by operation",
        &["operation"]
    )
    .expect("failed to register post_operation_duration_seconds");
}

/// Records one finished operation.
pub fn observe<T, E>(operation: &str, started: Instant, result: &Result<T, E>) {
    let outcome = if result.is_ok() { "success" } else { "error" };
    POST_OPERATIONS_TOTAL
        .with_label_values(&[operation, outcome])
        .inc();
    POST_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(started.elapsed().as_secs_f64());
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
