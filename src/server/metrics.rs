use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all media server metrics
const PREFIX: &str = "siwaht";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Ingestion Metrics
    pub static ref INGESTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_ingestions_total"), "Media ingestions by outcome"),
        &["outcome"]
    ).expect("Failed to create ingestions_total metric");

    pub static ref INGESTION_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_ingestion_duration_seconds"),
            "End-to-end ingestion duration in seconds"
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0]),
        &["file_type"]
    ).expect("Failed to create ingestion_duration_seconds metric");

    // Catalog Metrics
    pub static ref CATALOG_MEDIA_ITEMS: Gauge = Gauge::new(
        format!("{PREFIX}_catalog_media_items"),
        "Number of media records in the catalog"
    ).expect("Failed to create catalog_media_items metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(INGESTIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(INGESTION_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(CATALOG_MEDIA_ITEMS.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Seed the catalog gauge from the store at startup
pub fn init_catalog_metrics(num_media_items: usize) {
    CATALOG_MEDIA_ITEMS.set(num_media_items as f64);
    tracing::info!("Catalog metrics initialized: {} media items", num_media_items);
}

/// Record an HTTP request
pub fn record_http_request(method: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method])
        .observe(duration.as_secs_f64());
}

/// Record a completed or failed ingestion
pub fn record_ingestion(outcome: &str, file_type: &str, duration: Duration) {
    INGESTIONS_TOTAL.with_label_values(&[outcome]).inc();
    INGESTION_DURATION_SECONDS
        .with_label_values(&[file_type])
        .observe(duration.as_secs_f64());
}

/// Keep the catalog gauge in step with creates/deletes
pub fn set_catalog_size(num_media_items: usize) {
    CATALOG_MEDIA_ITEMS.set(num_media_items as f64);
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}
