use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;
use tracing::info;

/// Initialize the Prometheus exporter on the given port.
pub fn init_metrics_with_port(
    port: u16,
) -> Result<PrometheusHandle, Box<dyn std::error::Error + Send + Sync>> {
    let builder = PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .add_global_label("service", "marketpulse");

    let handle = builder.install_recorder()?;

    info!("Metrics server started on :{port}/metrics");
    Ok(handle)
}

/// Middleware to collect HTTP request metrics
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    let labels = [
        ("method", method.to_string()),
        ("path", path),
        ("status", status.as_u16().to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
    gauge!("http_requests_active").decrement(1.0);

    if status.is_server_error() {
        counter!("http_errors_total", &labels[..2]).increment(1);
    }

    response
}

/// Track report generation outcomes
pub fn track_report_generated(report_type: &str, status: &str, duration_ms: u64) {
    counter!("reports_generated_total",
        "report_type" => report_type.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!("report_generation_duration_seconds",
        "report_type" => report_type.to_string()
    )
    .record(duration_ms as f64 / 1000.0);
}

/// Track report cache lookups
pub fn track_report_cache(report_type: &str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("report_cache_lookups_total",
        "report_type" => report_type.to_string(),
        "result" => result
    )
    .increment(1);
}

/// Track credit consumption
pub fn track_credits_consumed(report_type: &str, credits: i32) {
    counter!("credits_consumed_total",
        "report_type" => report_type.to_string()
    )
    .increment(credits.max(0) as u64);
}

/// Track webhook processing outcomes
pub fn track_webhook_event(kind: &str, outcome: &str) {
    counter!("billing_webhook_events_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}
