use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};

use crate::{health::HealthStatus, server::Server};

/// Create health check routes
pub fn create_health_routes() -> Router<Server> {
    Router::new().route("/health", get(health_check))
}

async fn health_check(State(server): State<Server>) -> impl IntoResponse {
    let response = server.health_service.check_all().await;

    let status = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(response))
}
