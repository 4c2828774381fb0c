use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    billing::{
        CheckoutSession, Entitlements, PricingInfo, ProductType, ReportAccess, UsageStats,
        WebhookEvent, WebhookOutcome,
    },
    error::AppError,
    reports::ReportType,
    server::Server,
};

/// Create billing API routes
pub fn create_billing_routes() -> Router<Server> {
    Router::new()
        .route("/billing/entitlements/{workspace_id}", get(get_entitlements))
        .route(
            "/billing/access/{workspace_id}/{report_type}",
            get(check_access),
        )
        .route("/billing/usage/{workspace_id}", get(get_usage_stats))
        .route("/billing/pricing", get(get_pricing))
        .route("/billing/checkout", post(create_checkout))
        .route("/billing/webhook", post(handle_webhook))
}

async fn get_entitlements(
    State(server): State<Server>,
    Path(workspace_id): Path<String>,
) -> Result<Json<Entitlements>, AppError> {
    Ok(Json(server.billing_service.entitlements(&workspace_id).await?))
}

async fn check_access(
    State(server): State<Server>,
    Path((workspace_id, report_type)): Path<(String, String)>,
) -> Result<Json<ReportAccess>, AppError> {
    let report_type: ReportType = report_type
        .parse()
        .map_err(AppError::InvalidInput)?;
    Ok(Json(
        server
            .billing_service
            .check_access(&workspace_id, report_type)
            .await?,
    ))
}

async fn get_usage_stats(
    State(server): State<Server>,
    Path(workspace_id): Path<String>,
) -> Result<Json<UsageStats>, AppError> {
    Ok(Json(server.billing_service.usage_stats(&workspace_id).await?))
}

async fn get_pricing(State(server): State<Server>) -> Json<PricingInfo> {
    Json(server.billing_service.pricing())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub workspace_id: String,
    pub product_type: ProductType,
    /// Plan name or credit pack id.
    pub product_id: String,
}

async fn create_checkout(
    State(server): State<Server>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutSession>, AppError> {
    Ok(Json(
        server
            .billing_service
            .create_checkout(
                &request.workspace_id,
                request.product_type,
                &request.product_id,
            )
            .await?,
    ))
}

/// Apply a payment-processor notification. Signature verification happens
/// upstream; duplicate deliveries are silent no-ops.
async fn handle_webhook(
    State(server): State<Server>,
    Json(event): Json<WebhookEvent>,
) -> Result<Json<serde_json::Value>, AppError> {
    let outcome: WebhookOutcome = server.billing_service.apply_webhook(&event).await?;
    Ok(Json(serde_json::json!({
        "received": true,
        "outcome": outcome,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_request_deserializes() {
        let request: CheckoutRequest = serde_json::from_str(
            r#"{"workspace_id": "ws-1", "product_type": "subscription", "product_id": "PRO"}"#,
        )
        .unwrap();
        assert_eq!(request.product_type, ProductType::Subscription);
        assert_eq!(request.product_id, "PRO");
    }

    #[test]
    fn test_webhook_outcome_serializes_snake_case() {
        let json = serde_json::to_string(&WebhookOutcome::Duplicate).unwrap();
        assert_eq!(json, "\"duplicate\"");
    }
}
