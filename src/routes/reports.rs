use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    database::ReportQuery,
    database::entities::ReportRecord,
    error::AppError,
    reports::{CompetitorSnapshotRequest, SpendBaselineRequest, TrackingReadinessRequest},
    server::Server,
};

/// Create report API routes
pub fn create_report_routes() -> Router<Server> {
    Router::new()
        .route(
            "/reports/tracking-readiness",
            post(generate_tracking_readiness),
        )
        .route("/reports/spend-baseline", post(generate_spend_baseline))
        .route(
            "/reports/competitor-snapshot",
            post(generate_competitor_snapshot),
        )
        .route("/reports", get(list_reports))
        .route("/reports/{id}", get(get_report))
        .route("/reports/{id}", delete(delete_report))
        .route("/reports/{id}/data", get(get_report_data))
}

async fn generate_tracking_readiness(
    State(server): State<Server>,
    Json(request): Json<TrackingReadinessRequest>,
) -> Result<Json<ReportRecord>, AppError> {
    let report = server
        .report_service
        .generate_tracking_readiness(request)
        .await?;
    Ok(Json(report))
}

async fn generate_spend_baseline(
    State(server): State<Server>,
    Json(request): Json<SpendBaselineRequest>,
) -> Result<Json<ReportRecord>, AppError> {
    let report = server.report_service.generate_spend_baseline(request).await?;
    Ok(Json(report))
}

async fn generate_competitor_snapshot(
    State(server): State<Server>,
    Json(request): Json<CompetitorSnapshotRequest>,
) -> Result<Json<ReportRecord>, AppError> {
    let report = server
        .report_service
        .generate_competitor_snapshot(request)
        .await?;
    Ok(Json(report))
}

async fn get_report(
    State(server): State<Server>,
    Path(id): Path<String>,
) -> Result<Json<ReportRecord>, AppError> {
    Ok(Json(server.report_service.get_report(&id).await?))
}

/// Raw payload JSON behind a ready report.
async fn get_report_data(
    State(server): State<Server>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let report = server.report_service.get_report(&id).await?;
    let data = server.report_service.report_data(&id).await?;
    Ok(Json(serde_json::json!({
        "report_id": report.id,
        "report_type": report.report_type,
        "title": report.title,
        "summary": report.summary,
        "overall_score": report.overall_score,
        "confidence": report.confidence,
        "status": report.status,
        "created_at": report.created_at,
        "generation_time_ms": report.generation_time_ms,
        "data": data,
    })))
}

/// Query parameters for listing reports
#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub report_type: Option<String>,
    pub workspace_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListReportsResponse {
    pub reports: Vec<ReportRecord>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

async fn list_reports(
    State(server): State<Server>,
    Query(params): Query<ListReportsQuery>,
) -> Result<Json<ListReportsResponse>, AppError> {
    let limit = params.limit.unwrap_or(50).min(200);
    let offset = params.offset.unwrap_or(0);

    let query = ReportQuery {
        report_type: params.report_type,
        workspace_id: params.workspace_id,
        user_id: params.user_id,
        status: params.status,
        limit: Some(limit),
        offset: Some(offset),
    };

    let (reports, total) = server.report_service.list_reports(&query).await?;

    Ok(Json(ListReportsResponse {
        reports,
        total,
        limit,
        offset,
    }))
}

async fn delete_report(
    State(server): State<Server>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    server.report_service.delete_report(&id).await?;
    Ok(Json(
        serde_json::json!({ "message": "Report deleted successfully" }),
    ))
}
