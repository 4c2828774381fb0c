use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppError, insights::Persona, server::Server};

/// Create audience insight API routes
pub fn create_insight_routes() -> Router<Server> {
    Router::new().route("/insights/personas", post(generate_personas))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PersonaRequest {
    pub url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PersonaResponse {
    pub url: String,
    pub personas: Vec<Persona>,
}

/// Analyze a site and derive customer personas for it. Falls back to
/// template personas whenever the configured generator cannot deliver.
async fn generate_personas(
    State(server): State<Server>,
    Json(request): Json<PersonaRequest>,
) -> Result<Json<PersonaResponse>, AppError> {
    let profile = server.report_service.analyze_site(&request.url).await?;
    let personas = server.insight_service.personas(&profile).await;
    Ok(Json(PersonaResponse {
        url: request.url,
        personas,
    }))
}
