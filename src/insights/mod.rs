//! Audience insight generation.
//!
//! A single `InsightGenerator` contract with two implementations: an
//! LLM-backed generator and a template-backed one. Which one runs is a
//! configuration choice; the template generator is the unconditional
//! fallback whenever the LLM variant fails, so persona generation as a
//! whole never errors.

pub mod llm;
pub mod template;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::connectors::SiteProfile;

pub use llm::LlmInsightGenerator;
pub use template::TemplateInsightGenerator;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("llm request failed: {0}")]
    Request(String),
    #[error("llm response unusable: {0}")]
    Unusable(String),
}

/// A generated customer persona.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Persona {
    pub name: String,
    pub job_title: String,
    pub industry: String,
    pub company_size: String,
    pub pain_points: Vec<String>,
    pub goals: Vec<String>,
    pub keywords: Vec<String>,
    pub preferred_channels: Vec<String>,
    /// How much to trust this persona, 0.0 to 1.0.
    pub confidence_score: f64,
}

#[async_trait]
pub trait InsightGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn personas(&self, profile: &SiteProfile) -> Result<Vec<Persona>, InsightError>;
}

/// Front door for insight generation: tries the configured primary
/// generator and falls back to templates on any failure.
pub struct InsightService {
    primary: Option<Arc<dyn InsightGenerator>>,
    fallback: TemplateInsightGenerator,
}

impl InsightService {
    pub fn new(primary: Option<Arc<dyn InsightGenerator>>) -> Self {
        Self {
            primary,
            fallback: TemplateInsightGenerator::new(),
        }
    }

    pub async fn personas(&self, profile: &SiteProfile) -> Vec<Persona> {
        if let Some(primary) = &self.primary {
            match primary.personas(profile).await {
                Ok(personas) if !personas.is_empty() => {
                    info!(
                        generator = primary.name(),
                        count = personas.len(),
                        "personas generated"
                    );
                    return personas;
                }
                Ok(_) => {
                    warn!(
                        generator = primary.name(),
                        "generator returned no personas, falling back to templates"
                    );
                }
                Err(e) => {
                    warn!(
                        generator = primary.name(),
                        error = %e,
                        "persona generation failed, falling back to templates"
                    );
                }
            }
        }

        self.fallback.personas(profile).await.unwrap_or_default()
    }
}
