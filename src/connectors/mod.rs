//! Contracts for the external data sources the report pipeline consumes.
//!
//! The scraper, the per-platform ads connectors and the competitive
//! intelligence client are opaque collaborators: this module defines the
//! data each one must deliver and ships deterministic mock implementations
//! for development and tests. Wire formats of the real providers live
//! behind these traits and never leak into the scoring engines.

pub mod mock;
pub mod site;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Connector failure modes. A failed or timed-out source degrades the
/// affected report inputs; it never aborts generation on its own.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("no connector registered for platform: {0}")]
    UnsupportedPlatform(String),
}

/// What the site analyzer extracts from a target URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SiteProfile {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub business_model: Option<String>,
    pub key_topics: Vec<String>,
    pub value_propositions: Vec<String>,
    /// Detected technologies keyed by category (e.g. "Analytics").
    pub technologies: BTreeMap<String, Vec<String>>,
    /// Detected tracking pixels by name.
    pub tracking_pixels: Vec<String>,
}

#[async_trait]
pub trait SiteAnalyzer: Send + Sync {
    async fn analyze(&self, url: &str) -> Result<SiteProfile, ConnectorError>;
}

/// Supported advertising platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdPlatform {
    Google,
    Meta,
}

impl fmt::Display for AdPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdPlatform::Google => write!(f, "google"),
            AdPlatform::Meta => write!(f, "meta"),
        }
    }
}

/// Reference to a connected ad account, supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdAccountRef {
    pub platform: AdPlatform,
    pub account_id: String,
    pub account_name: Option<String>,
    pub currency: Option<String>,
}

/// One day of spend for one campaign.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailySpend {
    pub date: NaiveDate,
    pub campaign_id: String,
    pub campaign_name: String,
    pub spend: f64,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: f64,
}

/// Aggregated campaign-level summary over the lookback window.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CampaignSummary {
    pub campaign_id: String,
    pub campaign_name: String,
    pub spend: f64,
    pub clicks: u64,
    pub conversions: f64,
}

#[async_trait]
pub trait AdsConnector: Send + Sync {
    fn platform(&self) -> AdPlatform;

    async fn spend_data(
        &self,
        account: &AdAccountRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySpend>, ConnectorError>;

    async fn campaigns_summary(
        &self,
        account: &AdAccountRef,
        days: u32,
    ) -> Result<Vec<CampaignSummary>, ConnectorError>;
}

/// Search-visibility metrics for a domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DomainOverview {
    pub domain: String,
    pub organic_rank: u64,
    pub organic_keywords: u64,
    pub organic_traffic: u64,
    pub organic_cost: f64,
    pub ad_keywords: u64,
}

/// One competitor as reported by the intelligence provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompetitorMetrics {
    pub domain: String,
    /// Relevance of the overlap with the target domain, 0.0 to 1.0.
    pub competitive_relevance: f64,
    pub common_keywords: u64,
    pub ad_keywords: u64,
    pub ad_traffic: u64,
    pub organic_traffic: u64,
    /// Estimated monthly ad spend; zero for organic-only competitors.
    pub ad_cost: f64,
}

/// Per-keyword ranking metrics.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KeywordMetric {
    pub keyword: String,
    pub position: u32,
    pub search_volume: u64,
    pub cpc: f64,
    /// Competition density, 0.0 (none) to 1.0 (saturated).
    pub competition: f64,
}

/// A competitor ad creative observed by the intelligence provider.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdCopy {
    pub title: String,
    pub description: String,
    pub visible_url: String,
}

/// Full competitive picture for a domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CompetitorOverview {
    pub domain: String,
    pub overview: DomainOverview,
    pub organic_competitors: Vec<CompetitorMetrics>,
    pub paid_competitors: Vec<CompetitorMetrics>,
    pub top_keywords: Vec<KeywordMetric>,
    pub ad_copies: Vec<AdCopy>,
}

#[async_trait]
pub trait CompetitiveIntel: Send + Sync {
    async fn competitor_overview(&self, domain: &str)
    -> Result<CompetitorOverview, ConnectorError>;

    async fn domain_keywords(
        &self,
        domain: &str,
        limit: usize,
    ) -> Result<Vec<KeywordMetric>, ConnectorError>;
}
