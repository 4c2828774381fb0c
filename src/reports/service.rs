//! Report generation pipeline.
//!
//! Control flow for every request: fingerprint the normalized input,
//! return any cached `ready` report (no charge), gate on entitlements,
//! persist a `generating` row, collect external data under timeouts, run
//! the pure scoring engine, persist the result, and only then consume
//! credits. Billing failure after a successful generation is logged, not
//! surfaced — the report is still returned.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{error, info, warn};
use url::Url;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::billing::{self, BillingService};
use crate::connectors::{
    AdAccountRef, AdPlatform, AdsConnector, CompetitiveIntel, ConnectorError, KeywordMetric,
    SiteAnalyzer, SiteProfile,
};
use crate::database::entities::ReportRecord;
use crate::database::{DatabaseManager, ReportQuery, ScoredUpdate};
use crate::error::AppError;
use crate::fingerprint;
use crate::metrics;
use crate::scoring::spend::AccountSpend;
use crate::scoring::{competitor, spend, tracking};

use super::types::{ReportStatus, ReportType};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TrackingReadinessRequest {
    pub url: String,
    pub workspace_id: String,
    pub user_id: Option<String>,
    /// Return the `generating` placeholder immediately and finish in the
    /// background.
    #[serde(default)]
    pub background: bool,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SpendBaselineRequest {
    pub workspace_id: String,
    pub user_id: Option<String>,
    /// Lookback window in days.
    #[serde(default = "default_days")]
    pub days: u32,
    /// Connected ad accounts to include.
    #[serde(default)]
    pub accounts: Vec<AdAccountRef>,
    #[serde(default)]
    pub background: bool,
}

fn default_days() -> u32 {
    90
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CompetitorSnapshotRequest {
    pub url: String,
    pub workspace_id: String,
    pub user_id: Option<String>,
    #[serde(default)]
    pub background: bool,
}

#[derive(Debug, Serialize)]
struct TrackingReportData {
    website_url: String,
    website_title: Option<String>,
    analysis: tracking::TrackingAnalysis,
    technologies: BTreeMap<String, Vec<String>>,
    tracking_pixels: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SpendReportData {
    accounts_analyzed: usize,
    lookback_days: u32,
    analysis: spend::SpendAnalysis,
}

#[derive(Debug, Serialize)]
struct CompetitorReportData {
    target_domain: String,
    analysis: competitor::CompetitorAnalysis,
    keyword_gaps: competitor::KeywordGapAnalysis,
}

pub struct ReportService {
    database: Arc<dyn DatabaseManager>,
    billing: Arc<BillingService>,
    analyzer: Arc<dyn SiteAnalyzer>,
    ads_connectors: HashMap<AdPlatform, Arc<dyn AdsConnector>>,
    intel: Arc<dyn CompetitiveIntel>,
    connector_timeout: StdDuration,
}

impl ReportService {
    pub fn new(
        database: Arc<dyn DatabaseManager>,
        billing: Arc<BillingService>,
        analyzer: Arc<dyn SiteAnalyzer>,
        ads_connectors: Vec<Arc<dyn AdsConnector>>,
        intel: Arc<dyn CompetitiveIntel>,
        connector_timeout: StdDuration,
    ) -> Self {
        let ads_connectors = ads_connectors
            .into_iter()
            .map(|c| (c.platform(), c))
            .collect();
        Self {
            database,
            billing,
            analyzer,
            ads_connectors,
            intel,
            connector_timeout,
        }
    }

    /// Generate (or return the cached) tracking-readiness report.
    pub async fn generate_tracking_readiness(
        self: &Arc<Self>,
        request: TrackingReadinessRequest,
    ) -> Result<ReportRecord, AppError> {
        let url = parse_http_url(&request.url)?;
        let report_type = ReportType::TrackingReadiness;
        let input_hash = fingerprint::tracking_fingerprint(&url);

        if let Some(hit) = self.cached(report_type, &input_hash).await? {
            return Ok(hit);
        }

        self.billing
            .require_access(&request.workspace_id, report_type)
            .await?;

        let record = self
            .insert_generating(
                report_type,
                &input_hash,
                "Tracking Readiness Report",
                Some(fingerprint::website_id(&url)),
                &request.workspace_id,
                request.user_id.as_deref(),
            )
            .await?;

        let service = Arc::clone(self);
        let report_id = record.id.clone();
        let workspace_id = request.workspace_id.clone();
        if request.background {
            tokio::spawn(async move {
                service.run_tracking(report_id, url, workspace_id).await;
            });
            return Ok(record);
        }

        self.run_tracking(report_id.clone(), url, workspace_id).await;
        self.get_report(&report_id).await
    }

    /// Generate (or return the cached) spend-baseline report.
    pub async fn generate_spend_baseline(
        self: &Arc<Self>,
        request: SpendBaselineRequest,
    ) -> Result<ReportRecord, AppError> {
        if request.days == 0 || request.days > 365 {
            return Err(AppError::InvalidInput(
                "days must be between 1 and 365".to_string(),
            ));
        }

        let report_type = ReportType::SpendBaseline;
        let account_ids: Vec<String> = request
            .accounts
            .iter()
            .map(|a| a.account_id.clone())
            .collect();
        let input_hash = fingerprint::spend_fingerprint(&account_ids, request.days);

        if let Some(hit) = self.cached(report_type, &input_hash).await? {
            return Ok(hit);
        }

        self.billing
            .require_access(&request.workspace_id, report_type)
            .await?;

        let record = self
            .insert_generating(
                report_type,
                &input_hash,
                &format!("Spend Baseline Report - {} Account(s)", request.accounts.len()),
                None,
                &request.workspace_id,
                request.user_id.as_deref(),
            )
            .await?;

        let service = Arc::clone(self);
        let report_id = record.id.clone();
        let workspace_id = request.workspace_id.clone();
        let accounts = request.accounts.clone();
        let days = request.days;
        if request.background {
            tokio::spawn(async move {
                service
                    .run_spend_baseline(report_id, accounts, days, workspace_id)
                    .await;
            });
            return Ok(record);
        }

        self.run_spend_baseline(report_id.clone(), accounts, days, workspace_id)
            .await;
        self.get_report(&report_id).await
    }

    /// Generate (or return the cached) competitor-snapshot report.
    pub async fn generate_competitor_snapshot(
        self: &Arc<Self>,
        request: CompetitorSnapshotRequest,
    ) -> Result<ReportRecord, AppError> {
        let url = parse_http_url(&request.url)?;
        let domain = fingerprint::normalize_domain(&url);
        if domain.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "no domain in url: {}",
                request.url
            )));
        }

        let report_type = ReportType::CompetitorSnapshot;
        let input_hash = fingerprint::competitor_fingerprint(&domain);

        if let Some(hit) = self.cached(report_type, &input_hash).await? {
            return Ok(hit);
        }

        self.billing
            .require_access(&request.workspace_id, report_type)
            .await?;

        let record = self
            .insert_generating(
                report_type,
                &input_hash,
                &format!("Competitor Snapshot - {domain}"),
                Some(fingerprint::website_id(&url)),
                &request.workspace_id,
                request.user_id.as_deref(),
            )
            .await?;

        let service = Arc::clone(self);
        let report_id = record.id.clone();
        let workspace_id = request.workspace_id.clone();
        if request.background {
            tokio::spawn(async move {
                service
                    .run_competitor_snapshot(report_id, domain, workspace_id)
                    .await;
            });
            return Ok(record);
        }

        self.run_competitor_snapshot(report_id.clone(), domain, workspace_id)
            .await;
        self.get_report(&report_id).await
    }

    pub async fn get_report(&self, id: &str) -> Result<ReportRecord, AppError> {
        self.database
            .reports()
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("report {id}")))
    }

    /// Raw payload JSON for a report.
    pub async fn report_data(&self, id: &str) -> Result<serde_json::Value, AppError> {
        let report = self.get_report(id).await?;
        match report.data_json.as_deref() {
            Some(data) => serde_json::from_str(data)
                .map_err(|e| AppError::Internal(format!("stored report data is invalid: {e}"))),
            None => Ok(serde_json::Value::Null),
        }
    }

    pub async fn list_reports(
        &self,
        query: &ReportQuery,
    ) -> Result<(Vec<ReportRecord>, u64), AppError> {
        let reports = self.database.reports().list(query).await?;
        let total = self.database.reports().count(query).await?;
        Ok((reports, total))
    }

    pub async fn delete_report(&self, id: &str) -> Result<(), AppError> {
        if !self.database.reports().delete(id).await? {
            return Err(AppError::NotFound(format!("report {id}")));
        }
        info!(report_id = id, "report deleted");
        Ok(())
    }

    async fn cached(
        &self,
        report_type: ReportType,
        input_hash: &str,
    ) -> Result<Option<ReportRecord>, AppError> {
        let hit = self
            .database
            .reports()
            .find_ready(report_type.as_str(), input_hash)
            .await?;
        metrics::track_report_cache(report_type.as_str(), hit.is_some());
        if let Some(ref report) = hit {
            info!(
                report_id = %report.id,
                report_type = report_type.as_str(),
                "returning cached report, no credits charged"
            );
        }
        Ok(hit)
    }

    async fn insert_generating(
        &self,
        report_type: ReportType,
        input_hash: &str,
        title: &str,
        website_id: Option<String>,
        workspace_id: &str,
        user_id: Option<&str>,
    ) -> Result<ReportRecord, AppError> {
        let now = Utc::now();
        let record = ReportRecord {
            id: Uuid::new_v4().to_string(),
            report_type: report_type.as_str().to_string(),
            website_id,
            input_hash: input_hash.to_string(),
            title: title.to_string(),
            summary: None,
            data_json: None,
            overall_score: None,
            confidence: None,
            status: ReportStatus::Generating.as_str().to_string(),
            generation_time_ms: None,
            credit_cost: billing::report_cost(report_type),
            user_id: user_id.map(String::from),
            workspace_id: workspace_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.database.reports().insert(&record).await?;
        Ok(record)
    }

    async fn run_tracking(&self, report_id: String, url: String, workspace_id: String) {
        let report_type = ReportType::TrackingReadiness;
        let started = std::time::Instant::now();

        let profile = match self.bounded(self.analyzer.analyze(&url)).await {
            Ok(profile) => profile,
            Err(e) => {
                // The analyzer is this report's only data source; losing
                // it means zero usable data.
                self.fail(&report_id, report_type, &format!("Website analysis failed: {e}"))
                    .await;
                return;
            }
        };

        let analysis = tracking::score(&profile);
        let title = match &profile.title {
            Some(site_title) => format!("Tracking Readiness Report - {site_title}"),
            None => "Tracking Readiness Report".to_string(),
        };
        let data = TrackingReportData {
            website_url: url,
            website_title: profile.title.clone(),
            technologies: profile.technologies.clone(),
            tracking_pixels: profile.tracking_pixels.clone(),
            analysis,
        };

        self.complete(
            &report_id,
            report_type,
            &workspace_id,
            title,
            data.analysis.summary.clone(),
            data.analysis.overall_score,
            data.analysis.confidence.as_str(),
            &data,
            billing::report_cost(report_type),
            started.elapsed().as_millis() as i32,
        )
        .await;
    }

    async fn run_spend_baseline(
        &self,
        report_id: String,
        accounts: Vec<AdAccountRef>,
        days: u32,
        workspace_id: String,
    ) {
        let report_type = ReportType::SpendBaseline;
        let started = std::time::Instant::now();

        let end = Utc::now().date_naive() - Duration::days(1);
        let start = end - Duration::days(days as i64 - 1);

        let mut collected: Vec<AccountSpend> = Vec::new();
        for account in &accounts {
            let Some(connector) = self.ads_connectors.get(&account.platform) else {
                warn!(
                    platform = %account.platform,
                    account_id = %account.account_id,
                    "no connector registered for platform, skipping account"
                );
                continue;
            };

            let daily = match self.bounded(connector.spend_data(account, start, end)).await {
                Ok(daily) => daily,
                Err(e) => {
                    warn!(
                        account_id = %account.account_id,
                        error = %e,
                        "spend data unavailable, skipping account"
                    );
                    continue;
                }
            };

            let campaigns = match self.bounded(connector.campaigns_summary(account, days)).await {
                Ok(campaigns) => campaigns,
                Err(e) => {
                    warn!(
                        account_id = %account.account_id,
                        error = %e,
                        "campaign summary unavailable"
                    );
                    Vec::new()
                }
            };

            if !daily.is_empty() {
                collected.push(AccountSpend {
                    account: account.clone(),
                    daily,
                    campaigns,
                });
            }
        }

        if collected.is_empty() {
            // Distinct terminal state: a valid zero-score report that
            // costs nothing, not a failure.
            let data = serde_json::json!({
                "accounts_analyzed": 0,
                "lookback_days": days,
                "message": "Connect ad accounts to generate a spend baseline report.",
            });
            self.complete(
                &report_id,
                report_type,
                &workspace_id,
                "Spend Baseline Report - No Data Available".to_string(),
                "No connected ad accounts with spend data found.".to_string(),
                0,
                "LOW",
                &data,
                0,
                started.elapsed().as_millis() as i32,
            )
            .await;
            return;
        }

        let analysis = spend::score(&collected, days);
        let data = SpendReportData {
            accounts_analyzed: collected.len(),
            lookback_days: days,
            analysis,
        };

        self.complete(
            &report_id,
            report_type,
            &workspace_id,
            format!("Spend Baseline Report - {} Account(s)", collected.len()),
            data.analysis.summary.clone(),
            data.analysis.overall_score,
            data.analysis.confidence.as_str(),
            &data,
            billing::report_cost(report_type),
            started.elapsed().as_millis() as i32,
        )
        .await;
    }

    async fn run_competitor_snapshot(
        &self,
        report_id: String,
        domain: String,
        workspace_id: String,
    ) {
        let report_type = ReportType::CompetitorSnapshot;
        let started = std::time::Instant::now();

        let overview = match self.bounded(self.intel.competitor_overview(&domain)).await {
            Ok(overview) => overview,
            Err(e) => {
                self.fail(
                    &report_id,
                    report_type,
                    &format!("Competitive intelligence unavailable: {e}"),
                )
                .await;
                return;
            }
        };

        // Partial keyword data degrades the gap analysis, it does not
        // abort the report.
        let target_keywords = match self.bounded(self.intel.domain_keywords(&domain, 200)).await {
            Ok(keywords) => keywords,
            Err(e) => {
                warn!(domain, error = %e, "target keyword lookup failed");
                Vec::new()
            }
        };

        let mut competitor_domains: Vec<String> = Vec::new();
        for competitor in overview
            .organic_competitors
            .iter()
            .chain(overview.paid_competitors.iter())
        {
            if !competitor_domains.contains(&competitor.domain) {
                competitor_domains.push(competitor.domain.clone());
            }
            if competitor_domains.len() >= 5 {
                break;
            }
        }

        let mut competitor_keywords: BTreeMap<String, Vec<KeywordMetric>> = BTreeMap::new();
        for competitor_domain in competitor_domains.iter().take(3) {
            match self
                .bounded(self.intel.domain_keywords(competitor_domain, 200))
                .await
            {
                Ok(keywords) => {
                    competitor_keywords.insert(competitor_domain.clone(), keywords);
                }
                Err(e) => {
                    warn!(
                        competitor = %competitor_domain,
                        error = %e,
                        "competitor keyword lookup failed"
                    );
                }
            }
        }

        let gaps = competitor::analyze_keyword_gaps(&target_keywords, &competitor_keywords);
        let analysis = competitor::score(&overview, &gaps);
        let data = CompetitorReportData {
            target_domain: domain.clone(),
            analysis,
            keyword_gaps: gaps,
        };

        self.complete(
            &report_id,
            report_type,
            &workspace_id,
            format!("Competitor Snapshot - {domain}"),
            data.analysis.summary.clone(),
            data.analysis.overall_score,
            data.analysis.confidence.as_str(),
            &data,
            billing::report_cost(report_type),
            started.elapsed().as_millis() as i32,
        )
        .await;
    }

    /// Persist a completed analysis and charge credits afterwards.
    /// Credits are consumed strictly after the report reaches `ready`;
    /// a billing error at this point is logged and swallowed.
    #[allow(clippy::too_many_arguments)]
    async fn complete<T: Serialize>(
        &self,
        report_id: &str,
        report_type: ReportType,
        workspace_id: &str,
        title: String,
        summary: String,
        overall_score: i32,
        confidence: &str,
        data: &T,
        credit_cost: i32,
        generation_time_ms: i32,
    ) {
        let data_json = match serde_json::to_string(data) {
            Ok(json) => json,
            Err(e) => {
                self.fail(report_id, report_type, &format!("Report serialization failed: {e}"))
                    .await;
                return;
            }
        };

        let update = ScoredUpdate {
            title,
            summary,
            data_json,
            overall_score,
            confidence: confidence.to_string(),
            generation_time_ms,
            credit_cost,
        };

        if let Err(e) = self.database.reports().mark_ready(report_id, update).await {
            error!(report_id, error = %e, "failed to persist completed report");
            return;
        }

        metrics::track_report_generated(
            report_type.as_str(),
            "ready",
            generation_time_ms.max(0) as u64,
        );
        info!(
            report_id,
            report_type = report_type.as_str(),
            overall_score,
            generation_time_ms,
            "report generated"
        );

        if credit_cost > 0 {
            billing::consume_after_generation(&self.billing, workspace_id, report_type, report_id)
                .await;
        }
    }

    async fn fail(&self, report_id: &str, report_type: ReportType, summary: &str) {
        error!(report_id, report_type = report_type.as_str(), summary, "report failed");
        if let Err(e) = self.database.reports().mark_failed(report_id, summary).await {
            error!(report_id, error = %e, "failed to persist report failure");
        }
        metrics::track_report_generated(report_type.as_str(), "failed", 0);
    }

    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, ConnectorError>>,
    ) -> Result<T, ConnectorError> {
        match timeout(self.connector_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(ConnectorError::Timeout(self.connector_timeout)),
        }
    }

    /// Shared profile lookup for the insights surface.
    pub async fn analyze_site(&self, raw_url: &str) -> Result<SiteProfile, AppError> {
        let url = parse_http_url(raw_url)?;
        self.bounded(self.analyzer.analyze(&url))
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))
    }
}

fn parse_http_url(raw: &str) -> Result<String, AppError> {
    let url = Url::parse(raw).map_err(|e| AppError::InvalidInput(format!("invalid url: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::InvalidInput(format!(
            "unsupported url scheme: {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(AppError::InvalidInput("url has no host".to_string()));
    }
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_url() {
        assert!(parse_http_url("https://example.com").is_ok());
        assert!(parse_http_url("http://example.com/pricing").is_ok());
        assert!(parse_http_url("ftp://example.com").is_err());
        assert!(parse_http_url("not a url").is_err());
        assert!(parse_http_url("file:///etc/passwd").is_err());
    }
}
