use super::{Job, JobResult, ReportCleanupConfig};
use crate::{database::DatabaseManager, error::AppError};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;

/// Sweeps reports stuck in `generating` into a terminal `failed` state.
/// A generation that never completes is otherwise invisible to callers
/// polling the report id.
pub struct ReportCleanupJob {
    database: Arc<dyn DatabaseManager>,
    config: ReportCleanupConfig,
}

impl ReportCleanupJob {
    pub fn new(database: Arc<dyn DatabaseManager>, config: ReportCleanupConfig) -> Self {
        Self { database, config }
    }
}

#[async_trait]
impl Job for ReportCleanupJob {
    fn name(&self) -> &str {
        "report_cleanup"
    }

    async fn execute(&self) -> Result<JobResult, AppError> {
        let cutoff = Utc::now() - Duration::hours(self.config.stale_after_hours as i64);

        info!(
            "Sweeping reports stuck in generating since before {}",
            cutoff
        );

        let swept = self
            .database
            .reports()
            .sweep_stale_generating(cutoff)
            .await?;

        if swept > 0 {
            info!("Marked {} stale generating reports as failed", swept);
        }

        Ok(JobResult::success_with_count(swept))
    }
}
