pub mod cleanup;
pub mod scheduler;

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use cleanup::ReportCleanupJob;
pub use scheduler::JobScheduler;

/// Configuration for the job system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Enable/disable internal job scheduler
    #[serde(default = "default_jobs_enabled")]
    pub enabled: bool,

    /// Stale report cleanup job configuration
    #[serde(default)]
    pub report_cleanup: ReportCleanupConfig,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: default_jobs_enabled(),
            report_cleanup: ReportCleanupConfig::default(),
        }
    }
}

fn default_jobs_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportCleanupConfig {
    /// Cron schedule expression (6-field format: sec min hour day month dow)
    #[serde(default = "default_cleanup_schedule")]
    pub schedule: String,
    /// Reports stuck in `generating` longer than this are marked failed.
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u32,
}

impl Default for ReportCleanupConfig {
    fn default() -> Self {
        Self {
            schedule: default_cleanup_schedule(),
            stale_after_hours: default_stale_after_hours(),
        }
    }
}

fn default_cleanup_schedule() -> String {
    // Hourly at minute 10.
    "0 10 * * * *".to_string()
}

fn default_stale_after_hours() -> u32 {
    2
}

/// Result of job execution
#[derive(Debug, Clone)]
pub struct JobResult {
    pub success: bool,
    pub message: String,
    pub items_processed: u64,
}

impl JobResult {
    pub fn success_with_count(count: u64) -> Self {
        Self {
            success: true,
            message: format!("Successfully processed {count} items"),
            items_processed: count,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            items_processed: 0,
        }
    }
}

/// Trait for executable jobs
#[async_trait]
pub trait Job: Send + Sync {
    /// Get the job name for logging and identification
    fn name(&self) -> &str;

    /// Execute the job and return the result
    async fn execute(&self) -> Result<JobResult, AppError>;
}
