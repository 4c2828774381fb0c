use clap::Subcommand;
use std::sync::Arc;

use crate::Config;
use crate::database::{DatabaseManager, DatabaseManagerImpl};
use crate::jobs::{Job, ReportCleanupConfig, ReportCleanupJob};

#[derive(Subcommand)]
pub enum MaintenanceTask {
    /// Mark reports stuck in `generating` as failed
    CleanupReports {
        /// Age threshold in hours
        #[arg(long, default_value_t = 2)]
        stale_hours: u32,
    },
}

pub async fn handle_maintenance_command(
    task: MaintenanceTask,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let database: Arc<dyn DatabaseManager> =
        Arc::new(DatabaseManagerImpl::new_from_config(&config.database).await?);
    database.migrate().await?;

    match task {
        MaintenanceTask::CleanupReports { stale_hours } => {
            let job = ReportCleanupJob::new(
                database,
                ReportCleanupConfig {
                    schedule: String::new(),
                    stale_after_hours: stale_hours,
                },
            );
            let result = job.execute().await?;
            println!("{}", result.message);
        }
    }

    Ok(())
}
