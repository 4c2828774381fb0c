//! Database access layer with domain-specific DAOs.
//!
//! Each domain (reports, workspaces, billing events) has its own DAO for
//! focused operations; the manager trait exists for dependency injection
//! and testing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{ConnectOptions, DatabaseConnection};
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::health::{HealthCheckResult, HealthChecker};

pub mod dao;
pub mod entities;
pub mod migration;

pub use dao::{BillingEventsDao, ReportQuery, ReportsDao, ScoredUpdate, WorkspacesDao};

/// Database error types
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Record not found")]
    NotFound,
    #[error("Constraint violation: {0}")]
    Constraint(String),
    #[error("Migration error: {0}")]
    Migration(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Database manager trait for dependency injection and testing
#[async_trait]
pub trait DatabaseManager: Send + Sync {
    /// Run database migrations
    async fn migrate(&self) -> DatabaseResult<()>;

    /// Health check for database connection
    async fn health_check(&self) -> DatabaseResult<()>;

    /// Get reports DAO
    fn reports(&self) -> ReportsDao;

    /// Get workspaces DAO
    fn workspaces(&self) -> WorkspacesDao;

    /// Get billing events DAO
    fn billing_events(&self) -> BillingEventsDao;

    /// Get direct database connection (for transactions and admin
    /// operations)
    fn connection(&self) -> &DatabaseConnection;
}

/// Database connection manager implementation
pub struct DatabaseManagerImpl {
    connection: DatabaseConnection,
}

impl DatabaseManagerImpl {
    /// Create database manager from configuration
    pub async fn new_from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let mut options = ConnectOptions::new(config.url.clone());
        options
            .max_connections(config.max_connections)
            .connect_timeout(Duration::from_secs(10));

        // An in-memory SQLite pool must stay on a single connection or
        // each pooled connection sees its own empty database.
        if config.url.contains(":memory:") {
            options.max_connections(1);
        }

        let connection = sea_orm::Database::connect(options)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl DatabaseManager for DatabaseManagerImpl {
    async fn migrate(&self) -> DatabaseResult<()> {
        use crate::database::migration::Migrator;
        use sea_orm_migration::MigratorTrait;

        tracing::info!("Running database migrations");

        Migrator::up(&self.connection, None)
            .await
            .map_err(|e| DatabaseError::Migration(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Successfully completed all migrations");
        Ok(())
    }

    async fn health_check(&self) -> DatabaseResult<()> {
        self.connection
            .ping()
            .await
            .map_err(|e| DatabaseError::Database(format!("db error: {}", e)))
    }

    fn reports(&self) -> ReportsDao {
        ReportsDao::new(self.connection.clone())
    }

    fn workspaces(&self) -> WorkspacesDao {
        WorkspacesDao::new(self.connection.clone())
    }

    fn billing_events(&self) -> BillingEventsDao {
        BillingEventsDao::new(self.connection.clone())
    }

    fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}

#[async_trait]
impl HealthChecker for DatabaseManagerImpl {
    fn name(&self) -> &str {
        "database"
    }

    async fn check(&self) -> HealthCheckResult {
        match self.health_check().await {
            Ok(_) => HealthCheckResult::healthy_with_details(serde_json::json!({
                "status": "healthy",
                "connection": "ok"
            })),
            Err(err) => HealthCheckResult::unhealthy_with_details(
                "DB health check failed".to_string(),
                serde_json::json!({
                    "status": "unhealthy",
                    "error": err.to_string()
                }),
            ),
        }
    }
}

/// Convenience alias used by service constructors.
pub type SharedDatabase = Arc<dyn DatabaseManager>;
