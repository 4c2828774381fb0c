use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Expr,
};

use crate::database::entities::{ReportRecord, reports};
use crate::database::{DatabaseError, DatabaseResult};

/// Filters for listing reports.
#[derive(Debug, Default)]
pub struct ReportQuery {
    pub report_type: Option<String>,
    pub workspace_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Fields written when a generation attempt completes successfully.
#[derive(Debug, Clone)]
pub struct ScoredUpdate {
    pub title: String,
    pub summary: String,
    pub data_json: String,
    pub overall_score: i32,
    pub confidence: String,
    pub generation_time_ms: i32,
    pub credit_cost: i32,
}

/// Reports DAO for database operations
pub struct ReportsDao {
    db: DatabaseConnection,
}

impl ReportsDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Store a new report row (normally in `generating` status).
    pub async fn insert(&self, record: &ReportRecord) -> DatabaseResult<()> {
        let active_model = reports::ActiveModel {
            id: Set(record.id.clone()),
            report_type: Set(record.report_type.clone()),
            website_id: Set(record.website_id.clone()),
            input_hash: Set(record.input_hash.clone()),
            title: Set(record.title.clone()),
            summary: Set(record.summary.clone()),
            data_json: Set(record.data_json.clone()),
            overall_score: Set(record.overall_score),
            confidence: Set(record.confidence.clone()),
            status: Set(record.status.clone()),
            generation_time_ms: Set(record.generation_time_ms),
            credit_cost: Set(record.credit_cost),
            user_id: Set(record.user_id.clone()),
            workspace_id: Set(record.workspace_id.clone()),
            created_at: Set(record.created_at),
            updated_at: Set(record.updated_at),
        };

        active_model
            .insert(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(())
    }

    /// Cache lookup: a completed report for the same normalized input.
    /// Only `ready` rows count; failed attempts never block a retry.
    pub async fn find_ready(
        &self,
        report_type: &str,
        input_hash: &str,
    ) -> DatabaseResult<Option<ReportRecord>> {
        let report = reports::Entity::find()
            .filter(reports::Column::ReportType.eq(report_type))
            .filter(reports::Column::InputHash.eq(input_hash))
            .filter(reports::Column::Status.eq("ready"))
            .order_by_desc(reports::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(report)
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<ReportRecord>> {
        reports::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }

    /// Transition a `generating` row to `ready` with its computed scores.
    pub async fn mark_ready(&self, id: &str, update: ScoredUpdate) -> DatabaseResult<()> {
        let existing = reports::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?
            .ok_or(DatabaseError::NotFound)?;

        let mut active_model = reports::ActiveModel::from(existing);
        active_model.title = Set(update.title);
        active_model.summary = Set(Some(update.summary));
        active_model.data_json = Set(Some(update.data_json));
        active_model.overall_score = Set(Some(update.overall_score));
        active_model.confidence = Set(Some(update.confidence));
        active_model.status = Set("ready".to_string());
        active_model.generation_time_ms = Set(Some(update.generation_time_ms));
        active_model.credit_cost = Set(update.credit_cost);
        active_model.updated_at = Set(Utc::now());

        active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(())
    }

    /// Transition a `generating` row to `failed`. Failed reports carry the
    /// error description in their summary and cost nothing.
    pub async fn mark_failed(&self, id: &str, summary: &str) -> DatabaseResult<()> {
        let existing = reports::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?
            .ok_or(DatabaseError::NotFound)?;

        let mut active_model = reports::ActiveModel::from(existing);
        active_model.summary = Set(Some(summary.to_string()));
        active_model.status = Set("failed".to_string());
        active_model.credit_cost = Set(0);
        active_model.updated_at = Set(Utc::now());

        active_model
            .update(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(())
    }

    /// List reports with filtering, newest first.
    pub async fn list(&self, query: &ReportQuery) -> DatabaseResult<Vec<ReportRecord>> {
        let mut select = reports::Entity::find();

        if let Some(ref report_type) = query.report_type {
            select = select.filter(reports::Column::ReportType.eq(report_type));
        }
        if let Some(ref workspace_id) = query.workspace_id {
            select = select.filter(reports::Column::WorkspaceId.eq(workspace_id));
        }
        if let Some(ref user_id) = query.user_id {
            select = select.filter(reports::Column::UserId.eq(user_id));
        }
        if let Some(ref status) = query.status {
            select = select.filter(reports::Column::Status.eq(status));
        }

        select = select.order_by_desc(reports::Column::CreatedAt);

        if let Some(limit) = query.limit {
            select = select.limit(Some(limit));
        }
        if let Some(offset) = query.offset {
            select = select.offset(Some(offset));
        }

        select
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }

    /// Total number of rows matching the query filters.
    pub async fn count(&self, query: &ReportQuery) -> DatabaseResult<u64> {
        let mut select = reports::Entity::find();

        if let Some(ref report_type) = query.report_type {
            select = select.filter(reports::Column::ReportType.eq(report_type));
        }
        if let Some(ref workspace_id) = query.workspace_id {
            select = select.filter(reports::Column::WorkspaceId.eq(workspace_id));
        }
        if let Some(ref user_id) = query.user_id {
            select = select.filter(reports::Column::UserId.eq(user_id));
        }
        if let Some(ref status) = query.status {
            select = select.filter(reports::Column::Status.eq(status));
        }

        select
            .count(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }

    /// Delete a report by id. Returns false when the id did not exist.
    pub async fn delete(&self, id: &str) -> DatabaseResult<bool> {
        let result = reports::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Mark reports stuck in `generating` since before the cutoff as
    /// failed. Returns the number of rows swept.
    pub async fn sweep_stale_generating(
        &self,
        cutoff: DateTime<Utc>,
    ) -> DatabaseResult<u64> {
        let result = reports::Entity::update_many()
            .col_expr(reports::Column::Status, Expr::value("failed"))
            .col_expr(
                reports::Column::Summary,
                Expr::value("Report generation did not complete"),
            )
            .col_expr(reports::Column::CreditCost, Expr::value(0))
            .filter(reports::Column::Status.eq("generating"))
            .filter(reports::Column::CreatedAt.lt(cutoff))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
