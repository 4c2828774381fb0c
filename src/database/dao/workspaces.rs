use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, SqlErr, sea_query::Expr,
};

use crate::database::entities::{WorkspaceRecord, workspaces};
use crate::database::{DatabaseError, DatabaseResult};

/// Workspaces DAO. The credit balance only ever changes through these
/// operations so the non-negativity and debit-then-log invariants hold.
pub struct WorkspacesDao {
    db: DatabaseConnection,
}

impl WorkspacesDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<WorkspaceRecord>> {
        workspaces::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }

    /// Fetch a workspace, lazily creating it with FREE-plan defaults on
    /// first sight. A concurrent create racing on the primary key falls
    /// back to re-fetching the winner's row.
    pub async fn get_or_create(
        &self,
        id: &str,
        default_plan: &str,
        default_credits: i32,
        reset_date: NaiveDate,
    ) -> DatabaseResult<WorkspaceRecord> {
        if let Some(existing) = self.find_by_id(id).await? {
            return Ok(existing);
        }

        let now = Utc::now();
        let active_model = workspaces::ActiveModel {
            id: Set(id.to_string()),
            name: Set("Default Workspace".to_string()),
            plan: Set(default_plan.to_string()),
            report_credits: Set(default_credits),
            credits_reset_date: Set(reset_date),
            can_publish: Set(false),
            reports_generated_this_month: Set(0),
            last_report_generated: Set(None),
            processor_customer_id: Set(None),
            processor_subscription_id: Set(None),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match active_model.insert(&self.db).await {
            Ok(created) => Ok(created),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => self
                .find_by_id(id)
                .await?
                .ok_or(DatabaseError::NotFound),
            Err(e) => Err(DatabaseError::Database(e.to_string())),
        }
    }

    /// Reset monthly credits if the reset date has passed. The date filter
    /// makes the reset exactly-once under concurrent entitlement lookups.
    pub async fn apply_monthly_reset(
        &self,
        id: &str,
        monthly_credits: i32,
        today: NaiveDate,
        next_reset: NaiveDate,
    ) -> DatabaseResult<bool> {
        let result = workspaces::Entity::update_many()
            .col_expr(workspaces::Column::ReportCredits, Expr::value(monthly_credits))
            .col_expr(workspaces::Column::ReportsGeneratedThisMonth, Expr::value(0))
            .col_expr(workspaces::Column::CreditsResetDate, Expr::value(next_reset))
            .col_expr(workspaces::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(workspaces::Column::Id.eq(id))
            .filter(workspaces::Column::CreditsResetDate.lt(today))
            .exec(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Atomic conditional debit. The `report_credits >= cost` guard (and
    /// the monthly cap guard when given) is evaluated inside the UPDATE,
    /// so two concurrent consumers can never both drain the same credits.
    /// Returns false when the guard rejected the debit.
    pub async fn try_debit<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        cost: i32,
        monthly_cap: Option<i32>,
    ) -> DatabaseResult<bool> {
        let mut update = workspaces::Entity::update_many()
            .col_expr(
                workspaces::Column::ReportCredits,
                Expr::col(workspaces::Column::ReportCredits).sub(cost),
            )
            .col_expr(
                workspaces::Column::ReportsGeneratedThisMonth,
                Expr::col(workspaces::Column::ReportsGeneratedThisMonth).add(1),
            )
            .col_expr(
                workspaces::Column::LastReportGenerated,
                Expr::value(Some(Utc::now())),
            )
            .col_expr(workspaces::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(workspaces::Column::Id.eq(id))
            .filter(workspaces::Column::ReportCredits.gte(cost));

        if let Some(cap) = monthly_cap {
            update = update.filter(workspaces::Column::ReportsGeneratedThisMonth.lt(cap));
        }

        let result = update
            .exec(conn)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    /// Increment the credit balance (purchases, refunds).
    pub async fn add_credits<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        amount: i32,
    ) -> DatabaseResult<()> {
        let result = workspaces::Entity::update_many()
            .col_expr(
                workspaces::Column::ReportCredits,
                Expr::col(workspaces::Column::ReportCredits).add(amount),
            )
            .col_expr(workspaces::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(workspaces::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    /// Apply a plan change from a subscription event.
    pub async fn set_plan<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        plan: &str,
        can_publish: bool,
        customer_id: Option<&str>,
        subscription_id: Option<&str>,
    ) -> DatabaseResult<()> {
        let mut update = workspaces::Entity::update_many()
            .col_expr(workspaces::Column::Plan, Expr::value(plan))
            .col_expr(workspaces::Column::CanPublish, Expr::value(can_publish))
            .col_expr(workspaces::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(workspaces::Column::Id.eq(id));

        if let Some(customer) = customer_id {
            update = update.col_expr(
                workspaces::Column::ProcessorCustomerId,
                Expr::value(Some(customer.to_string())),
            );
        }
        if let Some(subscription) = subscription_id {
            update = update.col_expr(
                workspaces::Column::ProcessorSubscriptionId,
                Expr::value(Some(subscription.to_string())),
            );
        }

        let result = update
            .exec(conn)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}
