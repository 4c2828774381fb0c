use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, sea_query::Expr,
};

use crate::database::entities::{BillingEventRecord, billing_events};
use crate::database::{DatabaseError, DatabaseResult};

/// Billing events DAO. The table is append-only: rows are inserted and at
/// most flipped to `processed`, never updated or deleted.
pub struct BillingEventsDao {
    db: DatabaseConnection,
}

impl BillingEventsDao {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Append an event. Returns false when a row with the same
    /// `source_event_id` already exists — the unique index turns duplicate
    /// webhook delivery into a no-op even under concurrent redelivery.
    pub async fn insert_idempotent<C: ConnectionTrait>(
        &self,
        conn: &C,
        record: &BillingEventRecord,
    ) -> DatabaseResult<bool> {
        let active_model = billing_events::ActiveModel {
            id: Set(record.id.clone()),
            workspace_id: Set(record.workspace_id.clone()),
            event_type: Set(record.event_type.clone()),
            source_event_id: Set(record.source_event_id.clone()),
            amount_cents: Set(record.amount_cents),
            currency: Set(record.currency.clone()),
            credits_added: Set(record.credits_added),
            credits_consumed: Set(record.credits_consumed),
            product_name: Set(record.product_name.clone()),
            plan_changed_to: Set(record.plan_changed_to.clone()),
            metadata: Set(record.metadata.clone()),
            processed: Set(record.processed),
            created_at: Set(record.created_at),
        };

        match active_model.insert(conn).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(false)
            }
            Err(e) => Err(DatabaseError::Database(e.to_string())),
        }
    }

    /// Flip an event to processed once its ledger effect is applied.
    pub async fn mark_processed<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> DatabaseResult<()> {
        let result = billing_events::Entity::update_many()
            .col_expr(billing_events::Column::Processed, Expr::value(true))
            .filter(billing_events::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    pub async fn exists_source_event(&self, source_event_id: &str) -> DatabaseResult<bool> {
        let existing = billing_events::Entity::find()
            .filter(billing_events::Column::SourceEventId.eq(source_event_id))
            .one(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))?;

        Ok(existing.is_some())
    }

    /// Recent events for a workspace, newest first.
    pub async fn list_for_workspace(
        &self,
        workspace_id: &str,
        limit: u64,
    ) -> DatabaseResult<Vec<BillingEventRecord>> {
        billing_events::Entity::find()
            .filter(billing_events::Column::WorkspaceId.eq(workspace_id))
            .order_by_desc(billing_events::Column::CreatedAt)
            .limit(Some(limit))
            .all(&self.db)
            .await
            .map_err(|e| DatabaseError::Database(e.to_string()))
    }
}
