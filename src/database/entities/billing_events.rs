use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Append-only record of every credit-affecting action, the audit trail
/// reconciling the ledger with the payment processor. `source_event_id`
/// carries the processor's event id and is unique, which is what makes
/// webhook replay idempotent.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "billing_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub workspace_id: String,
    pub event_type: String,
    pub source_event_id: Option<String>,
    pub amount_cents: Option<i64>,
    pub currency: String,
    pub credits_added: i32,
    pub credits_consumed: i32,
    pub product_name: Option<String>,
    pub plan_changed_to: Option<String>,
    pub metadata: Option<String>,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
