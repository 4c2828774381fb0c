use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A generated (or in-flight) report. `(report_type, input_hash)` is the
/// dedup key for `ready` rows; failed rows never satisfy a cache lookup.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub report_type: String,
    pub website_id: Option<String>,
    pub input_hash: String,
    pub title: String,
    pub summary: Option<String>,
    /// Full typed report payload, serialized to JSON.
    pub data_json: Option<String>,
    pub overall_score: Option<i32>,
    pub confidence: Option<String>,
    /// Lifecycle state: generating, ready or failed.
    pub status: String,
    pub generation_time_ms: Option<i32>,
    pub credit_cost: i32,
    pub user_id: Option<String>,
    pub workspace_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
