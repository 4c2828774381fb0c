use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Billing and entitlement scope. The persisted row is the sole source of
/// truth for the credit balance; all mutation goes through the DAO so the
/// debit-then-log invariant holds.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "workspaces")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub plan: String,
    pub report_credits: i32,
    pub credits_reset_date: NaiveDate,
    pub can_publish: bool,
    pub reports_generated_this_month: i32,
    pub last_report_generated: Option<DateTime<Utc>>,
    pub processor_customer_id: Option<String>,
    pub processor_subscription_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
