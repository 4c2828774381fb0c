//! Entitlement ledger and billing-event reconciliation.
//!
//! The persisted workspace row is the sole source of truth for credits.
//! Every mutation pairs the ledger change with an appended billing event
//! inside one transaction, and debits happen through a conditional UPDATE
//! so concurrent consumers can never drive the balance negative.

pub mod plans;
pub mod webhook;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{BillingConfig, CancellationPolicy};
use crate::database::entities::BillingEventRecord;
use crate::database::DatabaseManager;
use crate::error::AppError;
use crate::metrics;
use crate::reports::types::ReportType;

pub use plans::{CREDIT_PACKS, CreditPack, FREE_MONTHLY_REPORT_CAP, Plan, report_cost};
pub use webhook::{ProductType, WebhookEvent, WebhookOutcome};

/// Current entitlements for a workspace.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Entitlements {
    pub workspace_id: String,
    pub plan: Plan,
    pub report_credits: i32,
    pub can_publish: bool,
    pub reports_generated_this_month: i32,
    pub credits_reset_date: NaiveDate,
}

/// Outcome of an access check for one report type.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportAccess {
    pub can_generate: bool,
    pub has_credits: bool,
    pub credits_available: i32,
    pub credits_needed: i32,
    pub plan: Plan,
    pub limit_reason: Option<String>,
    pub upgrade_required: bool,
}

/// Successful credit consumption.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreditConsumption {
    pub credits_consumed: i32,
    pub credits_remaining: i32,
}

/// Aggregated billing activity for a workspace.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsageStats {
    pub workspace_id: String,
    pub credits_available: i32,
    pub total_reports_generated: usize,
    pub total_credits_consumed: i64,
    pub report_breakdown: HashMap<String, usize>,
    pub recent_events: Vec<BillingEventRecord>,
}

/// Pricing catalog surfaced to the frontend.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PricingInfo {
    pub plans: Vec<PlanInfo>,
    pub credit_packs: Vec<CreditPack>,
    pub report_costs: HashMap<String, i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanInfo {
    pub plan: Plan,
    pub name: &'static str,
    pub price_cents: i64,
    pub monthly_credits: i32,
    pub can_publish: bool,
}

/// A created checkout session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CheckoutSession {
    pub session_id: String,
    pub checkout_url: String,
    pub mock: bool,
}

pub struct BillingService {
    database: Arc<dyn DatabaseManager>,
    config: BillingConfig,
}

impl BillingService {
    pub fn new(database: Arc<dyn DatabaseManager>, config: BillingConfig) -> Self {
        Self { database, config }
    }

    /// Current entitlements, lazily creating a FREE workspace and applying
    /// the monthly reset when its date has passed.
    pub async fn entitlements(&self, workspace_id: &str) -> Result<Entitlements, AppError> {
        let dao = self.database.workspaces();
        let today = Utc::now().date_naive();
        let default_reset = today + Duration::days(plans::CREDIT_RESET_INTERVAL_DAYS);

        let mut workspace = dao
            .get_or_create(
                workspace_id,
                Plan::Free.as_str(),
                Plan::Free.monthly_credits(),
                default_reset,
            )
            .await?;

        if workspace.credits_reset_date < today {
            let plan = parse_plan(&workspace.plan);
            let reset = dao
                .apply_monthly_reset(
                    workspace_id,
                    plan.monthly_credits(),
                    today,
                    today + Duration::days(plans::CREDIT_RESET_INTERVAL_DAYS),
                )
                .await?;
            if reset {
                info!(
                    workspace_id,
                    credits = plan.monthly_credits(),
                    "monthly credit reset applied"
                );
            }
            workspace = dao
                .find_by_id(workspace_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("workspace {workspace_id}")))?;
        }

        Ok(Entitlements {
            workspace_id: workspace.id,
            plan: parse_plan(&workspace.plan),
            report_credits: workspace.report_credits,
            can_publish: workspace.can_publish,
            reports_generated_this_month: workspace.reports_generated_this_month,
            credits_reset_date: workspace.credits_reset_date,
        })
    }

    /// Can this workspace generate a report of the given type right now?
    pub async fn check_access(
        &self,
        workspace_id: &str,
        report_type: ReportType,
    ) -> Result<ReportAccess, AppError> {
        let entitlements = self.entitlements(workspace_id).await?;
        let credits_needed = report_cost(report_type);
        let has_credits = entitlements.report_credits >= credits_needed;

        let limit_reason = if entitlements.plan == Plan::Free
            && entitlements.reports_generated_this_month >= FREE_MONTHLY_REPORT_CAP
        {
            Some(format!(
                "Free plan monthly limit reached ({FREE_MONTHLY_REPORT_CAP} reports)"
            ))
        } else {
            None
        };

        let can_generate = has_credits && limit_reason.is_none();

        Ok(ReportAccess {
            can_generate,
            has_credits,
            credits_available: entitlements.report_credits,
            credits_needed,
            plan: entitlements.plan,
            limit_reason,
            upgrade_required: !can_generate,
        })
    }

    /// Pre-flight gate: like `check_access` but turns a denial into the
    /// structured payment-required error.
    pub async fn require_access(
        &self,
        workspace_id: &str,
        report_type: ReportType,
    ) -> Result<ReportAccess, AppError> {
        let access = self.check_access(workspace_id, report_type).await?;
        if !access.can_generate {
            return Err(insufficient(&access));
        }
        Ok(access)
    }

    /// Debit credits for a generated report and append the paired
    /// `report_generated` event. Access is re-validated here — state may
    /// have changed since the pre-flight check — and the debit itself is
    /// guarded inside the UPDATE, so a losing racer gets a structured
    /// rejection and an untouched balance.
    pub async fn consume(
        &self,
        workspace_id: &str,
        report_type: ReportType,
        report_id: &str,
    ) -> Result<CreditConsumption, AppError> {
        let access = self.check_access(workspace_id, report_type).await?;
        if !access.can_generate {
            return Err(insufficient(&access));
        }

        let cost = access.credits_needed;
        let monthly_cap =
            (access.plan == Plan::Free).then_some(FREE_MONTHLY_REPORT_CAP);

        let txn = self
            .database
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("failed to open transaction: {e}")))?;

        let workspaces = self.database.workspaces();
        let debited = workspaces
            .try_debit(&txn, workspace_id, cost, monthly_cap)
            .await?;

        if !debited {
            txn.rollback()
                .await
                .map_err(|e| AppError::Internal(format!("rollback failed: {e}")))?;
            warn!(
                workspace_id,
                report_type = report_type.as_str(),
                "credit debit rejected at consumption time"
            );
            let access = self.check_access(workspace_id, report_type).await?;
            return Err(insufficient(&access));
        }

        let event = BillingEventRecord {
            id: Uuid::new_v4().to_string(),
            workspace_id: workspace_id.to_string(),
            event_type: "report_generated".to_string(),
            source_event_id: None,
            amount_cents: None,
            currency: self.config.currency.clone(),
            credits_added: 0,
            credits_consumed: cost,
            product_name: Some(format!("{} Report", report_type.as_str())),
            plan_changed_to: None,
            metadata: Some(
                serde_json::json!({
                    "report_id": report_id,
                    "report_type": report_type.as_str(),
                })
                .to_string(),
            ),
            processed: true,
            created_at: Utc::now(),
        };

        self.database
            .billing_events()
            .insert_idempotent(&txn, &event)
            .await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Internal(format!("commit failed: {e}")))?;

        let remaining = self
            .database
            .workspaces()
            .find_by_id(workspace_id)
            .await?
            .map(|w| w.report_credits)
            .unwrap_or(0);

        metrics::track_credits_consumed(report_type.as_str(), cost);
        info!(
            workspace_id,
            report_type = report_type.as_str(),
            cost,
            remaining,
            "credits consumed"
        );

        Ok(CreditConsumption {
            credits_consumed: cost,
            credits_remaining: remaining,
        })
    }

    /// Add purchased credits, idempotent per processor event id.
    pub async fn add_credits(
        &self,
        workspace_id: &str,
        credits: i32,
        source: &str,
        source_event_id: Option<&str>,
        amount_cents: Option<i64>,
        product_name: Option<String>,
    ) -> Result<WebhookOutcome, AppError> {
        let today = Utc::now().date_naive();
        self.database
            .workspaces()
            .get_or_create(
                workspace_id,
                Plan::Free.as_str(),
                Plan::Free.monthly_credits(),
                today + Duration::days(plans::CREDIT_RESET_INTERVAL_DAYS),
            )
            .await?;

        let txn = self
            .database
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("failed to open transaction: {e}")))?;

        let event_id = Uuid::new_v4().to_string();
        let event = BillingEventRecord {
            id: event_id.clone(),
            workspace_id: workspace_id.to_string(),
            event_type: "credits_purchased".to_string(),
            source_event_id: source_event_id.map(String::from),
            amount_cents,
            currency: self.config.currency.clone(),
            credits_added: credits,
            credits_consumed: 0,
            product_name,
            plan_changed_to: None,
            metadata: Some(serde_json::json!({ "source": source }).to_string()),
            processed: false,
            created_at: Utc::now(),
        };

        let events = self.database.billing_events();
        if !events.insert_idempotent(&txn, &event).await? {
            txn.rollback()
                .await
                .map_err(|e| AppError::Internal(format!("rollback failed: {e}")))?;
            info!(workspace_id, source_event_id, "duplicate credit purchase event ignored");
            return Ok(WebhookOutcome::Duplicate);
        }

        self.database
            .workspaces()
            .add_credits(&txn, workspace_id, credits)
            .await?;
        events.mark_processed(&txn, &event_id).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Internal(format!("commit failed: {e}")))?;

        info!(workspace_id, credits, source, "credits added");
        Ok(WebhookOutcome::Applied)
    }

    /// Apply a verified payment-processor notification to the ledger.
    pub async fn apply_webhook(&self, event: &WebhookEvent) -> Result<WebhookOutcome, AppError> {
        // Duplicate delivery is silent success regardless of kind.
        if self
            .database
            .billing_events()
            .exists_source_event(&event.event_id)
            .await?
        {
            metrics::track_webhook_event(&event.kind, "duplicate");
            return Ok(WebhookOutcome::Duplicate);
        }

        let outcome = match event.kind.as_str() {
            webhook::KIND_CHECKOUT_COMPLETED => self.apply_checkout_completed(event).await?,
            webhook::KIND_SUBSCRIPTION_CREATED | webhook::KIND_SUBSCRIPTION_UPDATED => {
                self.record_audit_event(event, "subscription_updated").await?
            }
            webhook::KIND_SUBSCRIPTION_DELETED => self.apply_subscription_canceled(event).await?,
            webhook::KIND_PAYMENT_SUCCEEDED => {
                self.record_audit_event(event, "payment_succeeded").await?
            }
            other => {
                info!(kind = other, event_id = %event.event_id, "unhandled webhook event kind");
                WebhookOutcome::Unhandled
            }
        };

        let label = match outcome {
            WebhookOutcome::Applied => "applied",
            WebhookOutcome::Duplicate => "duplicate",
            WebhookOutcome::Unhandled => "unhandled",
        };
        metrics::track_webhook_event(&event.kind, label);
        Ok(outcome)
    }

    async fn apply_checkout_completed(
        &self,
        event: &WebhookEvent,
    ) -> Result<WebhookOutcome, AppError> {
        let workspace_id = event
            .workspace_id
            .as_deref()
            .ok_or_else(|| AppError::InvalidInput("checkout event missing workspace_id".into()))?;

        match event.product_type {
            Some(ProductType::CreditPack) => {
                let pack = event
                    .credit_pack_id
                    .as_deref()
                    .and_then(plans::credit_pack);
                let credits = event
                    .credits
                    .or(pack.map(|p| p.credits))
                    .ok_or_else(|| {
                        AppError::InvalidInput("credit pack checkout without credits".into())
                    })?;
                let product_name = pack
                    .map(|p| p.name.to_string())
                    .unwrap_or_else(|| format!("Credit Pack - {credits} credits"));

                self.add_credits(
                    workspace_id,
                    credits,
                    "purchase",
                    Some(&event.event_id),
                    event.amount_cents,
                    Some(product_name),
                )
                .await
            }
            Some(ProductType::Subscription) => {
                let plan: Plan = event
                    .plan
                    .as_deref()
                    .and_then(|p| p.parse().ok())
                    .ok_or_else(|| {
                        AppError::InvalidInput("subscription checkout with unknown plan".into())
                    })?;

                self.apply_plan_change(workspace_id, event, plan, "subscription_created")
                    .await
            }
            None => Err(AppError::InvalidInput(
                "checkout event missing product_type".into(),
            )),
        }
    }

    async fn apply_subscription_canceled(
        &self,
        event: &WebhookEvent,
    ) -> Result<WebhookOutcome, AppError> {
        match self.config.cancellation_policy {
            CancellationPolicy::PeriodEnd => {
                // Entitlements survive until the period lapses; only the
                // audit trail records the cancellation now.
                self.record_audit_event(event, "subscription_canceled").await
            }
            CancellationPolicy::Immediate => {
                let Some(workspace_id) = event.workspace_id.as_deref() else {
                    return self.record_audit_event(event, "subscription_canceled").await;
                };
                self.apply_plan_change(workspace_id, event, Plan::Free, "subscription_canceled")
                    .await
            }
        }
    }

    async fn apply_plan_change(
        &self,
        workspace_id: &str,
        event: &WebhookEvent,
        plan: Plan,
        event_type: &str,
    ) -> Result<WebhookOutcome, AppError> {
        let today = Utc::now().date_naive();
        self.database
            .workspaces()
            .get_or_create(
                workspace_id,
                Plan::Free.as_str(),
                Plan::Free.monthly_credits(),
                today + Duration::days(plans::CREDIT_RESET_INTERVAL_DAYS),
            )
            .await?;

        let txn = self
            .database
            .connection()
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("failed to open transaction: {e}")))?;

        let record_id = Uuid::new_v4().to_string();
        let record = BillingEventRecord {
            id: record_id.clone(),
            workspace_id: workspace_id.to_string(),
            event_type: event_type.to_string(),
            source_event_id: Some(event.event_id.clone()),
            amount_cents: event.amount_cents,
            currency: self.config.currency.clone(),
            credits_added: 0,
            credits_consumed: 0,
            product_name: Some(plan.display_name().to_string()),
            plan_changed_to: Some(plan.as_str().to_string()),
            metadata: None,
            processed: false,
            created_at: Utc::now(),
        };

        let events = self.database.billing_events();
        if !events.insert_idempotent(&txn, &record).await? {
            txn.rollback()
                .await
                .map_err(|e| AppError::Internal(format!("rollback failed: {e}")))?;
            return Ok(WebhookOutcome::Duplicate);
        }

        self.database
            .workspaces()
            .set_plan(
                &txn,
                workspace_id,
                plan.as_str(),
                plan.can_publish(),
                event.customer_id.as_deref(),
                event.subscription_id.as_deref(),
            )
            .await?;
        events.mark_processed(&txn, &record_id).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Internal(format!("commit failed: {e}")))?;

        info!(workspace_id, plan = plan.as_str(), event_type, "plan updated");
        Ok(WebhookOutcome::Applied)
    }

    /// Record a processor event for audit without touching entitlements.
    async fn record_audit_event(
        &self,
        event: &WebhookEvent,
        event_type: &str,
    ) -> Result<WebhookOutcome, AppError> {
        let workspace_id = event.workspace_id.as_deref().unwrap_or("unattributed");

        // Audit rows reference the workspace table; materialize the row
        // first so events for not-yet-seen workspaces still land.
        let today = Utc::now().date_naive();
        self.database
            .workspaces()
            .get_or_create(
                workspace_id,
                Plan::Free.as_str(),
                Plan::Free.monthly_credits(),
                today + Duration::days(plans::CREDIT_RESET_INTERVAL_DAYS),
            )
            .await?;

        let record = BillingEventRecord {
            id: Uuid::new_v4().to_string(),
            workspace_id: workspace_id.to_string(),
            event_type: event_type.to_string(),
            source_event_id: Some(event.event_id.clone()),
            amount_cents: event.amount_cents,
            currency: self.config.currency.clone(),
            credits_added: 0,
            credits_consumed: 0,
            product_name: None,
            plan_changed_to: None,
            metadata: None,
            processed: true,
            created_at: Utc::now(),
        };

        let inserted = self
            .database
            .billing_events()
            .insert_idempotent(self.database.connection(), &record)
            .await?;

        if inserted {
            Ok(WebhookOutcome::Applied)
        } else {
            Ok(WebhookOutcome::Duplicate)
        }
    }

    /// Aggregate billing activity for a workspace.
    pub async fn usage_stats(&self, workspace_id: &str) -> Result<UsageStats, AppError> {
        let entitlements = self.entitlements(workspace_id).await?;
        let events = self
            .database
            .billing_events()
            .list_for_workspace(workspace_id, 500)
            .await?;

        let mut total_reports = 0;
        let mut total_credits: i64 = 0;
        let mut breakdown: HashMap<String, usize> = HashMap::new();

        for event in &events {
            if event.event_type == "report_generated" {
                total_reports += 1;
                total_credits += event.credits_consumed as i64;
                if let Some(report_type) = event
                    .metadata
                    .as_deref()
                    .and_then(|m| serde_json::from_str::<serde_json::Value>(m).ok())
                    .and_then(|v| v["report_type"].as_str().map(String::from))
                {
                    *breakdown.entry(report_type).or_default() += 1;
                }
            }
        }

        Ok(UsageStats {
            workspace_id: workspace_id.to_string(),
            credits_available: entitlements.report_credits,
            total_reports_generated: total_reports,
            total_credits_consumed: total_credits,
            report_breakdown: breakdown,
            recent_events: events.into_iter().take(10).collect(),
        })
    }

    /// Static pricing catalog.
    pub fn pricing(&self) -> PricingInfo {
        let plans = [Plan::Pro, Plan::Enterprise]
            .into_iter()
            .map(|plan| PlanInfo {
                plan,
                name: plan.display_name(),
                price_cents: plan.price_cents(),
                monthly_credits: plan.monthly_credits(),
                can_publish: plan.can_publish(),
            })
            .collect();

        let report_costs = ReportType::all()
            .into_iter()
            .map(|t| (t.as_str().to_string(), report_cost(t)))
            .collect();

        PricingInfo {
            plans,
            credit_packs: CREDIT_PACKS.to_vec(),
            report_costs,
        }
    }

    /// Create a checkout session with the payment processor. Only the
    /// mock processor is wired in; a live integration plugs in behind the
    /// same contract.
    pub async fn create_checkout(
        &self,
        workspace_id: &str,
        product_type: ProductType,
        product_id: &str,
    ) -> Result<CheckoutSession, AppError> {
        match product_type {
            ProductType::Subscription => {
                let _plan: Plan = product_id
                    .parse()
                    .map_err(|_| AppError::InvalidInput(format!("invalid plan: {product_id}")))?;
            }
            ProductType::CreditPack => {
                if plans::credit_pack(product_id).is_none() {
                    return Err(AppError::InvalidInput(format!(
                        "invalid credit pack: {product_id}"
                    )));
                }
            }
        }

        if !self.config.checkout_mock {
            return Err(AppError::Upstream(
                "payment processor is not configured".to_string(),
            ));
        }

        let session_id = format!("cs_mock_{}", Uuid::new_v4().simple());
        info!(workspace_id, product_id, session_id, "mock checkout session created");
        Ok(CheckoutSession {
            checkout_url: format!("https://checkout.invalid/pay/{session_id}"),
            session_id,
            mock: true,
        })
    }
}

fn parse_plan(raw: &str) -> Plan {
    raw.parse().unwrap_or(Plan::Free)
}

fn insufficient(access: &ReportAccess) -> AppError {
    AppError::InsufficientAccess {
        reason: access
            .limit_reason
            .clone()
            .unwrap_or_else(|| "Insufficient credits".to_string()),
        credits_available: access.credits_available,
        credits_needed: access.credits_needed,
        upgrade_required: access.upgrade_required,
    }
}

/// Ignore-and-log wrapper used after successful report generation, where
/// billing failure must not surface to the caller.
pub async fn consume_after_generation(
    billing: &BillingService,
    workspace_id: &str,
    report_type: ReportType,
    report_id: &str,
) -> Option<CreditConsumption> {
    match billing.consume(workspace_id, report_type, report_id).await {
        Ok(consumption) => Some(consumption),
        Err(e) => {
            warn!(
                workspace_id,
                report_id,
                error = %e,
                "credit consumption failed after report generation; report is still returned"
            );
            None
        }
    }
}
