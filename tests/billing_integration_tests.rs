use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait};

use marketpulse::billing::{Plan, ProductType, WebhookEvent, WebhookOutcome};
use marketpulse::config::CancellationPolicy;
use marketpulse::database::entities::workspaces;
use marketpulse::error::AppError;
use marketpulse::reports::ReportType;
use marketpulse::test_utils::TestServerBuilder;
use marketpulse::Server;

fn checkout_event(
    event_id: &str,
    workspace_id: &str,
    product_type: ProductType,
) -> WebhookEvent {
    WebhookEvent {
        event_id: event_id.to_string(),
        kind: "checkout.session.completed".to_string(),
        workspace_id: Some(workspace_id.to_string()),
        product_type: Some(product_type),
        plan: None,
        credit_pack_id: None,
        credits: None,
        amount_cents: Some(1_900),
        currency: Some("USD".to_string()),
        customer_id: Some("cus_123".to_string()),
        subscription_id: None,
    }
}

async fn set_workspace(
    server: &Server,
    id: &str,
    f: impl FnOnce(&mut workspaces::ActiveModel),
) {
    let workspace = workspaces::Entity::find_by_id(id)
        .one(server.database.connection())
        .await
        .unwrap()
        .unwrap();
    let mut active: workspaces::ActiveModel = workspace.into();
    f(&mut active);
    active.update(server.database.connection()).await.unwrap();
}

#[tokio::test]
async fn test_lazy_workspace_creation_with_free_defaults() {
    let server = TestServerBuilder::new().build().await;

    let entitlements = server.billing_service.entitlements("ws-new").await.unwrap();
    assert_eq!(entitlements.plan, Plan::Free);
    assert_eq!(entitlements.report_credits, 3);
    assert!(!entitlements.can_publish);
    assert_eq!(entitlements.reports_generated_this_month, 0);
    assert!(entitlements.credits_reset_date > Utc::now().date_naive());
}

#[tokio::test]
async fn test_credit_pack_webhook_is_idempotent() {
    let server = TestServerBuilder::new().build().await;
    let workspace = "ws-pack";

    let mut event = checkout_event("evt_pack_1", workspace, ProductType::CreditPack);
    event.credit_pack_id = Some("pack_10".to_string());

    let outcome = server.billing_service.apply_webhook(&event).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Applied);

    let entitlements = server.billing_service.entitlements(workspace).await.unwrap();
    assert_eq!(entitlements.report_credits, 13);

    // Redelivery of the same processor event changes nothing.
    let outcome = server.billing_service.apply_webhook(&event).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Duplicate);

    let entitlements = server.billing_service.entitlements(workspace).await.unwrap();
    assert_eq!(entitlements.report_credits, 13);
}

#[tokio::test]
async fn test_subscription_checkout_sets_plan_and_publish() {
    let server = TestServerBuilder::new().build().await;
    let workspace = "ws-sub";

    let mut event = checkout_event("evt_sub_1", workspace, ProductType::Subscription);
    event.plan = Some("PRO".to_string());
    event.subscription_id = Some("sub_123".to_string());

    let outcome = server.billing_service.apply_webhook(&event).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Applied);

    let entitlements = server.billing_service.entitlements(workspace).await.unwrap();
    assert_eq!(entitlements.plan, Plan::Pro);
    assert!(entitlements.can_publish);
}

#[tokio::test]
async fn test_webhook_unknown_kind_is_accepted() {
    let server = TestServerBuilder::new().build().await;

    let event = WebhookEvent {
        event_id: "evt_odd_1".to_string(),
        kind: "charge.refund.updated".to_string(),
        workspace_id: None,
        product_type: None,
        plan: None,
        credit_pack_id: None,
        credits: None,
        amount_cents: None,
        currency: None,
        customer_id: None,
        subscription_id: None,
    };

    let outcome = server.billing_service.apply_webhook(&event).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Unhandled);
}

#[tokio::test]
async fn test_checkout_webhook_without_workspace_is_rejected() {
    let server = TestServerBuilder::new().build().await;

    let mut event = checkout_event("evt_bad_1", "ignored", ProductType::CreditPack);
    event.workspace_id = None;

    let err = server.billing_service.apply_webhook(&event).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_cancellation_default_policy_keeps_entitlements() {
    let server = TestServerBuilder::new().build().await;
    let workspace = "ws-cancel-lazy";

    let mut event = checkout_event("evt_sub_2", workspace, ProductType::Subscription);
    event.plan = Some("PRO".to_string());
    server.billing_service.apply_webhook(&event).await.unwrap();

    let cancel = WebhookEvent {
        event_id: "evt_cancel_1".to_string(),
        kind: "customer.subscription.deleted".to_string(),
        workspace_id: Some(workspace.to_string()),
        ..checkout_event("evt_cancel_1", workspace, ProductType::Subscription)
    };
    let outcome = server.billing_service.apply_webhook(&cancel).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Applied);

    // period_end policy: plan survives, only the audit trail records it.
    let entitlements = server.billing_service.entitlements(workspace).await.unwrap();
    assert_eq!(entitlements.plan, Plan::Pro);
    assert!(entitlements.can_publish);
}

#[tokio::test]
async fn test_cancellation_immediate_policy_downgrades() {
    let server = TestServerBuilder::new()
        .configure(|c| c.billing.cancellation_policy = CancellationPolicy::Immediate)
        .build()
        .await;
    let workspace = "ws-cancel-now";

    let mut event = checkout_event("evt_sub_3", workspace, ProductType::Subscription);
    event.plan = Some("ENTERPRISE".to_string());
    server.billing_service.apply_webhook(&event).await.unwrap();

    let cancel = WebhookEvent {
        event_id: "evt_cancel_2".to_string(),
        kind: "customer.subscription.deleted".to_string(),
        ..checkout_event("evt_cancel_2", workspace, ProductType::Subscription)
    };
    server.billing_service.apply_webhook(&cancel).await.unwrap();

    let entitlements = server.billing_service.entitlements(workspace).await.unwrap();
    assert_eq!(entitlements.plan, Plan::Free);
    assert!(!entitlements.can_publish);
}

#[tokio::test]
async fn test_monthly_reset_applies_once() {
    let server = TestServerBuilder::new().build().await;
    let workspace = "ws-reset";

    server.billing_service.entitlements(workspace).await.unwrap();
    server
        .billing_service
        .consume(workspace, ReportType::SpendBaseline, "report-x")
        .await
        .unwrap();

    let entitlements = server.billing_service.entitlements(workspace).await.unwrap();
    assert_eq!(entitlements.report_credits, 1);
    assert_eq!(entitlements.reports_generated_this_month, 1);

    // Push the reset date into the past.
    let yesterday = Utc::now().date_naive() - Duration::days(1);
    set_workspace(&server, workspace, |active| {
        active.credits_reset_date = Set(yesterday);
    })
    .await;

    let entitlements = server.billing_service.entitlements(workspace).await.unwrap();
    assert_eq!(entitlements.report_credits, 3);
    assert_eq!(entitlements.reports_generated_this_month, 0);
    assert!(entitlements.credits_reset_date > Utc::now().date_naive());

    // A second lookup in the same period does not reset again.
    server
        .billing_service
        .consume(workspace, ReportType::TrackingReadiness, "report-y")
        .await
        .unwrap();
    let entitlements = server.billing_service.entitlements(workspace).await.unwrap();
    assert_eq!(entitlements.report_credits, 2);
    assert_eq!(entitlements.reports_generated_this_month, 1);
}

#[tokio::test]
async fn test_consume_rejects_below_zero() {
    let server = TestServerBuilder::new().build().await;
    let workspace = "ws-floor";

    // 3 credits cover exactly one competitor snapshot.
    let consumption = server
        .billing_service
        .consume(workspace, ReportType::CompetitorSnapshot, "report-1")
        .await
        .unwrap();
    assert_eq!(consumption.credits_consumed, 3);
    assert_eq!(consumption.credits_remaining, 0);

    let err = server
        .billing_service
        .consume(workspace, ReportType::CompetitorSnapshot, "report-2")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientAccess { .. }));

    let entitlements = server.billing_service.entitlements(workspace).await.unwrap();
    assert_eq!(entitlements.report_credits, 0, "balance must be unchanged");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_consume_with_one_credit() {
    let server = TestServerBuilder::new().build().await;
    let workspace = "ws-race";

    server.billing_service.entitlements(workspace).await.unwrap();
    set_workspace(&server, workspace, |active| {
        active.report_credits = Set(1);
    })
    .await;

    let billing_a = server.billing_service.clone();
    let billing_b = server.billing_service.clone();
    let (first, second) = tokio::join!(
        billing_a.consume(workspace, ReportType::TrackingReadiness, "race-1"),
        billing_b.consume(workspace, ReportType::TrackingReadiness, "race-2"),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one racer may win the last credit");

    let loser = if first.is_err() { first } else { second };
    assert!(matches!(
        loser.unwrap_err(),
        AppError::InsufficientAccess { .. }
    ));

    let entitlements = server.billing_service.entitlements(workspace).await.unwrap();
    assert_eq!(entitlements.report_credits, 0);
}

#[tokio::test]
async fn test_usage_stats_aggregate_consumption() {
    let server = TestServerBuilder::new().build().await;
    let workspace = "ws-stats";

    server
        .billing_service
        .consume(workspace, ReportType::TrackingReadiness, "r-1")
        .await
        .unwrap();
    server
        .billing_service
        .consume(workspace, ReportType::SpendBaseline, "r-2")
        .await
        .unwrap();

    let stats = server.billing_service.usage_stats(workspace).await.unwrap();
    assert_eq!(stats.total_reports_generated, 2);
    assert_eq!(stats.total_credits_consumed, 3);
    assert_eq!(stats.report_breakdown["TRACKING_READINESS"], 1);
    assert_eq!(stats.report_breakdown["SPEND_BASELINE"], 1);
    assert_eq!(stats.credits_available, 0);
    assert!(!stats.recent_events.is_empty());
}

#[tokio::test]
async fn test_checkout_session_creation() {
    let server = TestServerBuilder::new().build().await;

    let session = server
        .billing_service
        .create_checkout("ws-checkout", ProductType::Subscription, "PRO")
        .await
        .unwrap();
    assert!(session.mock);
    assert!(session.session_id.starts_with("cs_mock_"));

    let err = server
        .billing_service
        .create_checkout("ws-checkout", ProductType::CreditPack, "pack_999")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_pricing_catalog() {
    let server = TestServerBuilder::new().build().await;
    let pricing = server.billing_service.pricing();

    assert_eq!(pricing.plans.len(), 2);
    assert_eq!(pricing.credit_packs.len(), 3);
    assert_eq!(pricing.report_costs["COMPETITOR_SNAPSHOT"], 3);
}
