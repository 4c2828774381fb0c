use std::time::Duration;

use marketpulse::connectors::{AdAccountRef, AdPlatform};
use marketpulse::database::ReportQuery;
use marketpulse::error::AppError;
use marketpulse::reports::{
    CompetitorSnapshotRequest, ReportType, SpendBaselineRequest, TrackingReadinessRequest,
};
use marketpulse::test_utils::TestServerBuilder;

fn tracking_request(url: &str, workspace_id: &str) -> TrackingReadinessRequest {
    TrackingReadinessRequest {
        url: url.to_string(),
        workspace_id: workspace_id.to_string(),
        user_id: Some("user-1".to_string()),
        background: false,
    }
}

fn account(platform: AdPlatform, id: &str) -> AdAccountRef {
    AdAccountRef {
        platform,
        account_id: id.to_string(),
        account_name: None,
        currency: Some("USD".to_string()),
    }
}

#[tokio::test]
async fn test_tracking_report_generates_and_charges_one_credit() {
    let server = TestServerBuilder::new().build().await;

    let report = server
        .report_service
        .generate_tracking_readiness(tracking_request("https://example.com", "ws-gen"))
        .await
        .unwrap();

    assert_eq!(report.status, "ready");
    assert_eq!(report.report_type, "TRACKING_READINESS");
    let score = report.overall_score.unwrap();
    assert!((0..=100).contains(&score));
    assert!(report.confidence.is_some());
    assert_eq!(report.credit_cost, 1);
    assert!(report.generation_time_ms.is_some());

    let entitlements = server.billing_service.entitlements("ws-gen").await.unwrap();
    assert_eq!(entitlements.report_credits, 2);
    assert_eq!(entitlements.reports_generated_this_month, 1);
}

#[tokio::test]
async fn test_cache_hit_returns_same_report_without_charging() {
    let server = TestServerBuilder::new().build().await;

    let first = server
        .report_service
        .generate_tracking_readiness(tracking_request("https://cached.example", "ws-cache"))
        .await
        .unwrap();

    // Same normalized input, different surface form.
    let second = server
        .report_service
        .generate_tracking_readiness(tracking_request("https://cached.example/", "ws-cache"))
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.status, "ready");

    let entitlements = server.billing_service.entitlements("ws-cache").await.unwrap();
    assert_eq!(entitlements.report_credits, 2, "cache hit must not debit");
    assert_eq!(entitlements.reports_generated_this_month, 1);
}

#[tokio::test]
async fn test_free_plan_exhausts_after_three_reports() {
    let server = TestServerBuilder::new().build().await;
    let workspace = "ws-free-limit";

    for i in 0..3 {
        let report = server
            .report_service
            .generate_tracking_readiness(tracking_request(
                &format!("https://site{i}.example"),
                workspace,
            ))
            .await
            .unwrap();
        assert_eq!(report.status, "ready");
    }

    let access = server
        .billing_service
        .check_access(workspace, ReportType::TrackingReadiness)
        .await
        .unwrap();
    assert!(!access.can_generate);
    assert_eq!(access.credits_available, 0);
    assert!(access.upgrade_required);

    let err = server
        .report_service
        .generate_tracking_readiness(tracking_request("https://site4.example", workspace))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientAccess { .. }));
}

#[tokio::test]
async fn test_failed_generation_is_not_cached_and_not_charged() {
    let server = TestServerBuilder::new().build().await;
    let workspace = "ws-failed";

    // The mock analyzer refuses hosts containing "fail".
    let first = server
        .report_service
        .generate_tracking_readiness(tracking_request("https://failing.example", workspace))
        .await
        .unwrap();
    assert_eq!(first.status, "failed");
    assert_eq!(first.credit_cost, 0);
    assert!(first.summary.unwrap().contains("Website analysis failed"));

    let entitlements = server.billing_service.entitlements(workspace).await.unwrap();
    assert_eq!(entitlements.report_credits, 3, "failed report must not charge");

    // A retry gets a fresh attempt, not the failed row.
    let second = server
        .report_service
        .generate_tracking_readiness(tracking_request("https://failing.example", workspace))
        .await
        .unwrap();
    assert_ne!(second.id, first.id);
    assert_eq!(second.status, "failed");
}

#[tokio::test]
async fn test_spend_baseline_without_accounts_is_free_no_data_report() {
    let server = TestServerBuilder::new().build().await;

    let report = server
        .report_service
        .generate_spend_baseline(SpendBaselineRequest {
            workspace_id: "ws-nodata".to_string(),
            user_id: None,
            days: 90,
            accounts: vec![],
            background: false,
        })
        .await
        .unwrap();

    assert_eq!(report.status, "ready");
    assert_eq!(report.overall_score, Some(0));
    assert_eq!(report.confidence.as_deref(), Some("LOW"));
    assert_eq!(report.credit_cost, 0);

    let entitlements = server.billing_service.entitlements("ws-nodata").await.unwrap();
    assert_eq!(entitlements.report_credits, 3, "no-data report is not charged");
}

#[tokio::test]
async fn test_spend_baseline_with_unreachable_accounts_degrades_to_no_data() {
    let server = TestServerBuilder::new().build().await;

    let report = server
        .report_service
        .generate_spend_baseline(SpendBaselineRequest {
            workspace_id: "ws-unreachable".to_string(),
            user_id: None,
            days: 30,
            accounts: vec![account(AdPlatform::Google, "fail-acct")],
            background: false,
        })
        .await
        .unwrap();

    assert_eq!(report.status, "ready");
    assert_eq!(report.overall_score, Some(0));
    assert_eq!(report.credit_cost, 0);
}

#[tokio::test]
async fn test_spend_baseline_with_accounts_charges_two_credits() {
    let server = TestServerBuilder::new().build().await;

    let report = server
        .report_service
        .generate_spend_baseline(SpendBaselineRequest {
            workspace_id: "ws-spend".to_string(),
            user_id: None,
            days: 90,
            accounts: vec![
                account(AdPlatform::Google, "g-acct-1"),
                account(AdPlatform::Meta, "m-acct-1"),
            ],
            background: false,
        })
        .await
        .unwrap();

    assert_eq!(report.status, "ready");
    assert_eq!(report.credit_cost, 2);
    let score = report.overall_score.unwrap();
    assert!((0..=100).contains(&score));

    let entitlements = server.billing_service.entitlements("ws-spend").await.unwrap();
    assert_eq!(entitlements.report_credits, 1);
}

#[tokio::test]
async fn test_spend_baseline_rejects_bad_window() {
    let server = TestServerBuilder::new().build().await;

    let err = server
        .report_service
        .generate_spend_baseline(SpendBaselineRequest {
            workspace_id: "ws-window".to_string(),
            user_id: None,
            days: 0,
            accounts: vec![],
            background: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let entitlements = server.billing_service.entitlements("ws-window").await.unwrap();
    assert_eq!(entitlements.report_credits, 3, "rejected input must not mutate state");
}

#[tokio::test]
async fn test_competitor_snapshot_generates_and_charges_three() {
    let server = TestServerBuilder::new().build().await;

    let report = server
        .report_service
        .generate_competitor_snapshot(CompetitorSnapshotRequest {
            url: "https://www.example.com/pricing".to_string(),
            workspace_id: "ws-comp".to_string(),
            user_id: None,
            background: false,
        })
        .await
        .unwrap();

    assert_eq!(report.status, "ready");
    assert_eq!(report.report_type, "COMPETITOR_SNAPSHOT");
    assert_eq!(report.credit_cost, 3);
    let score = report.overall_score.unwrap();
    assert!((0..=100).contains(&score));

    let entitlements = server.billing_service.entitlements("ws-comp").await.unwrap();
    assert_eq!(entitlements.report_credits, 0);

    // Same domain through a different URL form is a cache hit.
    let second = server
        .report_service
        .generate_competitor_snapshot(CompetitorSnapshotRequest {
            url: "http://example.com".to_string(),
            workspace_id: "ws-comp".to_string(),
            user_id: None,
            background: false,
        })
        .await
        .unwrap();
    assert_eq!(second.id, report.id);
}

#[tokio::test]
async fn test_report_crud_and_listing() {
    let server = TestServerBuilder::new().build().await;

    let report = server
        .report_service
        .generate_tracking_readiness(tracking_request("https://crud.example", "ws-crud"))
        .await
        .unwrap();

    let fetched = server.report_service.get_report(&report.id).await.unwrap();
    assert_eq!(fetched.id, report.id);

    let data = server.report_service.report_data(&report.id).await.unwrap();
    assert!(data["analysis"]["sections"].is_array());

    let (reports, total) = server
        .report_service
        .list_reports(&ReportQuery {
            workspace_id: Some("ws-crud".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(reports[0].id, report.id);

    server.report_service.delete_report(&report.id).await.unwrap();
    let err = server.report_service.get_report(&report.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = server.report_service.delete_report(&report.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_background_generation_returns_placeholder_then_completes() {
    let server = TestServerBuilder::new().build().await;

    let mut request = tracking_request("https://background.example", "ws-bg");
    request.background = true;

    let placeholder = server
        .report_service
        .generate_tracking_readiness(request)
        .await
        .unwrap();
    assert_eq!(placeholder.status, "generating");
    assert!(placeholder.overall_score.is_none());

    // Poll until the background task lands the result.
    let mut finished = None;
    for _ in 0..100 {
        let current = server
            .report_service
            .get_report(&placeholder.id)
            .await
            .unwrap();
        if current.status != "generating" {
            finished = Some(current);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let finished = finished.expect("background generation never completed");
    assert_eq!(finished.status, "ready");

    let entitlements = server.billing_service.entitlements("ws-bg").await.unwrap();
    assert_eq!(entitlements.report_credits, 2);
}
