//! Spend-baseline scoring over connected ad-account data.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Confidence, Priority, Recommendation, clamp100, top_recommendations};
use crate::connectors::{AdAccountRef, CampaignSummary, DailySpend};

/// Everything collected for one connected account.
#[derive(Debug, Clone)]
pub struct AccountSpend {
    pub account: AdAccountRef,
    pub daily: Vec<DailySpend>,
    pub campaigns: Vec<CampaignSummary>,
}

/// Aggregate metrics for a single account over the lookback window.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountSummary {
    pub account_id: String,
    pub account_name: String,
    pub platform: String,
    pub total_spend: f64,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub total_conversions: f64,
    pub avg_daily_spend: f64,
    pub overall_cpc: f64,
    pub overall_ctr: f64,
    pub overall_cpa: f64,
    pub campaigns_count: usize,
    pub active_days: usize,
}

/// Per-platform totals and efficiency metrics.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PlatformBreakdown {
    pub platform: String,
    pub accounts: usize,
    pub total_spend: f64,
    pub spend_share: f64,
    pub avg_cpc: f64,
    pub avg_ctr: f64,
    pub avg_cpa: f64,
    pub total_conversions: f64,
}

/// One week of aggregated spend, weeks starting Monday.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WeeklyTrend {
    pub week_start: NaiveDate,
    pub total_spend: f64,
    pub total_clicks: u64,
    pub total_conversions: f64,
}

/// Cross-account performance benchmarks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SpendBenchmarks {
    pub total_spend: f64,
    pub total_clicks: u64,
    pub total_impressions: u64,
    pub total_conversions: f64,
    pub avg_cpc: f64,
    pub avg_ctr: f64,
    pub avg_cpa: f64,
    pub conversion_rate: f64,
}

/// Result of the spend-baseline analysis.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SpendAnalysis {
    pub overall_score: i32,
    pub confidence: Confidence,
    pub summary: String,
    pub platform_breakdown: Vec<PlatformBreakdown>,
    pub spend_trends: Vec<WeeklyTrend>,
    pub benchmarks: SpendBenchmarks,
    pub account_summaries: Vec<AccountSummary>,
    pub recommendations: Vec<Recommendation>,
}

/// Summarize one account's raw records. Ratios divide defensively: an
/// account with zero clicks reports a CPC of zero, not infinity.
pub fn summarize_account(spend: &AccountSpend) -> AccountSummary {
    let total_spend: f64 = spend.daily.iter().map(|r| r.spend).sum();
    let total_impressions: u64 = spend.daily.iter().map(|r| r.impressions).sum();
    let total_clicks: u64 = spend.daily.iter().map(|r| r.clicks).sum();
    let total_conversions: f64 = spend.daily.iter().map(|r| r.conversions).sum();
    let active_days = spend
        .daily
        .iter()
        .map(|r| r.date)
        .collect::<std::collections::BTreeSet<_>>()
        .len();

    AccountSummary {
        account_id: spend.account.account_id.clone(),
        account_name: spend
            .account
            .account_name
            .clone()
            .unwrap_or_else(|| format!("{} Account", spend.account.platform)),
        platform: spend.account.platform.to_string(),
        total_spend,
        total_impressions,
        total_clicks,
        total_conversions,
        avg_daily_spend: ratio(total_spend, active_days as f64),
        overall_cpc: ratio(total_spend, total_clicks as f64),
        overall_ctr: ratio(total_clicks as f64, total_impressions as f64) * 100.0,
        overall_cpa: ratio(total_spend, total_conversions),
        campaigns_count: spend.campaigns.len(),
        active_days,
    }
}

/// Score the spend baseline across all collected accounts. Callers handle
/// the zero-account / zero-data case separately (it is a distinct "no
/// data" report, not a low score).
pub fn score(accounts: &[AccountSpend], days: u32) -> SpendAnalysis {
    let account_summaries: Vec<AccountSummary> =
        accounts.iter().map(summarize_account).collect();

    let platform_breakdown = platform_breakdown(&account_summaries);
    let benchmarks = benchmarks(&account_summaries);
    let all_daily: Vec<&DailySpend> = accounts.iter().flat_map(|a| a.daily.iter()).collect();
    let spend_trends = weekly_trends(&all_daily);
    let recommendations = recommendations(&platform_breakdown, &benchmarks);
    let overall_score = baseline_score(&platform_breakdown, &benchmarks, days);

    let confidence = if account_summaries.len() >= 2 && benchmarks.total_spend > 1000.0 {
        Confidence::High
    } else if !account_summaries.is_empty() {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    let summary = if overall_score >= 80 {
        format!(
            "Strong advertising baseline with ${:.0} total spend across {} account(s).",
            benchmarks.total_spend,
            account_summaries.len()
        )
    } else if overall_score >= 60 {
        format!(
            "Good advertising foundation with ${:.0} spend, some optimization opportunities.",
            benchmarks.total_spend
        )
    } else {
        format!(
            "Early stage advertising with ${:.0} spend, significant growth potential.",
            benchmarks.total_spend
        )
    };

    SpendAnalysis {
        overall_score,
        confidence,
        summary,
        platform_breakdown,
        spend_trends,
        benchmarks,
        account_summaries,
        recommendations,
    }
}

fn platform_breakdown(summaries: &[AccountSummary]) -> Vec<PlatformBreakdown> {
    struct Totals {
        accounts: usize,
        spend: f64,
        impressions: u64,
        clicks: u64,
        conversions: f64,
    }

    let mut by_platform: BTreeMap<String, Totals> = BTreeMap::new();
    for summary in summaries {
        let totals = by_platform.entry(summary.platform.clone()).or_insert(Totals {
            accounts: 0,
            spend: 0.0,
            impressions: 0,
            clicks: 0,
            conversions: 0.0,
        });
        totals.accounts += 1;
        totals.spend += summary.total_spend;
        totals.impressions += summary.total_impressions;
        totals.clicks += summary.total_clicks;
        totals.conversions += summary.total_conversions;
    }

    let total_spend: f64 = by_platform.values().map(|t| t.spend).sum();

    by_platform
        .into_iter()
        .map(|(platform, t)| PlatformBreakdown {
            platform,
            accounts: t.accounts,
            total_spend: t.spend,
            spend_share: ratio(t.spend, total_spend) * 100.0,
            avg_cpc: ratio(t.spend, t.clicks as f64),
            avg_ctr: ratio(t.clicks as f64, t.impressions as f64) * 100.0,
            avg_cpa: ratio(t.spend, t.conversions),
            total_conversions: t.conversions,
        })
        .collect()
}

fn benchmarks(summaries: &[AccountSummary]) -> SpendBenchmarks {
    let total_spend: f64 = summaries.iter().map(|s| s.total_spend).sum();
    let total_clicks: u64 = summaries.iter().map(|s| s.total_clicks).sum();
    let total_impressions: u64 = summaries.iter().map(|s| s.total_impressions).sum();
    let total_conversions: f64 = summaries.iter().map(|s| s.total_conversions).sum();

    SpendBenchmarks {
        total_spend,
        total_clicks,
        total_impressions,
        total_conversions,
        avg_cpc: ratio(total_spend, total_clicks as f64),
        avg_ctr: ratio(total_clicks as f64, total_impressions as f64) * 100.0,
        avg_cpa: ratio(total_spend, total_conversions),
        conversion_rate: ratio(total_conversions, total_clicks as f64) * 100.0,
    }
}

/// Aggregate daily records into the last 12 weekly buckets.
fn weekly_trends(daily: &[&DailySpend]) -> Vec<WeeklyTrend> {
    let mut weeks: BTreeMap<NaiveDate, WeeklyTrend> = BTreeMap::new();
    for record in daily {
        let week_start =
            record.date - Duration::days(record.date.weekday().num_days_from_monday() as i64);
        let entry = weeks.entry(week_start).or_insert(WeeklyTrend {
            week_start,
            total_spend: 0.0,
            total_clicks: 0,
            total_conversions: 0.0,
        });
        entry.total_spend += record.spend;
        entry.total_clicks += record.clicks;
        entry.total_conversions += record.conversions;
    }

    let trends: Vec<WeeklyTrend> = weeks.into_values().collect();
    let skip = trends.len().saturating_sub(12);
    trends.into_iter().skip(skip).collect()
}

fn recommendations(
    platforms: &[PlatformBreakdown],
    benchmarks: &SpendBenchmarks,
) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    if platforms.len() > 1 {
        let with_cpa: Vec<&PlatformBreakdown> =
            platforms.iter().filter(|p| p.avg_cpa > 0.0).collect();
        if let (Some(best), Some(worst)) = (
            with_cpa
                .iter()
                .min_by(|a, b| a.avg_cpa.total_cmp(&b.avg_cpa)),
            with_cpa
                .iter()
                .max_by(|a, b| a.avg_cpa.total_cmp(&b.avg_cpa)),
        ) {
            if worst.avg_cpa > best.avg_cpa * 1.5 {
                recs.push(Recommendation {
                    priority: Priority::High,
                    category: "Budget Allocation".to_string(),
                    title: format!("Shift Budget to {}", best.platform),
                    description: format!(
                        "{} has {:.1}x better CPA than {}. Consider reallocating 20% of budget.",
                        best.platform,
                        worst.avg_cpa / best.avg_cpa,
                        worst.platform
                    ),
                });
            }
        }
    }

    if benchmarks.avg_ctr < 2.0 {
        recs.push(Recommendation {
            priority: Priority::Medium,
            category: "Performance".to_string(),
            title: "Improve Click-Through Rates".to_string(),
            description: format!(
                "Average CTR of {:.1}% is below industry average. Consider refreshing ad copy and testing new creatives.",
                benchmarks.avg_ctr
            ),
        });
    }

    if benchmarks.avg_cpa > 100.0 {
        recs.push(Recommendation {
            priority: Priority::High,
            category: "Cost Efficiency".to_string(),
            title: "Optimize Cost Per Acquisition".to_string(),
            description: format!(
                "Average CPA of ${:.2} suggests room for optimization. Review targeting, bidding strategies, and landing page experience.",
                benchmarks.avg_cpa
            ),
        });
    }

    if benchmarks.total_spend < 500.0 {
        recs.push(Recommendation {
            priority: Priority::Medium,
            category: "Growth".to_string(),
            title: "Consider Budget Increase".to_string(),
            description: format!(
                "Current spend of ${:.0} may limit reach. Test 20-30% budget increases on best-performing campaigns.",
                benchmarks.total_spend
            ),
        });
    } else if benchmarks.total_spend > 10000.0 {
        recs.push(Recommendation {
            priority: Priority::Low,
            category: "Scale".to_string(),
            title: "Optimize for Scale".to_string(),
            description: format!(
                "High spend volume of ${:.0} detected. Focus on automated bidding and audience expansion.",
                benchmarks.total_spend
            ),
        });
    }

    top_recommendations(recs)
}

fn baseline_score(
    platforms: &[PlatformBreakdown],
    benchmarks: &SpendBenchmarks,
    days: u32,
) -> i32 {
    let mut score: i64 = 50;

    score += match platforms.len() {
        0 => 0,
        1 => 5,
        _ => 15,
    };

    score += match benchmarks.total_spend {
        s if s >= 5000.0 => 20,
        s if s >= 1000.0 => 15,
        s if s >= 500.0 => 10,
        s if s >= 100.0 => 5,
        _ => 0,
    };

    if benchmarks.avg_ctr >= 3.0 {
        score += 10;
    } else if benchmarks.avg_ctr >= 2.0 {
        score += 5;
    }

    if benchmarks.avg_cpa > 0.0 && benchmarks.avg_cpa <= 50.0 {
        score += 10;
    } else if benchmarks.avg_cpa > 0.0 && benchmarks.avg_cpa <= 100.0 {
        score += 5;
    }

    if days >= 90 {
        score += 5;
    }

    clamp100(score)
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::AdPlatform;

    fn account(
        platform: AdPlatform,
        id: &str,
        daily_spend: f64,
        clicks: u64,
        impressions: u64,
        conversions: f64,
        days: u32,
    ) -> AccountSpend {
        let daily = (0..days)
            .map(|i| DailySpend {
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(i as i64),
                campaign_id: "c1".to_string(),
                campaign_name: "Campaign 1".to_string(),
                spend: daily_spend,
                impressions,
                clicks,
                conversions,
            })
            .collect();
        AccountSpend {
            account: AdAccountRef {
                platform,
                account_id: id.to_string(),
                account_name: None,
                currency: None,
            },
            daily,
            campaigns: vec![CampaignSummary {
                campaign_id: "c1".to_string(),
                campaign_name: "Campaign 1".to_string(),
                spend: daily_spend * days as f64,
                clicks: clicks * days as u64,
                conversions: conversions * days as f64,
            }],
        }
    }

    #[test]
    fn test_two_platform_healthy_account_scores_high() {
        // 2 platforms, $9000 spend, CTR 5%, CPA ~$30, 90 days:
        // 50 + 15 + 20 + 10 + 10 + 5 = 100.
        let accounts = vec![
            account(AdPlatform::Google, "g-1", 50.0, 100, 2000, 2.0, 90),
            account(AdPlatform::Meta, "m-1", 50.0, 100, 2000, 1.5, 90),
        ];
        let analysis = score(&accounts, 90);
        assert_eq!(analysis.overall_score, 100);
        assert_eq!(analysis.confidence, Confidence::High);
        assert_eq!(analysis.platform_breakdown.len(), 2);
    }

    #[test]
    fn test_single_small_account_scores_low_with_medium_confidence() {
        let accounts = vec![account(AdPlatform::Google, "g-1", 1.0, 1, 1000, 0.0, 30)];
        let analysis = score(&accounts, 30);
        // 50 + 5 (one platform) + 0 spend tier + 0 ctr + 0 cpa = 55.
        assert_eq!(analysis.overall_score, 55);
        assert_eq!(analysis.confidence, Confidence::Medium);
    }

    #[test]
    fn test_score_bounded() {
        let accounts = vec![
            account(AdPlatform::Google, "g-1", 10000.0, 5000, 50000, 500.0, 90),
            account(AdPlatform::Meta, "m-1", 10000.0, 5000, 50000, 500.0, 90),
        ];
        let analysis = score(&accounts, 365);
        assert!(analysis.overall_score <= 100);
        assert!(analysis.overall_score >= 0);
    }

    #[test]
    fn test_more_spend_never_lowers_score() {
        let low = score(&[account(AdPlatform::Google, "g", 5.0, 50, 1000, 1.0, 30)], 30);
        let high = score(&[account(AdPlatform::Google, "g", 50.0, 50, 1000, 1.0, 30)], 30);
        assert!(high.overall_score >= low.overall_score);
    }

    #[test]
    fn test_weekly_trends_limited_to_twelve() {
        let acct = account(AdPlatform::Google, "g-1", 10.0, 10, 100, 1.0, 180);
        let analysis = score(&[acct], 180);
        assert!(analysis.spend_trends.len() <= 12);
        // Buckets are ordered and aligned to Mondays.
        for pair in analysis.spend_trends.windows(2) {
            assert!(pair[0].week_start < pair[1].week_start);
        }
        for week in &analysis.spend_trends {
            assert_eq!(week.week_start.weekday().num_days_from_monday(), 0);
        }
    }

    #[test]
    fn test_low_ctr_triggers_creative_recommendation() {
        let acct = account(AdPlatform::Google, "g-1", 20.0, 10, 2000, 1.0, 30);
        let analysis = score(&[acct], 30);
        assert!(
            analysis
                .recommendations
                .iter()
                .any(|r| r.title == "Improve Click-Through Rates")
        );
    }

    #[test]
    fn test_cpa_gap_triggers_budget_shift() {
        // Google CPA $10, Meta CPA $100.
        let accounts = vec![
            account(AdPlatform::Google, "g-1", 20.0, 50, 1000, 2.0, 30),
            account(AdPlatform::Meta, "m-1", 20.0, 50, 1000, 0.2, 30),
        ];
        let analysis = score(&accounts, 30);
        assert!(
            analysis
                .recommendations
                .iter()
                .any(|r| r.title == "Shift Budget to google")
        );
    }

    #[test]
    fn test_zero_division_is_safe() {
        let acct = AccountSpend {
            account: AdAccountRef {
                platform: AdPlatform::Google,
                account_id: "g-1".to_string(),
                account_name: None,
                currency: None,
            },
            daily: vec![DailySpend {
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                campaign_id: "c1".to_string(),
                campaign_name: "Campaign 1".to_string(),
                spend: 100.0,
                impressions: 0,
                clicks: 0,
                conversions: 0.0,
            }],
            campaigns: vec![],
        };
        let summary = summarize_account(&acct);
        assert_eq!(summary.overall_cpc, 0.0);
        assert_eq!(summary.overall_ctr, 0.0);
        assert_eq!(summary.overall_cpa, 0.0);
    }
}
