//! Competitor-snapshot scoring and keyword-gap analysis.
//!
//! Three sub-scores (organic strength, paid strength, keyword opportunity)
//! are each computed on the full 0-100 scale and averaged into the overall
//! score. Keyword gaps are keywords competitors rank for that the target
//! does not; each gap gets a weighted-tier opportunity score.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Confidence, Priority, Recommendation, clamp100, top_recommendations};
use crate::connectors::{AdCopy, CompetitorMetrics, CompetitorOverview, KeywordMetric};

/// A keyword gap with its scored opportunity.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct KeywordOpportunity {
    pub keyword: String,
    pub position: u32,
    pub search_volume: u64,
    pub cpc: f64,
    pub competition: f64,
    /// Competitor the gap was observed on (best-volume variant for common
    /// keywords).
    pub competitor_domain: String,
    /// How many analyzed competitors rank for this keyword.
    pub competitor_count: u32,
    pub opportunity_score: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GapSummary {
    pub total_target_keywords: usize,
    pub total_gap_opportunities: usize,
    pub high_value_opportunities: usize,
    pub multi_competitor_opportunities: usize,
}

/// Output of the keyword-gap analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct KeywordGapAnalysis {
    pub gaps_by_competitor: BTreeMap<String, Vec<KeywordOpportunity>>,
    pub top_opportunities: Vec<KeywordOpportunity>,
    pub common_competitor_keywords: Vec<KeywordOpportunity>,
    pub summary: GapSummary,
}

/// Weighted-tier opportunity score for a single keyword gap.
pub fn opportunity_score(metric: &KeywordMetric, competitor_count: u32) -> i32 {
    let mut score: i64 = 50;

    score += match metric.search_volume {
        v if v >= 10_000 => 30,
        v if v >= 1_000 => 20,
        v if v >= 100 => 10,
        v if v >= 10 => 5,
        _ => 0,
    };

    // Low competition is the opportunity.
    score += match metric.competition {
        c if c <= 0.3 => 20,
        c if c <= 0.6 => 10,
        c if c <= 0.8 => 5,
        _ => 0,
    };

    // CPC as a commercial-value proxy.
    score += match metric.cpc {
        c if c >= 10.0 => 15,
        c if c >= 5.0 => 10,
        c if c >= 1.0 => 5,
        _ => 0,
    };

    score += match competitor_count {
        n if n >= 3 => 10,
        2 => 5,
        _ => 0,
    };

    // A competitor ranking well proves the keyword is winnable.
    score += match metric.position {
        p if p >= 1 && p <= 3 => 15,
        p if p <= 10 => 10,
        p if p <= 20 => 5,
        _ => 0,
    };

    clamp100(score)
}

/// Find keywords competitors rank for that the target does not.
pub fn analyze_keyword_gaps(
    target_keywords: &[KeywordMetric],
    competitor_keywords: &BTreeMap<String, Vec<KeywordMetric>>,
) -> KeywordGapAnalysis {
    let target_set: BTreeSet<String> = target_keywords
        .iter()
        .map(|kw| kw.keyword.to_lowercase())
        .collect();

    let mut gaps_by_competitor: BTreeMap<String, Vec<KeywordOpportunity>> = BTreeMap::new();
    let mut top_opportunities = Vec::new();

    for (domain, keywords) in competitor_keywords {
        let mut gaps: Vec<KeywordOpportunity> = keywords
            .iter()
            .filter(|kw| !target_set.contains(&kw.keyword.to_lowercase()))
            .map(|kw| KeywordOpportunity {
                keyword: kw.keyword.clone(),
                position: kw.position,
                search_volume: kw.search_volume,
                cpc: kw.cpc,
                competition: kw.competition,
                competitor_domain: domain.clone(),
                competitor_count: 1,
                opportunity_score: opportunity_score(kw, 1),
            })
            .collect();

        top_opportunities.extend(gaps.iter().filter(|g| g.opportunity_score >= 70).cloned());

        gaps.sort_by(|a, b| b.opportunity_score.cmp(&a.opportunity_score));
        gaps.truncate(20);
        gaps_by_competitor.insert(domain.clone(), gaps);
    }

    let total_gap_opportunities = gaps_by_competitor.values().map(Vec::len).sum();

    // Keywords multiple competitors target are the strongest signal: keep
    // the best-volume variant and rescore with the competitor count.
    let mut common: Vec<KeywordOpportunity> = Vec::new();
    let mut seen: BTreeMap<String, (u32, Option<(&str, &KeywordMetric)>)> = BTreeMap::new();
    for (domain, keywords) in competitor_keywords {
        let mut counted: BTreeSet<String> = BTreeSet::new();
        for kw in keywords {
            let key = kw.keyword.to_lowercase();
            if target_set.contains(&key) {
                continue;
            }
            let entry = seen.entry(key.clone()).or_insert((0, None));
            if counted.insert(key) {
                entry.0 += 1;
            }
            let better = match entry.1 {
                Some((_, best)) => kw.search_volume > best.search_volume,
                None => true,
            };
            if better {
                entry.1 = Some((domain.as_str(), kw));
            }
        }
    }
    for (count, best) in seen.into_values() {
        if count < 2 {
            continue;
        }
        if let Some((domain, kw)) = best {
            common.push(KeywordOpportunity {
                keyword: kw.keyword.clone(),
                position: kw.position,
                search_volume: kw.search_volume,
                cpc: kw.cpc,
                competition: kw.competition,
                competitor_domain: domain.to_string(),
                competitor_count: count,
                opportunity_score: opportunity_score(kw, count),
            });
        }
    }

    top_opportunities.sort_by(|a, b| b.opportunity_score.cmp(&a.opportunity_score));
    top_opportunities.truncate(20);
    common.sort_by(|a, b| b.opportunity_score.cmp(&a.opportunity_score));
    common.truncate(15);

    let summary = GapSummary {
        total_target_keywords: target_keywords.len(),
        total_gap_opportunities,
        high_value_opportunities: top_opportunities.len(),
        multi_competitor_opportunities: common.len(),
    };

    KeywordGapAnalysis {
        gaps_by_competitor,
        top_opportunities,
        common_competitor_keywords: common,
        summary,
    }
}

/// Position in the market derived from organic and paid strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum MarketPosition {
    MarketLeader,
    StrongCompetitor,
    EstablishedPlayer,
    EmergingPlayer,
    NewEntrant,
}

impl fmt::Display for MarketPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketPosition::MarketLeader => "Market Leader",
            MarketPosition::StrongCompetitor => "Strong Competitor",
            MarketPosition::EstablishedPlayer => "Established Player",
            MarketPosition::EmergingPlayer => "Emerging Player",
            MarketPosition::NewEntrant => "New Entrant",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum CompetitiveIntensity {
    VeryHigh,
    High,
    Medium,
    Low,
}

impl fmt::Display for CompetitiveIntensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompetitiveIntensity::VeryHigh => "Very High",
            CompetitiveIntensity::High => "High",
            CompetitiveIntensity::Medium => "Medium",
            CompetitiveIntensity::Low => "Low",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganicStrength {
    pub score: i32,
    pub rank: u64,
    pub keywords: u64,
    pub traffic: u64,
    pub top_competitors: Vec<CompetitorMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaidStrength {
    pub score: i32,
    pub ad_keywords: u64,
    pub estimated_competitor_spend: f64,
    pub top_competitors: Vec<CompetitorMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompetitiveLandscape {
    pub organic: OrganicStrength,
    pub paid: PaidStrength,
    pub market_position: MarketPosition,
    pub competitive_intensity: CompetitiveIntensity,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OpportunityOutlook {
    pub total_opportunities: usize,
    pub high_value_opportunities: usize,
    pub avg_opportunity_score: f64,
    pub top_opportunities: Vec<KeywordOpportunity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdIntelligence {
    pub ad_copies_found: usize,
    pub common_themes: Vec<String>,
    pub messaging_patterns: Vec<String>,
    pub sample_ads: Vec<AdCopy>,
}

/// Result of the competitor-snapshot analysis.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompetitorAnalysis {
    pub overall_score: i32,
    pub confidence: Confidence,
    pub summary: String,
    pub landscape: CompetitiveLandscape,
    pub opportunities: OpportunityOutlook,
    pub ad_intelligence: AdIntelligence,
    pub recommendations: Vec<Recommendation>,
}

/// Score the competitive landscape for a domain.
pub fn score(overview: &CompetitorOverview, gaps: &KeywordGapAnalysis) -> CompetitorAnalysis {
    let organic_score = organic_strength_score(overview);
    let paid_score = paid_strength_score(overview);
    let opportunity_score = keyword_opportunity_score(&gaps.top_opportunities);

    let overall_score =
        clamp100((organic_score as i64 + paid_score as i64 + opportunity_score as i64) / 3);

    let confidence = confidence(overview, gaps);

    let market_position = market_position(organic_score, paid_score);
    let competitive_intensity =
        competitive_intensity(&overview.organic_competitors, &overview.paid_competitors);

    let landscape = CompetitiveLandscape {
        organic: OrganicStrength {
            score: organic_score,
            rank: overview.overview.organic_rank,
            keywords: overview.overview.organic_keywords,
            traffic: overview.overview.organic_traffic,
            top_competitors: overview.organic_competitors.iter().take(5).cloned().collect(),
        },
        paid: PaidStrength {
            score: paid_score,
            ad_keywords: overview.overview.ad_keywords,
            estimated_competitor_spend: overview
                .paid_competitors
                .iter()
                .take(3)
                .map(|c| c.ad_cost)
                .sum(),
            top_competitors: overview.paid_competitors.iter().take(5).cloned().collect(),
        },
        market_position,
        competitive_intensity,
    };

    let avg_opportunity_score = if gaps.top_opportunities.is_empty() {
        0.0
    } else {
        gaps.top_opportunities
            .iter()
            .map(|o| o.opportunity_score as f64)
            .sum::<f64>()
            / gaps.top_opportunities.len() as f64
    };
    let opportunities = OpportunityOutlook {
        total_opportunities: gaps.top_opportunities.len(),
        high_value_opportunities: gaps
            .top_opportunities
            .iter()
            .filter(|o| o.opportunity_score >= 80)
            .count(),
        avg_opportunity_score,
        top_opportunities: gaps.top_opportunities.iter().take(10).cloned().collect(),
    };

    let ad_intelligence = AdIntelligence {
        ad_copies_found: overview.ad_copies.len(),
        common_themes: extract_ad_themes(&overview.ad_copies),
        messaging_patterns: messaging_patterns(&overview.ad_copies),
        sample_ads: overview.ad_copies.iter().take(5).cloned().collect(),
    };

    let recommendations = recommendations(&landscape, &opportunities, &ad_intelligence);
    let summary = summary(overall_score, &landscape, &opportunities);

    CompetitorAnalysis {
        overall_score,
        confidence,
        summary,
        landscape,
        opportunities,
        ad_intelligence,
        recommendations,
    }
}

fn organic_strength_score(overview: &CompetitorOverview) -> i32 {
    let mut score: i64 = 50;

    score += match overview.overview.organic_keywords {
        k if k >= 10_000 => 25,
        k if k >= 5_000 => 20,
        k if k >= 1_000 => 15,
        k if k >= 100 => 10,
        _ => 0,
    };

    score += relevance_bonus(&overview.organic_competitors);

    score += match overview.overview.organic_traffic {
        t if t >= 100_000 => 10,
        t if t >= 50_000 => 7,
        t if t >= 10_000 => 5,
        _ => 0,
    };

    clamp100(score)
}

fn paid_strength_score(overview: &CompetitorOverview) -> i32 {
    let mut score: i64 = 50;

    score += match overview.overview.ad_keywords {
        k if k >= 1_000 => 25,
        k if k >= 500 => 20,
        k if k >= 100 => 15,
        k if k >= 10 => 10,
        _ => 0,
    };

    score += relevance_bonus(&overview.paid_competitors);

    let competitor_spend: f64 = overview
        .paid_competitors
        .iter()
        .take(3)
        .map(|c| c.ad_cost)
        .sum();
    score += match competitor_spend {
        s if s >= 50_000.0 => 10,
        s if s >= 10_000.0 => 7,
        s if s >= 1_000.0 => 5,
        _ => 0,
    };

    clamp100(score)
}

fn relevance_bonus(competitors: &[CompetitorMetrics]) -> i64 {
    if competitors.is_empty() {
        return 0;
    }
    let top = &competitors[..competitors.len().min(5)];
    let avg: f64 =
        top.iter().map(|c| c.competitive_relevance).sum::<f64>() / top.len() as f64;
    match avg {
        a if a >= 0.8 => 15,
        a if a >= 0.6 => 10,
        a if a >= 0.4 => 5,
        _ => 0,
    }
}

fn keyword_opportunity_score(opportunities: &[KeywordOpportunity]) -> i32 {
    if opportunities.is_empty() {
        return 30;
    }

    let high = opportunities
        .iter()
        .filter(|o| o.opportunity_score >= 80)
        .count() as i64;
    let medium = opportunities
        .iter()
        .filter(|o| o.opportunity_score >= 60 && o.opportunity_score < 80)
        .count() as i64;

    let mut score: i64 = 40;
    score += (high * 3).min(30);
    score += (medium * 2).min(20);
    score += (opportunities.len() as i64).min(10);

    clamp100(score)
}

fn confidence(overview: &CompetitorOverview, gaps: &KeywordGapAnalysis) -> Confidence {
    let organic = overview.organic_competitors.len();
    let paid = overview.paid_competitors.len();
    let opportunities = gaps.top_opportunities.len();

    if organic >= 5 && paid >= 3 && opportunities >= 10 {
        Confidence::High
    } else if organic >= 3 && paid >= 2 && opportunities >= 5 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn market_position(organic_score: i32, paid_score: i32) -> MarketPosition {
    match (organic_score + paid_score) / 2 {
        s if s >= 80 => MarketPosition::MarketLeader,
        s if s >= 65 => MarketPosition::StrongCompetitor,
        s if s >= 50 => MarketPosition::EstablishedPlayer,
        s if s >= 35 => MarketPosition::EmergingPlayer,
        _ => MarketPosition::NewEntrant,
    }
}

fn competitive_intensity(
    organic: &[CompetitorMetrics],
    paid: &[CompetitorMetrics],
) -> CompetitiveIntensity {
    let distinct: BTreeSet<&str> = organic
        .iter()
        .chain(paid.iter())
        .map(|c| c.domain.as_str())
        .collect();
    let total = distinct.len();

    let avg_relevance = if organic.is_empty() {
        0.0
    } else {
        let top = &organic[..organic.len().min(5)];
        top.iter().map(|c| c.competitive_relevance).sum::<f64>() / top.len() as f64
    };

    if total >= 10 && avg_relevance >= 0.7 {
        CompetitiveIntensity::VeryHigh
    } else if total >= 7 && avg_relevance >= 0.5 {
        CompetitiveIntensity::High
    } else if total >= 5 {
        CompetitiveIntensity::Medium
    } else {
        CompetitiveIntensity::Low
    }
}

const THEME_KEYWORDS: &[(&str, &[&str])] = &[
    ("Efficiency", &["efficient", "efficiency", "streamline", "optimize"]),
    ("Innovation", &["innovative", "cutting-edge", "advanced", "revolutionary"]),
    ("Reliability", &["reliable", "trusted", "proven", "secure"]),
    ("Growth", &["grow", "scale", "expand", "increase"]),
    ("Savings", &["save", "reduce", "lower", "affordable"]),
    ("Ease Of Use", &["easy", "simple", "user-friendly", "intuitive"]),
];

fn extract_ad_themes(ad_copies: &[AdCopy]) -> Vec<String> {
    if ad_copies.is_empty() {
        return Vec::new();
    }

    let all_text: String = ad_copies
        .iter()
        .map(|ad| format!("{} {}", ad.title, ad.description).to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");

    THEME_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| all_text.contains(kw)))
        .map(|(theme, _)| theme.to_string())
        .take(5)
        .collect()
}

fn messaging_patterns(ad_copies: &[AdCopy]) -> Vec<String> {
    if ad_copies.is_empty() {
        return Vec::new();
    }

    let mut patterns = Vec::new();
    let title_lower = |ad: &AdCopy| ad.title.to_lowercase();
    let desc_lower = |ad: &AdCopy| ad.description.to_lowercase();

    if ad_copies
        .iter()
        .any(|ad| title_lower(ad).contains("free") || desc_lower(ad).contains("trial"))
    {
        patterns.push("Free Trial".to_string());
    }
    if ad_copies.iter().any(|ad| {
        let d = desc_lower(ad);
        ["start", "get started", "try", "learn more"]
            .iter()
            .any(|cta| d.contains(cta))
    }) {
        patterns.push("Call to Action".to_string());
    }
    if ad_copies.iter().any(|ad| {
        let t = title_lower(ad);
        ["improve", "increase", "boost", "enhance"]
            .iter()
            .any(|b| t.contains(b))
    }) {
        patterns.push("Benefits Focus".to_string());
    }
    if ad_copies.iter().any(|ad| {
        let d = desc_lower(ad);
        ["solution", "solve", "fix", "address"].iter().any(|p| d.contains(p))
    }) {
        patterns.push("Problem Solution".to_string());
    }
    if ad_copies.iter().any(|ad| {
        let d = desc_lower(ad);
        ["trusted", "proven", "thousands", "leading"]
            .iter()
            .any(|p| d.contains(p))
    }) {
        patterns.push("Social Proof".to_string());
    }

    patterns
}

fn recommendations(
    landscape: &CompetitiveLandscape,
    opportunities: &OpportunityOutlook,
    ad_intelligence: &AdIntelligence,
) -> Vec<Recommendation> {
    let mut recs = Vec::new();

    match landscape.market_position {
        MarketPosition::NewEntrant | MarketPosition::EmergingPlayer => {
            recs.push(Recommendation {
                priority: Priority::High,
                category: "Market Entry".to_string(),
                title: "Focus on Long-Tail Keywords".to_string(),
                description: format!(
                    "As a {}, target long-tail, low-competition keywords to establish market presence before competing on high-volume terms.",
                    landscape.market_position.to_string().to_lowercase()
                ),
            });
        }
        MarketPosition::MarketLeader | MarketPosition::StrongCompetitor => {
            recs.push(Recommendation {
                priority: Priority::Medium,
                category: "Market Defense".to_string(),
                title: "Defend Market Position".to_string(),
                description: format!(
                    "Maintain strong {} position by monitoring competitor keyword movements and protecting branded terms.",
                    landscape.market_position.to_string().to_lowercase()
                ),
            });
        }
        MarketPosition::EstablishedPlayer => {}
    }

    if opportunities.high_value_opportunities >= 10 {
        recs.push(Recommendation {
            priority: Priority::High,
            category: "Keyword Expansion".to_string(),
            title: "Capitalize on High-Value Keyword Gaps".to_string(),
            description: format!(
                "Found {} high-value keyword opportunities. Prioritize these for immediate campaign expansion.",
                opportunities.high_value_opportunities
            ),
        });
    } else if opportunities.total_opportunities >= 20 {
        recs.push(Recommendation {
            priority: Priority::Medium,
            category: "Keyword Research".to_string(),
            title: "Expand Keyword Portfolio".to_string(),
            description: format!(
                "Found {} keyword opportunities. Conduct deeper research to identify quick wins.",
                opportunities.total_opportunities
            ),
        });
    }

    match landscape.competitive_intensity {
        CompetitiveIntensity::VeryHigh => {
            recs.push(Recommendation {
                priority: Priority::High,
                category: "Differentiation".to_string(),
                title: "Focus on Unique Value Proposition".to_string(),
                description: "High competitive intensity detected. Emphasize unique differentiators and consider niche targeting.".to_string(),
            });
        }
        CompetitiveIntensity::Low => {
            recs.push(Recommendation {
                priority: Priority::Medium,
                category: "Market Opportunity".to_string(),
                title: "Aggressive Market Expansion".to_string(),
                description: "Low competitive intensity presents growth opportunity. Consider increasing budget and expanding keyword targeting.".to_string(),
            });
        }
        _ => {}
    }

    if ad_intelligence
        .messaging_patterns
        .iter()
        .any(|p| p == "Free Trial")
    {
        recs.push(Recommendation {
            priority: Priority::Medium,
            category: "Messaging".to_string(),
            title: "Consider Free Trial Messaging".to_string(),
            description: "Competitors are successfully using free trial offers. Test similar low-risk trial offers.".to_string(),
        });
    }

    let organic_keywords = landscape.organic.keywords;
    let paid_keywords = landscape.paid.ad_keywords;
    if organic_keywords > paid_keywords * 3 {
        recs.push(Recommendation {
            priority: Priority::Medium,
            category: "Budget Allocation".to_string(),
            title: "Increase Paid Search Investment".to_string(),
            description: format!(
                "Strong organic presence ({organic_keywords} keywords) vs limited paid presence ({paid_keywords} keywords). Consider expanding paid campaigns."
            ),
        });
    }

    top_recommendations(recs)
}

fn summary(
    score: i32,
    landscape: &CompetitiveLandscape,
    opportunities: &OpportunityOutlook,
) -> String {
    let position = landscape.market_position.to_string().to_lowercase();
    let intensity = landscape.competitive_intensity.to_string().to_lowercase();
    let count = opportunities.total_opportunities;

    if score >= 80 {
        format!(
            "Strong competitive position as {position} with {count} keyword opportunities in a {intensity} intensity market."
        )
    } else if score >= 60 {
        format!(
            "Solid competitive foundation as {position} with room for growth. {count} keyword gaps identified."
        )
    } else if score >= 40 {
        format!(
            "Developing competitive presence as {position}. Significant opportunity with {count} keyword gaps to pursue."
        )
    } else {
        format!(
            "Early stage competitive position with substantial growth potential. {count} keyword opportunities available for market entry."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::DomainOverview;

    fn keyword(name: &str, volume: u64, cpc: f64, competition: f64, position: u32) -> KeywordMetric {
        KeywordMetric {
            keyword: name.to_string(),
            search_volume: volume,
            cpc,
            competition,
            position,
        }
    }

    fn competitor(domain: &str, relevance: f64, ad_cost: f64) -> CompetitorMetrics {
        CompetitorMetrics {
            domain: domain.to_string(),
            competitive_relevance: relevance,
            common_keywords: 100,
            ad_keywords: 50,
            ad_traffic: 1000,
            organic_traffic: 5000,
            ad_cost,
        }
    }

    #[test]
    fn test_opportunity_score_tiers_and_bounds() {
        // Best case saturates above 100 and clamps.
        let best = keyword("kw", 20_000, 12.0, 0.1, 1);
        assert_eq!(opportunity_score(&best, 3), 100);

        // Worst case stays at the base.
        let worst = keyword("kw", 0, 0.0, 0.95, 80);
        assert_eq!(opportunity_score(&worst, 1), 50);

        // Mid-tier: 50 + 20 (volume) + 10 (competition) + 5 (cpc) + 5
        // (two competitors) + 10 (position 8).
        let mid = keyword("kw", 2_000, 1.5, 0.5, 8);
        assert_eq!(opportunity_score(&mid, 2), 100.min(50 + 20 + 10 + 5 + 5 + 10));
    }

    #[test]
    fn test_opportunity_score_monotone_in_volume() {
        let tiers = [5u64, 50, 500, 5_000, 50_000];
        let mut last = 0;
        for volume in tiers {
            let s = opportunity_score(&keyword("kw", volume, 2.0, 0.5, 15), 1);
            assert!(s >= last);
            last = s;
        }
    }

    #[test]
    fn test_gap_analysis_excludes_target_keywords() {
        let target = vec![keyword("shared term", 1000, 2.0, 0.4, 5)];
        let mut competitors = BTreeMap::new();
        competitors.insert(
            "rival.com".to_string(),
            vec![
                keyword("Shared Term", 1000, 2.0, 0.4, 3),
                keyword("gap term", 5000, 3.0, 0.3, 2),
            ],
        );

        let analysis = analyze_keyword_gaps(&target, &competitors);
        let gaps = &analysis.gaps_by_competitor["rival.com"];
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].keyword, "gap term");
    }

    #[test]
    fn test_gap_analysis_common_keywords_need_two_competitors() {
        let mut competitors = BTreeMap::new();
        competitors.insert(
            "a.com".to_string(),
            vec![
                keyword("both", 2000, 2.0, 0.3, 4),
                keyword("only a", 9000, 4.0, 0.2, 2),
            ],
        );
        competitors.insert(
            "b.com".to_string(),
            vec![keyword("both", 4000, 2.5, 0.3, 6)],
        );

        let analysis = analyze_keyword_gaps(&[], &competitors);
        assert_eq!(analysis.common_competitor_keywords.len(), 1);
        let common = &analysis.common_competitor_keywords[0];
        assert_eq!(common.keyword, "both");
        assert_eq!(common.competitor_count, 2);
        // Best-volume variant wins.
        assert_eq!(common.search_volume, 4000);
        assert_eq!(common.competitor_domain, "b.com");
    }

    #[test]
    fn test_zero_evidence_scores_from_base_values() {
        // No competitors, no keywords, no opportunities: organic 50, paid
        // 50, opportunity 30 -> mean 43.
        let overview = CompetitorOverview {
            domain: "example.com".to_string(),
            ..Default::default()
        };
        let gaps = KeywordGapAnalysis::default();

        let analysis = score(&overview, &gaps);
        assert_eq!(analysis.landscape.organic.score, 50);
        assert_eq!(analysis.landscape.paid.score, 50);
        assert_eq!(analysis.overall_score, 43);
        assert_eq!(analysis.confidence, Confidence::Low);
        assert!(analysis.ad_intelligence.common_themes.is_empty());
    }

    #[test]
    fn test_rich_evidence_scores_high_confidence() {
        let overview = CompetitorOverview {
            domain: "example.com".to_string(),
            overview: DomainOverview {
                domain: "example.com".to_string(),
                organic_rank: 1200,
                organic_keywords: 12_000,
                organic_traffic: 150_000,
                organic_cost: 40_000.0,
                ad_keywords: 1_500,
            },
            organic_competitors: (0..6)
                .map(|i| competitor(&format!("org{i}.com"), 0.85, 0.0))
                .collect(),
            paid_competitors: (0..4)
                .map(|i| competitor(&format!("paid{i}.com"), 0.8, 30_000.0))
                .collect(),
            top_keywords: vec![],
            ad_copies: vec![],
        };

        let mut competitor_keywords = BTreeMap::new();
        competitor_keywords.insert(
            "org0.com".to_string(),
            (0..15)
                .map(|i| keyword(&format!("gap {i}"), 15_000, 11.0, 0.2, 2))
                .collect::<Vec<_>>(),
        );
        let gaps = analyze_keyword_gaps(&[], &competitor_keywords);

        let analysis = score(&overview, &gaps);
        assert_eq!(analysis.landscape.organic.score, 100);
        assert_eq!(analysis.landscape.paid.score, 100);
        assert_eq!(analysis.confidence, Confidence::High);
        assert_eq!(analysis.landscape.market_position, MarketPosition::MarketLeader);
        assert!(analysis.overall_score >= 80);
        assert!(analysis.overall_score <= 100);
    }

    #[test]
    fn test_market_position_bands() {
        assert_eq!(market_position(90, 80), MarketPosition::MarketLeader);
        assert_eq!(market_position(70, 62), MarketPosition::StrongCompetitor);
        assert_eq!(market_position(50, 52), MarketPosition::EstablishedPlayer);
        assert_eq!(market_position(40, 32), MarketPosition::EmergingPlayer);
        assert_eq!(market_position(20, 20), MarketPosition::NewEntrant);
    }

    #[test]
    fn test_ad_theme_and_pattern_extraction() {
        let ads = vec![
            AdCopy {
                title: "Streamline Your Workflow".to_string(),
                description: "Start your free trial today. Trusted by thousands.".to_string(),
                visible_url: "rival.com".to_string(),
            },
            AdCopy {
                title: "Boost Productivity".to_string(),
                description: "The proven solution for modern teams.".to_string(),
                visible_url: "rival.com".to_string(),
            },
        ];

        let themes = extract_ad_themes(&ads);
        assert!(themes.contains(&"Efficiency".to_string()));
        assert!(themes.contains(&"Reliability".to_string()));

        let patterns = messaging_patterns(&ads);
        assert!(patterns.contains(&"Free Trial".to_string()));
        assert!(patterns.contains(&"Benefits Focus".to_string()));
        assert!(patterns.contains(&"Social Proof".to_string()));
    }

    #[test]
    fn test_organic_imbalance_triggers_paid_recommendation() {
        let overview = CompetitorOverview {
            domain: "example.com".to_string(),
            overview: DomainOverview {
                organic_keywords: 9_000,
                ad_keywords: 100,
                ..Default::default()
            },
            ..Default::default()
        };
        let analysis = score(&overview, &KeywordGapAnalysis::default());
        assert!(
            analysis
                .recommendations
                .iter()
                .any(|r| r.title == "Increase Paid Search Investment")
        );
    }
}
