//! Deterministic mock connectors for development and tests.
//!
//! Mock data is derived from a stable hash of the input domain or account
//! id, so repeated requests see identical upstream data and the report
//! cache behaves exactly as it would against live providers. A host or
//! account id containing `fail` simulates an unreachable provider.

use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};

use super::{
    AdAccountRef, AdCopy, AdPlatform, AdsConnector, CampaignSummary, CompetitiveIntel,
    CompetitorMetrics, CompetitorOverview, ConnectorError, DailySpend, DomainOverview,
    KeywordMetric, SiteAnalyzer, SiteProfile,
};
use crate::fingerprint::normalize_domain;

fn stable_hash(input: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    hasher.finish()
}

fn fails(input: &str) -> bool {
    input.contains("fail")
}

/// Mock site analyzer producing a plausible technology profile.
#[derive(Default)]
pub struct MockSiteAnalyzer;

#[async_trait]
impl SiteAnalyzer for MockSiteAnalyzer {
    async fn analyze(&self, url: &str) -> Result<SiteProfile, ConnectorError> {
        let domain = normalize_domain(url);
        if fails(&domain) {
            return Err(ConnectorError::Request(format!(
                "connection refused: {domain}"
            )));
        }

        let seed = stable_hash(&domain);
        let mut technologies = BTreeMap::new();
        technologies.insert(
            "Analytics".to_string(),
            vec!["Google Analytics".to_string()],
        );
        if seed % 3 != 0 {
            technologies.insert(
                "Tag Managers".to_string(),
                vec!["Google Tag Manager".to_string()],
            );
        }
        if seed % 4 == 0 {
            technologies.insert("Ecommerce".to_string(), vec!["Shopify".to_string()]);
        }
        technologies.insert("CMS".to_string(), vec!["WordPress".to_string()]);

        let mut tracking_pixels = vec!["Google Analytics".to_string()];
        if seed % 2 == 0 {
            tracking_pixels.push("Facebook Pixel".to_string());
        }
        if seed % 5 == 0 {
            tracking_pixels.push("LinkedIn Insight Tag".to_string());
        }

        Ok(SiteProfile {
            url: url.to_string(),
            title: Some(format!("{domain} — Home")),
            description: Some("Mock site description".to_string()),
            industry: Some(industry_for(&domain).to_string()),
            business_model: Some("b2b".to_string()),
            key_topics: vec![
                "automation".to_string(),
                "analytics".to_string(),
                "growth".to_string(),
            ],
            value_propositions: vec!["Save time with automation".to_string()],
            technologies,
            tracking_pixels,
        })
    }
}

fn industry_for(domain: &str) -> &'static str {
    if domain.contains("shop") || domain.contains("store") {
        "ecommerce"
    } else if domain.contains("marketing") || domain.contains("ad") {
        "marketing"
    } else {
        "technology"
    }
}

/// Mock ads connector for a single platform.
pub struct MockAdsConnector {
    platform: AdPlatform,
}

impl MockAdsConnector {
    pub fn new(platform: AdPlatform) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl AdsConnector for MockAdsConnector {
    fn platform(&self) -> AdPlatform {
        self.platform
    }

    async fn spend_data(
        &self,
        account: &AdAccountRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailySpend>, ConnectorError> {
        if fails(&account.account_id) {
            return Err(ConnectorError::Request(format!(
                "account unreachable: {}",
                account.account_id
            )));
        }

        let seed = stable_hash(&account.account_id);
        let daily_spend = 20.0 + (seed % 80) as f64;
        let mut records = Vec::new();
        let mut date = start;
        while date <= end {
            let wobble = (stable_hash(&format!("{}-{date}", account.account_id)) % 10) as f64;
            records.push(DailySpend {
                date,
                campaign_id: format!("{}-c1", self.platform),
                campaign_name: format!("{} Search Campaign", self.platform),
                spend: daily_spend + wobble,
                impressions: 1500 + (seed % 1000),
                clicks: 40 + (seed % 60),
                conversions: 1.0 + (seed % 4) as f64,
            });
            date += Duration::days(1);
        }
        Ok(records)
    }

    async fn campaigns_summary(
        &self,
        account: &AdAccountRef,
        days: u32,
    ) -> Result<Vec<CampaignSummary>, ConnectorError> {
        if fails(&account.account_id) {
            return Err(ConnectorError::Request(format!(
                "account unreachable: {}",
                account.account_id
            )));
        }

        let seed = stable_hash(&account.account_id);
        Ok(vec![CampaignSummary {
            campaign_id: format!("{}-c1", self.platform),
            campaign_name: format!("{} Search Campaign", self.platform),
            spend: (20.0 + (seed % 80) as f64) * days as f64,
            clicks: (40 + (seed % 60)) * days as u64,
            conversions: (1.0 + (seed % 4) as f64) * days as f64,
        }])
    }
}

const ORGANIC_COMPETITOR_NAMES: &[&str] = &[
    "techcompetitor.com",
    "rivalsite.com",
    "alternativesolution.com",
    "competingplatform.com",
    "industryplayer.com",
];

const PAID_COMPETITOR_NAMES: &[&str] = &[
    "adcompetitor.com",
    "ppcrival.com",
    "paidadssolution.com",
    "adspendplatform.com",
    "paidcompetitor.com",
];

const AD_TITLES: &[&str] = &[
    "Transform Your Business Today",
    "The Complete Solution You Need",
    "Streamline Operations Instantly",
    "Boost Productivity & Efficiency",
    "Professional Grade Platform",
];

const AD_DESCRIPTIONS: &[&str] = &[
    "Discover how leading companies improve efficiency with our platform. Start your free trial today.",
    "Join thousands of professionals who trust our solution. Get started in minutes with expert support.",
    "Revolutionary approach to business optimization. See immediate results with our proven methodology.",
    "Enterprise-grade solution designed for modern businesses. Secure, scalable, and user-friendly.",
    "Unlock your team's potential with advanced automation. Integrate seamlessly with existing workflows.",
];

/// Mock competitive-intelligence client.
#[derive(Default)]
pub struct MockCompetitiveIntel;

#[async_trait]
impl CompetitiveIntel for MockCompetitiveIntel {
    async fn competitor_overview(
        &self,
        domain: &str,
    ) -> Result<CompetitorOverview, ConnectorError> {
        if fails(domain) {
            return Err(ConnectorError::Request(format!(
                "provider unavailable for {domain}"
            )));
        }

        let seed = stable_hash(domain) % 10_000;

        let overview = DomainOverview {
            domain: domain.to_string(),
            organic_rank: 1_000 + seed,
            organic_keywords: 5_000u64.saturating_sub(seed / 2).max(100),
            organic_traffic: 100_000u64.saturating_sub(seed * 10).max(1_000),
            organic_cost: 50_000.0 - (seed * 5) as f64,
            ad_keywords: 2_000u64.saturating_sub(seed).max(50),
        };

        let organic_competitors = ORGANIC_COMPETITOR_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let h = stable_hash(&format!("{domain}_{i}")) % 1_000;
                CompetitorMetrics {
                    domain: name.to_string(),
                    competitive_relevance: (0.9 - i as f64 * 0.15).max(0.3),
                    common_keywords: 500u64.saturating_sub(h).max(50),
                    ad_keywords: 200u64.saturating_sub(h / 2).max(20),
                    ad_traffic: 50_000u64.saturating_sub(h * 50).max(1_000),
                    organic_traffic: 200_000u64.saturating_sub(h * 100).max(5_000),
                    ad_cost: 0.0,
                }
            })
            .collect();

        let paid_competitors = PAID_COMPETITOR_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let h = stable_hash(&format!("{domain}_paid_{i}")) % 1_000;
                CompetitorMetrics {
                    domain: name.to_string(),
                    competitive_relevance: (0.85 - i as f64 * 0.12).max(0.4),
                    common_keywords: 300u64.saturating_sub(h).max(30),
                    ad_keywords: 400u64.saturating_sub(h).max(50),
                    ad_traffic: 80_000u64.saturating_sub(h * 60).max(2_000),
                    organic_traffic: 0,
                    ad_cost: (25_000.0 - (h * 20) as f64).max(1_000.0),
                }
            })
            .collect();

        let top_keywords = mock_keywords(domain, 20);

        let ad_copies = AD_TITLES
            .iter()
            .zip(AD_DESCRIPTIONS.iter())
            .map(|(title, description)| AdCopy {
                title: title.to_string(),
                description: description.to_string(),
                visible_url: format!("{domain}/solution"),
            })
            .collect();

        Ok(CompetitorOverview {
            domain: domain.to_string(),
            overview,
            organic_competitors,
            paid_competitors,
            top_keywords,
            ad_copies,
        })
    }

    async fn domain_keywords(
        &self,
        domain: &str,
        limit: usize,
    ) -> Result<Vec<KeywordMetric>, ConnectorError> {
        if fails(domain) {
            return Err(ConnectorError::Request(format!(
                "provider unavailable for {domain}"
            )));
        }
        Ok(mock_keywords(domain, limit))
    }
}

fn mock_keywords(domain: &str, limit: usize) -> Vec<KeywordMetric> {
    let base_keywords: &[&str] = if domain.contains("marketing") || domain.contains("ad") {
        &[
            "marketing platform",
            "advertising tool",
            "campaign management",
            "digital marketing",
            "marketing automation",
        ]
    } else {
        &[
            "software solution",
            "tech platform",
            "application development",
            "digital tool",
            "automation software",
        ]
    };

    let mut keywords = Vec::new();
    'outer: for (i, base) in base_keywords.iter().enumerate() {
        for suffix in ["", " tools", " platform", " service"] {
            if keywords.len() >= limit {
                break 'outer;
            }
            let term = format!("{base}{suffix}");
            let h = stable_hash(&format!("{domain}_{term}")) % 1_000;
            keywords.push(KeywordMetric {
                keyword: term,
                position: (1 + i as u32 + (h % 10) as u32).min(50),
                search_volume: 5_000u64.saturating_sub(h * 3).max(100),
                cpc: (10.0 - h as f64 * 0.008).max(0.5),
                competition: (0.2 + h as f64 * 0.0005).min(1.0),
            });
        }
    }
    keywords
}
