//! Tracking-readiness scoring.
//!
//! Decomposes measurement maturity into three capped sub-scores: analytics
//! tracking (40), conversion tracking (35) and technical implementation
//! (25). The overall score is their sum.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{
    Confidence, Priority, Recommendation, Section, SectionStatus, top_recommendations,
};
use crate::connectors::SiteProfile;

const ANALYTICS_TOOLS: &[&str] = &[
    "google analytics",
    "adobe analytics",
    "mixpanel",
    "amplitude",
    "hotjar",
];

const CONVERSION_PIXELS: &[&str] = &[
    "facebook pixel",
    "google ads",
    "linkedin insight",
    "twitter pixel",
    "tiktok pixel",
];

const TAG_MANAGERS: &[&str] = &["google tag manager", "tealium", "adobe launch"];

const CONSENT_TOOLS: &[&str] = &["onetrust", "cookiebot", "trustarc"];

const ECOMMERCE_PLATFORMS: &[&str] = &["shopify", "woocommerce", "magento", "bigcommerce"];

/// Result of the tracking-readiness analysis.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TrackingAnalysis {
    pub overall_score: i32,
    pub confidence: Confidence,
    pub summary: String,
    pub sections: Vec<Section>,
    pub recommendations: Vec<Recommendation>,
}

/// Score a site profile for tracking readiness.
pub fn score(profile: &SiteProfile) -> TrackingAnalysis {
    let mut sections = Vec::new();
    let mut recommendations = Vec::new();

    // Analytics tracking, capped at 40.
    let mut analytics_score = 0;
    let mut analytics_found = Vec::new();
    for (category, tools) in &profile.technologies {
        if category.to_lowercase().contains("analytics") {
            for tool in tools {
                if matches_any(tool, ANALYTICS_TOOLS) {
                    analytics_found.push(tool.clone());
                    analytics_score += 15;
                }
            }
        }
    }
    for pixel in &profile.tracking_pixels {
        if pixel.to_lowercase().contains("analytics") {
            analytics_found.push(pixel.clone());
            analytics_score += 10;
        }
    }
    let analytics_score = analytics_score.min(40);

    sections.push(Section {
        title: "Analytics Tracking".to_string(),
        score: analytics_score,
        max_score: 40,
        status: SectionStatus::from_thresholds(analytics_score, 30, 15),
        details: if analytics_found.is_empty() {
            "No analytics tracking detected".to_string()
        } else {
            format!(
                "Found {} analytics tools: {}",
                analytics_found.len(),
                analytics_found
                    .iter()
                    .take(3)
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            )
        },
        items: analytics_found,
    });

    if analytics_score < 15 {
        recommendations.push(Recommendation {
            priority: Priority::High,
            category: "Analytics".to_string(),
            title: "Install Web Analytics".to_string(),
            description: "Add Google Analytics 4 or similar analytics tracking to measure website performance".to_string(),
        });
    }

    // Conversion tracking, capped at 35.
    let mut conversion_score = 0;
    let mut conversion_found = Vec::new();
    for pixel in &profile.tracking_pixels {
        if matches_any(pixel, CONVERSION_PIXELS) {
            conversion_found.push(pixel.clone());
            conversion_score += 12;
        }
    }
    for (category, tools) in &profile.technologies {
        let category = category.to_lowercase();
        if ["advertising", "marketing", "conversion"]
            .iter()
            .any(|w| category.contains(w))
        {
            conversion_found.extend(tools.iter().cloned());
            conversion_score += 8;
        }
    }
    let conversion_score = conversion_score.min(35);

    sections.push(Section {
        title: "Conversion Tracking".to_string(),
        score: conversion_score,
        max_score: 35,
        status: SectionStatus::from_thresholds(conversion_score, 25, 12),
        details: if conversion_found.is_empty() {
            "No conversion tracking detected".to_string()
        } else {
            format!("Found {} conversion tracking tools", conversion_found.len())
        },
        items: conversion_found,
    });

    if conversion_score < 12 {
        recommendations.push(Recommendation {
            priority: Priority::High,
            category: "Conversion Tracking".to_string(),
            title: "Setup Conversion Pixels".to_string(),
            description: "Install Facebook Pixel, Google Ads tracking, or other platform pixels to track conversions".to_string(),
        });
    }

    // Technical implementation, capped at 25.
    let mut technical_score = 0;
    let mut technical_items = Vec::new();
    for tools in profile.technologies.values() {
        for tool in tools {
            if matches_any(tool, TAG_MANAGERS) {
                technical_items.push(format!("Tag Manager: {tool}"));
                technical_score += 10;
            }
            if matches_any(tool, CONSENT_TOOLS) {
                technical_items.push(format!("Consent Management: {tool}"));
                technical_score += 8;
            }
            if matches_any(tool, ECOMMERCE_PLATFORMS) {
                technical_items.push(format!("E-commerce Platform: {tool}"));
                technical_score += 7;
            }
        }
    }
    let technical_score = technical_score.min(25);

    sections.push(Section {
        title: "Technical Implementation".to_string(),
        score: technical_score,
        max_score: 25,
        status: SectionStatus::from_thresholds(technical_score, 20, 10),
        details: if technical_items.is_empty() {
            "Basic technical setup".to_string()
        } else {
            format!("Found {} technical implementations", technical_items.len())
        },
        items: technical_items,
    });

    if technical_score < 10 {
        recommendations.push(Recommendation {
            priority: Priority::Medium,
            category: "Technical Setup".to_string(),
            title: "Implement Tag Management".to_string(),
            description: "Setup Google Tag Manager to centralize tracking code management"
                .to_string(),
        });
    }

    let overall_score = analytics_score + conversion_score + technical_score;

    let confidence = if profile.technologies.len() > 3 && profile.tracking_pixels.len() > 2 {
        Confidence::High
    } else if profile.technologies.len() > 1 || profile.tracking_pixels.len() > 1 {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    let summary = match overall_score {
        80.. => "Excellent tracking setup with comprehensive analytics and conversion tracking.",
        60..=79 => "Good tracking foundation with some areas for improvement.",
        40..=59 => "Basic tracking in place but missing key components for optimal measurement.",
        _ => "Limited tracking setup - significant improvements needed for effective measurement.",
    }
    .to_string();

    TrackingAnalysis {
        overall_score,
        confidence,
        summary,
        sections,
        recommendations: top_recommendations(recommendations),
    }
}

fn matches_any(candidate: &str, known: &[&str]) -> bool {
    let candidate = candidate.to_lowercase();
    known.iter().any(|k| candidate.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn profile_with(
        technologies: Vec<(&str, Vec<&str>)>,
        pixels: Vec<&str>,
    ) -> SiteProfile {
        SiteProfile {
            url: "https://example.com".to_string(),
            technologies: technologies
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into_iter().map(String::from).collect()))
                .collect::<BTreeMap<_, _>>(),
            tracking_pixels: pixels.into_iter().map(String::from).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_profile_scores_zero_with_low_confidence() {
        let analysis = score(&SiteProfile::default());
        assert_eq!(analysis.overall_score, 0);
        assert_eq!(analysis.confidence, Confidence::Low);
        assert_eq!(analysis.sections.len(), 3);
        assert!(analysis.summary.contains("Limited tracking setup"));
        // Missing analytics, conversion and tag management all trigger.
        assert_eq!(analysis.recommendations.len(), 3);
    }

    #[test]
    fn test_rich_profile_scores_high() {
        let analysis = score(&profile_with(
            vec![
                ("Analytics", vec!["Google Analytics", "Mixpanel", "Hotjar"]),
                ("Advertising", vec!["Google Ads Remarketing"]),
                ("Tag Managers", vec!["Google Tag Manager"]),
                ("Ecommerce", vec!["Shopify"]),
                ("Privacy", vec!["OneTrust"]),
            ],
            vec!["Facebook Pixel", "Google Ads Conversion", "LinkedIn Insight Tag"],
        ));

        assert!(analysis.overall_score >= 80, "got {}", analysis.overall_score);
        assert!(analysis.overall_score <= 100);
        assert_eq!(analysis.confidence, Confidence::High);
        assert!(analysis.recommendations.is_empty());
    }

    #[test]
    fn test_sub_scores_stay_within_caps() {
        // Far more evidence than any cap can absorb.
        let many_tools: Vec<&str> = vec!["Google Analytics"; 20];
        let analysis = score(&profile_with(
            vec![("Analytics", many_tools)],
            vec!["Facebook Pixel"; 20].into_iter().collect(),
        ));

        for section in &analysis.sections {
            assert!(section.score >= 0);
            assert!(section.score <= section.max_score);
        }
        assert!(analysis.overall_score <= 100);
    }

    #[test]
    fn test_more_evidence_never_lowers_score() {
        let base = score(&profile_with(
            vec![("Analytics", vec!["Google Analytics"])],
            vec![],
        ));
        let more = score(&profile_with(
            vec![("Analytics", vec!["Google Analytics", "Amplitude"])],
            vec![],
        ));
        assert!(more.overall_score >= base.overall_score);
    }

    #[test]
    fn test_analytics_pixel_counts_toward_analytics() {
        let analysis = score(&profile_with(vec![], vec!["Google Analytics pixel"]));
        let analytics = &analysis.sections[0];
        assert_eq!(analytics.title, "Analytics Tracking");
        assert_eq!(analytics.score, 10);
    }

    #[test]
    fn test_medium_confidence_thresholds() {
        let analysis = score(&profile_with(
            vec![("Analytics", vec!["Google Analytics"]), ("CMS", vec!["WordPress"])],
            vec![],
        ));
        assert_eq!(analysis.confidence, Confidence::Medium);
    }
}
