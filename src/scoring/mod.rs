//! Scoring engines for the three report types.
//!
//! Every engine is a pure function over structured connector data: no I/O,
//! no clock, no database. Sub-scores start from a base value, accumulate
//! bounded increments from discrete evidence thresholds and are clamped to
//! their cap, so partial or missing upstream data degrades a score instead
//! of failing the report.

pub mod competitor;
pub mod spend;
pub mod tracking;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// How much supporting evidence backed a computed score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "LOW",
            Confidence::Medium => "MEDIUM",
            Confidence::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(Confidence::Low),
            "MEDIUM" => Some(Confidence::Medium),
            "HIGH" => Some(Confidence::High),
            _ => None,
        }
    }
}

/// Recommendation urgency, rendered in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// A single actionable recommendation produced by an engine rule check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Recommendation {
    pub priority: Priority,
    pub category: String,
    pub title: String,
    pub description: String,
}

/// Qualitative status of a scored report section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    Excellent,
    Good,
    Poor,
}

impl SectionStatus {
    /// Band a section score against its excellent/good thresholds.
    pub fn from_thresholds(score: i32, excellent_at: i32, good_at: i32) -> Self {
        if score >= excellent_at {
            SectionStatus::Excellent
        } else if score >= good_at {
            SectionStatus::Good
        } else {
            SectionStatus::Poor
        }
    }
}

/// A capped sub-score with the evidence items that contributed to it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Section {
    pub title: String,
    pub score: i32,
    pub max_score: i32,
    pub status: SectionStatus,
    pub details: String,
    pub items: Vec<String>,
}

/// Clamp an accumulated score into `[0, 100]`.
pub(crate) fn clamp100(value: i64) -> i32 {
    value.clamp(0, 100) as i32
}

/// Truncate a recommendation list to the top entries, preserving the order
/// the rule checks produced them in.
pub(crate) fn top_recommendations(mut recs: Vec<Recommendation>) -> Vec<Recommendation> {
    recs.truncate(5);
    recs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_roundtrip() {
        for c in [Confidence::Low, Confidence::Medium, Confidence::High] {
            assert_eq!(Confidence::parse(c.as_str()), Some(c));
        }
        assert_eq!(Confidence::parse("bogus"), None);
    }

    #[test]
    fn test_confidence_ordering() {
        assert!(Confidence::Low < Confidence::Medium);
        assert!(Confidence::Medium < Confidence::High);
    }

    #[test]
    fn test_section_status_banding() {
        assert_eq!(
            SectionStatus::from_thresholds(35, 30, 15),
            SectionStatus::Excellent
        );
        assert_eq!(
            SectionStatus::from_thresholds(20, 30, 15),
            SectionStatus::Good
        );
        assert_eq!(
            SectionStatus::from_thresholds(5, 30, 15),
            SectionStatus::Poor
        );
    }

    #[test]
    fn test_clamp100() {
        assert_eq!(clamp100(-5), 0);
        assert_eq!(clamp100(50), 50);
        assert_eq!(clamp100(170), 100);
    }

    #[test]
    fn test_top_recommendations_truncates() {
        let recs: Vec<Recommendation> = (0..8)
            .map(|i| Recommendation {
                priority: Priority::Low,
                category: "test".to_string(),
                title: format!("rec {i}"),
                description: String::new(),
            })
            .collect();
        assert_eq!(top_recommendations(recs).len(), 5);
    }
}
