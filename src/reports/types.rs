use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The three report products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    TrackingReadiness,
    SpendBaseline,
    CompetitorSnapshot,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::TrackingReadiness => "TRACKING_READINESS",
            ReportType::SpendBaseline => "SPEND_BASELINE",
            ReportType::CompetitorSnapshot => "COMPETITOR_SNAPSHOT",
        }
    }

    pub fn all() -> [ReportType; 3] {
        [
            ReportType::TrackingReadiness,
            ReportType::SpendBaseline,
            ReportType::CompetitorSnapshot,
        ]
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TRACKING_READINESS" => Ok(ReportType::TrackingReadiness),
            "SPEND_BASELINE" => Ok(ReportType::SpendBaseline),
            "COMPETITOR_SNAPSHOT" => Ok(ReportType::CompetitorSnapshot),
            other => Err(format!("unknown report type: {other}")),
        }
    }
}

/// Report lifecycle state. `Ready` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Generating,
    Ready,
    Failed,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Generating => "generating",
            ReportStatus::Ready => "ready",
            ReportStatus::Failed => "failed",
        }
    }
}
