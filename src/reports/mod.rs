pub mod service;
pub mod types;

pub use service::{
    CompetitorSnapshotRequest, ReportService, SpendBaselineRequest, TrackingReadinessRequest,
};
pub use types::{ReportStatus, ReportType};
