pub mod billing_events;
pub mod reports;
pub mod workspaces;

pub use billing_events::BillingEventsDao;
pub use reports::{ReportQuery, ReportsDao, ScoredUpdate};
pub use workspaces::WorkspacesDao;
