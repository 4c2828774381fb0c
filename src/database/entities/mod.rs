pub mod billing_events;
pub mod reports;
pub mod workspaces;

pub use billing_events::Entity as BillingEvents;
pub use reports::Entity as Reports;
pub use workspaces::Entity as Workspaces;

// Type aliases
pub type ReportRecord = reports::Model;
pub type WorkspaceRecord = workspaces::Model;
pub type BillingEventRecord = billing_events::Model;
