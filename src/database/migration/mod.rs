use sea_orm_migration::prelude::*;

pub use sea_orm_migration::MigratorTrait;

mod m20250312_100000_create_workspaces_table;
mod m20250312_100100_create_reports_table;
mod m20250312_100200_create_billing_events_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250312_100000_create_workspaces_table::Migration),
            Box::new(m20250312_100100_create_reports_table::Migration),
            Box::new(m20250312_100200_create_billing_events_table::Migration),
        ]
    }
}

/// Common table and column identifiers
#[derive(Iden)]
pub enum Workspaces {
    Table,
    Id,
    Name,
    Plan,
    ReportCredits,
    CreditsResetDate,
    CanPublish,
    ReportsGeneratedThisMonth,
    LastReportGenerated,
    ProcessorCustomerId,
    ProcessorSubscriptionId,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Reports {
    Table,
    Id,
    ReportType,
    WebsiteId,
    InputHash,
    Title,
    Summary,
    DataJson,
    OverallScore,
    Confidence,
    Status,
    GenerationTimeMs,
    CreditCost,
    UserId,
    WorkspaceId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum BillingEvents {
    Table,
    Id,
    WorkspaceId,
    EventType,
    SourceEventId,
    AmountCents,
    Currency,
    CreditsAdded,
    CreditsConsumed,
    ProductName,
    PlanChangedTo,
    Metadata,
    Processed,
    CreatedAt,
}
