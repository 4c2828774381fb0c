use super::Workspaces;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Workspaces::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Workspaces::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Workspaces::Name).string().not_null())
                    .col(ColumnDef::new(Workspaces::Plan).string().not_null())
                    .col(
                        ColumnDef::new(Workspaces::ReportCredits)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Workspaces::CreditsResetDate)
                            .date()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Workspaces::CanPublish).boolean().not_null())
                    .col(
                        ColumnDef::new(Workspaces::ReportsGeneratedThisMonth)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Workspaces::LastReportGenerated)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Workspaces::ProcessorCustomerId)
                            .string()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Workspaces::ProcessorSubscriptionId)
                            .string()
                            .null(),
                    )
                    .col(ColumnDef::new(Workspaces::IsActive).boolean().not_null())
                    .col(
                        ColumnDef::new(Workspaces::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Workspaces::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Workspaces::Table).to_owned())
            .await
    }
}
