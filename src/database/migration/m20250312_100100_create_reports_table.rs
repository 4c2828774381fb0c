use super::Reports;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reports::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reports::ReportType).string().not_null())
                    .col(ColumnDef::new(Reports::WebsiteId).string().null())
                    .col(ColumnDef::new(Reports::InputHash).string().not_null())
                    .col(ColumnDef::new(Reports::Title).string().not_null())
                    .col(ColumnDef::new(Reports::Summary).text().null())
                    .col(ColumnDef::new(Reports::DataJson).text().null())
                    .col(ColumnDef::new(Reports::OverallScore).integer().null())
                    .col(ColumnDef::new(Reports::Confidence).string().null())
                    .col(ColumnDef::new(Reports::Status).string().not_null())
                    .col(ColumnDef::new(Reports::GenerationTimeMs).integer().null())
                    .col(ColumnDef::new(Reports::CreditCost).integer().not_null())
                    .col(ColumnDef::new(Reports::UserId).string().null())
                    .col(ColumnDef::new(Reports::WorkspaceId).string().not_null())
                    .col(
                        ColumnDef::new(Reports::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Reports::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Dedup lookups filter on (report_type, input_hash, status). Not
        // unique: multiple failed attempts may share a hash.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reports_type_hash_status")
                    .table(Reports::Table)
                    .col(Reports::ReportType)
                    .col(Reports::InputHash)
                    .col(Reports::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reports_workspace_id")
                    .table(Reports::Table)
                    .col(Reports::WorkspaceId)
                    .to_owned(),
            )
            .await?;

        // Stale-generation sweeps scan by status + age.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_reports_status_created")
                    .table(Reports::Table)
                    .col(Reports::Status)
                    .col(Reports::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reports::Table).to_owned())
            .await
    }
}
