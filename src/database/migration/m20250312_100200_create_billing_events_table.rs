use super::{BillingEvents, Workspaces};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BillingEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BillingEvents::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BillingEvents::WorkspaceId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BillingEvents::EventType).string().not_null())
                    .col(ColumnDef::new(BillingEvents::SourceEventId).string().null())
                    .col(
                        ColumnDef::new(BillingEvents::AmountCents)
                            .big_integer()
                            .null(),
                    )
                    .col(ColumnDef::new(BillingEvents::Currency).string().not_null())
                    .col(
                        ColumnDef::new(BillingEvents::CreditsAdded)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BillingEvents::CreditsConsumed)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BillingEvents::ProductName).string().null())
                    .col(ColumnDef::new(BillingEvents::PlanChangedTo).string().null())
                    .col(ColumnDef::new(BillingEvents::Metadata).text().null())
                    .col(ColumnDef::new(BillingEvents::Processed).boolean().not_null())
                    .col(
                        ColumnDef::new(BillingEvents::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Foreign key only on PostgreSQL (SQLite cannot add FKs after
        // table creation).
        if manager.get_database_backend() == sea_orm::DatabaseBackend::Postgres {
            manager
                .create_foreign_key(
                    ForeignKey::create()
                        .name("fk_billing_events_workspace_id")
                        .from(BillingEvents::Table, BillingEvents::WorkspaceId)
                        .to(Workspaces::Table, Workspaces::Id)
                        .on_delete(ForeignKeyAction::Cascade)
                        .to_owned(),
                )
                .await?;
        }

        // Processor event ids must apply at most once; the unique index is
        // what serializes concurrent webhook redelivery.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_billing_events_source_event_id")
                    .table(BillingEvents::Table)
                    .col(BillingEvents::SourceEventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_billing_events_workspace_id")
                    .table(BillingEvents::Table)
                    .col(BillingEvents::WorkspaceId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BillingEvents::Table).to_owned())
            .await
    }
}
