use clap::Subcommand;
use sea_orm_migration::MigratorTrait;

use crate::Config;
use crate::database::migration::Migrator;
use crate::database::{DatabaseManager, DatabaseManagerImpl};

#[derive(Subcommand)]
pub enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Roll back the most recent migration
    Down,
    /// Show migration status
    Status,
    /// Drop all tables and re-apply every migration
    Fresh,
}

pub async fn handle_migrate_command(
    action: MigrateAction,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let database = DatabaseManagerImpl::new_from_config(&config.database).await?;
    let connection = database.connection();

    match action {
        MigrateAction::Up => {
            Migrator::up(connection, None).await?;
            println!("Migrations applied");
        }
        MigrateAction::Down => {
            Migrator::down(connection, Some(1)).await?;
            println!("Rolled back one migration");
        }
        MigrateAction::Status => {
            let pending = Migrator::get_pending_migrations(connection).await?;
            if pending.is_empty() {
                println!("All migrations applied");
            } else {
                println!("{} pending migrations:", pending.len());
                for migration in pending {
                    println!("  {}", migration.name());
                }
            }
        }
        MigrateAction::Fresh => {
            Migrator::fresh(connection).await?;
            println!("Database recreated from scratch");
        }
    }

    Ok(())
}
