//! Database layer: SeaORM entities, migrations and repositories

pub mod entities;
pub mod migrator;
pub mod repositories;

pub use repositories::SeaOrmRepositoryProvider;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use thiserror::Error;
use tracing::info;

use migrator::Migrator;

/// Failures while bringing up infrastructure
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database connection failed: {0}")]
    Connect(#[source] sea_orm::DbErr),

    #[error("Migration failed: {0}")]
    Migrate(#[source] sea_orm::DbErr),
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./waypark.db?mode=rwc")
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./waypark.db?mode=rwc".to_string(),
            max_connections: 10,
        }
    }
}

impl DatabaseConfig {
    /// Create config for SQLite
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
            ..Self::default()
        }
    }

    /// Shared in-memory SQLite database, used by tests
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

/// Initialize database connection
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, InfraError> {
    info!("Connecting to database: {}", config.url);
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .sqlx_logging(false);
    let db = Database::connect(options).await.map_err(InfraError::Connect)?;
    info!("Database connected successfully");
    Ok(db)
}

/// Apply all pending migrations
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), InfraError> {
    info!("Running database migrations...");
    Migrator::up(db, None).await.map_err(InfraError::Migrate)?;
    info!("Migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RepositoryProvider;

    #[tokio::test]
    async fn in_memory_database_migrates() {
        let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&db).await.unwrap();

        let repos = SeaOrmRepositoryProvider::new(db);
        assert_eq!(repos.slots().count().await.unwrap(), 0);
    }
}
