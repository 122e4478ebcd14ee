use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::info;

use crate::config::AppConfig;
use crate::migrator::Migrator;

/// Shared database connection handle.
pub type DbPool = DatabaseConnection;

/// Connection pool tuning knobs.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

/// Establishes a database connection with default pool settings.
pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    establish_connection_with_config(database_url, DbConfig::default()).await
}

/// Establishes a database connection with explicit pool settings.
pub async fn establish_connection_with_config(
    database_url: &str,
    cfg: DbConfig,
) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .connect_timeout(cfg.connect_timeout)
        .idle_timeout(cfg.idle_timeout)
        .acquire_timeout(cfg.acquire_timeout)
        .sqlx_logging(true);

    let conn = Database::connect(opt).await?;
    info!("Database connection established");
    Ok(conn)
}

/// Establishes a connection using pool settings from the application config.
pub async fn establish_connection_from_app_config(
    config: &AppConfig,
) -> Result<DatabaseConnection, DbErr> {
    establish_connection_with_config(
        &config.database_url,
        DbConfig {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            connect_timeout: Duration::from_secs(config.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(config.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(config.db_acquire_timeout_secs),
        },
    )
    .await
}

/// Applies all pending migrations.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<(), DbErr> {
    info!("Running database migrations");
    Migrator::up(conn, None).await?;
    info!("Database migrations complete");
    Ok(())
}
