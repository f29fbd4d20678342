//! Infrastructure shared by the web server and the maintenance binaries:
//! configuration, logging and the PostgreSQL pool.

use config::Config;
use log::*;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::sync::Arc;
use tokio::time::Duration;

pub mod config;
pub mod logging;

/// PostgreSQL schema holding every mentorship table.
pub const DB_SCHEMA: &str = "mentorship_platform";

/// Statements slower than this are logged at `warn`. Admission counts run
/// while participant advisory locks are held.
const SLOW_STATEMENT_THRESHOLD: Duration = Duration::from_millis(500);

/// Pool settings for `config`. Per-statement SQL logging stays at `debug`.
pub fn connect_options(config: &Config) -> ConnectOptions {
    let mut opt = ConnectOptions::new(config.database_url());
    opt.max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .connect_timeout(Duration::from_secs(config.db_connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime_secs))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug)
        .sqlx_slow_statements_logging_settings(LevelFilter::Warn, SLOW_STATEMENT_THRESHOLD)
        .set_schema_search_path(DB_SCHEMA);
    opt
}

/// Opens the pool and checks that PostgreSQL answers before the caller starts
/// serving or seeding.
pub async fn init_database(config: &Config) -> Result<DatabaseConnection, DbErr> {
    info!(
        "Connecting to PostgreSQL schema {DB_SCHEMA} with {}..{} pooled connections \
         (acquire timeout {}s)",
        config.db_min_connections, config.db_max_connections, config.db_acquire_timeout_secs,
    );

    let db = Database::connect(connect_options(config)).await?;
    db.ping().await?;
    debug!("Database connection verified");

    Ok(db)
}

/// The connection pool and configuration every request needs. Clone is cheap:
/// the pool sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub database_connection: Arc<DatabaseConnection>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, db: &Arc<DatabaseConnection>) -> Self {
        Self {
            database_connection: Arc::clone(db),
            config,
        }
    }

    pub fn db_conn_ref(&self) -> &DatabaseConnection {
        self.database_connection.as_ref()
    }
}
