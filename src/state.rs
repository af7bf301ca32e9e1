use std::sync::Arc;

use sea_orm::{ConnectOptions, Database};
use sqlx::postgres::PgPool;

use crate::config::Config;
use crate::repositories::{PgStorage, Storage};
use crate::services::{ExecutorConfig, SuiteRunner};

/// Application state shared across all handlers and the scheduler
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Storage collaborator for suites, settings and run results
    pub storage: Arc<dyn Storage>,
    pub runner: SuiteRunner,
}

impl AppState {
    /// Create a new AppState backed by Postgres
    pub async fn new(config: Config) -> Result<Self, AppStateError> {
        // Connect to PostgreSQL with SQLx (for migrations)
        let pg_pool = PgPool::connect(&config.database_url)
            .await
            .map_err(|e| AppStateError::Postgres(e.to_string()))?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pg_pool)
            .await
            .map_err(|e| AppStateError::Migration(e.to_string()))?;
        pg_pool.close().await;

        // Connect to PostgreSQL with SeaORM
        let mut opt = ConnectOptions::new(&config.database_url);
        opt.max_connections(20)
            .min_connections(2)
            .sqlx_logging(false);

        let db = Database::connect(opt)
            .await
            .map_err(|e| AppStateError::Postgres(e.to_string()))?;

        Self::with_storage(config, Arc::new(PgStorage::new(db)))
    }

    /// Create AppState with a custom storage (in-memory for tests)
    pub fn with_storage(config: Config, storage: Arc<dyn Storage>) -> Result<Self, AppStateError> {
        let runner = SuiteRunner::with_config(ExecutorConfig {
            timeout: config.request_timeout(),
        })
        .map_err(|e| AppStateError::HttpClient(e.to_string()))?;

        Ok(Self {
            config,
            storage,
            runner,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("PostgreSQL connection error: {0}")]
    Postgres(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}
