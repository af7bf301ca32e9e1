pub mod memory;
pub mod postgres;
pub mod run_result;
pub mod settings;
pub mod suite;

pub use memory::InMemoryStorage;
pub use postgres::PgStorage;
pub use run_result::RunResultRepository;
pub use settings::SettingsRepository;
pub use suite::SuiteRepository;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{RunResult, Settings, TestSuite};

/// Filter and paging for run result listings
#[derive(Debug, Clone)]
pub struct RunResultQuery {
    /// Only results started at or after this instant
    pub since: Option<OffsetDateTime>,
    pub limit: u64,
    pub offset: u64,
}

impl Default for RunResultQuery {
    fn default() -> Self {
        Self {
            since: None,
            limit: 100,
            offset: 0,
        }
    }
}

/// Storage collaborator the engine reads suites and settings from and
/// writes run results to. Every lookup is owner scoped: a record that
/// belongs to another owner is reported as not found.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert or replace a suite, stamping `updated_at`
    async fn save_suite(&self, suite: TestSuite) -> AppResult<TestSuite>;

    async fn get_suite(&self, id: Uuid, owner_id: Uuid) -> AppResult<TestSuite>;

    async fn list_suites_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<TestSuite>>;

    async fn delete_suite(&self, id: Uuid, owner_id: Uuid) -> AppResult<()>;

    /// Validate and insert or replace an owner's settings, stamping `updated_at`
    async fn save_settings(&self, settings: Settings) -> AppResult<Settings>;

    async fn get_settings(&self, owner_id: Uuid) -> AppResult<Option<Settings>>;

    /// Settings of every owner that has stored any
    async fn list_settings(&self) -> AppResult<Vec<Settings>>;

    /// Append a new run result or replace the one with the same id
    async fn save_run_result(&self, result: &RunResult) -> AppResult<()>;

    async fn get_run_result(&self, id: Uuid, owner_id: Uuid) -> AppResult<RunResult>;

    /// Owner's run results, newest first
    async fn list_run_results(
        &self,
        owner_id: Uuid,
        query: &RunResultQuery,
    ) -> AppResult<Vec<RunResult>>;

    async fn delete_run_result(&self, id: Uuid, owner_id: Uuid) -> AppResult<()>;

    /// Delete every run result of the owner started at or before `cutoff`.
    /// Returns the number deleted.
    async fn delete_run_results_before(
        &self,
        owner_id: Uuid,
        cutoff: OffsetDateTime,
    ) -> AppResult<u64>;
}

/// Render a unit enum through its serde name for a text column
pub(crate) fn to_column_text<T: serde::Serialize>(column: &str, value: &T) -> AppResult<String> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(text)) => Ok(text),
        Ok(other) => Err(AppError::Internal(format!(
            "{} does not serialize to text: {}",
            column, other
        ))),
        Err(e) => Err(AppError::Internal(e.to_string())),
    }
}

/// Parse a text column back into a unit enum by its serde name
pub(crate) fn from_column_text<T: serde::de::DeserializeOwned>(column: &str, raw: &str) -> AppResult<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string())).map_err(|e| {
        AppError::Database(format!("Invalid {} value '{}': {}", column, raw, e))
    })
}
