use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use suite_runner::error::{AppError, AppResult};
use suite_runner::models::{RunResult, RunStatus, Settings, TestSuite};
use suite_runner::repositories::{InMemoryStorage, RunResultQuery, Storage};

/// In-memory storage with injectable failures
#[derive(Default)]
pub struct FlakyStorage {
    pub inner: InMemoryStorage,
    /// Listing this owner's suites fails
    pub broken_owner: Option<Uuid>,
    /// Every save of this suite's results fails
    pub broken_suite: Option<Uuid>,
    /// Pending saves succeed, finalized saves fail
    pub reject_finalized: bool,
    /// Retention deletes for this owner fail
    pub broken_cleanup_owner: Option<Uuid>,
}

fn outage(what: &str) -> AppError {
    AppError::Database(format!("{} unavailable", what))
}

#[async_trait]
impl Storage for FlakyStorage {
    async fn save_suite(&self, suite: TestSuite) -> AppResult<TestSuite> {
        self.inner.save_suite(suite).await
    }

    async fn get_suite(&self, id: Uuid, owner_id: Uuid) -> AppResult<TestSuite> {
        self.inner.get_suite(id, owner_id).await
    }

    async fn list_suites_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<TestSuite>> {
        if self.broken_owner == Some(owner_id) {
            return Err(outage("suites"));
        }
        self.inner.list_suites_by_owner(owner_id).await
    }

    async fn delete_suite(&self, id: Uuid, owner_id: Uuid) -> AppResult<()> {
        self.inner.delete_suite(id, owner_id).await
    }

    async fn save_settings(&self, settings: Settings) -> AppResult<Settings> {
        self.inner.save_settings(settings).await
    }

    async fn get_settings(&self, owner_id: Uuid) -> AppResult<Option<Settings>> {
        self.inner.get_settings(owner_id).await
    }

    async fn list_settings(&self) -> AppResult<Vec<Settings>> {
        self.inner.list_settings().await
    }

    async fn save_run_result(&self, result: &RunResult) -> AppResult<()> {
        if self.broken_suite == Some(result.suite_id) {
            return Err(outage("results"));
        }
        if self.reject_finalized && result.status != RunStatus::Pending {
            return Err(outage("results"));
        }
        self.inner.save_run_result(result).await
    }

    async fn get_run_result(&self, id: Uuid, owner_id: Uuid) -> AppResult<RunResult> {
        self.inner.get_run_result(id, owner_id).await
    }

    async fn list_run_results(
        &self,
        owner_id: Uuid,
        query: &RunResultQuery,
    ) -> AppResult<Vec<RunResult>> {
        self.inner.list_run_results(owner_id, query).await
    }

    async fn delete_run_result(&self, id: Uuid, owner_id: Uuid) -> AppResult<()> {
        self.inner.delete_run_result(id, owner_id).await
    }

    async fn delete_run_results_before(
        &self,
        owner_id: Uuid,
        cutoff: OffsetDateTime,
    ) -> AppResult<u64> {
        if self.broken_cleanup_owner == Some(owner_id) {
            return Err(outage("retention"));
        }
        self.inner.delete_run_results_before(owner_id, cutoff).await
    }
}
