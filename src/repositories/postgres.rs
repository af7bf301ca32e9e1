use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{RunResult, Settings, TestSuite};
use crate::repositories::{
    RunResultQuery, RunResultRepository, SettingsRepository, Storage, SuiteRepository,
};

/// Postgres-backed storage over the SeaORM repositories
#[derive(Clone)]
pub struct PgStorage {
    db: DatabaseConnection,
}

impl PgStorage {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn save_suite(&self, mut suite: TestSuite) -> AppResult<TestSuite> {
        suite.touch();
        SuiteRepository::upsert(&self.db, &suite).await?;
        Ok(suite)
    }

    async fn get_suite(&self, id: Uuid, owner_id: Uuid) -> AppResult<TestSuite> {
        SuiteRepository::find_by_id_and_owner(&self.db, id, owner_id).await
    }

    async fn list_suites_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<TestSuite>> {
        SuiteRepository::list_by_owner(&self.db, owner_id).await
    }

    async fn delete_suite(&self, id: Uuid, owner_id: Uuid) -> AppResult<()> {
        SuiteRepository::delete_by_owner(&self.db, id, owner_id).await
    }

    async fn save_settings(&self, mut settings: Settings) -> AppResult<Settings> {
        settings.validate()?;
        settings.touch();
        SettingsRepository::upsert(&self.db, &settings).await?;
        Ok(settings)
    }

    async fn get_settings(&self, owner_id: Uuid) -> AppResult<Option<Settings>> {
        SettingsRepository::find_by_owner(&self.db, owner_id).await
    }

    async fn list_settings(&self) -> AppResult<Vec<Settings>> {
        SettingsRepository::list_all(&self.db).await
    }

    async fn save_run_result(&self, result: &RunResult) -> AppResult<()> {
        RunResultRepository::upsert(&self.db, result).await
    }

    async fn get_run_result(&self, id: Uuid, owner_id: Uuid) -> AppResult<RunResult> {
        RunResultRepository::find_by_id_and_owner(&self.db, id, owner_id).await
    }

    async fn list_run_results(
        &self,
        owner_id: Uuid,
        query: &RunResultQuery,
    ) -> AppResult<Vec<RunResult>> {
        RunResultRepository::list_by_owner(&self.db, owner_id, query).await
    }

    async fn delete_run_result(&self, id: Uuid, owner_id: Uuid) -> AppResult<()> {
        RunResultRepository::delete_by_owner(&self.db, id, owner_id).await
    }

    async fn delete_run_results_before(
        &self,
        owner_id: Uuid,
        cutoff: OffsetDateTime,
    ) -> AppResult<u64> {
        RunResultRepository::delete_started_before(&self.db, owner_id, cutoff).await
    }
}
