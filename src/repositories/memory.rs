use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{RunResult, Settings, TestSuite};
use crate::repositories::{RunResultQuery, Storage};

/// In-process storage, used by tests and single-process deployments
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    inner: Arc<Mutex<InMemoryStorageInner>>,
}

#[derive(Default)]
struct InMemoryStorageInner {
    suites: HashMap<Uuid, TestSuite>,
    settings: HashMap<Uuid, Settings>,
    results: HashMap<Uuid, RunResult>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_suite(&self, mut suite: TestSuite) -> AppResult<TestSuite> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.suites.get(&suite.id) {
            if existing.owner_id != suite.owner_id {
                return Err(AppError::NotFound("Test suite".to_string()));
            }
        }

        suite.touch();
        inner.suites.insert(suite.id, suite.clone());
        Ok(suite)
    }

    async fn get_suite(&self, id: Uuid, owner_id: Uuid) -> AppResult<TestSuite> {
        let inner = self.inner.lock().await;
        inner
            .suites
            .get(&id)
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Test suite".to_string()))
    }

    async fn list_suites_by_owner(&self, owner_id: Uuid) -> AppResult<Vec<TestSuite>> {
        let inner = self.inner.lock().await;
        let mut suites: Vec<TestSuite> = inner
            .suites
            .values()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();

        suites.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(suites)
    }

    async fn delete_suite(&self, id: Uuid, owner_id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        match inner.suites.get(&id) {
            Some(suite) if suite.owner_id == owner_id => {
                inner.suites.remove(&id);
                Ok(())
            }
            _ => Err(AppError::NotFound("Test suite".to_string())),
        }
    }

    async fn save_settings(&self, mut settings: Settings) -> AppResult<Settings> {
        settings.validate()?;
        settings.touch();

        let mut inner = self.inner.lock().await;
        inner.settings.insert(settings.owner_id, settings.clone());
        Ok(settings)
    }

    async fn get_settings(&self, owner_id: Uuid) -> AppResult<Option<Settings>> {
        let inner = self.inner.lock().await;
        Ok(inner.settings.get(&owner_id).cloned())
    }

    async fn list_settings(&self) -> AppResult<Vec<Settings>> {
        let inner = self.inner.lock().await;
        let mut settings: Vec<Settings> = inner.settings.values().cloned().collect();
        settings.sort_by_key(|s| s.owner_id);
        Ok(settings)
    }

    async fn save_run_result(&self, result: &RunResult) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.results.get(&result.id) {
            if existing.owner_id != result.owner_id {
                return Err(AppError::NotFound("Run result".to_string()));
            }
        }

        inner.results.insert(result.id, result.clone());
        Ok(())
    }

    async fn get_run_result(&self, id: Uuid, owner_id: Uuid) -> AppResult<RunResult> {
        let inner = self.inner.lock().await;
        inner
            .results
            .get(&id)
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Run result".to_string()))
    }

    async fn list_run_results(
        &self,
        owner_id: Uuid,
        query: &RunResultQuery,
    ) -> AppResult<Vec<RunResult>> {
        let inner = self.inner.lock().await;
        let mut results: Vec<RunResult> = inner
            .results
            .values()
            .filter(|r| r.owner_id == owner_id)
            .filter(|r| query.since.map_or(true, |since| r.start_time >= since))
            .cloned()
            .collect();

        // Sort by start_time descending
        results.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        Ok(results
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect())
    }

    async fn delete_run_result(&self, id: Uuid, owner_id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.lock().await;
        match inner.results.get(&id) {
            Some(result) if result.owner_id == owner_id => {
                inner.results.remove(&id);
                Ok(())
            }
            _ => Err(AppError::NotFound("Run result".to_string())),
        }
    }

    async fn delete_run_results_before(
        &self,
        owner_id: Uuid,
        cutoff: OffsetDateTime,
    ) -> AppResult<u64> {
        let mut inner = self.inner.lock().await;
        let before = inner.results.len();
        inner
            .results
            .retain(|_, r| !(r.owner_id == owner_id && r.start_time <= cutoff));
        Ok((before - inner.results.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cadence;
    use time::Duration;

    fn suite(owner_id: Uuid) -> TestSuite {
        TestSuite::new(owner_id, "Suite", "https://api.example.com")
    }

    fn result_started(owner_id: Uuid, start_time: OffsetDateTime) -> RunResult {
        RunResult::pending(&suite(owner_id), start_time)
    }

    #[tokio::test]
    async fn test_suite_is_owner_scoped() {
        let storage = InMemoryStorage::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let saved = storage.save_suite(suite(owner)).await.unwrap();

        assert!(storage.get_suite(saved.id, owner).await.is_ok());
        assert!(matches!(
            storage.get_suite(saved.id, other).await,
            Err(AppError::NotFound(_))
        ));
        assert!(storage.delete_suite(saved.id, other).await.is_err());
        assert!(storage.list_suites_by_owner(other).await.unwrap().is_empty());

        let mut hijack = saved.clone();
        hijack.owner_id = other;
        assert!(storage.save_suite(hijack).await.is_err());

        storage.delete_suite(saved.id, owner).await.unwrap();
        assert!(storage.get_suite(saved.id, owner).await.is_err());
    }

    #[tokio::test]
    async fn test_save_touches_updated_at() {
        let storage = InMemoryStorage::new();
        let mut original = suite(Uuid::new_v4());
        original.updated_at = OffsetDateTime::now_utc() - Duration::days(1);

        let saved = storage.save_suite(original.clone()).await.unwrap();
        assert!(saved.updated_at > original.updated_at);
        assert_eq!(saved.created_at, original.created_at);
    }

    #[tokio::test]
    async fn test_settings_validation() {
        let storage = InMemoryStorage::new();
        let owner = Uuid::new_v4();

        let invalid = Settings::scheduled(owner, Cadence::Daily, 0);
        assert!(matches!(
            storage.save_settings(invalid).await,
            Err(AppError::Validation(_))
        ));
        assert!(storage.get_settings(owner).await.unwrap().is_none());

        storage
            .save_settings(Settings::scheduled(owner, Cadence::Hourly, 7))
            .await
            .unwrap();
        let stored = storage.get_settings(owner).await.unwrap().unwrap();
        assert_eq!(stored.scheduling.interval, Cadence::Hourly);
        assert_eq!(storage.list_settings().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_run_result_replace_and_list() {
        let storage = InMemoryStorage::new();
        let owner = Uuid::new_v4();
        let now = OffsetDateTime::now_utc();

        let older = result_started(owner, now - Duration::hours(2));
        let newer = result_started(owner, now - Duration::hours(1));
        storage.save_run_result(&older).await.unwrap();
        storage.save_run_result(&newer).await.unwrap();

        let finalized = newer.clone().finalize(Vec::new(), now);
        storage.save_run_result(&finalized).await.unwrap();

        let listed = storage
            .list_run_results(owner, &RunResultQuery::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert!(listed[0].is_finalized());

        let recent = storage
            .list_run_results(
                owner,
                &RunResultQuery {
                    since: Some(now - Duration::minutes(90)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(recent.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_run_results_before() {
        let storage = InMemoryStorage::new();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let cutoff = OffsetDateTime::now_utc() - Duration::days(30);

        let at_cutoff = result_started(owner, cutoff);
        let after_cutoff = result_started(owner, cutoff + Duration::seconds(1));
        let other_owner = result_started(other, cutoff - Duration::days(1));
        for r in [&at_cutoff, &after_cutoff, &other_owner] {
            storage.save_run_result(r).await.unwrap();
        }

        let deleted = storage.delete_run_results_before(owner, cutoff).await.unwrap();
        assert_eq!(deleted, 1);
        assert!(storage.get_run_result(at_cutoff.id, owner).await.is_err());
        assert!(storage.get_run_result(after_cutoff.id, owner).await.is_ok());
        assert!(storage.get_run_result(other_owner.id, other).await.is_ok());
    }
}
