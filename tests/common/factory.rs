use time::OffsetDateTime;
use uuid::Uuid;

use suite_runner::models::{Cadence, RunResult, Settings, Step, TestSuite};
use suite_runner::repositories::Storage;
use suite_runner::services::AuthService;
use suite_runner::state::AppState;

/// Authentication info for tests
pub struct TestAuth {
    pub owner_id: Uuid,
    pub token: String,
}

impl TestAuth {
    /// Get the Authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Factory for creating test data
pub struct Factory<'a> {
    state: &'a AppState,
}

impl<'a> Factory<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn storage(&self) -> &dyn Storage {
        self.state.storage.as_ref()
    }

    /// Create a fresh owner and a token for it
    pub fn create_owner(&self) -> TestAuth {
        let owner_id = Uuid::new_v4();
        let token = AuthService::generate_token(owner_id, &self.state.config).unwrap();

        TestAuth { owner_id, token }
    }

    /// Store a suite with the given steps
    pub async fn create_suite(&self, owner_id: Uuid, base_url: &str, steps: Vec<Step>) -> TestSuite {
        let suite = steps.into_iter().fold(
            TestSuite::new(owner_id, format!("Suite {}", Uuid::new_v4()), base_url),
            TestSuite::with_step,
        );

        self.storage().save_suite(suite).await.unwrap()
    }

    /// Store settings with scheduling enabled at `interval`
    pub async fn schedule(&self, owner_id: Uuid, interval: Cadence, retain_results: i32) -> Settings {
        self.storage()
            .save_settings(Settings::scheduled(owner_id, interval, retain_results))
            .await
            .unwrap()
    }

    /// Store settings with scheduling disabled
    pub async fn unscheduled(&self, owner_id: Uuid, retain_results: i32) -> Settings {
        let mut settings = Settings::new(owner_id);
        settings.scheduling.retain_results = retain_results;

        self.storage().save_settings(settings).await.unwrap()
    }

    /// Store a finalized, stepless result that started at `start_time`
    pub async fn create_result(&self, suite: &TestSuite, start_time: OffsetDateTime) -> RunResult {
        let result = RunResult::pending(suite, start_time).finalize(Vec::new(), start_time);
        self.storage().save_run_result(&result).await.unwrap();
        result
    }
}
