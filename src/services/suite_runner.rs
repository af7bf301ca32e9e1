use time::OffsetDateTime;

use crate::error::{AppError, AppResult};
use crate::models::{RunResult, TestSuite};
use crate::repositories::Storage;
use crate::services::step_executor::{ExecutorConfig, StepExecutor};

/// Suite Runner Service
///
/// Runs every step of a suite in declared order, one at a time. A failing
/// step never stops the run: the report always holds one result per step.
/// Each call owns its own `RunResult`, so separate runs may proceed
/// concurrently without coordination.
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    executor: StepExecutor,
}

impl SuiteRunner {
    pub fn new(executor: StepExecutor) -> Self {
        Self { executor }
    }

    pub fn with_config(config: ExecutorConfig) -> AppResult<Self> {
        Ok(Self::new(StepExecutor::with_config(config)?))
    }

    /// Run a suite to completion without touching storage
    pub async fn run(&self, suite: &TestSuite) -> RunResult {
        let pending = RunResult::pending(suite, OffsetDateTime::now_utc());
        self.complete(pending, suite).await
    }

    /// Run a suite, recording it as pending first and replacing that record
    /// with the finalized result once every step has executed.
    ///
    /// When the finalized result cannot be stored the pending record is
    /// removed and the finished report is handed back inside the error.
    pub async fn run_recorded(
        &self,
        storage: &dyn Storage,
        suite: &TestSuite,
    ) -> Result<RunResult, RecordError> {
        let pending = RunResult::pending(suite, OffsetDateTime::now_utc());
        storage
            .save_run_result(&pending)
            .await
            .map_err(RecordError::NotStarted)?;

        tracing::info!(
            run_id = %pending.id,
            suite_id = %suite.id,
            owner_id = %suite.owner_id,
            steps = suite.steps.len(),
            "Suite run started"
        );

        let result = self.complete(pending, suite).await;

        if let Err(e) = storage.save_run_result(&result).await {
            tracing::error!(
                run_id = %result.id,
                suite_id = %suite.id,
                error = %e,
                "Failed to record finished run, removing pending record"
            );
            if let Err(cleanup) = storage.delete_run_result(result.id, result.owner_id).await {
                tracing::error!(run_id = %result.id, error = %cleanup, "Pending record left behind");
            }
            return Err(RecordError::NotRecorded {
                result: Box::new(result),
                source: e,
            });
        }

        let summary = result.summary();
        tracing::info!(
            run_id = %result.id,
            suite_id = %suite.id,
            status = result.status.as_str(),
            passed = summary.passed,
            failed = summary.failed,
            duration_ms = result.duration_ms,
            "Suite run finished"
        );

        Ok(result)
    }

    async fn complete(&self, pending: RunResult, suite: &TestSuite) -> RunResult {
        let mut steps = Vec::with_capacity(suite.steps.len());

        // Later steps may depend on side effects of earlier ones
        for step in &suite.steps {
            let result = self
                .executor
                .execute(step, &suite.base_url, suite.environment)
                .await;
            steps.push(result);
        }

        pending.finalize(steps, OffsetDateTime::now_utc())
    }
}

/// Why a recorded run could not be stored
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The pending record was rejected; no step was executed
    #[error("Failed to open run record: {0}")]
    NotStarted(#[source] AppError),

    /// Every step ran but the finalized result was not stored
    #[error("Run {} finished but was not recorded: {source}", result.id)]
    NotRecorded {
        result: Box<RunResult>,
        #[source]
        source: AppError,
    },
}

impl RecordError {
    /// The finished report, when the run got that far
    pub fn into_result(self) -> Option<RunResult> {
        match self {
            Self::NotStarted(_) => None,
            Self::NotRecorded { result, .. } => Some(*result),
        }
    }
}

impl From<RecordError> for AppError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::NotStarted(source) | RecordError::NotRecorded { source, .. } => source,
        }
    }
}
