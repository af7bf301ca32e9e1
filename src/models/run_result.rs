use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{Environment, HttpMethod, TestSuite};

/// Overall verdict of a suite run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Passed,
    Failed,
    Pending,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Pending => "pending",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
}

impl StepStatus {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionResult {
    pub name: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

/// What was sent, after URL resolution and header flattening
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

/// What came back. Status 0 means the round trip never completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl ResponseSnapshot {
    /// Sentinel response for a request that never completed
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: 0,
            headers: HashMap::new(),
            body: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    pub status: StepStatus,
    pub duration_ms: i64,
    pub request: RequestSnapshot,
    pub response: ResponseSnapshot,
    pub assertions: Vec<AssertionResult>,
}

/// Replayable report of one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub suite_id: Uuid,
    /// Suite name at run time; survives suite rename or deletion
    pub suite_name: String,
    pub status: RunStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub duration_ms: i64,
    pub environment: Environment,
    pub steps: Vec<StepResult>,
}

/// Summary statistics for a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
}

impl RunResult {
    /// Open a pending result for `suite`
    pub fn pending(suite: &TestSuite, start_time: OffsetDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: suite.owner_id,
            suite_id: suite.id,
            suite_name: suite.name.clone(),
            status: RunStatus::Pending,
            start_time,
            end_time: None,
            duration_ms: 0,
            environment: suite.environment,
            steps: Vec::new(),
        }
    }

    /// Close the run with its step results. Passed iff every step passed.
    pub fn finalize(mut self, steps: Vec<StepResult>, end_time: OffsetDateTime) -> Self {
        debug_assert!(!self.is_finalized(), "run result finalized twice");

        self.status = if steps.iter().all(|s| s.status.is_passed()) {
            RunStatus::Passed
        } else {
            RunStatus::Failed
        };
        self.duration_ms = (end_time - self.start_time).whole_milliseconds().max(0) as i64;
        self.end_time = Some(end_time);
        self.steps = steps;
        self
    }

    pub fn is_finalized(&self) -> bool {
        self.status != RunStatus::Pending
    }

    /// Whole days elapsed since the run started
    pub fn age_days(&self, now: OffsetDateTime) -> i64 {
        (now - self.start_time).whole_days()
    }

    pub fn summary(&self) -> RunSummary {
        let total = self.steps.len();
        let passed = self.steps.iter().filter(|s| s.status.is_passed()).count();
        let pass_rate = if total > 0 {
            (passed as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        RunSummary {
            total,
            passed,
            failed: total - passed,
            pass_rate,
        }
    }
}
