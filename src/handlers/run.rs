use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middlewares::AuthOwner;
use crate::models::{RunResult, RunSummary};
use crate::services::RecordError;
use crate::state::AppState;

/// A finished run plus its step tally
#[derive(Debug, Serialize)]
pub struct RunResponse {
    #[serde(flatten)]
    pub result: RunResult,
    pub summary: RunSummary,
    /// False when the run finished but storing it failed
    pub recorded: bool,
}

impl RunResponse {
    fn new(result: RunResult, recorded: bool) -> Self {
        let summary = result.summary();
        Self {
            result,
            summary,
            recorded,
        }
    }
}

/// Run a suite now and wait for it to finish
pub async fn run_suite(
    owner: AuthOwner,
    State(state): State<AppState>,
    Path(suite_id): Path<Uuid>,
) -> AppResult<Json<RunResponse>> {
    let suite = state.storage.get_suite(suite_id, owner.id).await?;

    tracing::info!(suite_id = %suite.id, owner_id = %owner.id, "Manual run requested");
    let response = match state.runner.run_recorded(state.storage.as_ref(), &suite).await {
        Ok(result) => RunResponse::new(result, true),
        Err(RecordError::NotRecorded { result, .. }) => RunResponse::new(*result, false),
        Err(e) => return Err(e.into()),
    };

    Ok(Json(response))
}
