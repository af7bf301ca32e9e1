use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::handlers::PaginationParams;
use crate::middlewares::AuthOwner;
use crate::models::RunResult;
use crate::repositories::RunResultQuery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListResultsParams {
    /// RFC 3339 lower bound on start time
    pub since: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ResultListResponse {
    pub data: Vec<RunResult>,
    pub limit: u64,
    pub offset: u64,
}

/// List the caller's run results, newest first
pub async fn list_results(
    owner: AuthOwner,
    State(state): State<AppState>,
    Query(params): Query<ListResultsParams>,
) -> AppResult<Json<ResultListResponse>> {
    let since = params
        .since
        .as_deref()
        .map(|raw| {
            OffsetDateTime::parse(raw, &Rfc3339)
                .map_err(|_| AppError::Validation(format!("since is not RFC 3339: {}", raw)))
        })
        .transpose()?;

    let page = PaginationParams {
        limit: params.limit,
        offset: params.offset,
    };
    let query = RunResultQuery {
        since,
        limit: page.limit(),
        offset: page.offset(),
    };

    let data = state.storage.list_run_results(owner.id, &query).await?;

    Ok(Json(ResultListResponse {
        data,
        limit: query.limit,
        offset: query.offset,
    }))
}

pub async fn get_result(
    owner: AuthOwner,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RunResult>> {
    let result = state.storage.get_run_result(id, owner.id).await?;
    Ok(Json(result))
}

pub async fn delete_result(
    owner: AuthOwner,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.storage.delete_run_result(id, owner.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
