use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::entity::run_result::{self, ActiveModel, Column, Entity as RunResultEntity};
use crate::error::{AppError, AppResult};
use crate::models::RunResult;
use crate::repositories::{from_column_text, RunResultQuery};

/// Run result repository for database operations
pub struct RunResultRepository;

impl RunResultRepository {
    /// Append a result, or replace the stored one with the same id
    pub async fn upsert(db: &DatabaseConnection, result: &RunResult) -> AppResult<()> {
        let existing = RunResultEntity::find_by_id(result.id).one(db).await?;

        let steps_json = serde_json::to_value(&result.steps)
            .map_err(|e| AppError::Internal(format!("Failed to encode step results: {}", e)))?;

        let model = ActiveModel {
            id: Set(result.id),
            owner_id: Set(result.owner_id),
            suite_id: Set(result.suite_id),
            suite_name: Set(result.suite_name.clone()),
            status: Set(result.status.as_str().to_string()),
            environment: Set(result.environment.as_str().to_string()),
            start_time: Set(result.start_time),
            end_time: Set(result.end_time),
            duration_ms: Set(result.duration_ms),
            steps: Set(steps_json),
        };

        match existing {
            None => {
                model.insert(db).await?;
            }
            Some(current) if current.owner_id == result.owner_id => {
                model.update(db).await?;
            }
            Some(_) => return Err(AppError::NotFound("Run result".to_string())),
        }

        Ok(())
    }

    /// Find run result by ID with ownership verification
    pub async fn find_by_id_and_owner(
        db: &DatabaseConnection,
        id: Uuid,
        owner_id: Uuid,
    ) -> AppResult<RunResult> {
        let model = RunResultEntity::find_by_id(id)
            .filter(Column::OwnerId.eq(owner_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Run result".to_string()))?;

        model.try_into()
    }

    /// List an owner's results, newest first
    pub async fn list_by_owner(
        db: &DatabaseConnection,
        owner_id: Uuid,
        query: &RunResultQuery,
    ) -> AppResult<Vec<RunResult>> {
        let mut select = RunResultEntity::find().filter(Column::OwnerId.eq(owner_id));

        if let Some(since) = query.since {
            select = select.filter(Column::StartTime.gte(since));
        }

        let models = select
            .order_by_desc(Column::StartTime)
            .offset(query.offset)
            .limit(query.limit)
            .all(db)
            .await?;

        models.into_iter().map(RunResult::try_from).collect()
    }

    /// Delete run result (with ownership check)
    pub async fn delete_by_owner(db: &DatabaseConnection, id: Uuid, owner_id: Uuid) -> AppResult<()> {
        let result = RunResultEntity::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::OwnerId.eq(owner_id))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Run result".to_string()));
        }

        Ok(())
    }

    /// Delete every result of the owner started at or before `cutoff`
    pub async fn delete_started_before(
        db: &DatabaseConnection,
        owner_id: Uuid,
        cutoff: OffsetDateTime,
    ) -> AppResult<u64> {
        let result = RunResultEntity::delete_many()
            .filter(Column::OwnerId.eq(owner_id))
            .filter(Column::StartTime.lte(cutoff))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }
}

impl TryFrom<run_result::Model> for RunResult {
    type Error = AppError;

    fn try_from(m: run_result::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            owner_id: m.owner_id,
            suite_id: m.suite_id,
            suite_name: m.suite_name,
            status: from_column_text("status", &m.status)?,
            start_time: m.start_time,
            end_time: m.end_time,
            duration_ms: m.duration_ms,
            environment: from_column_text("environment", &m.environment)?,
            steps: serde_json::from_value(m.steps)
                .map_err(|e| AppError::Database(format!("Invalid stored step results: {}", e)))?,
        })
    }
}
