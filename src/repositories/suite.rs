use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::test_suite::{self, ActiveModel, Column, Entity as SuiteEntity};
use crate::error::{AppError, AppResult};
use crate::models::TestSuite;
use crate::repositories::{from_column_text, to_column_text};

/// Test suite repository for database operations
pub struct SuiteRepository;

impl SuiteRepository {
    /// Insert the suite, or replace it when the same owner already stored it
    pub async fn upsert(db: &DatabaseConnection, suite: &TestSuite) -> AppResult<()> {
        let existing = SuiteEntity::find_by_id(suite.id).one(db).await?;

        let steps_json = serde_json::to_value(&suite.steps)
            .map_err(|e| AppError::Validation(format!("Invalid steps JSON: {}", e)))?;

        let model = ActiveModel {
            id: Set(suite.id),
            owner_id: Set(suite.owner_id),
            name: Set(suite.name.clone()),
            description: Set(suite.description.clone()),
            base_url: Set(suite.base_url.clone()),
            api_kind: Set(to_column_text("api_kind", &suite.api_kind)?),
            environment: Set(suite.environment.as_str().to_string()),
            steps: Set(steps_json),
            created_at: Set(suite.created_at),
            updated_at: Set(suite.updated_at),
        };

        match existing {
            None => {
                model.insert(db).await?;
            }
            Some(current) if current.owner_id == suite.owner_id => {
                model.update(db).await?;
            }
            Some(_) => return Err(AppError::NotFound("Test suite".to_string())),
        }

        Ok(())
    }

    /// Find suite by ID with ownership verification
    pub async fn find_by_id_and_owner(
        db: &DatabaseConnection,
        id: Uuid,
        owner_id: Uuid,
    ) -> AppResult<TestSuite> {
        let model = SuiteEntity::find_by_id(id)
            .filter(Column::OwnerId.eq(owner_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Test suite".to_string()))?;

        model.try_into()
    }

    /// List all suites of an owner, oldest first
    pub async fn list_by_owner(db: &DatabaseConnection, owner_id: Uuid) -> AppResult<Vec<TestSuite>> {
        let models = SuiteEntity::find()
            .filter(Column::OwnerId.eq(owner_id))
            .order_by_asc(Column::CreatedAt)
            .all(db)
            .await?;

        models.into_iter().map(TestSuite::try_from).collect()
    }

    /// Delete suite (with ownership check)
    pub async fn delete_by_owner(db: &DatabaseConnection, id: Uuid, owner_id: Uuid) -> AppResult<()> {
        let result = SuiteEntity::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::OwnerId.eq(owner_id))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Test suite".to_string()));
        }

        Ok(())
    }
}

// Conversion from SeaORM model to our domain model
impl TryFrom<test_suite::Model> for TestSuite {
    type Error = AppError;

    fn try_from(m: test_suite::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: m.id,
            owner_id: m.owner_id,
            name: m.name,
            description: m.description,
            base_url: m.base_url,
            api_kind: from_column_text("api_kind", &m.api_kind)?,
            environment: from_column_text("environment", &m.environment)?,
            steps: serde_json::from_value(m.steps)
                .map_err(|e| AppError::Database(format!("Invalid stored steps: {}", e)))?,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}
