use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::entity::settings::{self, ActiveModel, Column, Entity as SettingsEntity};
use crate::error::{AppError, AppResult};
use crate::models::{SchedulingSettings, Settings};

/// Settings repository for database operations
pub struct SettingsRepository;

impl SettingsRepository {
    /// Insert or replace an owner's settings
    pub async fn upsert(db: &DatabaseConnection, input: &Settings) -> AppResult<()> {
        let existing = SettingsEntity::find_by_id(input.owner_id).one(db).await?;

        let model = ActiveModel {
            owner_id: Set(input.owner_id),
            enable_scheduling: Set(input.scheduling.enable_scheduling),
            schedule_interval: Set(input.scheduling.interval.as_str().to_string()),
            retain_results: Set(input.scheduling.retain_results),
            updated_at: Set(input.updated_at),
        };

        if existing.is_some() {
            model.update(db).await?;
        } else {
            model.insert(db).await?;
        }

        Ok(())
    }

    pub async fn find_by_owner(db: &DatabaseConnection, owner_id: Uuid) -> AppResult<Option<Settings>> {
        SettingsEntity::find_by_id(owner_id)
            .one(db)
            .await?
            .map(Settings::try_from)
            .transpose()
    }

    pub async fn list_all(db: &DatabaseConnection) -> AppResult<Vec<Settings>> {
        let models = SettingsEntity::find()
            .order_by_asc(Column::OwnerId)
            .all(db)
            .await?;

        models.into_iter().map(Settings::try_from).collect()
    }
}

impl TryFrom<settings::Model> for Settings {
    type Error = AppError;

    fn try_from(m: settings::Model) -> Result<Self, Self::Error> {
        let interval = m.schedule_interval.parse().map_err(|e| {
            AppError::Database(format!("Invalid schedule_interval for {}: {}", m.owner_id, e))
        })?;

        Ok(Self {
            owner_id: m.owner_id,
            scheduling: SchedulingSettings {
                enable_scheduling: m.enable_scheduling,
                interval,
                retain_results: m.retain_results,
            },
            updated_at: m.updated_at,
        })
    }
}
