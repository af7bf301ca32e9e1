use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Run results keep no foreign key to their suite so they outlive it
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "run_results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_id: Uuid,
    pub suite_id: Uuid,
    pub suite_name: String,
    pub status: String,
    pub environment: String,
    pub start_time: TimeDateTimeWithTimeZone,
    pub end_time: Option<TimeDateTimeWithTimeZone>,
    pub duration_ms: i64,
    #[sea_orm(column_type = "Json")]
    pub steps: Json,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
