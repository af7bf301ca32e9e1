use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const MIN_RETAIN_DAYS: i32 = 1;
pub const MAX_RETAIN_DAYS: i32 = 365;

/// One of the four fixed scheduling periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Hourly,
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Cadence {
    pub const ALL: [Cadence; 4] = [Self::Hourly, Self::Daily, Self::Weekly, Self::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown cadence: {0}")]
pub struct UnknownCadence(pub String);

impl FromStr for Cadence {
    type Err = UnknownCadence;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(UnknownCadence(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingSettings {
    pub enable_scheduling: bool,
    pub interval: Cadence,
    /// Retention window in days
    pub retain_results: i32,
}

impl Default for SchedulingSettings {
    fn default() -> Self {
        Self {
            enable_scheduling: false,
            interval: Cadence::Daily,
            retain_results: 30,
        }
    }
}

/// Per-owner settings read by the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub owner_id: Uuid,
    pub scheduling: SchedulingSettings,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Settings {
    pub fn new(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            scheduling: SchedulingSettings::default(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn scheduled(owner_id: Uuid, interval: Cadence, retain_results: i32) -> Self {
        Self {
            owner_id,
            scheduling: SchedulingSettings {
                enable_scheduling: true,
                interval,
                retain_results,
            },
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    /// Whether this owner's suites run on the given cadence
    pub fn is_scheduled_for(&self, cadence: Cadence) -> bool {
        self.scheduling.enable_scheduling && self.scheduling.interval == cadence
    }

    pub fn validate(&self) -> AppResult<()> {
        let days = self.scheduling.retain_results;
        if !(MIN_RETAIN_DAYS..=MAX_RETAIN_DAYS).contains(&days) {
            return Err(AppError::Validation(format!(
                "retain_results must be between {} and {} days, got {}",
                MIN_RETAIN_DAYS, MAX_RETAIN_DAYS, days
            )));
        }
        Ok(())
    }

    /// Stamp `updated_at`. Storage calls this on every mutation.
    pub fn touch(&mut self) {
        self.updated_at = OffsetDateTime::now_utc();
    }
}
