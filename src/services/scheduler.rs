use serde::Serialize;
use std::sync::Arc;
use time::{Date, Duration, Month, OffsetDateTime, Time, UtcOffset};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::Cadence;
use crate::repositories::Storage;
use crate::services::SuiteRunner;
use crate::state::AppState;

impl Cadence {
    /// Cron form of the firing point, evaluated in UTC
    pub fn cron_expression(&self) -> &'static str {
        match self {
            Self::Hourly => "0 * * * *",
            Self::Daily => "0 0 * * *",
            Self::Weekly => "0 0 * * 0",
            Self::Monthly => "0 0 1 * *",
        }
    }

    /// First firing point strictly after `now`.
    ///
    /// Hourly fires at the top of every hour, daily at midnight, weekly at
    /// midnight on Sunday and monthly at midnight on the 1st, all in UTC.
    pub fn next_fire_after(&self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        let now = now.to_offset(UtcOffset::UTC);
        let midnight = |date: Date| date.midnight().assume_utc();

        match self {
            Self::Hourly => {
                let top = now.replace_time(Time::from_hms(now.hour(), 0, 0).ok()?);
                Some(top + Duration::HOUR)
            }
            Self::Daily => Some(midnight(now.date().next_day()?)),
            Self::Weekly => {
                let days_ahead = 7 - i64::from(now.weekday().number_days_from_sunday());
                Some(midnight(now.date()) + Duration::days(days_ahead))
            }
            Self::Monthly => {
                let date = now.date();
                let (year, month) = match date.month() {
                    Month::December => (date.year() + 1, Month::January),
                    month => (date.year(), month.next()),
                };
                Date::from_calendar_date(year, month, 1).ok().map(midnight)
            }
        }
    }
}

/// What one firing did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FiringReport {
    pub cadence: Cadence,
    /// Owners whose settings selected this cadence
    pub owners: usize,
    /// Suite runs completed and recorded
    pub suites_run: usize,
    /// Owners or suites that could not be processed, including failed cleanups
    pub failures: usize,
    /// Run results removed by retention cleanup (daily only)
    pub results_deleted: u64,
}

impl FiringReport {
    fn new(cadence: Cadence) -> Self {
        Self {
            cadence,
            owners: 0,
            suites_run: 0,
            failures: 0,
            results_deleted: 0,
        }
    }
}

/// The work done when a cadence fires. A failure for one owner or suite is
/// logged and never stops the rest of the batch.
#[derive(Clone)]
pub struct ScheduledJobs {
    storage: Arc<dyn Storage>,
    runner: SuiteRunner,
}

impl ScheduledJobs {
    pub fn new(storage: Arc<dyn Storage>, runner: SuiteRunner) -> Self {
        Self { storage, runner }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.storage.clone(), state.runner.clone())
    }

    /// Handle one firing of `cadence`; daily firings also purge old results
    pub async fn fire(&self, cadence: Cadence, now: OffsetDateTime) -> FiringReport {
        let mut report = self.run_scheduled(cadence).await;

        if cadence == Cadence::Daily {
            let cleanup = self.cleanup_old_results(now).await;
            report.results_deleted = cleanup.deleted;
            report.failures += cleanup.failures;
        }

        tracing::info!(
            cadence = %cadence,
            owners = report.owners,
            suites_run = report.suites_run,
            failures = report.failures,
            results_deleted = report.results_deleted,
            "Scheduled firing completed"
        );

        report
    }

    /// Run every suite of every owner scheduled at `cadence`
    pub async fn run_scheduled(&self, cadence: Cadence) -> FiringReport {
        let mut report = FiringReport::new(cadence);
        tracing::info!(cadence = %cadence, "Running scheduled tests");

        let settings = match self.storage.list_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!(cadence = %cadence, error = %e, "Failed to load settings");
                report.failures += 1;
                return report;
            }
        };

        for owner in settings.iter().filter(|s| s.is_scheduled_for(cadence)) {
            report.owners += 1;

            let suites = match self.storage.list_suites_by_owner(owner.owner_id).await {
                Ok(suites) => suites,
                Err(e) => {
                    tracing::error!(
                        cadence = %cadence,
                        owner_id = %owner.owner_id,
                        error = %e,
                        "Failed to list suites for owner"
                    );
                    report.failures += 1;
                    continue;
                }
            };

            for suite in &suites {
                match self.runner.run_recorded(self.storage.as_ref(), suite).await {
                    Ok(_) => report.suites_run += 1,
                    Err(e) => {
                        tracing::error!(
                            cadence = %cadence,
                            owner_id = %owner.owner_id,
                            suite_id = %suite.id,
                            error = %e,
                            "Scheduled suite run failed"
                        );
                        report.failures += 1;
                    }
                }
            }
        }

        report
    }

    /// Delete results whose age in days has reached the owner's retention
    /// window. Owners without stored settings are left alone.
    pub async fn cleanup_old_results(&self, now: OffsetDateTime) -> CleanupReport {
        let mut report = CleanupReport::default();
        tracing::info!("Cleaning up old test results");

        let settings = match self.storage.list_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load settings for cleanup");
                report.failures += 1;
                return report;
            }
        };

        for owner in &settings {
            let cutoff = retention_cutoff(now, owner.scheduling.retain_results);
            match self
                .storage
                .delete_run_results_before(owner.owner_id, cutoff)
                .await
            {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(owner_id = %owner.owner_id, deleted = count, "Old results removed");
                    }
                    report.deleted += count;
                }
                Err(e) => {
                    tracing::error!(owner_id = %owner.owner_id, error = %e, "Failed to clean up results");
                    report.failures += 1;
                }
            }
        }

        report
    }
}

/// What one retention pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub deleted: u64,
    /// Owners whose old results could not be deleted
    pub failures: usize,
}

/// Results started at or before this instant are `retain_days` or more days old
pub fn retention_cutoff(now: OffsetDateTime, retain_days: i32) -> OffsetDateTime {
    now - Duration::days(i64::from(retain_days))
}

/// Owns the periodic triggers. Dropping it without [`Scheduler::shutdown`]
/// leaves the trigger tasks running.
pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<(Cadence, JoinHandle<()>)>,
}

impl Scheduler {
    /// Register one trigger per cadence
    pub fn start(jobs: Arc<ScheduledJobs>, cadences: &[Cadence]) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handles = cadences
            .iter()
            .map(|&cadence| {
                tracing::info!(
                    cadence = %cadence,
                    cron = cadence.cron_expression(),
                    "Registering scheduled trigger"
                );
                let handle = tokio::spawn(run_trigger(cadence, jobs.clone(), shutdown_rx.clone()));
                (cadence, handle)
            })
            .collect();

        tracing::info!("Test scheduler initialized");

        Self {
            shutdown_tx,
            handles,
        }
    }

    pub fn cadences(&self) -> Vec<Cadence> {
        self.handles.iter().map(|(cadence, _)| *cadence).collect()
    }

    /// Cancel every trigger. A firing already in progress finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);

        for (cadence, handle) in self.handles {
            if let Err(e) = handle.await {
                tracing::error!(cadence = %cadence, error = %e, "Trigger task ended abnormally");
            }
        }

        tracing::info!("Test scheduler stopped");
    }
}

async fn run_trigger(
    cadence: Cadence,
    jobs: Arc<ScheduledJobs>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut after = OffsetDateTime::now_utc();

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let Some(next) = cadence.next_fire_after(after) else {
            tracing::error!(cadence = %cadence, "No next firing point, trigger stopped");
            break;
        };
        let wait = (next - OffsetDateTime::now_utc()).max(Duration::ZERO).unsigned_abs();
        tracing::debug!(cadence = %cadence, next = %next, "Trigger sleeping");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                jobs.fire(cadence, OffsetDateTime::now_utc()).await;
                // Never fire twice for the same point if the clock lags
                after = OffsetDateTime::now_utc().max(next);
            }
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    tracing::debug!(cadence = %cadence, "Trigger stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_hourly_fires_at_top_of_next_hour() {
        let next = Cadence::Hourly.next_fire_after(datetime!(2025-03-10 14:25:13 UTC));
        assert_eq!(next, Some(datetime!(2025-03-10 15:00:00 UTC)));

        let exact = Cadence::Hourly.next_fire_after(datetime!(2025-03-10 15:00:00 UTC));
        assert_eq!(exact, Some(datetime!(2025-03-10 16:00:00 UTC)));

        let day_end = Cadence::Hourly.next_fire_after(datetime!(2025-12-31 23:59:59 UTC));
        assert_eq!(day_end, Some(datetime!(2026-01-01 00:00:00 UTC)));
    }

    #[test]
    fn test_daily_fires_at_next_midnight() {
        let next = Cadence::Daily.next_fire_after(datetime!(2025-02-28 00:00:00 UTC));
        assert_eq!(next, Some(datetime!(2025-03-01 00:00:00 UTC)));
    }

    #[test]
    fn test_weekly_fires_on_sunday_midnight() {
        // 2025-03-12 is a Wednesday
        let next = Cadence::Weekly.next_fire_after(datetime!(2025-03-12 08:00:00 UTC));
        assert_eq!(next, Some(datetime!(2025-03-16 00:00:00 UTC)));

        let on_sunday = Cadence::Weekly.next_fire_after(datetime!(2025-03-16 00:00:00 UTC));
        assert_eq!(on_sunday, Some(datetime!(2025-03-23 00:00:00 UTC)));

        let saturday = Cadence::Weekly.next_fire_after(datetime!(2025-03-15 23:59:59 UTC));
        assert_eq!(saturday, Some(datetime!(2025-03-16 00:00:00 UTC)));
    }

    #[test]
    fn test_monthly_fires_on_first_of_next_month() {
        let next = Cadence::Monthly.next_fire_after(datetime!(2025-01-31 12:00:00 UTC));
        assert_eq!(next, Some(datetime!(2025-02-01 00:00:00 UTC)));

        let december = Cadence::Monthly.next_fire_after(datetime!(2025-12-01 00:00:00 UTC));
        assert_eq!(december, Some(datetime!(2026-01-01 00:00:00 UTC)));
    }

    #[test]
    fn test_next_fire_normalizes_offset() {
        // 01:30 at +02:00 is 23:30 UTC the previous day
        let next = Cadence::Daily.next_fire_after(datetime!(2025-06-02 01:30:00 +02:00));
        assert_eq!(next, Some(datetime!(2025-06-02 00:00:00 UTC)));
    }

    #[test]
    fn test_retention_cutoff_boundary() {
        let now = datetime!(2025-06-30 12:00:00 UTC);
        let cutoff = retention_cutoff(now, 30);

        let exactly_30_days = now - Duration::days(30);
        let just_under = now - Duration::days(30) + Duration::seconds(1);

        assert!(exactly_30_days <= cutoff);
        assert!(just_under > cutoff);
    }

    #[test]
    fn test_cron_expressions() {
        assert_eq!(Cadence::Hourly.cron_expression(), "0 * * * *");
        assert_eq!(Cadence::Weekly.cron_expression(), "0 0 * * 0");
    }
}
