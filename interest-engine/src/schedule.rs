//! Monthly accrual schedule
//!
//! The cycle runs once per calendar month at a configured day and UTC
//! time. Days past the end of a short month clamp to its last day, so
//! `day_of_month = 31` runs on Feb 28 (or 29).

use crate::{Error, Result};
use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Accrual schedule configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Day of the month the cycle runs (1-31, clamped to month length)
    pub day_of_month: u32,

    /// Time of day (UTC) the cycle runs, e.g. "02:00"
    pub time_utc: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            day_of_month: 1,
            time_utc: "02:00".to_string(),
        }
    }
}

impl ScheduleConfig {
    fn parse_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.time_utc, "%H:%M")
            .map_err(|e| Error::Config(format!("Invalid time format '{}': {}", self.time_utc, e)))
    }

    /// Calculate the next cycle run strictly after `now`
    pub fn next_run(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        if !(1..=31).contains(&self.day_of_month) {
            return Err(Error::Config(format!(
                "day_of_month must be 1-31, got {}",
                self.day_of_month
            )));
        }
        let time = self.parse_time()?;

        let this_month = clamped_date(now.year(), now.month(), self.day_of_month)?;
        let candidate = this_month
            .and_time(time)
            .and_local_timezone(Utc)
            .single()
            .ok_or_else(|| Error::Schedule("Invalid timezone conversion".to_string()))?;

        if candidate > now {
            return Ok(candidate);
        }

        let next_month = this_month
            .checked_add_months(Months::new(1))
            .ok_or_else(|| Error::Schedule("Date overflow".to_string()))?;
        let next = clamped_date(next_month.year(), next_month.month(), self.day_of_month)?
            .and_time(time)
            .and_local_timezone(Utc)
            .single()
            .ok_or_else(|| Error::Schedule("Invalid timezone conversion".to_string()))?;

        Ok(next)
    }
}

/// Long-running monthly cycle driver
pub struct Scheduler {
    config: ScheduleConfig,
    engine: crate::engine::InterestEngine,
    last_period_end: Option<NaiveDate>,
}

impl Scheduler {
    /// Create a scheduler driving `engine` on `config`'s cadence
    pub fn new(config: ScheduleConfig, engine: crate::engine::InterestEngine) -> Self {
        Self {
            config,
            engine,
            last_period_end: None,
        }
    }

    /// Run cycles forever. Each calendar period is accrued at most once
    /// per process lifetime even if the wakeup fires twice.
    pub async fn run(mut self) -> Result<()> {
        loop {
            let now = Utc::now();
            let next = self.config.next_run(now)?;
            let wait = (next - now)
                .to_std()
                .map_err(|e| Error::Schedule(format!("Negative sleep duration: {}", e)))?;

            tracing::info!(next_run = %next, "Waiting for next accrual cycle");
            tokio::time::sleep(wait).await;

            let as_of = next.date_naive();
            if self.last_period_end == Some(as_of) {
                tracing::debug!(as_of = %as_of, "Period already accrued, skipping");
                continue;
            }

            match self.engine.run_interest_cycle(as_of) {
                Ok(report) => {
                    self.last_period_end = Some(as_of);
                    tracing::info!(
                        as_of = %as_of,
                        credited = report.credited,
                        total_interest = %report.total_interest,
                        "Accrual cycle complete"
                    );
                }
                Err(e) => {
                    tracing::error!(as_of = %as_of, error = %e, "Accrual cycle failed");
                }
            }
        }
    }
}

/// Date at `day` in the given month, clamped to the month's last day
fn clamped_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
        return Ok(date);
    }

    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::Schedule(format!("Invalid month {year}-{month}")))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(|| Error::Schedule("Date overflow".to_string()))?;

    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn schedule(day_of_month: u32, time_utc: &str) -> ScheduleConfig {
        ScheduleConfig {
            day_of_month,
            time_utc: time_utc.to_string(),
        }
    }

    #[test]
    fn test_next_run_later_this_month() {
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let next = schedule(20, "02:00").next_run(now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 8, 20, 2, 0, 0).unwrap());
    }

    #[test]
    fn test_next_run_rolls_to_next_month() {
        let now = Utc.with_ymd_and_hms(2026, 8, 15, 12, 0, 0).unwrap();
        let next = schedule(1, "02:00").next_run(now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 9, 1, 2, 0, 0).unwrap());

        // Exactly at the run time -> next month, strictly after now
        let at_run = Utc.with_ymd_and_hms(2026, 9, 1, 2, 0, 0).unwrap();
        let next = schedule(1, "02:00").next_run(at_run).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 10, 1, 2, 0, 0).unwrap());
    }

    #[test]
    fn test_short_month_clamps() {
        let now = Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap();
        let next = schedule(31, "02:00").next_run(now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 2, 28, 2, 0, 0).unwrap());

        // Leap year
        let now = Utc.with_ymd_and_hms(2028, 2, 10, 0, 0, 0).unwrap();
        let next = schedule(31, "02:00").next_run(now).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2028, 2, 29, 2, 0, 0).unwrap());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let now = Utc::now();
        assert!(schedule(0, "02:00").next_run(now).is_err());
        assert!(schedule(32, "02:00").next_run(now).is_err());
        assert!(schedule(1, "2am").next_run(now).is_err());
    }
}
