//! Recurring runs on a cron cadence.

use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::RunResult;
use crate::notify::create_driver;
use crate::pipeline;

const WEEKDAYS: [&str; 8] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Parses a cron expression. Five-field crontab syntax (minute precision, weekdays
/// 0-7 with 0 and 7 both Sunday) is accepted alongside the six/seven-field form with
/// seconds.
pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    let invalid = |reason: String| Error::InvalidCron {
        expr: expr.to_string(),
        reason,
    };

    let fields: Vec<&str> = expr.split_whitespace().collect();
    let normalized = match fields.len() {
        5 => {
            let weekday = crontab_weekdays(fields[4]).map_err(invalid)?;
            format!(
                "0 {} {} {} {} {}",
                fields[0], fields[1], fields[2], fields[3], weekday
            )
        }
        6 | 7 => fields.join(" "),
        n => return Err(invalid(format!("expected 5, 6 or 7 fields, got {}", n))),
    };

    Schedule::from_str(&normalized).map_err(|e| invalid(e.to_string()))
}

/// Rewrites numeric crontab weekdays as names, which mean the same thing in every
/// cron dialect.
fn crontab_weekdays(field: &str) -> std::result::Result<String, String> {
    let name = |token: &str| -> std::result::Result<String, String> {
        match token.parse::<usize>() {
            Ok(n) if n < WEEKDAYS.len() => Ok(WEEKDAYS[n].to_string()),
            Ok(n) => Err(format!("weekday {} out of range", n)),
            Err(_) => Ok(token.to_string()),
        }
    };

    field
        .split(',')
        .map(|part| -> std::result::Result<String, String> {
            let (base, step) = match part.split_once('/') {
                Some((base, step)) => (base, Some(step)),
                None => (part, None),
            };
            let base = base
                .split('-')
                .map(name)
                .collect::<std::result::Result<Vec<_>, _>>()?
                .join("-");
            Ok(match step {
                Some(step) => format!("{}/{}", base, step),
                None => base,
            })
        })
        .collect::<std::result::Result<Vec<_>, String>>()
        .map(|parts| parts.join(","))
}

/// A running schedule. Dropping the handle leaves the task running; call
/// [`ScheduleHandle::stop`] to end it.
pub struct ScheduleHandle {
    task: JoinHandle<()>,
}

impl ScheduleHandle {
    pub async fn stop(self) {
        self.task.abort();
        let _ = self.task.await;
        tracing::info!("TrendCompass scheduler stopped");
    }
}

/// Validates `expr` and spawns a task that runs the pipeline at every fire time,
/// handing each result to `on_complete`. Must be called from within a tokio runtime.
///
/// Failures inside a tick (including driver construction) are logged; the schedule
/// keeps going.
pub fn schedule<F>(config: Arc<Config>, expr: &str, on_complete: F) -> Result<ScheduleHandle>
where
    F: Fn(RunResult) + Send + Sync + 'static,
{
    let cron = parse_schedule(expr)?;
    tracing::info!(cron = %expr, "Scheduling TrendCompass");

    let task = tokio::spawn(async move {
        loop {
            let Some(next) = cron.upcoming(Local).next() else {
                tracing::warn!("Cron expression has no upcoming fire times");
                break;
            };
            let wait = (next - Local::now()).to_std().unwrap_or(Duration::ZERO);
            tracing::debug!(next = %next.to_rfc3339(), "Waiting for next run");
            tokio::time::sleep(wait).await;

            tracing::info!(at = %chrono::Utc::now().to_rfc3339(), "Starting scheduled TrendCompass job");
            match run_tick(&config).await {
                Ok(result) => {
                    tracing::info!(success = result.success, message = %result.message, "TrendCompass job completed");
                    on_complete(result);
                }
                Err(e) => tracing::error!(error = %e, "Error in scheduled TrendCompass job"),
            }

            let skipped = missed_fires(&cron, &next, &Local::now());
            if skipped > 0 {
                tracing::warn!(
                    skipped,
                    fired_at = %next.to_rfc3339(),
                    "TrendCompass job overran its schedule; skipped fire times"
                );
            }
        }
    });

    Ok(ScheduleHandle { task })
}

/// Counts fire times strictly after `fired_at` that are already in the past at `now`.
fn missed_fires<Z: TimeZone>(cron: &Schedule, fired_at: &DateTime<Z>, now: &DateTime<Z>) -> usize {
    cron.after(fired_at).take_while(|fire| fire <= now).count()
}

async fn run_tick(config: &Config) -> Result<RunResult> {
    let driver = create_driver(&config.notification)?;
    Ok(pipeline::run(config, driver.as_ref()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike, Weekday};

    #[test]
    fn five_field_expressions_get_a_seconds_field() {
        let s = parse_schedule("0 9 * * *").unwrap();
        let next = s.upcoming(Local).next().unwrap();
        assert_eq!((next.hour(), next.minute(), next.second()), (9, 0, 0));
    }

    #[test]
    fn numeric_weekdays_follow_crontab() {
        let s = parse_schedule("30 8 * * 1-5").unwrap();
        for fire in s.upcoming(Local).take(10) {
            assert!(!matches!(fire.weekday(), Weekday::Sat | Weekday::Sun));
        }
        let sunday = parse_schedule("0 0 * * 0").unwrap();
        assert_eq!(sunday.upcoming(Local).next().unwrap().weekday(), Weekday::Sun);
    }

    #[test]
    fn weekday_rewrite_keeps_steps_and_lists() {
        assert_eq!(crontab_weekdays("*").unwrap(), "*");
        assert_eq!(crontab_weekdays("1,3").unwrap(), "Mon,Wed");
        assert_eq!(crontab_weekdays("1-5/2").unwrap(), "Mon-Fri/2");
        assert!(crontab_weekdays("9").is_err());
    }

    #[test]
    fn overrunning_ticks_count_skipped_fires() {
        let every_minute = parse_schedule("* * * * *").unwrap();
        let fired = Local.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();

        let quick = Local.with_ymd_and_hms(2024, 1, 1, 9, 0, 30).unwrap();
        assert_eq!(missed_fires(&every_minute, &fired, &quick), 0);

        let slow = Local.with_ymd_and_hms(2024, 1, 1, 9, 3, 30).unwrap();
        assert_eq!(missed_fires(&every_minute, &fired, &slow), 3);

        let daily = parse_schedule("0 9 * * *").unwrap();
        assert_eq!(missed_fires(&daily, &fired, &slow), 0);
    }

    #[test]
    fn six_field_expressions_pass_through() {
        assert!(parse_schedule("*/30 * * * * *").is_ok());
    }

    #[test]
    fn invalid_expressions_are_rejected() {
        for expr in ["", "every day", "61 * * * *", "* * *"] {
            let err = parse_schedule(expr).unwrap_err();
            assert!(matches!(err, Error::InvalidCron { .. }), "{expr}: {err}");
        }
    }

    #[tokio::test]
    async fn invalid_schedule_fails_before_spawning() {
        let result = schedule(Arc::new(Config::default()), "nope", |_| {});
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn handle_stops_the_task() {
        let handle = schedule(Arc::new(Config::default()), "0 0 1 1 *", |_| {}).unwrap();
        handle.stop().await;
    }
}
