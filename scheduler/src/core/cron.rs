//! Standard 5-field cron expressions
//!
//! Expressions are `minute hour day-of-month month day-of-week` with
//! day-of-week `0`-`7` (both `0` and `7` are Sunday) or three-letter names.
//! They are evaluated in UTC by the `cron` crate, which expects a leading
//! seconds field and numbers weekdays `1` (Sunday) to `7` (Saturday), so
//! numeric weekdays are rewritten as names before parsing.
//!
//! When both day-of-month and day-of-week are restricted (neither starts with
//! `*`), a time matches if either field does, as in vixie cron. Such an
//! expression is held as two schedules and the earlier candidate wins.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::error::{SchedulerError, SchedulerResult};

const WEEKDAYS: [&str; 8] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

/// A validated cron expression
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedules: Vec<cron::Schedule>,
}

impl CronSchedule {
    pub fn parse(expression: &str) -> SchedulerResult<Self> {
        let invalid = |message: String| SchedulerError::InvalidCron {
            expression: expression.to_string(),
            message,
        };

        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(invalid(format!("expected 5 fields, found {}", fields.len())));
        }

        let (minute, hour, day_of_month, month) = (fields[0], fields[1], fields[2], fields[3]);
        let day_of_week = translate_day_of_week(fields[4]).map_err(invalid)?;
        let build = |dom: &str, dow: &str| {
            cron::Schedule::from_str(&format!("0 {} {} {} {} {}", minute, hour, dom, month, dow))
                .map_err(|e| invalid(e.to_string()))
        };

        let schedules = if restricted(day_of_month) && restricted(fields[4]) {
            vec![build(day_of_month, "*")?, build("*", &day_of_week)?]
        } else {
            vec![build(day_of_month, &day_of_week)?]
        };

        Ok(Self {
            expression: fields.join(" "),
            schedules,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First matching time strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedules
            .iter()
            .filter_map(|schedule| schedule.after(&after).next())
            .min()
    }

    /// Next due time following a run stamped at `last_run`.
    ///
    /// If the run overran past that slot, skips forward to the first
    /// matching time after `now`.
    pub fn next_due(&self, last_run: DateTime<Utc>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.next_after(last_run) {
            Some(next) if next > now => Some(next),
            _ => self.next_after(now.max(last_run)),
        }
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

impl FromStr for CronSchedule {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn restricted(field: &str) -> bool {
    !field.starts_with('*') && field != "?"
}

fn weekday(value: &str) -> Result<String, String> {
    if value.chars().all(|c| c.is_ascii_digit()) {
        let index: usize = value
            .parse()
            .map_err(|_| format!("invalid day-of-week '{}'", value))?;
        WEEKDAYS
            .get(index)
            .map(|name| name.to_string())
            .ok_or_else(|| format!("day-of-week {} out of range 0-7", index))
    } else {
        Ok(value.to_ascii_uppercase())
    }
}

/// Rewrite numeric weekdays as names, splitting ranges that end on Sunday (7)
fn translate_day_of_week(field: &str) -> Result<String, String> {
    let mut parts = Vec::new();

    for item in field.split(',') {
        let (base, step) = match item.split_once('/') {
            Some((base, step)) => (base, Some(step)),
            None => (item, None),
        };
        let suffix = step.map(|s| format!("/{}", s)).unwrap_or_default();

        if base == "*" || base == "?" {
            parts.push(format!("{}{}", base, suffix));
            continue;
        }

        match base.split_once('-') {
            Some((start, "7")) if start != "0" => {
                if step.is_some() {
                    return Err(format!("stepped range ending in 7 is not supported: '{}'", item));
                }
                let start = weekday(start)?;
                if start == "SAT" {
                    parts.push(start);
                } else {
                    parts.push(format!("{}-SAT", start));
                }
                parts.push("SUN".to_string());
            }
            Some(("0", "7")) => parts.push(format!("*{}", suffix)),
            Some((start, end)) => {
                parts.push(format!("{}-{}{}", weekday(start)?, weekday(end)?, suffix));
            }
            None => parts.push(format!("{}{}", weekday(base)?, suffix)),
        }
    }

    Ok(parts.join(","))
}
