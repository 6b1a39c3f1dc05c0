use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Months, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::TaskshotError;
use crate::types::Task;

/// Task list date filter, relative to "now" in the caller's time zone.
///
/// Boundaries are local midnights. `Week` covers the last seven days plus
/// today and `Month` reaches back one calendar month from today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    Today,
    Yesterday,
    Week,
    Month,
    #[default]
    All,
}

impl DateRange {
    /// Half-open `[start, end)` bounds; `None` means unbounded on that side.
    pub fn bounds<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
    ) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let today = now.date_naive();
        let midnight = |date: chrono::NaiveDate| {
            now.timezone()
                .from_local_datetime(&date.and_time(NaiveTime::MIN))
                .earliest()
                .map(|t| t.with_timezone(&Utc))
        };
        match self {
            DateRange::Today => (midnight(today), None),
            DateRange::Yesterday => (
                today.checked_sub_days(Days::new(1)).and_then(midnight),
                midnight(today),
            ),
            DateRange::Week => (today.checked_sub_days(Days::new(7)).and_then(midnight), None),
            DateRange::Month => (
                today.checked_sub_months(Months::new(1)).and_then(midnight),
                None,
            ),
            DateRange::All => (None, None),
        }
    }

    /// Whether `timestamp` falls inside this range.
    pub fn contains<Tz: TimeZone>(&self, timestamp: DateTime<Utc>, now: &DateTime<Tz>) -> bool {
        let (start, end) = self.bounds(now);
        start.is_none_or(|s| timestamp >= s) && end.is_none_or(|e| timestamp < e)
    }

    /// Tasks whose `timestamp` falls inside this range, order preserved.
    pub fn filter<'a, Tz: TimeZone>(&self, tasks: &'a [Task], now: &DateTime<Tz>) -> Vec<&'a Task> {
        tasks
            .iter()
            .filter(|task| self.contains(task.timestamp, now))
            .collect()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DateRange::Today => "today",
            DateRange::Yesterday => "yesterday",
            DateRange::Week => "week",
            DateRange::Month => "month",
            DateRange::All => "all",
        })
    }
}

impl FromStr for DateRange {
    type Err = TaskshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(DateRange::Today),
            "yesterday" => Ok(DateRange::Yesterday),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            "all" => Ok(DateRange::All),
            other => Err(TaskshotError::InvalidInput(format!(
                "unknown date range: {other} (expected today, yesterday, week, month or all)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn yesterday_is_half_open() {
        let now = at("2026-03-10T15:00:00Z");
        let range = DateRange::Yesterday;
        assert!(range.contains(at("2026-03-09T00:00:00Z"), &now));
        assert!(range.contains(at("2026-03-09T23:59:59Z"), &now));
        assert!(!range.contains(at("2026-03-10T00:00:00Z"), &now));
        assert!(!range.contains(at("2026-03-08T23:59:59Z"), &now));
    }

    #[test]
    fn today_starts_at_midnight() {
        let now = at("2026-03-10T15:00:00Z");
        assert_eq!(DateRange::Today.bounds(&now), (Some(at("2026-03-10T00:00:00Z")), None));
    }

    #[test]
    fn week_and_month_reach_back() {
        let now = at("2026-03-31T08:00:00Z");
        assert_eq!(DateRange::Week.bounds(&now).0, Some(at("2026-03-24T00:00:00Z")));
        // Feb has no 31st; chrono clamps to the last day.
        assert_eq!(DateRange::Month.bounds(&now).0, Some(at("2026-02-28T00:00:00Z")));
    }

    #[test]
    fn all_is_unbounded() {
        let now = at("2026-03-10T15:00:00Z");
        assert!(DateRange::All.contains(at("1999-01-01T00:00:00Z"), &now));
    }

    #[test]
    fn parses_names() {
        assert_eq!("Week".parse::<DateRange>().unwrap(), DateRange::Week);
        assert!("fortnight".parse::<DateRange>().is_err());
        assert_eq!(DateRange::Yesterday.to_string(), "yesterday");
    }
}
