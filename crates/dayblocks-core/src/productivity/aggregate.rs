//! Aggregation over raw session and sleep records.
//!
//! Session durations come from the backend as text in the loose grammar
//! (`"1h2m3.4s"`, `"23m4.5s"`, `"12.3s"`). Entries that do not parse count
//! as zero and are reported back to the caller.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::scorer::ProductivityInputs;
use crate::api::{SessionRecord, SleepRecord};
use crate::duration;

pub const SECONDS_PER_DAY: f64 = 24.0 * 60.0 * 60.0;

/// One session inside a [`DayTotal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSlice {
    pub session_id: String,
    pub project_id: Option<String>,
    pub start_time: DateTime<FixedOffset>,
    pub seconds: f64,
}

/// All tracked time that started on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTotal {
    pub date: NaiveDate,
    pub total_seconds: f64,
    pub sessions: Vec<SessionSlice>,
}

/// Seconds of a closed session. Open sessions count as zero.
fn session_seconds(record: &SessionRecord, malformed: &mut Vec<String>) -> f64 {
    let Some(text) = record.duration.as_deref() else {
        return 0.0;
    };
    match duration::parse_loose(text) {
        Ok(secs) => secs,
        Err(err) => {
            warn!(session_id = %record.id, %err, "skipping session duration");
            malformed.push(text.to_string());
            0.0
        }
    }
}

/// Sum of every session's duration.
pub fn total_productive_seconds(sessions: &[SessionRecord], malformed: &mut Vec<String>) -> f64 {
    sessions
        .iter()
        .map(|s| session_seconds(s, malformed))
        .sum()
}

/// Sessions whose start falls on `date`, in the session's own offset.
pub fn sessions_on(sessions: &[SessionRecord], date: NaiveDate) -> Vec<SessionRecord> {
    sessions
        .iter()
        .filter(|s| s.start_time.date_naive() == date)
        .cloned()
        .collect()
}

/// Per-day totals, oldest day first.
pub fn daily_totals(sessions: &[SessionRecord], malformed: &mut Vec<String>) -> Vec<DayTotal> {
    let mut days: BTreeMap<NaiveDate, DayTotal> = BTreeMap::new();
    for record in sessions {
        let date = record.start_time.date_naive();
        let seconds = session_seconds(record, malformed);
        let day = days.entry(date).or_insert_with(|| DayTotal {
            date,
            total_seconds: 0.0,
            sessions: Vec::new(),
        });
        day.total_seconds += seconds;
        day.sessions.push(SessionSlice {
            session_id: record.id.clone(),
            project_id: record.project_id.clone(),
            start_time: record.start_time,
            seconds,
        });
    }
    days.into_values()
        .map(|mut day| {
            day.sessions.sort_by_key(|s| s.start_time);
            day
        })
        .collect()
}

/// The sleep that ended on `today`, if any.
pub fn todays_sleep(records: &[SleepRecord], today: NaiveDate) -> Option<&SleepRecord> {
    records.iter().find(|r| r.end_time.date_naive() == today)
}

/// Awake time left in a day after `sleep_seconds` of sleep.
pub fn awake_seconds(sleep_seconds: f64) -> f64 {
    (SECONDS_PER_DAY - sleep_seconds).max(0.0)
}

/// Build scorer inputs for `today` from raw records.
///
/// Without a sleep record ending today, `default_sleep_hours` is assumed.
pub fn inputs_for_day(
    sessions: &[SessionRecord],
    sleep: &[SleepRecord],
    today: NaiveDate,
    default_sleep_hours: f64,
    malformed: &mut Vec<String>,
) -> ProductivityInputs {
    let productive = total_productive_seconds(&sessions_on(sessions, today), malformed);
    let sleep_seconds = todays_sleep(sleep, today)
        .map(|r| r.duration as f64)
        .unwrap_or(default_sleep_hours * 3600.0);
    ProductivityInputs {
        productive_seconds: productive,
        awake_seconds: awake_seconds(sleep_seconds),
        sleep_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(text).unwrap()
    }

    fn session(id: &str, start: &str, duration: Option<&str>) -> SessionRecord {
        SessionRecord {
            id: id.into(),
            project_id: Some("p".into()),
            start_time: at(start),
            end_time: None,
            duration: duration.map(str::to_string),
        }
    }

    fn sleep(end: &str, hours: u64) -> SleepRecord {
        let end_time = at(end);
        SleepRecord {
            start_time: end_time - chrono::Duration::hours(hours as i64),
            end_time,
            duration: hours * 3600,
        }
    }

    #[test]
    fn totals_skip_malformed_entries() {
        let sessions = vec![
            session("1", "2024-05-01T09:00:00+03:00", Some("1h0m0s")),
            session("2", "2024-05-01T11:00:00+03:00", Some("30m15.5s")),
            session("3", "2024-05-01T13:00:00+03:00", Some("soon")),
            session("4", "2024-05-01T15:00:00+03:00", None),
        ];
        let mut malformed = Vec::new();
        assert_eq!(total_productive_seconds(&sessions, &mut malformed), 5415.5);
        assert_eq!(malformed, vec!["soon".to_string()]);
    }

    #[test]
    fn daily_totals_group_by_start_date() {
        let sessions = vec![
            session("b", "2024-05-02T08:00:00+03:00", Some("2h0m0s")),
            session("a2", "2024-05-01T14:00:00+03:00", Some("45m")),
            session("a1", "2024-05-01T09:00:00+03:00", Some("15m")),
        ];
        let days = daily_totals(&sessions, &mut Vec::new());
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(days[0].total_seconds, 3600.0);
        assert_eq!(days[0].sessions[0].session_id, "a1");
        assert_eq!(days[1].total_seconds, 7200.0);
    }

    #[test]
    fn todays_sleep_matches_end_date() {
        let records = vec![sleep("2024-05-01T07:00:00+03:00", 8), sleep("2024-05-02T06:30:00+03:00", 6)];
        let today = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert_eq!(todays_sleep(&records, today).map(|r| r.duration), Some(6 * 3600));
        let missing = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert!(todays_sleep(&records, missing).is_none());
    }

    #[test]
    fn inputs_fall_back_to_default_sleep() {
        let sessions = vec![
            session("1", "2024-05-03T09:00:00+03:00", Some("5h0m0s")),
            session("2", "2024-05-02T09:00:00+03:00", Some("9h0m0s")),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let inputs = inputs_for_day(&sessions, &[], today, 8.0, &mut Vec::new());
        assert_eq!(inputs.productive_seconds, 18000.0);
        assert_eq!(inputs.sleep_seconds, 28800.0);
        assert_eq!(inputs.awake_seconds, 57600.0);
    }

    #[test]
    fn awake_never_negative() {
        assert_eq!(awake_seconds(30.0 * 3600.0), 0.0);
    }
}
