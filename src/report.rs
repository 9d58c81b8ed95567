//! Summaries of the activities recorded in a timeclock.
//!
//! Replaying the log rebuilds each activity from its `i` line up to its last
//! event, adding up only the stretches where the timer was running.

use std::collections::BTreeMap;

use anyhow::{anyhow, bail, Result};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use clap::ValueEnum;
use prettytable::{color, format, Attr, Cell, Row, Table};
use serde::Serialize;

use crate::timeclock::{EventCode, LogEntry};

/// One timed activity, from its init event to its last event
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub started_at: NaiveDateTime,
    pub last_timestamp: NaiveDateTime,
    pub tag: String,
    pub notes: String,
    /// Time spent running, excluding pauses
    #[serde(with = "crate::time::duration::seconds")]
    pub duration: TimeDelta,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Replay {
    Idle,
    Running,
    Paused,
    Resumed,
}

impl Replay {
    fn next(self, event: EventCode) -> Option<Self> {
        use EventCode::*;

        match (self, event) {
            (Self::Idle, Init) => Some(Self::Running),
            (Self::Running, Pause) => Some(Self::Paused),
            (Self::Running, Out) => Some(Self::Idle),
            (Self::Paused, Init) => Some(Self::Running),
            (Self::Paused, Unpause) => Some(Self::Resumed),
            (Self::Paused, Out) => Some(Self::Idle),
            (Self::Resumed, Init) => Some(Self::Running),
            (Self::Resumed, Pause) => Some(Self::Paused),
            (Self::Resumed, Out) => Some(Self::Idle),
            _ => None,
        }
    }

    fn is_running(self) -> bool {
        matches!(self, Self::Running | Self::Resumed)
    }
}

/// Rebuild the activities recorded in a timeclock
///
/// Fails on the first event that can't follow the one before it,
/// like a pause while nothing is running.
pub fn replay(entries: &[LogEntry]) -> Result<Vec<Activity>> {
    let mut state = Replay::Idle;
    let mut activities: Vec<Activity> = Vec::new();

    for (row, entry) in entries.iter().enumerate() {
        let next = state
            .next(entry.event)
            .ok_or_else(|| anyhow!("Row {}: ({}), wasn't expecting \"{}\"", row, entry, entry.event))?;

        if entry.event == EventCode::Init {
            activities.push(Activity {
                started_at: entry.timestamp,
                last_timestamp: entry.timestamp,
                tag: entry.tag.clone(),
                notes: entry.notes.clone(),
                duration: TimeDelta::zero(),
            });
        } else {
            let Some(current) = activities.last_mut() else {
                bail!("Row {}: ({}), no activity to update", row, entry);
            };

            if state.is_running() {
                current.duration += entry.timestamp - current.last_timestamp;
            }
            current.last_timestamp = entry.timestamp;
        }

        state = next;
    }

    Ok(activities)
}

/// Which activities to include in a report
#[derive(Clone, Debug, Default)]
pub struct Filter {
    pub tag: Option<String>,
    /// Inclusive, compared against the start of the activity
    pub begin: Option<NaiveDateTime>,
    /// Exclusive, compared against the last event of the activity
    pub end: Option<NaiveDateTime>,
}

impl Filter {
    pub fn matches(&self, activity: &Activity) -> bool {
        self.tag.as_ref().map_or(true, |tag| &activity.tag == tag)
            && self.begin.map_or(true, |begin| activity.started_at >= begin)
            && self.end.map_or(true, |end| activity.last_timestamp < end)
    }
}

/// Sort activities by start time and tag, keeping the ones the filter matches
pub fn select(mut activities: Vec<Activity>, filter: &Filter) -> Vec<Activity> {
    activities.sort_by(|a, b| (a.started_at, &a.tag).cmp(&(b.started_at, &b.tag)));
    activities.retain(|a| filter.matches(a));
    activities
}

/// Span of time that grouped activities are summed over
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Period {
    #[value(name = "h")]
    Hour,
    #[value(name = "d")]
    Day,
    #[value(name = "w")]
    Week,
    #[value(name = "m")]
    Month,
    #[value(name = "y")]
    Year,
}

impl Period {
    /// Label for the period containing `t`
    pub fn key(self, t: NaiveDateTime) -> String {
        let fmt = match self {
            Self::Hour => "%Y-%m-%d-%H",
            Self::Day => "%Y-%m-%d",
            Self::Week => "%Y-%W",
            Self::Month => "%Y-%m",
            Self::Year => "%Y",
        };

        t.format(fmt).to_string()
    }
}

/// Total time for one tag in one period
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupRow {
    pub period: String,
    pub tag: String,
    #[serde(with = "crate::time::duration::seconds")]
    pub duration: TimeDelta,
}

/// Sum activity durations per period and tag, sorted by period then tag
pub fn group(activities: &[Activity], period: Period) -> Vec<GroupRow> {
    let mut totals: BTreeMap<(String, String), TimeDelta> = BTreeMap::new();

    for activity in activities {
        let key = (period.key(activity.started_at), activity.tag.clone());
        *totals.entry(key).or_insert_with(TimeDelta::zero) += activity.duration;
    }

    totals
        .into_iter()
        .map(|((period, tag), duration)| GroupRow { period, tag, duration })
        .collect()
}

/// Unit durations are printed in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Unit {
    #[default]
    #[value(name = "s")]
    Seconds,
    #[value(name = "m")]
    Minutes,
    #[value(name = "h")]
    Hours,
}

impl Unit {
    /// Whole numbers print as-is, anything else is rounded to two decimals
    pub fn format(self, d: TimeDelta) -> String {
        let secs = d.num_seconds();

        let (per_unit, suffix) = match self {
            Self::Seconds => return format!("{}s", secs),
            Self::Minutes => (60, "m"),
            Self::Hours => (3600, "h"),
        };

        if secs % per_unit == 0 {
            format!("{}{}", secs / per_unit, suffix)
        } else {
            let value = format!("{:.2}", secs as f64 / per_unit as f64);
            let value = value.trim_end_matches('0').trim_end_matches('.');
            format!("{}{}", value, suffix)
        }
    }
}

/// Parse a report boundary, either a date (meaning midnight) or a date and time
pub fn parse_bound(s: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .map_err(|_| anyhow!("Expected YYYY-MM-DD or \"YYYY-MM-DD HH:MM:SS\", got {}", s))
}

fn title_row(titles: &[&str]) -> Row {
    Row::new(
        titles
            .iter()
            .map(|t| Cell::new(t).with_style(Attr::Underline(true)))
            .collect(),
    )
}

/// Table with one row per activity
pub fn activity_table(activities: &[Activity], unit: Unit) -> Table {
    let mut table = Table::new();

    table.set_titles(title_row(&["Start", "End", "Duration", "Tag"]));

    for activity in activities {
        let start = activity.started_at.format("%Y-%m-%d %H:%M:%S").to_string();
        let end = activity.last_timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let dur = unit.format(activity.duration);

        table.add_row(Row::new(vec![
            Cell::new(&start).with_style(Attr::ForegroundColor(color::BLUE)),
            Cell::new(&end).with_style(Attr::ForegroundColor(color::BLUE)),
            Cell::new(&dur).style_spec("r").with_style(Attr::ForegroundColor(color::CYAN)),
            Cell::new(&activity.tag),
        ]));
    }
    table.set_format(*format::consts::FORMAT_CLEAN);

    table
}

/// Table with one row per period and tag
pub fn group_table(rows: &[GroupRow], unit: Unit) -> Table {
    let mut table = Table::new();

    table.set_titles(title_row(&["Period", "Tag", "Duration"]));

    for row in rows {
        let dur = unit.format(row.duration);

        table.add_row(Row::new(vec![
            Cell::new(&row.period).with_style(Attr::ForegroundColor(color::BLUE)),
            Cell::new(&row.tag),
            Cell::new(&dur).style_spec("r").with_style(Attr::ForegroundColor(color::CYAN)),
        ]));
    }
    table.set_format(*format::consts::FORMAT_CLEAN);

    table
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    use super::{activity_table, group, group_table, parse_bound, replay, select, Filter, Period, Unit};
    use crate::timeclock::LogEntry;

    fn entries(lines: &[&str]) -> Vec<LogEntry> {
        lines.iter().map(|l| l.parse().unwrap()).collect()
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn pauses_are_not_counted() {
        let log = entries(&[
            "i 2024-03-27 09:00:00 Work  report",
            "p 2024-03-27 09:10:00 Work  ",
            "u 2024-03-27 09:30:00 Work  ",
            "o 2024-03-27 09:45:00 Work  ",
        ]);

        let activities = replay(&log).unwrap();

        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].started_at, at(27, 9, 0));
        assert_eq!(activities[0].last_timestamp, at(27, 9, 45));
        assert_eq!(activities[0].duration, TimeDelta::minutes(25));
        assert_eq!(activities[0].notes, "report");
    }

    #[test]
    fn repeated_pauses_add_up() {
        let log = entries(&[
            "i 2024-03-27 09:00:00 Work  ",
            "p 2024-03-27 09:05:00 Work  ",
            "u 2024-03-27 09:06:00 Work  ",
            "p 2024-03-27 09:10:00 Work  ",
            "u 2024-03-27 09:20:00 Work  ",
            "o 2024-03-27 09:21:00 Work  ",
        ]);

        assert_eq!(replay(&log).unwrap()[0].duration, TimeDelta::minutes(10));
    }

    #[test]
    fn init_after_pause_starts_a_new_activity() {
        let log = entries(&[
            "i 2024-03-27 09:00:00 Work  ",
            "p 2024-03-27 09:05:00 Work  ",
            "i 2024-03-27 10:00:00 Read  ",
            "o 2024-03-27 10:30:00 Read  ",
        ]);

        let activities = replay(&log).unwrap();

        assert_eq!(activities.len(), 2);
        assert_eq!(activities[0].duration, TimeDelta::minutes(5));
        assert_eq!(activities[1].tag, "Read");
        assert_eq!(activities[1].duration, TimeDelta::minutes(30));
    }

    #[test]
    fn unexpected_event_names_the_row() {
        let log = entries(&[
            "i 2024-03-27 09:00:00 Work  ",
            "u 2024-03-27 09:05:00 Work  ",
        ]);

        let err = replay(&log).unwrap_err();
        assert!(err.to_string().starts_with("Row 1:"));
        assert!(err.to_string().ends_with("wasn't expecting \"u\""));
    }

    #[test]
    fn pause_without_init_is_rejected() {
        let log = entries(&["p 2024-03-27 09:00:00 Work  "]);

        assert!(replay(&log).is_err());
    }

    #[test]
    fn filters_apply_to_start_and_end() {
        let log = entries(&[
            "i 2024-03-26 09:00:00 Work  ",
            "o 2024-03-26 10:00:00 Work  ",
            "i 2024-03-27 09:00:00 Read  ",
            "o 2024-03-27 10:00:00 Read  ",
            "i 2024-03-27 23:00:00 Work  ",
            "o 2024-03-28 01:00:00 Work  ",
        ]);
        let activities = replay(&log).unwrap();

        let by_tag = select(activities.clone(), &Filter { tag: Some("Work".to_string()), ..Filter::default() });
        assert_eq!(by_tag.len(), 2);

        let window = Filter {
            begin: Some(at(27, 0, 0)),
            end: Some(at(28, 0, 0)),
            ..Filter::default()
        };
        let in_window = select(activities, &window);
        assert_eq!(in_window.len(), 1);
        assert_eq!(in_window[0].tag, "Read");
    }

    #[test]
    fn group_by_day_and_tag() {
        let log = entries(&[
            "i 2024-03-27 09:00:00 Work  ",
            "o 2024-03-27 09:30:00 Work  ",
            "i 2024-03-27 11:00:00 Read  ",
            "o 2024-03-27 11:15:00 Read  ",
            "i 2024-03-27 14:00:00 Work  ",
            "o 2024-03-27 14:45:00 Work  ",
            "i 2024-03-28 09:00:00 Work  ",
            "o 2024-03-28 09:10:00 Work  ",
        ]);

        let rows = group(&replay(&log).unwrap(), Period::Day);

        let summary: Vec<(&str, &str, i64)> = rows
            .iter()
            .map(|r| (r.period.as_str(), r.tag.as_str(), r.duration.num_minutes()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("2024-03-27", "Read", 15),
                ("2024-03-27", "Work", 75),
                ("2024-03-28", "Work", 10),
            ]
        );
    }

    #[test]
    fn period_keys() {
        let t = at(27, 14, 5);

        assert_eq!(Period::Hour.key(t), "2024-03-27-14");
        assert_eq!(Period::Day.key(t), "2024-03-27");
        assert_eq!(Period::Week.key(t), "2024-13");
        assert_eq!(Period::Month.key(t), "2024-03");
        assert_eq!(Period::Year.key(t), "2024");
    }

    #[test]
    fn unit_formatting() {
        assert_eq!(Unit::Seconds.format(TimeDelta::seconds(1500)), "1500s");
        assert_eq!(Unit::Minutes.format(TimeDelta::seconds(1500)), "25m");
        assert_eq!(Unit::Minutes.format(TimeDelta::seconds(90)), "1.5m");
        assert_eq!(Unit::Hours.format(TimeDelta::seconds(1500)), "0.42h");
        assert_eq!(Unit::Hours.format(TimeDelta::seconds(7200)), "2h");
    }

    #[test]
    fn bounds_accept_dates_and_datetimes() {
        assert_eq!(parse_bound("2024-03-27").unwrap(), at(27, 0, 0));
        assert_eq!(parse_bound("2024-03-27 14:05:00").unwrap(), at(27, 14, 5));
        assert!(parse_bound("last week").is_err());
    }

    #[test]
    fn tables_have_a_row_per_item() {
        let log = entries(&[
            "i 2024-03-27 09:00:00 Work  ",
            "o 2024-03-27 09:30:00 Work  ",
            "i 2024-03-27 11:00:00 Read  ",
            "o 2024-03-27 11:15:00 Read  ",
        ]);
        let activities = replay(&log).unwrap();

        let table = activity_table(&activities, Unit::Minutes);
        assert_eq!(table.len(), 2);
        assert!(table.to_string().contains("30m"));

        let grouped = group_table(&group(&activities, Period::Year), Unit::Seconds);
        assert_eq!(grouped.len(), 2);
        assert!(grouped.to_string().contains("900s"));
    }

    #[test]
    fn activities_serialize_durations_in_seconds() {
        let log = entries(&[
            "i 2024-03-27 09:00:00 Work  notes",
            "o 2024-03-27 09:30:00 Work  ",
        ]);

        let json = serde_json::to_value(replay(&log).unwrap()).unwrap();

        assert_eq!(json[0]["duration"], 1800);
        assert_eq!(json[0]["tag"], "Work");
        assert_eq!(json[0]["started_at"], "2024-03-27T09:00:00");
    }
}
