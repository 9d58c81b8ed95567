//! Resolve the timer's command-line target into a countdown length.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use thiserror::Error;

use super::TimeDeltaExt;

/// The target was neither a time of day nor a duration.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("invalid duration or time: {literal}")]
pub struct ParseError {
    literal: String,
}

impl ParseError {
    fn new(literal: &str) -> Self {
        Self {
            literal: literal.to_string(),
        }
    }

    /// The input that failed to parse
    pub fn literal(&self) -> &str {
        &self.literal
    }
}

/// Parse a countdown target relative to `now`.
///
/// A time of day ("2:15PM", "14:15") counts down to its next occurrence. If
/// that time of day is at or before the current one, the target is tomorrow.
/// Anything else is read as a duration ("25s", "10m", "1h30m").
///
/// Time-of-day formats are tried first. Negative durations are rejected.
pub fn parse_target(input: &str, now: NaiveDateTime) -> Result<TimeDelta, ParseError> {
    if let Some(target) = parse_time_of_day(input) {
        return Ok(until_next(target, now.time()));
    }

    match TimeDelta::from_human(input) {
        Ok(delta) if delta >= TimeDelta::zero() => Ok(delta),
        _ => Err(ParseError::new(input)),
    }
}

fn parse_time_of_day(input: &str) -> Option<NaiveTime> {
    let upper = input.trim().to_uppercase();

    NaiveTime::parse_from_str(&upper, "%I:%M%p")
        .or_else(|_| NaiveTime::parse_from_str(&upper, "%H:%M"))
        .ok()
}

fn until_next(target: NaiveTime, now: NaiveTime) -> TimeDelta {
    let now = now.with_nanosecond(0).unwrap_or(now);
    let delta = target.signed_duration_since(now);

    if delta <= TimeDelta::zero() {
        delta + TimeDelta::days(1)
    } else {
        delta
    }
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    use super::{parse_target, ParseError};

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 27)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn relative_durations_ignore_now() {
        for now in [at(0, 0, 0), at(14, 0, 0), at(23, 59, 59)] {
            assert_eq!(parse_target("25s", now).unwrap(), TimeDelta::seconds(25));
            assert_eq!(parse_target("10m", now).unwrap(), TimeDelta::minutes(10));
        }
    }

    #[test]
    fn kitchen_time_later_today() {
        let now = at(14, 0, 0);

        assert_eq!(parse_target("3:00PM", now).unwrap(), TimeDelta::hours(1));
        assert_eq!(parse_target("3:00pm", now).unwrap(), TimeDelta::hours(1));
        assert_eq!(parse_target("02:15PM", now).unwrap(), TimeDelta::minutes(15));
    }

    #[test]
    fn kitchen_time_already_passed_rolls_over() {
        let now = at(14, 0, 0);

        assert_eq!(parse_target("1:00PM", now).unwrap(), TimeDelta::hours(23));
        assert_eq!(parse_target("9:30AM", now).unwrap(), TimeDelta::minutes(19 * 60 + 30));
    }

    #[test]
    fn twenty_four_hour_time() {
        let now = at(14, 0, 0);

        assert_eq!(parse_target("14:15", now).unwrap(), TimeDelta::minutes(15));
        assert_eq!(parse_target("00:00", now).unwrap(), TimeDelta::hours(10));
    }

    #[test]
    fn current_time_of_day_means_tomorrow() {
        let now = at(14, 0, 0);

        assert_eq!(parse_target("14:00", now).unwrap(), TimeDelta::days(1));
        assert_eq!(parse_target("2:00PM", now).unwrap(), TimeDelta::days(1));
    }

    #[test]
    fn sub_second_part_of_now_is_ignored() {
        let now = at(13, 59, 59) + TimeDelta::milliseconds(700);

        assert_eq!(parse_target("14:00", now).unwrap(), TimeDelta::seconds(1));
    }

    #[test]
    fn invalid_literal_is_reported() {
        let err = parse_target("soon", at(14, 0, 0)).unwrap_err();

        assert_eq!(err.literal(), "soon");
        assert_eq!(err.to_string(), "invalid duration or time: soon");
    }

    #[test]
    fn out_of_range_times_and_negative_durations_fail() {
        let now = at(14, 0, 0);

        assert!(matches!(parse_target("25:00", now), Err(ParseError { .. })));
        assert!(parse_target("13:00PM", now).is_err());
        assert!(parse_target("-5m", now).is_err());
    }
}
