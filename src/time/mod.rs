#[doc(hidden)]
pub mod duration;
mod target;

pub use target::{parse_target, ParseError};

use anyhow::{anyhow, bail, Result};
use chrono::TimeDelta;
use regex::Regex;

/// Extensions to `TimeDelta`
pub trait TimeDeltaExt
where
  Self: Sized
{
  /// Parse a `TimeDelta` from a human duration string, for example "25s", "10m" or "1h30m".
  ///
  /// Accepts one or more `<number><unit>` pairs with an optional leading sign.
  /// Numbers may carry a decimal fraction ("1.5h").
  /// Recognized units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.
  fn from_human(s: &str) -> Result<Self>;

  /// Formats the TimeDelta as a "kitchen timer" string, e.g. mm:ss.
  ///
  /// The delta is rounded to the nearest second first.
  /// If the delta is an hour or longer, it is formatted as hh:mm:ss.
  /// Negative deltas format as zero.
  fn to_kitchen(&self) -> String;

  /// Formats the TimeDelta in a humanized way, for example 22m30s.
  fn to_human(&self) -> String;
}

const NANOS_PER_SEC: i64 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<i64> {
  match unit {
    "ns" => Some(1),
    "us" | "µs" => Some(1_000),
    "ms" => Some(1_000_000),
    "s" => Some(NANOS_PER_SEC),
    "m" => Some(60 * NANOS_PER_SEC),
    "h" => Some(3600 * NANOS_PER_SEC),
    _ => None,
  }
}

impl TimeDeltaExt for TimeDelta {
  fn from_human(s: &str) -> Result<Self> {
    let whole = Regex::new(r"^[-+]?(?:(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:ns|us|µs|ms|s|m|h))+$")?;
    let part = Regex::new(r"([0-9]*)(?:\.([0-9]*))?(ns|us|µs|ms|s|m|h)")?;

    if s == "0" {
      return Ok(TimeDelta::zero());
    }

    if !whole.is_match(s) {
      bail!("String {} is not a duration", s);
    }

    let (negative, body) = match s.strip_prefix('-') {
      Some(rest) => (true, rest),
      None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let overflow = || anyhow!("Duration {} is out of range", s);

    let mut nanos: i64 = 0;
    for cap in part.captures_iter(body) {
      let unit = unit_nanos(&cap[3]).ok_or_else(|| anyhow!("Unknown unit in {}", s))?;

      let integer: i64 = match &cap[1] {
        "" => 0,
        digits => digits.parse().map_err(|_| overflow())?,
      };
      let fraction = match cap.get(2).map(|m| m.as_str()) {
        None | Some("") => 0,
        Some(digits) => {
          let value: f64 = format!("0.{}", digits).parse()?;
          (value * unit as f64).round() as i64
        }
      };

      let value = integer
        .checked_mul(unit)
        .and_then(|v| v.checked_add(fraction))
        .ok_or_else(overflow)?;
      nanos = nanos.checked_add(value).ok_or_else(overflow)?;
    }

    if negative {
      nanos = -nanos;
    }

    Ok(TimeDelta::nanoseconds(nanos))
  }

  fn to_kitchen(&self) -> String {
    let millis = self.num_milliseconds().max(0);
    let total = (millis + 500) / 1000;

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
      format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
      format!("{:02}:{:02}", minutes, seconds)
    }
  }

  fn to_human(&self) -> String {
    use std::fmt::Write;

    let total = self.num_seconds();

    if total <= 0 {
      return "0s".to_string();
    }

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    let mut acc = String::new();

    if hours > 0 {
      write!(acc, "{}h", hours).unwrap();
    }

    if minutes > 0 {
      write!(acc, "{}m", minutes).unwrap();
    }

    if seconds > 0 {
      write!(acc, "{}s", seconds).unwrap();
    }

    acc
  }
}
