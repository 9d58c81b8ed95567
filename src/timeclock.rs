//! The timeclock: an append-only log with one line per timer event.
//!
//! Each line reads `<code> <YYYY-MM-DD HH:MM:SS> <tag>  <notes>`, where the
//! code is one of `i` (init), `p` (pause), `u` (unpause) or `o` (out).

use std::fmt;
use std::fs::{read_to_string, File, OpenOptions};
use std::io::{self, prelude::*};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use log::debug;
use regex::Regex;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What happened to the timer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventCode {
    Init,
    Pause,
    Unpause,
    Out,
}

impl EventCode {
    pub fn as_char(self) -> char {
        match self {
            Self::Init => 'i',
            Self::Pause => 'p',
            Self::Unpause => 'u',
            Self::Out => 'o',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'i' => Some(Self::Init),
            'p' => Some(Self::Pause),
            'u' => Some(Self::Unpause),
            'o' => Some(Self::Out),
            _ => None,
        }
    }
}

impl fmt::Display for EventCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One line of the timeclock
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub event: EventCode,
    pub timestamp: NaiveDateTime,
    pub tag: String,
    pub notes: String,
}

impl LogEntry {
    pub fn new(event: EventCode, timestamp: NaiveDateTime, tag: &str, notes: &str) -> Self {
        Self {
            event,
            timestamp,
            tag: tag.to_string(),
            notes: notes.to_string(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}  {}",
            self.event,
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.tag,
            self.notes
        )
    }
}

impl FromStr for LogEntry {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let re = Regex::new(r"^(\S+) (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}) (.*)$")?;
        let cap = re
            .captures(line)
            .with_context(|| format!("Line does not look like a timeclock entry: {:?}", line))?;

        let code = &cap[1];
        let event = code
            .chars()
            .next()
            .filter(|_| code.len() == 1)
            .and_then(EventCode::from_char)
            .ok_or_else(|| anyhow!("Invalid timeclock: {} should be one of i, o, p, u", code))?;

        let timestamp = NaiveDateTime::parse_from_str(&cap[2], TIMESTAMP_FORMAT)
            .with_context(|| format!("Invalid timestamp {}", &cap[2]))?;

        let rest = &cap[3];
        let (tag, notes) = rest.split_once("  ").unwrap_or((rest, ""));

        Ok(Self::new(event, timestamp, tag, notes))
    }
}

/// Somewhere timer events get written to
pub trait Recorder {
    fn record(&mut self, entry: &LogEntry) -> Result<()>;
}

impl Recorder for Vec<LogEntry> {
    fn record(&mut self, entry: &LogEntry) -> Result<()> {
        self.push(entry.clone());
        Ok(())
    }
}

/// A timeclock file on disk
///
/// The file is opened for every write and closed right after,
/// so nothing holds it open while the timer runs.
#[derive(Clone, Debug)]
pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Make sure the file can be opened for appending, creating it if needed
    pub fn check_access(&self) -> Result<()> {
        self.open()
            .map(drop)
            .with_context(|| format!("There was a problem accessing {}", self.path.display()))
    }

    /// Read every entry in the file
    ///
    /// A file that doesn't exist yet has no entries.
    pub fn entries(&self) -> Result<Vec<LogEntry>> {
        if !self.path.try_exists()? {
            return Ok(Vec::new());
        }

        let contents = read_to_string(&self.path)
            .with_context(|| format!("There was a problem accessing {}", self.path.display()))?;

        contents
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(row, line)| line.parse::<LogEntry>().with_context(|| format!("Row {}", row)))
            .collect()
    }

    fn open(&self) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.create(true).append(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        options.open(&self.path)
    }
}

impl Recorder for LogFile {
    fn record(&mut self, entry: &LogEntry) -> Result<()> {
        let mut file = self
            .open()
            .with_context(|| format!("There was a problem accessing {}", self.path.display()))?;

        writeln!(file, "{}", entry)
            .with_context(|| format!("There was a problem writing to {}", self.path.display()))?;

        debug!("Appended {:?} to {}", entry.event, self.path.display());

        Ok(())
    }
}
