//! A single timer run: the clock face, its alarm and ticker, and the keys
//! that pause, resume or cancel it.
//!
//! All state changes happen on one task. [`Session::run`] waits on the
//! expiry alarm, the one-second ticker and the input channel together, and
//! hands exactly one event at a time to [`Session::handle`].
//!
//! Pausing stops the alarm and the ticker outright. Resuming arms a fresh
//! alarm for the time that was left when the timer paused and a fresh
//! ticker, so a pause neither moves the expiry instant nor queues up ticks.

use std::pin::Pin;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{Local, TimeDelta};
use log::{debug, info};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior, Sleep};

use crate::font;
use crate::geometry::{self, cells};
use crate::terminal::{Input, Surface};
use crate::time::TimeDeltaExt;
use crate::timeclock::{EventCode, LogEntry, Recorder};

/// How often the clock face changes
pub const TICK: Duration = Duration::from_secs(1);

/// Toggles closer together than this are dropped
pub const INPUT_DELAY: Duration = Duration::from_millis(500);

pub const PAUSED_CAPTION: &str = "PAUSED";

/// What the user asked for
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerSpec {
    pub total_duration: TimeDelta,
    /// Show elapsed time instead of time remaining
    pub count_up: bool,
    pub tag: String,
    pub notes: String,
}

/// How a session ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The timer ran out
    Expired,
    /// The user quit
    Cancelled,
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Expired => 0,
            Self::Cancelled => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Tick,
    Expire,
    Input(Input),
}

/// The expiry alarm and the ticker of a running timer
#[derive(Debug)]
pub struct Clocks {
    alarm: Pin<Box<Sleep>>,
    ticker: Interval,
}

impl Clocks {
    /// Arm an alarm `remaining` from `now`, and a ticker whose first tick is one [`TICK`] away
    pub fn start(remaining: Duration, now: Instant) -> Self {
        let mut ticker = interval_at(now + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            alarm: Box::pin(sleep_until(now + remaining)),
            ticker,
        }
    }

    /// Disarm both, returning how long the alarm still had to go
    pub fn stop(self, now: Instant) -> Duration {
        self.deadline().saturating_duration_since(now)
    }

    /// When the alarm goes off
    pub fn deadline(&self) -> Instant {
        self.alarm.deadline()
    }
}

#[derive(Debug)]
pub enum Mode {
    Running(Clocks),
    Paused {
        /// Time left on the alarm when it was stopped
        remaining: Duration,
    },
}

impl Mode {
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused { .. })
    }
}

#[derive(Debug)]
pub struct TimerState {
    /// Counted down once per tick, so it may briefly dip below zero before the alarm fires
    time_left: TimeDelta,
    mode: Mode,
    last_toggle_at: Option<Instant>,
}

pub struct Session<S, R> {
    spec: TimerSpec,
    state: TimerState,
    surface: S,
    recorder: R,
}

impl<S: Surface, R: Recorder> Session<S, R> {
    /// Start the timer: arm the clocks, record the init event and draw the first frame.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(spec: TimerSpec, surface: S, recorder: R) -> Result<Self> {
        let now = Instant::now();
        let clocks = Clocks::start(spec.total_duration.to_std().unwrap_or_default(), now);

        let mut session = Self {
            state: TimerState {
                time_left: spec.total_duration,
                mode: Mode::Running(clocks),
                last_toggle_at: None,
            },
            spec,
            surface,
            recorder,
        };

        info!(
            "Starting {} timer ({}) for {}",
            if session.spec.count_up { "count-up" } else { "countdown" },
            session.spec.tag,
            session.spec.total_duration.to_human()
        );

        let notes = session.spec.notes.clone();
        session.record(EventCode::Init, &notes)?;
        session.draw_clock()?;

        Ok(session)
    }

    /// Process events until the timer expires or the user quits
    pub async fn run(&mut self, inputs: &mut UnboundedReceiver<Input>) -> Result<Outcome> {
        loop {
            let event = match &mut self.state.mode {
                Mode::Running(clocks) => tokio::select! {
                    biased;
                    () = &mut clocks.alarm => Some(Event::Expire),
                    input = inputs.recv() => input.map(Event::Input),
                    _ = clocks.ticker.tick() => Some(Event::Tick),
                },
                Mode::Paused { .. } => inputs.recv().await.map(Event::Input),
            };

            let Some(event) = event else {
                bail!("Terminal input closed unexpectedly");
            };

            if let Some(outcome) = self.handle(event, Instant::now())? {
                return Ok(outcome);
            }
        }
    }

    /// Apply one event at time `now`, returning the outcome if it ends the session
    pub fn handle(&mut self, event: Event, now: Instant) -> Result<Option<Outcome>> {
        match event {
            Event::Tick => {
                if self.state.mode.is_paused() {
                    debug!("Ignoring tick while paused");
                    return Ok(None);
                }
                self.tick()?;
                Ok(None)
            }
            Event::Expire => {
                if self.state.mode.is_paused() {
                    debug!("Ignoring expiry while paused");
                    return Ok(None);
                }
                info!("Timer expired");
                self.record(EventCode::Out, "")?;
                Ok(Some(Outcome::Expired))
            }
            Event::Input(Input::Quit) => {
                info!("Timer cancelled with {} left", self.state.time_left.to_kitchen());
                self.record(EventCode::Out, "")?;
                Ok(Some(Outcome::Cancelled))
            }
            Event::Input(Input::Toggle) => {
                self.toggle(now)?;
                Ok(None)
            }
            Event::Input(Input::Resize) => {
                debug!("Redrawing after resize");
                self.redraw()?;
                Ok(None)
            }
            Event::Input(Input::Other) => Ok(None),
        }
    }

    fn tick(&mut self) -> Result<()> {
        self.state.time_left -= TimeDelta::seconds(1);
        self.draw_clock()
    }

    fn toggle(&mut self, now: Instant) -> Result<()> {
        if let Some(last) = self.state.last_toggle_at {
            let since = now.saturating_duration_since(last);
            if since <= INPUT_DELAY {
                debug!("Dropping toggle {:?} after the last one", since);
                return Ok(());
            }
        }

        let placeholder = Mode::Paused { remaining: Duration::ZERO };
        self.state.mode = match std::mem::replace(&mut self.state.mode, placeholder) {
            Mode::Running(clocks) => {
                let remaining = clocks.stop(now);
                debug!("Paused with {:?} on the alarm", remaining);

                self.record(EventCode::Pause, "")?;
                self.draw_caption()?;
                Mode::Paused { remaining }
            }
            Mode::Paused { remaining } => {
                let clocks = Clocks::start(remaining, now);
                debug!("Resumed with {:?} on the alarm", remaining);

                self.record(EventCode::Unpause, "")?;
                self.draw_clock()?;
                Mode::Running(clocks)
            }
        };

        self.state.last_toggle_at = Some(now);

        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        self.draw_clock()?;

        if self.state.mode.is_paused() {
            self.draw_caption()?;
        }

        Ok(())
    }

    fn record(&mut self, event: EventCode, notes: &str) -> Result<()> {
        let entry = LogEntry::new(event, Local::now().naive_local(), &self.spec.tag, notes);
        self.recorder.record(&entry)
    }

    fn draw_clock(&mut self) -> Result<()> {
        let block = font::render(&self.display_value().to_kitchen());
        let (w, h) = self.surface.size()?;
        let (x, y) = geometry::center_block(
            i32::from(w),
            i32::from(h),
            cells(block.width()),
            cells(block.height()),
        );

        self.surface.clear()?;
        for (row, text) in block.rows().iter().enumerate() {
            self.surface.draw_text(text, x, y + cells(row))?;
        }
        self.surface.flush()
    }

    fn draw_caption(&mut self) -> Result<()> {
        let (w, h) = self.surface.size()?;
        let (x, y) = geometry::caption_origin(
            i32::from(w),
            i32::from(h),
            cells(PAUSED_CAPTION.chars().count()),
        );

        self.surface.draw_text(PAUSED_CAPTION, x, y)?;
        self.surface.flush()
    }

    /// The value on the clock face, never below zero or above the total
    pub fn display_value(&self) -> TimeDelta {
        let total = self.spec.total_duration;
        let value = if self.spec.count_up {
            total - self.state.time_left
        } else {
            self.state.time_left
        };

        value.min(total).max(TimeDelta::zero())
    }

    pub fn time_left(&self) -> TimeDelta {
        self.state.time_left
    }

    pub fn is_paused(&self) -> bool {
        self.state.mode.is_paused()
    }

    /// How long until the alarm fires, counting from `now`
    pub fn remaining(&self, now: Instant) -> Duration {
        match &self.state.mode {
            Mode::Running(clocks) => clocks.deadline().saturating_duration_since(now),
            Mode::Paused { remaining } => *remaining,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    /// Take back the surface and recorder once the session is over
    pub fn into_parts(self) -> (S, R) {
        (self.surface, self.recorder)
    }
}
