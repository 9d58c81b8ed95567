//! A terminal countdown timer that draws the time left in large digits and
//! keeps a timeclock of when each timer started, paused, resumed and ended.

pub mod config;
pub mod font;
pub mod geometry;
pub mod report;
pub mod session;
pub mod terminal;
pub mod time;
pub mod timeclock;

pub use config::{default_config_path, Config};
pub use session::{Outcome, Session, TimerSpec};
