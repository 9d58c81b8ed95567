//! The screen the clock is drawn on, and the keys it listens to.

use std::io::{self, Stdout, Write};
use std::thread;

use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::Print,
    terminal::{self, disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// User input the timer reacts to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    /// Esc or Ctrl-C
    Quit,
    /// Space
    Toggle,
    /// The terminal changed size
    Resize,
    Other,
}

impl Input {
    pub fn from_event(event: &Event) -> Self {
        match event {
            Event::Key(key) => Self::from_key(key),
            Event::Resize(_, _) => Self::Resize,
            _ => Self::Other,
        }
    }

    fn from_key(key: &KeyEvent) -> Self {
        if key.kind != KeyEventKind::Press {
            return Self::Other;
        }

        match key.code {
            KeyCode::Esc => Self::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Self::Quit,
            KeyCode::Char(' ') => Self::Toggle,
            _ => Self::Other,
        }
    }
}

/// A grid of character cells that text can be drawn onto
///
/// Coordinates may be negative or past the edge; whatever falls outside the
/// grid is clipped.
pub trait Surface {
    /// Current size as (columns, rows)
    fn size(&self) -> Result<(u16, u16)>;

    fn clear(&mut self) -> Result<()>;

    fn draw_text(&mut self, text: &str, x: i32, y: i32) -> Result<()>;

    /// Push everything drawn since the last flush to the screen
    fn flush(&mut self) -> Result<()>;
}

/// The real terminal, in raw mode on the alternate screen
///
/// The terminal is restored when this is closed or dropped,
/// including while unwinding from a panic.
pub struct Terminal {
    stdout: Stdout,
    active: bool,
}

impl Terminal {
    pub fn open() -> Result<Self> {
        enable_raw_mode().context("Unable to enable raw mode")?;

        let mut term = Self {
            stdout: io::stdout(),
            active: true,
        };

        execute!(term.stdout, EnterAlternateScreen, Hide)
            .context("Unable to enter the alternate screen")?;

        Ok(term)
    }

    /// Restore the terminal to the state it was in before `open`
    pub fn close(mut self) -> Result<()> {
        self.restore().context("Unable to restore the terminal")
    }

    fn restore(&mut self) -> io::Result<()> {
        if !self.active {
            return Ok(());
        }
        self.active = false;

        execute!(self.stdout, Show, LeaveAlternateScreen)?;
        disable_raw_mode()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!("Failed to restore the terminal: {}", e);
        }
    }
}

impl Surface for Terminal {
    fn size(&self) -> Result<(u16, u16)> {
        terminal::size().context("Unable to read the terminal size")
    }

    fn clear(&mut self) -> Result<()> {
        queue!(self.stdout, Clear(ClearType::All))?;
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x: i32, y: i32) -> Result<()> {
        let (width, height) = self.size()?;
        let Some((column, row, visible)) = clip(text, x, y, width, height) else {
            return Ok(());
        };

        queue!(self.stdout, MoveTo(column, row), Print(visible))?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.stdout.flush()?;
        Ok(())
    }
}

/// The part of `text` drawn at (`x`, `y`) that lands inside a `width` x `height` grid
///
/// Returns the column and row to start printing at along with the characters
/// that fit, or `None` when none of the text is visible.
fn clip(text: &str, x: i32, y: i32, width: u16, height: u16) -> Option<(u16, u16, String)> {
    let row = u16::try_from(y).ok().filter(|row| *row < height)?;
    let column = u16::try_from(x.max(0)).ok().filter(|column| *column < width)?;

    let skip = usize::try_from(x.saturating_neg()).unwrap_or(0);
    let visible: String = text
        .chars()
        .skip(skip)
        .take(usize::from(width - column))
        .collect();

    if visible.is_empty() {
        None
    } else {
        Some((column, row, visible))
    }
}

/// Read terminal events on a background thread.
///
/// Events the timer doesn't care about are dropped before they reach the
/// channel. The thread stops once the receiver is gone or reading fails; it
/// is never joined, since a blocked read only ends with the process.
pub fn spawn_input_reader() -> UnboundedReceiver<Input> {
    let (tx, rx) = mpsc::unbounded_channel();

    thread::spawn(move || loop {
        match event::read() {
            Ok(event) => {
                let input = Input::from_event(&event);
                if input == Input::Other {
                    continue;
                }

                debug!("Terminal input {:?}", input);

                if tx.send(input).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("Failed to read terminal event: {}", e);
                break;
            }
        }
    });

    rx
}

#[cfg(test)]
mod test {
    use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};

    use super::{clip, Input};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn quit_keys() {
        assert_eq!(Input::from_event(&key(KeyCode::Esc, KeyModifiers::NONE)), Input::Quit);
        assert_eq!(
            Input::from_event(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Input::Quit
        );
    }

    #[test]
    fn plain_c_is_not_quit() {
        assert_eq!(
            Input::from_event(&key(KeyCode::Char('c'), KeyModifiers::NONE)),
            Input::Other
        );
    }

    #[test]
    fn space_toggles() {
        assert_eq!(Input::from_event(&key(KeyCode::Char(' '), KeyModifiers::NONE)), Input::Toggle);
    }

    #[test]
    fn key_release_is_ignored() {
        let release = Event::Key(KeyEvent {
            code: KeyCode::Char(' '),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });

        assert_eq!(Input::from_event(&release), Input::Other);
    }

    #[test]
    fn resize_event() {
        assert_eq!(Input::from_event(&Event::Resize(100, 40)), Input::Resize);
        assert_eq!(Input::from_event(&Event::FocusGained), Input::Other);
    }

    #[test]
    fn clip_inside_grid_is_untouched() {
        assert_eq!(clip("12:00", 3, 2, 20, 10), Some((3, 2, "12:00".to_string())));
    }

    #[test]
    fn clip_negative_x_drops_leading_chars() {
        assert_eq!(clip("abcdefgh", -3, 0, 20, 10), Some((0, 0, "defgh".to_string())));
        assert_eq!(clip("abc", -3, 0, 20, 10), None);
    }

    #[test]
    fn clip_cuts_at_right_edge() {
        assert_eq!(clip("abcdefgh", 16, 1, 20, 10), Some((16, 1, "abcd".to_string())));
        assert_eq!(clip("abcdefgh", 20, 1, 20, 10), None);
    }

    #[test]
    fn clip_block_wider_than_grid() {
        let row = "█".repeat(30);

        let (column, _, visible) = clip(&row, -5, 0, 20, 10).unwrap();
        assert_eq!(column, 0);
        assert_eq!(visible.chars().count(), 20);
    }

    #[test]
    fn clip_drops_rows_outside_grid() {
        assert_eq!(clip("abc", 0, -1, 20, 10), None);
        assert_eq!(clip("abc", 0, 10, 20, 10), None);
        assert_eq!(clip("abc", 0, 9, 20, 10), Some((0, 9, "abc".to_string())));
    }
}
