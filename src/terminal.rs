// src/terminal.rs - Operator terminal boundary (crossterm)
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::Print;
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::execute;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalGeometry {
    pub rows: u16,
    pub cols: u16,
}

impl TerminalGeometry {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

/// Something that happened at the keyboard or to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermEvent {
    Key(char),
    /// Ctrl-C while in raw mode, where it does not raise SIGINT.
    Interrupt,
    Resize(TerminalGeometry),
}

/// Input side of the operator terminal.
pub trait Console {
    fn geometry(&mut self) -> io::Result<TerminalGeometry>;

    /// Next pending event, without blocking.
    fn poll_event(&mut self) -> io::Result<Option<TermEvent>>;

    /// Clear the screen, show `message` and block for one line of input in cooked mode.
    /// Returns `None` at end of input.
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>>;
}

static RAW_MODE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// True while a [`RawModeGuard`] owns the terminal.
pub fn raw_mode_active() -> bool {
    RAW_MODE_ACTIVE.load(Ordering::SeqCst)
}

pub(crate) fn set_raw_mode_active(active: bool) {
    RAW_MODE_ACTIVE.store(active, Ordering::SeqCst);
}

/// Raw mode, alternate screen and hidden cursor for as long as the guard lives.
#[derive(Debug)]
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn acquire() -> io::Result<Self> {
        tracing::debug!("Switching terminal to raw mode");
        // Raised first so nothing is logged onto the alternate screen
        set_raw_mode_active(true);
        if let Err(e) = enable_raw_mode() {
            set_raw_mode_active(false);
            return Err(e);
        }
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            set_raw_mode_active(false);
            return Err(e);
        }
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show, LeaveAlternateScreen);
        let restored = disable_raw_mode();
        set_raw_mode_active(false);
        if let Err(e) = restored {
            tracing::error!("Failed to restore terminal mode: {}", e);
        } else {
            tracing::debug!("Terminal restored");
        }
    }
}

#[derive(Debug, Default)]
pub struct CrosstermConsole;

impl CrosstermConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Console for CrosstermConsole {
    fn geometry(&mut self) -> io::Result<TerminalGeometry> {
        let (cols, rows) = terminal::size()?;
        Ok(TerminalGeometry::new(rows, cols))
    }

    fn poll_event(&mut self) -> io::Result<Option<TermEvent>> {
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(Some(TermEvent::Interrupt));
                    }
                    KeyCode::Char(c) => return Ok(Some(TermEvent::Key(c))),
                    _ => continue,
                },
                Event::Resize(cols, rows) => {
                    return Ok(Some(TermEvent::Resize(TerminalGeometry::new(rows, cols))));
                }
                _ => continue,
            }
        }
        Ok(None)
    }

    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        let mut out = io::stdout();
        disable_raw_mode()?;
        execute!(out, Clear(ClearType::All), MoveTo(0, 0), Print(message), Show)?;
        out.flush()?;

        let mut line = String::new();
        let read = io::stdin().read_line(&mut line);

        // Back to raw mode before reporting anything
        let restored = execute!(out, Hide).and_then(|_| enable_raw_mode());
        let n = read?;
        restored?;

        if n == 0 {
            Ok(None)
        } else {
            Ok(Some(line))
        }
    }
}
