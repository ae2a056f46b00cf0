//! Keyboard command handling.
//!
//! Keys are read one at a time without blocking. `s` and `t` open a one-line prompt (the only
//! place the loop blocks on the operator); everything else is handled immediately.

use std::io;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::control::{ControlLoop, SetpointRequest};
use crate::hardware::{AnalogInput, HeaterOutput};
use crate::terminal::{Console, TermEvent, TerminalGeometry};
use crate::timer::{CountdownTimer, TimerSubsystem};

pub const SETPOINT_PROMPT: &str = "Enter new desired temperature (°C) [hold seconds]: ";
pub const TIMER_PROMPT: &str = "Enter timer duration (D:H:M:S): ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Malformed setpoint: {0:?}")]
    MalformedSetpoint(String),
    #[error("Malformed timer: {0:?}")]
    MalformedTimer(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    EditSetpoint,
    EditTimer,
}

impl Command {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'q' | 'Q' => Some(Command::Quit),
            's' | 'S' => Some(Command::EditSetpoint),
            't' | 'T' => Some(Command::EditTimer),
            _ => None,
        }
    }
}

/// What the loop has to do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Ignored,
    Quit,
    Interrupt,
    /// A prompt took over the screen; repaint everything.
    Redraw,
    Resize(TerminalGeometry),
}

/// Parse `<celsius> [hold_seconds]`.
pub fn parse_setpoint(line: &str) -> Result<SetpointRequest, InputError> {
    let malformed = || InputError::MalformedSetpoint(line.trim().to_string());
    let mut tokens = line.split_whitespace();

    let celsius = tokens
        .next()
        .and_then(|t| t.parse::<f64>().ok())
        .filter(|t| t.is_finite())
        .ok_or_else(malformed)?;

    let hold_for = match tokens.next() {
        None => None,
        Some(t) => Some(Duration::from_secs(t.parse::<u64>().map_err(|_| malformed())?)),
    };

    if tokens.next().is_some() {
        return Err(malformed());
    }

    Ok(SetpointRequest { celsius, hold_for })
}

#[derive(Debug, Default)]
pub struct InputDispatcher;

impl InputDispatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn dispatch<C, A, H>(
        &mut self,
        event: TermEvent,
        console: &mut C,
        control: &mut ControlLoop<A, H>,
        timer: &mut TimerSubsystem,
        now: Instant,
    ) -> io::Result<Dispatch>
    where
        C: Console,
        A: AnalogInput,
        H: HeaterOutput,
    {
        let key = match event {
            TermEvent::Interrupt => return Ok(Dispatch::Interrupt),
            TermEvent::Resize(geometry) => {
                tracing::debug!("Terminal resized to {}x{}", geometry.cols, geometry.rows);
                return Ok(Dispatch::Resize(geometry));
            }
            TermEvent::Key(key) => key,
        };

        match Command::from_key(key) {
            Some(Command::Quit) => Ok(Dispatch::Quit),
            Some(Command::EditSetpoint) => {
                self.edit_setpoint(console, control, now)?;
                Ok(Dispatch::Redraw)
            }
            Some(Command::EditTimer) => {
                self.edit_timer(console, timer, now)?;
                Ok(Dispatch::Redraw)
            }
            None => {
                tracing::trace!("Ignoring key {:?}", key);
                Ok(Dispatch::Ignored)
            }
        }
    }

    fn edit_setpoint<C, A, H>(
        &mut self,
        console: &mut C,
        control: &mut ControlLoop<A, H>,
        now: Instant,
    ) -> io::Result<()>
    where
        C: Console,
        A: AnalogInput,
        H: HeaterOutput,
    {
        let Some(line) = console.prompt(SETPOINT_PROMPT)? else {
            return Ok(());
        };
        match parse_setpoint(&line) {
            Ok(request) => control.set_setpoint(request, now),
            Err(e) => tracing::warn!("{}, setpoint unchanged", e),
        }
        Ok(())
    }

    fn edit_timer<C: Console>(
        &mut self,
        console: &mut C,
        timer: &mut TimerSubsystem,
        now: Instant,
    ) -> io::Result<()> {
        let Some(line) = console.prompt(TIMER_PROMPT)? else {
            return Ok(());
        };
        match line.parse::<CountdownTimer>() {
            Ok(value) => timer.arm(value, now),
            Err(e) => {
                tracing::warn!("{}, timer reset", e);
                timer.disarm();
            }
        }
        Ok(())
    }
}
