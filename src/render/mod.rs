//! Incremental status screen.
//!
//! [`RenderEngine`] remembers what it last put on screen. A full redraw paints the box,
//! labels and values at positions computed from the current geometry. Every later call only
//! rewrites the value cells that changed, leaving the frame alone, or writes nothing at all
//! when the state is unchanged.

pub mod layout;
pub mod progress;

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};

use crate::control::{ControlState, HeaterMode};
use crate::hardware::SensorError;
use crate::terminal::TerminalGeometry;
use crate::timer::{CountdownTimer, TimerSubsystem};

use layout::{
    BAR_ROW, CONTROL_LINES, CURRENT_ROW, DESIRED_ROW, HEADER_SEPARATOR_ROW, HEATER_ROW, Layout,
    MIN_COLS, MIN_ROWS, SENSOR_ROW, TIMER_ROW, TIMER_SEPARATOR_ROW, TITLE_ROW, VALUE_WIDTH,
};

const TITLE: &str = "TEMP CONTROL";
const CONTROLS: [&str; CONTROL_LINES as usize] = [
    "[s] Set desired temperature",
    "[t] Set timer (D:H:M:S)",
    "[q] Quit",
];

/// Everything the screen shows, captured once per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub current: Option<f64>,
    pub desired: f64,
    pub mode: HeaterMode,
    pub fault: Option<SensorError>,
    pub timer: CountdownTimer,
    pub timer_armed: bool,
    pub percent_remaining: f64,
}

impl RenderState {
    pub fn capture(control: &ControlState, timer: &TimerSubsystem) -> Self {
        Self {
            current: control.current,
            desired: control.desired,
            mode: control.mode,
            fault: control.fault.clone(),
            timer: timer.timer(),
            timer_armed: timer.is_armed(),
            percent_remaining: timer.percent_remaining(),
        }
    }
}

/// A value cell that can be rewritten on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Current,
    Desired,
    Heater,
    Sensor,
    /// Timer value and its progress bar.
    Timer,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Current,
        Field::Desired,
        Field::Heater,
        Field::Sensor,
        Field::Timer,
    ];

    fn label(self) -> &'static str {
        match self {
            Field::Current => "Current temperature:",
            Field::Desired => "Desired temperature:",
            Field::Heater => "Heater:",
            Field::Sensor => "Sensor:",
            Field::Timer => "Timer:",
        }
    }

    fn row(self) -> u16 {
        match self {
            Field::Current => CURRENT_ROW,
            Field::Desired => DESIRED_ROW,
            Field::Heater => HEATER_ROW,
            Field::Sensor => SENSOR_ROW,
            Field::Timer => TIMER_ROW,
        }
    }

    fn changed(self, old: &RenderState, new: &RenderState) -> bool {
        match self {
            Field::Current => old.current != new.current,
            Field::Desired => old.desired != new.desired,
            Field::Heater => old.mode != new.mode,
            Field::Sensor => old.fault != new.fault,
            Field::Timer => {
                old.timer != new.timer
                    || old.timer_armed != new.timer_armed
                    || old.percent_remaining != new.percent_remaining
            }
        }
    }

    fn value(self, state: &RenderState) -> String {
        match self {
            Field::Current => format_temperature(state.current),
            Field::Desired => format_temperature(Some(state.desired)),
            Field::Heater => format_heater(state.mode).to_string(),
            Field::Sensor => format_sensor(state.fault.as_ref()).to_string(),
            Field::Timer => format_timer(&state.timer, state.timer_armed),
        }
    }
}

/// What a [`RenderEngine::render`] call wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Draw {
    Full,
    Partial(Vec<Field>),
    Skipped,
}

pub fn format_temperature(celsius: Option<f64>) -> String {
    match celsius {
        Some(t) => format!("{:>6.1}°C", t),
        None => "  --.-°C".to_string(),
    }
}

pub fn format_heater(mode: HeaterMode) -> &'static str {
    match mode {
        HeaterMode::Heating => "ON",
        HeaterMode::Idle => "OFF",
        HeaterMode::Safety => "OFF (safety)",
    }
}

/// Out-of-band voltages are retried inside a reading and only surface as `NoValidReading`.
pub fn format_sensor(fault: Option<&SensorError>) -> &'static str {
    match fault {
        None => "OK",
        Some(SensorError::UnsafeTemperature { .. }) => "FAULT (range)",
        Some(SensorError::NoValidReading { .. } | SensorError::VoltageOutOfBand { .. }) => {
            "FAULT (no reading)"
        }
    }
}

pub fn format_timer(timer: &CountdownTimer, armed: bool) -> String {
    if armed {
        timer.to_string()
    } else {
        "--".to_string()
    }
}

pub struct RenderEngine<W: Write> {
    out: W,
    geometry: TerminalGeometry,
    bar_width: u16,
    snapshot: Option<RenderState>,
    layout_dirty: bool,
}

impl<W: Write> RenderEngine<W> {
    pub fn new(out: W, geometry: TerminalGeometry, bar_width: u16) -> Self {
        Self {
            out,
            geometry,
            bar_width,
            snapshot: None,
            layout_dirty: true,
        }
    }

    pub fn geometry(&self) -> TerminalGeometry {
        self.geometry
    }

    /// New geometry; the next render repaints everything.
    pub fn resize(&mut self, geometry: TerminalGeometry) {
        self.geometry = geometry;
        self.layout_dirty = true;
    }

    /// Force a full redraw on the next render, e.g. after a prompt overwrote the screen.
    pub fn invalidate(&mut self) {
        self.layout_dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.layout_dirty
    }

    pub fn snapshot(&self) -> Option<&RenderState> {
        self.snapshot.as_ref()
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    /// Full redraw on the first call or after a resize, otherwise only changed fields.
    pub fn render(&mut self, state: &RenderState) -> io::Result<Draw> {
        if self.layout_dirty || self.snapshot.is_none() {
            self.full_redraw(state)?;
            return Ok(Draw::Full);
        }
        let fields = self.partial_update(state)?;
        if fields.is_empty() {
            Ok(Draw::Skipped)
        } else {
            Ok(Draw::Partial(fields))
        }
    }

    pub fn full_redraw(&mut self, state: &RenderState) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All))?;

        match Layout::compute(self.geometry, self.bar_width) {
            Some(layout) => {
                self.draw_frame(&layout)?;
                for field in Field::ALL {
                    self.draw_field(&layout, field, state)?;
                }
            }
            None => {
                tracing::debug!(
                    "Terminal {}x{} below {}x{}",
                    self.geometry.cols,
                    self.geometry.rows,
                    MIN_COLS,
                    MIN_ROWS
                );
                queue!(
                    self.out,
                    MoveTo(0, 0),
                    Print(format!("Terminal too small (need {}x{})", MIN_COLS, MIN_ROWS))
                )?;
            }
        }

        self.out.flush()?;
        self.snapshot = Some(state.clone());
        self.layout_dirty = false;
        Ok(())
    }

    /// Rewrite the fields that differ from the snapshot. Returns the fields written.
    pub fn partial_update(&mut self, state: &RenderState) -> io::Result<Vec<Field>> {
        let Some(layout) = Layout::compute(self.geometry, self.bar_width) else {
            return Ok(Vec::new());
        };
        let changed: Vec<Field> = match &self.snapshot {
            Some(old) => Field::ALL
                .into_iter()
                .filter(|f| f.changed(old, state))
                .collect(),
            None => Field::ALL.to_vec(),
        };
        if changed.is_empty() {
            return Ok(changed);
        }

        for &field in &changed {
            self.draw_field(&layout, field, state)?;
        }
        self.out.flush()?;
        self.snapshot = Some(state.clone());
        Ok(changed)
    }

    fn draw_frame(&mut self, layout: &Layout) -> io::Result<()> {
        let inner = usize::from(layout.inner_width());
        let rule = "─".repeat(inner);

        queue!(
            self.out,
            MoveTo(layout.left, layout.top),
            Print(format!("┌{}┐", rule))
        )?;
        for row in layout.top + 1..layout.bottom() {
            queue!(
                self.out,
                MoveTo(layout.left, row),
                Print('│'),
                MoveTo(layout.right(), row),
                Print('│')
            )?;
        }
        queue!(
            self.out,
            MoveTo(layout.left, layout.bottom()),
            Print(format!("└{}┘", rule))
        )?;

        for row in [
            layout.row(HEADER_SEPARATOR_ROW),
            layout.row(TIMER_SEPARATOR_ROW),
            layout.controls_separator_row(),
        ] {
            queue!(self.out, MoveTo(layout.left, row), Print(format!("├{}┤", rule)))?;
        }

        let title_col = layout.left + 1 + (layout.inner_width() - TITLE.len() as u16) / 2;
        queue!(
            self.out,
            MoveTo(title_col, layout.row(TITLE_ROW)),
            Print(TITLE)
        )?;

        for field in Field::ALL {
            queue!(
                self.out,
                MoveTo(layout.content_col(), layout.row(field.row())),
                Print(field.label())
            )?;
        }

        for (i, hint) in CONTROLS.iter().enumerate() {
            queue!(
                self.out,
                MoveTo(layout.content_col(), layout.control_row(i as u16)),
                Print(hint)
            )?;
        }
        Ok(())
    }

    fn draw_field(&mut self, layout: &Layout, field: Field, state: &RenderState) -> io::Result<()> {
        let value = format!(
            "{:<width$}",
            field.value(state),
            width = usize::from(VALUE_WIDTH)
        );
        queue!(
            self.out,
            MoveTo(layout.value_col(), layout.row(field.row())),
            Print(value)
        )?;

        if field == Field::Timer {
            queue!(
                self.out,
                MoveTo(layout.content_col(), layout.row(BAR_ROW)),
                Print(progress::render_bar(state.percent_remaining, layout.bar_width))
            )?;
        }
        Ok(())
    }
}
