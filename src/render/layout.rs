// src/render/layout.rs - Screen positions derived from terminal geometry
use crate::terminal::TerminalGeometry;

pub const MARGIN_COLS: u16 = 2;
pub const MARGIN_ROWS: u16 = 1;

/// Width reserved for a field label, including the trailing space.
pub const LABEL_WIDTH: u16 = 21;
/// Width every value is padded to, so a shorter value erases a longer one.
pub const VALUE_WIDTH: u16 = 20;

/// Horizontal padding between the box border and its content.
const PADDING: u16 = 2;
/// `[` + `]` + ` 100%` around the bar cells.
const BAR_DECORATION: u16 = 7;

// Rows inside the box, counted from its top border
pub const TITLE_ROW: u16 = 1;
pub const HEADER_SEPARATOR_ROW: u16 = 2;
pub const CURRENT_ROW: u16 = 4;
pub const DESIRED_ROW: u16 = 5;
pub const HEATER_ROW: u16 = 6;
pub const SENSOR_ROW: u16 = 7;
pub const TIMER_SEPARATOR_ROW: u16 = 9;
pub const TIMER_ROW: u16 = 11;
pub const BAR_ROW: u16 = 12;

/// Number of control hint lines at the bottom of the box.
pub const CONTROL_LINES: u16 = 3;

const MIN_BOX_WIDTH: u16 = LABEL_WIDTH + VALUE_WIDTH + 2 * PADDING;
const MIN_BOX_HEIGHT: u16 = BAR_ROW + 2 + CONTROL_LINES + 3;

pub const MIN_COLS: u16 = MIN_BOX_WIDTH + 2 * MARGIN_COLS;
pub const MIN_ROWS: u16 = MIN_BOX_HEIGHT + 2 * MARGIN_ROWS;

/// Absolute positions of the bordered box and everything inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub bar_width: u16,
}

impl Layout {
    /// `None` when the terminal cannot hold the box.
    pub fn compute(geometry: TerminalGeometry, bar_width: u16) -> Option<Self> {
        if geometry.cols < MIN_COLS || geometry.rows < MIN_ROWS {
            return None;
        }
        let width = geometry.cols - 2 * MARGIN_COLS;
        let height = geometry.rows - 2 * MARGIN_ROWS;
        let max_bar = width - 2 * PADDING - BAR_DECORATION;
        Some(Self {
            left: MARGIN_COLS,
            top: MARGIN_ROWS,
            width,
            height,
            bar_width: bar_width.clamp(1, max_bar),
        })
    }

    pub fn right(&self) -> u16 {
        self.left + self.width - 1
    }

    pub fn bottom(&self) -> u16 {
        self.top + self.height - 1
    }

    /// Absolute row for a row offset inside the box.
    pub fn row(&self, offset: u16) -> u16 {
        self.top + offset
    }

    pub fn content_col(&self) -> u16 {
        self.left + PADDING
    }

    pub fn value_col(&self) -> u16 {
        self.content_col() + LABEL_WIDTH
    }

    pub fn inner_width(&self) -> u16 {
        self.width - 2
    }

    pub fn controls_separator_row(&self) -> u16 {
        self.bottom() - CONTROL_LINES - 1
    }

    /// Absolute row of the `index`th control hint.
    pub fn control_row(&self, index: u16) -> u16 {
        self.bottom() - CONTROL_LINES + index
    }
}
