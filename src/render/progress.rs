// src/render/progress.rs - Timer progress bar
pub const FILLED: char = '█';
pub const EMPTY: char = '░';

/// Number of filled cells for `percent` in `[0, 1]`, rounded down.
pub fn filled_cells(percent: f64, width: u16) -> u16 {
    let p = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 1.0) };
    (p * f64::from(width)).floor() as u16
}

/// `[████░░░░]  50%`. Always `width + 7` characters wide.
pub fn render_bar(percent: f64, width: u16) -> String {
    let filled = filled_cells(percent, width);
    let mut bar = String::with_capacity(usize::from(width) * 3 + 8);
    bar.push('[');
    bar.extend(std::iter::repeat_n(FILLED, usize::from(filled)));
    bar.extend(std::iter::repeat_n(EMPTY, usize::from(width - filled)));
    bar.push(']');
    let shown = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 1.0) };
    bar.push_str(&format!(" {:>3}%", (shown * 100.0).floor() as u16));
    bar
}
