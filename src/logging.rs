//! Log sinks that coexist with the full-screen display.
//!
//! The status screen owns the terminal while a [`RawModeGuard`](crate::terminal::RawModeGuard)
//! is held. A log line written to stderr in that window would land inside the box, so the
//! console sink drops events until the terminal is restored. A log file is never gated.

use std::io;

use tracing::Metadata;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::{MakeWriterExt, WithFilter};

use crate::terminal;

pub type ConsoleWriter<M> = WithFilter<M, fn(&Metadata<'_>) -> bool>;

fn outside_raw_mode(_: &Metadata<'_>) -> bool {
    !terminal::raw_mode_active()
}

/// Wrap `make` so it writes nothing while the terminal is in raw mode.
pub fn unless_raw_mode<M>(make: M) -> ConsoleWriter<M>
where
    M: for<'a> MakeWriter<'a>,
{
    make.with_filter(outside_raw_mode as fn(&Metadata<'_>) -> bool)
}

/// Stderr, silenced while the status screen is up.
pub fn stderr_writer() -> ConsoleWriter<fn() -> io::Stderr> {
    unless_raw_mode(io::stderr as fn() -> io::Stderr)
}
