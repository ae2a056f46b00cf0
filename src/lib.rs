//! heatctl: single-zone on/off heater controller with a live terminal display.
//!
//! The loop in [`app::App`] samples the sensor, drives the heater with a dead-band rule,
//! counts down an optional timer, repaints only what changed on screen and handles
//! single-key commands. Hardware and terminal access sit behind traits so every piece can be
//! driven from tests.

pub mod app;
pub mod config;
pub mod control;
pub mod hardware;
pub mod input;
pub mod logging;
pub mod render;
pub mod terminal;
pub mod timer;

pub use app::{App, AppError, ShutdownToken};
pub use config::{Config, ConfigError, load_config};
