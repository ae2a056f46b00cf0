// src/control/setpoint.rs - Temporary setpoint holds
use std::time::{Duration, Instant};

/// An operator request for a new desired temperature.
///
/// With `hold_for` set (and non-zero) the new value is temporary and reverts to the default
/// setpoint once the duration has elapsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetpointRequest {
    pub celsius: f64,
    pub hold_for: Option<Duration>,
}

impl SetpointRequest {
    pub fn permanent(celsius: f64) -> Self {
        Self {
            celsius,
            hold_for: None,
        }
    }

    pub fn temporary(celsius: f64, hold_for: Duration) -> Self {
        Self {
            celsius,
            hold_for: Some(hold_for),
        }
    }
}

/// A running temporary setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Override {
    armed_at: Instant,
    duration: Duration,
}

impl Override {
    pub fn new(armed_at: Instant, duration: Duration) -> Self {
        Self { armed_at, duration }
    }

    pub fn armed_at(&self) -> Instant {
        self.armed_at
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn expires_at(&self) -> Instant {
        self.armed_at + self.duration
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.armed_at) >= self.duration
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration
            .saturating_sub(now.saturating_duration_since(self.armed_at))
    }
}
