//! Countdown timer shown beneath the temperature block.
//!
//! The timer is independent of temperature control. It counts down once per elapsed
//! wall-clock second, however often the screen is redrawn, and reports the fraction of its
//! original duration still outstanding.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::input::InputError;

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountdownTimer {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl CountdownTimer {
    pub fn new(days: u32, hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            days,
            hours,
            minutes,
            seconds,
        }
    }

    /// Normalized timer (hours < 24, minutes and seconds < 60). Saturates at `u32::MAX` days.
    pub fn from_total_seconds(total: u64) -> Self {
        let days = (total / SECS_PER_DAY).min(u64::from(u32::MAX)) as u32;
        let rest = total % SECS_PER_DAY;
        Self {
            days,
            hours: (rest / SECS_PER_HOUR) as u32,
            minutes: ((rest % SECS_PER_HOUR) / SECS_PER_MINUTE) as u32,
            seconds: (rest % SECS_PER_MINUTE) as u32,
        }
    }

    pub fn total_seconds(&self) -> u64 {
        u64::from(self.days) * SECS_PER_DAY
            + u64::from(self.hours) * SECS_PER_HOUR
            + u64::from(self.minutes) * SECS_PER_MINUTE
            + u64::from(self.seconds)
    }

    pub fn is_zero(&self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }

    /// Take one second off, borrowing up the seconds → minutes → hours → days chain.
    /// Returns `false` if the timer was already at zero.
    pub fn decrement(&mut self) -> bool {
        if self.seconds > 0 {
            self.seconds -= 1;
        } else if self.minutes > 0 {
            self.minutes -= 1;
            self.seconds = 59;
        } else if self.hours > 0 {
            self.hours -= 1;
            self.minutes = 59;
            self.seconds = 59;
        } else if self.days > 0 {
            self.days -= 1;
            self.hours = 23;
            self.minutes = 59;
            self.seconds = 59;
        } else {
            return false;
        }
        true
    }
}

impl fmt::Display for CountdownTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}d {:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Parses `D:H:M:S`, all non-negative integers.
impl FromStr for CountdownTimer {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || InputError::MalformedTimer(s.trim().to_string());
        let mut fields = [0u32; 4];
        let mut parts = s.trim().split(':');
        for field in fields.iter_mut() {
            let part = parts.next().ok_or_else(malformed)?.trim();
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            *field = part.parse().map_err(|_| malformed())?;
        }
        if parts.next().is_some() {
            return Err(malformed());
        }
        let [days, hours, minutes, seconds] = fields;
        Ok(Self::new(days, hours, minutes, seconds))
    }
}

/// Owner of the countdown and its percentage baseline.
#[derive(Debug, Clone, Default)]
pub struct TimerSubsystem {
    timer: CountdownTimer,
    initial_total: Option<u64>,
    last_tick: Option<Instant>,
}

impl TimerSubsystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timer(&self) -> CountdownTimer {
        self.timer
    }

    pub fn is_armed(&self) -> bool {
        self.initial_total.is_some()
    }

    pub fn initial_total_seconds(&self) -> Option<u64> {
        self.initial_total
    }

    /// Start a countdown. Any running countdown is replaced and the percentage baseline is
    /// recaptured from the new value. A zero duration disarms.
    pub fn arm(&mut self, timer: CountdownTimer, now: Instant) {
        let total = timer.total_seconds();
        if total == 0 {
            self.disarm();
            return;
        }
        self.timer = CountdownTimer::from_total_seconds(total);
        self.initial_total = Some(total);
        self.last_tick = Some(now);
        tracing::info!("Timer armed for {}", self.timer);
    }

    pub fn disarm(&mut self) {
        if self.is_armed() {
            tracing::info!("Timer disarmed");
        }
        self.timer = CountdownTimer::default();
        self.initial_total = None;
        self.last_tick = None;
    }

    /// Count down one second.
    pub fn tick(&mut self) {
        if !self.is_armed() {
            return;
        }
        self.timer.decrement();
        if self.timer.is_zero() {
            tracing::info!("Timer expired");
            self.initial_total = None;
            self.last_tick = None;
        }
    }

    /// Apply every whole second elapsed since the last tick. Returns the number of ticks.
    pub fn update(&mut self, now: Instant) -> u64 {
        let mut ticks = 0;
        while let Some(last) = self.last_tick {
            if now.saturating_duration_since(last) < Duration::from_secs(1) {
                break;
            }
            self.last_tick = Some(last + Duration::from_secs(1));
            self.tick();
            ticks += 1;
        }
        ticks
    }

    /// Fraction of the armed duration still outstanding, in `[0, 1]`; `0` when disarmed.
    pub fn percent_remaining(&self) -> f64 {
        match self.initial_total {
            Some(initial) if initial > 0 => {
                (self.timer.total_seconds() as f64 / initial as f64).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrow_chain() {
        let mut t = CountdownTimer::new(1, 0, 0, 0);
        assert!(t.decrement());
        assert_eq!(t, CountdownTimer::new(0, 23, 59, 59));

        let mut t = CountdownTimer::new(0, 1, 0, 0);
        t.decrement();
        assert_eq!(t, CountdownTimer::new(0, 0, 59, 59));

        let mut t = CountdownTimer::new(0, 0, 1, 0);
        t.decrement();
        assert_eq!(t, CountdownTimer::new(0, 0, 0, 59));

        let mut t = CountdownTimer::default();
        assert!(!t.decrement());
    }

    #[test]
    fn test_normalization_preserves_total() {
        let t = CountdownTimer::from_total_seconds(90);
        assert_eq!(t, CountdownTimer::new(0, 0, 1, 30));
        let t = CountdownTimer::new(0, 25, 61, 61);
        let n = CountdownTimer::from_total_seconds(t.total_seconds());
        assert_eq!(n, CountdownTimer::new(1, 2, 2, 1));
    }

    #[test]
    fn test_parse() {
        assert_eq!(
            "1:2:3:4".parse::<CountdownTimer>().unwrap(),
            CountdownTimer::new(1, 2, 3, 4)
        );
        assert_eq!(
            " 0:0:1:30\n".parse::<CountdownTimer>().unwrap(),
            CountdownTimer::new(0, 0, 1, 30)
        );
        for bad in ["abc", "", "1:2:3", "1:2:3:4:5", "1:-2:3:4", "1:2:x:4", "1::3:4", "+1:2:3:4"] {
            assert!(bad.parse::<CountdownTimer>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(CountdownTimer::new(2, 3, 4, 5).to_string(), "2d 03:04:05");
    }

    #[test]
    fn test_arm_zero_disarms() {
        let mut sub = TimerSubsystem::new();
        let now = Instant::now();
        sub.arm(CountdownTimer::new(0, 0, 0, 10), now);
        sub.arm(CountdownTimer::default(), now);
        assert!(!sub.is_armed());
        assert_eq!(sub.percent_remaining(), 0.0);
    }

    #[test]
    fn test_rearm_resets_baseline() {
        let mut sub = TimerSubsystem::new();
        let now = Instant::now();
        sub.arm(CountdownTimer::new(0, 0, 0, 10), now);
        for _ in 0..5 {
            sub.tick();
        }
        assert_eq!(sub.percent_remaining(), 0.5);
        sub.arm(CountdownTimer::new(0, 0, 0, 4), now);
        assert_eq!(sub.initial_total_seconds(), Some(4));
        assert_eq!(sub.percent_remaining(), 1.0);
    }

    #[test]
    fn test_update_ticks_once_per_elapsed_second() {
        let mut sub = TimerSubsystem::new();
        let t0 = Instant::now();
        sub.arm(CountdownTimer::new(0, 0, 0, 10), t0);
        assert_eq!(sub.update(t0 + Duration::from_millis(500)), 0);
        assert_eq!(sub.update(t0 + Duration::from_millis(999)), 0);
        assert_eq!(sub.update(t0 + Duration::from_millis(1000)), 1);
        assert_eq!(sub.update(t0 + Duration::from_millis(1500)), 0);
        assert_eq!(sub.update(t0 + Duration::from_millis(3200)), 2);
        assert_eq!(sub.timer(), CountdownTimer::new(0, 0, 0, 7));
    }

    #[test]
    fn test_update_stops_at_zero() {
        let mut sub = TimerSubsystem::new();
        let t0 = Instant::now();
        sub.arm(CountdownTimer::new(0, 0, 0, 3), t0);
        assert_eq!(sub.update(t0 + Duration::from_secs(60)), 3);
        assert!(!sub.is_armed());
        assert!(sub.timer().is_zero());
    }
}
