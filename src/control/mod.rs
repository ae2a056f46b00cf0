//! On/off temperature control with a dead-band.
//!
//! [`ControlLoop`] owns the sensor reader, the heater actuator and the [`ControlState`].
//! One [`ControlLoop::tick`] reads the sensor, expires any temporary setpoint, and then
//! decides the heater state:
//!
//! - an invalid sample switches the heater off and enters [`HeaterMode::Safety`]
//! - below `desired - tolerance` the heater turns on, unless the target is at or above the
//!   maximum temperature
//! - above `desired + tolerance` the heater turns off
//! - inside the band the previous state is held

pub mod setpoint;

use std::time::Instant;

use crate::config::Config;
use crate::hardware::{
    AnalogInput, HeaterActuator, HeaterOutput, SensorError, SensorReader, TemperatureSample,
};

pub use setpoint::{Override, SetpointRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterMode {
    Idle,
    Heating,
    /// Last sample was invalid; the heater is forced off.
    Safety,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlSettings {
    pub default_setpoint: f64,
    pub tolerance: f64,
    pub max_temp: f64,
}

impl ControlSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            default_setpoint: config.control.default_setpoint,
            tolerance: config.control.tolerance,
            max_temp: config.control.max_temp,
        }
    }
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Hysteresis rule for a valid reading. `heating` is the current actuator state.
pub fn decide(current: f64, desired: f64, heating: bool, settings: &ControlSettings) -> bool {
    if desired >= settings.max_temp {
        return false;
    }
    if current < desired - settings.tolerance {
        true
    } else if current > desired + settings.tolerance {
        false
    } else {
        heating
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    /// Latest valid temperature; `None` before the first reading or after a fault.
    pub current: Option<f64>,
    pub fault: Option<SensorError>,
    pub desired: f64,
    pub mode: HeaterMode,
    pub hold: Option<Override>,
}

impl ControlState {
    fn new(desired: f64) -> Self {
        Self {
            current: None,
            fault: None,
            desired,
            mode: HeaterMode::Idle,
            hold: None,
        }
    }

    pub fn heating(&self) -> bool {
        self.mode == HeaterMode::Heating
    }

    pub fn override_expiry(&self) -> Option<Instant> {
        self.hold.map(|h| h.expires_at())
    }
}

pub struct ControlLoop<A: AnalogInput, H: HeaterOutput> {
    sensor: SensorReader<A>,
    heater: HeaterActuator<H>,
    settings: ControlSettings,
    state: ControlState,
}

impl<A: AnalogInput, H: HeaterOutput> ControlLoop<A, H> {
    pub fn new(sensor: SensorReader<A>, heater: HeaterActuator<H>, settings: ControlSettings) -> Self {
        let state = ControlState::new(settings.default_setpoint);
        Self {
            sensor,
            heater,
            settings,
            state,
        }
    }

    pub fn from_config(input: A, output: H, config: &Config) -> Self {
        Self::new(
            SensorReader::from_config(input, config),
            HeaterActuator::new(output),
            ControlSettings::from_config(config),
        )
    }

    pub fn state(&self) -> &ControlState {
        &self.state
    }

    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    pub fn sensor(&self) -> &SensorReader<A> {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut SensorReader<A> {
        &mut self.sensor
    }

    pub fn heater(&self) -> &HeaterActuator<H> {
        &self.heater
    }

    /// One control cycle: sample, expire the hold, decide.
    pub async fn tick(&mut self, now: Instant) -> &ControlState {
        let sample = self.sensor.read().await;
        self.expire_override(now);
        self.apply_sample(sample);
        &self.state
    }

    /// Drive the heater from an already acquired sample.
    pub fn apply_sample(&mut self, sample: TemperatureSample) -> HeaterMode {
        match sample {
            TemperatureSample::Invalid(fault) => {
                self.heater.off();
                if self.state.mode != HeaterMode::Safety {
                    tracing::warn!("Entering safety mode: {}", fault);
                }
                self.state.current = None;
                self.state.fault = Some(fault);
                self.state.mode = HeaterMode::Safety;
            }
            TemperatureSample::Valid(current) => {
                if self.state.mode == HeaterMode::Safety {
                    tracing::info!("Sensor recovered at {:.1}°C", current);
                }
                let heating = decide(current, self.state.desired, self.state.heating(), &self.settings);
                self.heater.set(heating);
                self.state.current = Some(current);
                self.state.fault = None;
                self.state.mode = if heating && self.heater.is_energized() {
                    HeaterMode::Heating
                } else {
                    HeaterMode::Idle
                };
            }
        }
        self.state.mode
    }

    /// Revert to the default setpoint once a temporary hold has run out.
    pub fn expire_override(&mut self, now: Instant) -> bool {
        match self.state.hold {
            Some(hold) if hold.is_expired(now) => {
                self.state.desired = self.settings.default_setpoint;
                self.state.hold = None;
                tracing::info!(
                    "Temporary setpoint expired, reverting to {:.1}°C",
                    self.state.desired
                );
                true
            }
            _ => false,
        }
    }

    pub fn set_setpoint(&mut self, request: SetpointRequest, now: Instant) {
        self.state.desired = request.celsius;
        self.state.hold = request
            .hold_for
            .filter(|d| !d.is_zero())
            .map(|d| Override::new(now, d));

        match self.state.hold {
            Some(hold) => tracing::info!(
                "Setpoint temporarily changed to {:.1}°C for {}s",
                request.celsius,
                hold.duration().as_secs()
            ),
            None => tracing::info!("Setpoint changed to {:.1}°C", request.celsius),
        }
        if request.celsius >= self.settings.max_temp {
            tracing::warn!(
                "Setpoint {:.1}°C is at or above the {:.1}°C limit; heater will stay off",
                request.celsius,
                self.settings.max_temp
            );
        }
    }

    /// Command the heater off. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        tracing::info!("Control loop shutting down, heater off");
        self.heater.off();
        if self.state.mode == HeaterMode::Heating {
            self.state.mode = HeaterMode::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ControlSettings {
        ControlSettings {
            default_setpoint: 21.0,
            tolerance: 2.0,
            max_temp: 100.0,
        }
    }

    #[test]
    fn test_decide_below_band_heats() {
        assert!(decide(18.9, 21.0, false, &settings()));
    }

    #[test]
    fn test_decide_above_band_idles() {
        assert!(!decide(23.1, 21.0, true, &settings()));
    }

    #[test]
    fn test_decide_holds_inside_band() {
        for t in [19.0, 20.0, 21.0, 22.5, 23.0] {
            assert!(decide(t, 21.0, true, &settings()));
            assert!(!decide(t, 21.0, false, &settings()));
        }
    }

    #[test]
    fn test_decide_refuses_out_of_range_target() {
        assert!(!decide(20.0, 100.0, false, &settings()));
        assert!(!decide(20.0, 150.0, true, &settings()));
    }
}
