//! # Controller Configuration
//!
//! Every tunable of the controller lives here: sensor calibration, control thresholds,
//! display sizing and the hardware backend settings.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [sensor]
//! samples = 3
//! settle_ms = 100
//! min_volts = 0.2
//! max_volts = 3.0
//!
//! [control]
//! default_setpoint = 21.0
//! tolerance = 2.0
//! max_temp = 100.0
//! interval_ms = 500
//!
//! [display]
//! bar_width = 30
//! ```
//!
//! Missing sections and fields fall back to their defaults, so an empty file is a valid
//! configuration.

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration for the controller.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Analog front-end calibration and sampling budget.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SensorConfig {
    /// Raw acquisitions per reading.
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Settle delay between acquisitions, in milliseconds.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_adc_reference_volts")]
    pub adc_reference_volts: f64,
    #[serde(default = "default_adc_levels")]
    pub adc_levels: u32,
    #[serde(default = "default_offset_volts")]
    pub offset_volts: f64,
    #[serde(default = "default_degrees_per_volt")]
    pub degrees_per_volt: f64,
    #[serde(default = "default_min_volts")]
    pub min_volts: f64,
    #[serde(default = "default_max_volts")]
    pub max_volts: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            settle_ms: default_settle_ms(),
            adc_reference_volts: default_adc_reference_volts(),
            adc_levels: default_adc_levels(),
            offset_volts: default_offset_volts(),
            degrees_per_volt: default_degrees_per_volt(),
            min_volts: default_min_volts(),
            max_volts: default_max_volts(),
        }
    }
}

impl SensorConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

/// Thresholds for the on/off controller.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlConfig {
    #[serde(default = "default_setpoint")]
    pub default_setpoint: f64,
    /// Half-width of the dead-band around the setpoint.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_temp")]
    pub max_temp: f64,
    /// Sleep between loop iterations, in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            default_setpoint: default_setpoint(),
            tolerance: default_tolerance(),
            max_temp: default_max_temp(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl ControlConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default = "default_bar_width")]
    pub bar_width: u16,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            bar_width: default_bar_width(),
        }
    }
}

/// Paths used by the sysfs backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HardwareConfig {
    #[serde(default = "default_adc_path")]
    pub adc_path: String,
    #[serde(default = "default_gpio_path")]
    pub gpio_path: String,
}

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            adc_path: default_adc_path(),
            gpio_path: default_gpio_path(),
        }
    }
}

/// Parameters of the simulated thermal plant.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulationConfig {
    #[serde(default = "default_ambient_temp")]
    pub initial_temp: f64,
    #[serde(default = "default_ambient_temp")]
    pub ambient_temp: f64,
    /// Degrees per second gained while the element is energized.
    #[serde(default = "default_heating_rate")]
    pub heating_rate: f64,
    /// Fraction of the difference to ambient lost per second.
    #[serde(default = "default_loss_coefficient")]
    pub loss_coefficient: f64,
    /// Peak-to-peak sensor noise in degrees.
    #[serde(default = "default_noise")]
    pub noise: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            initial_temp: default_ambient_temp(),
            ambient_temp: default_ambient_temp(),
            heating_rate: default_heating_rate(),
            loss_coefficient: default_loss_coefficient(),
            noise: default_noise(),
            seed: None,
        }
    }
}

fn default_samples() -> usize { 3 }
fn default_settle_ms() -> u64 { 100 }
fn default_adc_reference_volts() -> f64 { 3.3 }
fn default_adc_levels() -> u32 { 1024 }
fn default_offset_volts() -> f64 { 0.5 }
fn default_degrees_per_volt() -> f64 { 100.0 }
fn default_min_volts() -> f64 { 0.2 }
fn default_max_volts() -> f64 { 3.0 }
fn default_setpoint() -> f64 { 21.0 }
fn default_tolerance() -> f64 { 2.0 }
fn default_max_temp() -> f64 { 100.0 }
fn default_interval_ms() -> u64 { 500 }
fn default_bar_width() -> u16 { 30 }
fn default_adc_path() -> String { "/sys/bus/iio/devices/iio:device0/in_voltage0_raw".to_string() }
fn default_gpio_path() -> String { "/sys/class/gpio/gpio17/value".to_string() }
fn default_ambient_temp() -> f64 { 20.0 }
fn default_heating_rate() -> f64 { 0.5 }
fn default_loss_coefficient() -> f64 { 0.01 }
fn default_noise() -> f64 { 0.1 }

impl Config {
    /// Reject tunables the controller cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.sensor;
        let c = &self.control;
        for (name, value) in [
            ("sensor.adc_reference_volts", s.adc_reference_volts),
            ("sensor.offset_volts", s.offset_volts),
            ("sensor.degrees_per_volt", s.degrees_per_volt),
            ("sensor.min_volts", s.min_volts),
            ("sensor.max_volts", s.max_volts),
            ("control.default_setpoint", c.default_setpoint),
            ("control.tolerance", c.tolerance),
            ("control.max_temp", c.max_temp),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{} must be finite, got {}", name, value)));
            }
        }
        if s.samples == 0 {
            return Err(ConfigError::Invalid("sensor.samples must be at least 1".into()));
        }
        if s.adc_levels == 0 {
            return Err(ConfigError::Invalid("sensor.adc_levels must be non-zero".into()));
        }
        if !(s.min_volts < s.max_volts) {
            return Err(ConfigError::Invalid(format!(
                "sensor voltage band is empty: [{}, {}]",
                s.min_volts, s.max_volts
            )));
        }
        if !(c.tolerance >= 0.0) {
            return Err(ConfigError::Invalid("control.tolerance must be non-negative".into()));
        }
        if !(c.max_temp > 0.0) {
            return Err(ConfigError::Invalid("control.max_temp must be positive".into()));
        }
        if c.interval_ms == 0 {
            return Err(ConfigError::Invalid("control.interval_ms must be non-zero".into()));
        }
        if self.display.bar_width == 0 {
            return Err(ConfigError::Invalid("display.bar_width must be non-zero".into()));
        }
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::error!("Failed to parse config TOML: {}", e);
                Err(ConfigError::Toml(e))
            }
        },
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            Err(ConfigError::Io(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.sensor.samples, 3);
        assert_eq!(config.sensor.settle_ms, 100);
        assert_eq!(config.sensor.min_volts, 0.2);
        assert_eq!(config.sensor.max_volts, 3.0);
        assert_eq!(config.control.default_setpoint, 21.0);
        assert_eq!(config.control.tolerance, 2.0);
        assert_eq!(config.control.max_temp, 100.0);
        assert_eq!(config.control.interval(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_config_success() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("heatctl.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[control]\ndefault_setpoint = 35.5\ntolerance = 1.0").unwrap();
        file.flush().unwrap();
        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.control.default_setpoint, 35.5);
        assert_eq!(config.control.tolerance, 1.0);
        // Defaults for missing fields
        assert_eq!(config.control.max_temp, 100.0);
        assert_eq!(config.sensor.samples, 3);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent_file.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "not a valid toml").unwrap();
        file.flush().unwrap();
        let result = load_config(file_path.to_str().unwrap());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_validate_rejects_inverted_band() {
        let mut config = Config::default();
        config.sensor.min_volts = 3.0;
        config.sensor.max_volts = 0.2;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_non_finite_control_values() {
        for field in ["default_setpoint = nan", "default_setpoint = inf", "tolerance = inf", "max_temp = -inf"] {
            let config: Config = toml::from_str(&format!("[control]\n{}", field)).unwrap();
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "{field:?} should be rejected"
            );
        }

        let mut config = Config::default();
        config.control.default_setpoint = f64::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_non_finite_calibration() {
        let mut config = Config::default();
        config.sensor.degrees_per_volt = f64::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_samples() {
        let mut config = Config::default();
        config.sensor.samples = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_simulation_section_parsing() {
        let toml = r#"
        [simulation]
        ambient_temp = 15.0
        noise = 0.0
        seed = 7
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.simulation.ambient_temp, 15.0);
        assert_eq!(config.simulation.noise, 0.0);
        assert_eq!(config.simulation.seed, Some(7));
        assert_eq!(config.simulation.heating_rate, 0.5);
    }
}
