//! Validated temperature acquisition.
//!
//! A reading is built from several raw acquisitions. Each raw code goes through two fixed
//! linear transforms (code → volts → degrees). Codes whose voltage falls outside the valid
//! band are dropped and the next attempt is taken. A temperature outside the safe range
//! aborts the reading at once.

use std::time::Duration;

use thiserror::Error;

use super::hardware_traits::AnalogInput;
use crate::config::Config;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SensorError {
    #[error("voltage {volts:.2} V outside valid band")]
    VoltageOutOfBand { volts: f64 },
    #[error("temperature {celsius:.1}°C outside safe range")]
    UnsafeTemperature { celsius: f64 },
    #[error("no valid reading after {attempts} attempts")]
    NoValidReading { attempts: usize },
}

/// Outcome of one [`SensorReader::read`].
#[derive(Debug, Clone, PartialEq)]
pub enum TemperatureSample {
    Valid(f64),
    Invalid(SensorError),
}

impl TemperatureSample {
    pub fn celsius(&self) -> Option<f64> {
        match self {
            TemperatureSample::Valid(t) => Some(*t),
            TemperatureSample::Invalid(_) => None,
        }
    }

    pub fn fault(&self) -> Option<&SensorError> {
        match self {
            TemperatureSample::Valid(_) => None,
            TemperatureSample::Invalid(e) => Some(e),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, TemperatureSample::Valid(_))
    }
}

/// Fixed transforms from raw converter codes to degrees, plus the validity limits.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorCalibration {
    pub reference_volts: f64,
    pub levels: u32,
    pub offset_volts: f64,
    pub degrees_per_volt: f64,
    pub min_volts: f64,
    pub max_volts: f64,
    pub max_temp: f64,
}

impl Default for SensorCalibration {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SensorCalibration {
    pub fn from_config(config: &Config) -> Self {
        let s = &config.sensor;
        Self {
            reference_volts: s.adc_reference_volts,
            levels: s.adc_levels,
            offset_volts: s.offset_volts,
            degrees_per_volt: s.degrees_per_volt,
            min_volts: s.min_volts,
            max_volts: s.max_volts,
            max_temp: config.control.max_temp,
        }
    }

    pub fn code_to_volts(&self, code: u16) -> f64 {
        f64::from(code) * (self.reference_volts / f64::from(self.levels))
    }

    pub fn volts_to_celsius(&self, volts: f64) -> f64 {
        (volts - self.offset_volts) * self.degrees_per_volt
    }

    /// Convert and validate a single raw code.
    pub fn convert(&self, code: u16) -> Result<f64, SensorError> {
        let volts = self.code_to_volts(code);
        if volts < self.min_volts || volts > self.max_volts {
            return Err(SensorError::VoltageOutOfBand { volts });
        }
        let celsius = self.volts_to_celsius(volts);
        if !(0.0..=self.max_temp).contains(&celsius) {
            return Err(SensorError::UnsafeTemperature { celsius });
        }
        Ok(celsius)
    }

    /// Nearest raw code for a temperature, saturated to the converter range.
    pub fn code_for(&self, celsius: f64) -> u16 {
        let volts = celsius / self.degrees_per_volt + self.offset_volts;
        let code = (volts * f64::from(self.levels) / self.reference_volts).round();
        let top = f64::from(self.levels.saturating_sub(1).min(u32::from(u16::MAX)));
        code.clamp(0.0, top) as u16
    }
}

/// Multi-sample reader over an [`AnalogInput`].
#[derive(Debug)]
pub struct SensorReader<A> {
    input: A,
    calibration: SensorCalibration,
    samples: usize,
    settle: Duration,
}

impl<A: AnalogInput> SensorReader<A> {
    pub fn new(input: A, calibration: SensorCalibration, samples: usize, settle: Duration) -> Self {
        Self {
            input,
            calibration,
            samples: samples.max(1),
            settle,
        }
    }

    pub fn from_config(input: A, config: &Config) -> Self {
        Self::new(
            input,
            SensorCalibration::from_config(config),
            config.sensor.samples,
            config.sensor.settle_delay(),
        )
    }

    pub fn input(&self) -> &A {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut A {
        &mut self.input
    }

    pub fn calibration(&self) -> &SensorCalibration {
        &self.calibration
    }

    /// Take up to `samples` acquisitions and average the ones that validate.
    ///
    /// Returns `Invalid` as soon as one acquisition converts to an unsafe temperature; the
    /// caller must de-energize the heater without waiting for anything else.
    pub async fn read(&mut self) -> TemperatureSample {
        let mut total = 0.0;
        let mut accepted = 0usize;

        for attempt in 0..self.samples {
            if attempt > 0 && !self.settle.is_zero() {
                tokio::time::sleep(self.settle).await;
            }

            let code = match self.input.read_raw_code() {
                Ok(code) => code,
                Err(e) => {
                    tracing::warn!("Sensor acquisition {} failed: {}", attempt + 1, e);
                    continue;
                }
            };

            match self.calibration.convert(code) {
                Ok(celsius) => {
                    total += celsius;
                    accepted += 1;
                }
                Err(e @ SensorError::UnsafeTemperature { .. }) => {
                    tracing::error!("Sensor hard fault: {}, shutting heater off", e);
                    return TemperatureSample::Invalid(e);
                }
                Err(e) => {
                    tracing::warn!("Discarding sample {} (code {}): {}", attempt + 1, code, e);
                }
            }
        }

        if accepted == 0 {
            let e = SensorError::NoValidReading {
                attempts: self.samples,
            };
            tracing::error!("Sensor fault: {}", e);
            return TemperatureSample::Invalid(e);
        }

        TemperatureSample::Valid(total / accepted as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::HardwareError;
    use std::collections::VecDeque;

    struct Codes(VecDeque<u16>);

    impl AnalogInput for Codes {
        fn read_raw_code(&mut self) -> Result<u16, HardwareError> {
            self.0
                .pop_front()
                .ok_or_else(|| HardwareError::Unavailable("script exhausted".into()))
        }
    }

    fn reader(codes: &[u16]) -> SensorReader<Codes> {
        SensorReader::new(
            Codes(codes.iter().copied().collect()),
            SensorCalibration::default(),
            3,
            Duration::ZERO,
        )
    }

    #[test]
    fn test_linear_transforms() {
        let cal = SensorCalibration::default();
        assert!((cal.code_to_volts(1024) - 3.3).abs() < 1e-9);
        assert!((cal.volts_to_celsius(0.75) - 25.0).abs() < 1e-9);
        assert!((cal.volts_to_celsius(0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_code_for_round_trips_within_one_step() {
        let cal = SensorCalibration::default();
        let step = cal.reference_volts / f64::from(cal.levels) * cal.degrees_per_volt;
        for t in [0.5, 21.0, 37.2, 99.0] {
            let back = cal.convert(cal.code_for(t)).unwrap();
            assert!((back - t).abs() <= step / 2.0 + 1e-9, "{t} -> {back}");
        }
    }

    #[test]
    fn test_convert_rejects_out_of_band_voltage() {
        let cal = SensorCalibration::default();
        // 0 V is below the 0.2 V floor
        assert!(matches!(cal.convert(0), Err(SensorError::VoltageOutOfBand { .. })));
        // ~3.297 V is above the 3.0 V ceiling
        assert!(matches!(cal.convert(1023), Err(SensorError::VoltageOutOfBand { .. })));
    }

    #[test]
    fn test_convert_flags_unsafe_temperature() {
        let cal = SensorCalibration::default();
        // ~0.31 V is in band but converts to about -19°C
        assert!(matches!(cal.convert(96), Err(SensorError::UnsafeTemperature { .. })));
        // ~2.0 V converts to about 150°C
        assert!(matches!(cal.convert(620), Err(SensorError::UnsafeTemperature { .. })));
    }

    #[tokio::test]
    async fn test_read_averages_all_valid_samples() {
        let cal = SensorCalibration::default();
        let codes = [cal.code_for(20.0), cal.code_for(22.0), cal.code_for(24.0)];
        let expected = codes.iter().map(|c| cal.convert(*c).unwrap()).sum::<f64>() / 3.0;
        let sample = reader(&codes).read().await;
        assert_eq!(sample, TemperatureSample::Valid(expected));
    }

    #[tokio::test]
    async fn test_read_skips_out_of_band_samples() {
        let cal = SensorCalibration::default();
        let good = cal.code_for(30.0);
        let sample = reader(&[0, good, 1023]).read().await;
        assert_eq!(sample, TemperatureSample::Valid(cal.convert(good).unwrap()));
    }

    #[tokio::test]
    async fn test_read_without_valid_samples() {
        let sample = reader(&[0, 0, 1023]).read().await;
        assert_eq!(
            sample,
            TemperatureSample::Invalid(SensorError::NoValidReading { attempts: 3 })
        );
    }

    #[tokio::test]
    async fn test_read_stops_at_hard_fault() {
        let cal = SensorCalibration::default();
        let mut r = reader(&[cal.code_for(25.0), 620, cal.code_for(25.0)]);
        let sample = r.read().await;
        assert!(matches!(
            sample,
            TemperatureSample::Invalid(SensorError::UnsafeTemperature { .. })
        ));
        // The third code was never consumed
        assert_eq!(r.input().0.len(), 1);
    }

    #[tokio::test]
    async fn test_read_counts_hardware_errors_as_discarded() {
        let cal = SensorCalibration::default();
        let good = cal.code_for(40.0);
        // Only one code scripted: the other two attempts fail at the boundary
        let sample = reader(&[good]).read().await;
        assert_eq!(sample, TemperatureSample::Valid(cal.convert(good).unwrap()));
    }
}
