//! Simulated thermal plant.
//!
//! A lumped model: the element adds a fixed rate of heat while energized and the body loses
//! heat toward ambient in proportion to the difference. The probe reports the plant
//! temperature with uniform noise, quantized back into raw converter codes so the real
//! [`SensorReader`](super::SensorReader) path is exercised end to end.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::HardwareError;
use super::hardware_traits::{AnalogInput, HeaterOutput};
use super::sensor::SensorCalibration;
use crate::config::SimulationConfig;

#[derive(Debug)]
pub struct SimulatedPlant {
    temperature: f64,
    ambient: f64,
    heating_rate: f64,
    loss_coefficient: f64,
    noise: f64,
    energized: bool,
    rng: StdRng,
}

impl SimulatedPlant {
    pub fn new(config: &SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            temperature: config.initial_temp,
            ambient: config.ambient_temp,
            heating_rate: config.heating_rate,
            loss_coefficient: config.loss_coefficient,
            noise: config.noise,
            energized: false,
            rng,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn set_temperature(&mut self, celsius: f64) {
        self.temperature = celsius;
    }

    pub fn is_energized(&self) -> bool {
        self.energized
    }

    /// Integrate the model over `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        if dt <= 0.0 {
            return;
        }
        let gain = if self.energized { self.heating_rate * dt } else { 0.0 };
        let loss = self.loss_coefficient * (self.temperature - self.ambient) * dt;
        self.temperature += gain - loss;
    }

    /// Plant temperature as the probe would see it.
    pub fn measure(&mut self) -> f64 {
        if self.noise > 0.0 {
            self.temperature + self.noise * (self.rng.random::<f64>() - 0.5)
        } else {
            self.temperature
        }
    }

    /// Split the plant into an input/output pair sharing the same model.
    pub fn into_handles(self, calibration: SensorCalibration) -> (SimulatedProbe, SimulatedElement) {
        let plant = Arc::new(Mutex::new(self));
        (
            SimulatedProbe {
                plant: plant.clone(),
                calibration,
                last_read: None,
            },
            SimulatedElement { plant },
        )
    }
}

/// Analog side of the simulated plant. Time advances by wall-clock between reads.
#[derive(Debug, Clone)]
pub struct SimulatedProbe {
    plant: Arc<Mutex<SimulatedPlant>>,
    calibration: SensorCalibration,
    last_read: Option<Instant>,
}

impl SimulatedProbe {
    pub fn plant(&self) -> Arc<Mutex<SimulatedPlant>> {
        self.plant.clone()
    }
}

impl AnalogInput for SimulatedProbe {
    fn read_raw_code(&mut self) -> Result<u16, HardwareError> {
        let now = Instant::now();
        let mut plant = self
            .plant
            .lock()
            .map_err(|_| HardwareError::Unavailable("simulated plant poisoned".into()))?;
        if let Some(last) = self.last_read {
            plant.advance(now.duration_since(last).as_secs_f64());
        }
        self.last_read = Some(now);
        let measured = plant.measure();
        Ok(self.calibration.code_for(measured))
    }
}

/// Output side of the simulated plant.
#[derive(Debug, Clone)]
pub struct SimulatedElement {
    plant: Arc<Mutex<SimulatedPlant>>,
}

impl HeaterOutput for SimulatedElement {
    fn write(&mut self, energized: bool) -> Result<(), HardwareError> {
        let mut plant = self
            .plant
            .lock()
            .map_err(|_| HardwareError::Unavailable("simulated plant poisoned".into()))?;
        plant.energized = energized;
        Ok(())
    }
}
