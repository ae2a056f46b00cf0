// src/hardware/mod.rs - Sensor and heater hardware boundary
pub mod hardware_traits;
pub mod heater;
pub mod sensor;
pub mod simulated;
pub mod sysfs;

use thiserror::Error;

pub use hardware_traits::{AnalogInput, HeaterOutput};
pub use heater::HeaterActuator;
pub use sensor::{SensorCalibration, SensorError, SensorReader, TemperatureSample};

#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid raw code: {0:?}")]
    InvalidCode(String),
    #[error("Hardware unavailable: {0}")]
    Unavailable(String),
}
