// src/hardware/sysfs.rs - Linux sysfs-backed ADC channel and GPIO line
use std::fs;
use std::path::{Path, PathBuf};

use super::HardwareError;
use super::hardware_traits::{AnalogInput, HeaterOutput};

/// Raw ADC channel exposed as a text attribute, e.g. an IIO `in_voltageN_raw` node.
#[derive(Debug, Clone)]
pub struct SysfsAdc {
    path: PathBuf,
}

impl SysfsAdc {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl AnalogInput for SysfsAdc {
    fn read_raw_code(&mut self) -> Result<u16, HardwareError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| HardwareError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        let trimmed = contents.trim();
        trimmed
            .parse::<u16>()
            .map_err(|_| HardwareError::InvalidCode(trimmed.to_string()))
    }
}

/// Output line exposed through a GPIO `value` attribute.
#[derive(Debug, Clone)]
pub struct SysfsGpio {
    path: PathBuf,
}

impl SysfsGpio {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl HeaterOutput for SysfsGpio {
    fn write(&mut self, energized: bool) -> Result<(), HardwareError> {
        let value: &[u8] = if energized { b"1\n" } else { b"0\n" };
        fs::write(&self.path, value).map_err(|source| HardwareError::Io {
            path: self.path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_adc_parses_trimmed_code() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in_voltage0_raw");
        fs::write(&path, "512\n").unwrap();
        let mut adc = SysfsAdc::new(&path);
        assert_eq!(adc.read_raw_code().unwrap(), 512);
    }

    #[test]
    fn test_adc_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in_voltage0_raw");
        fs::write(&path, "n/a").unwrap();
        let mut adc = SysfsAdc::new(&path);
        assert!(matches!(adc.read_raw_code(), Err(HardwareError::InvalidCode(_))));
    }

    #[test]
    fn test_adc_missing_node() {
        let mut adc = SysfsAdc::new("/nonexistent/in_voltage0_raw");
        assert!(matches!(adc.read_raw_code(), Err(HardwareError::Io { .. })));
    }

    #[test]
    fn test_gpio_writes_value() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("value");
        let mut gpio = SysfsGpio::new(&path);
        gpio.write(true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "1\n");
        gpio.write(false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "0\n");
    }
}
