// Trait-based interfaces for the sensor/actuator boundary.
//
// These are the only places the controller touches hardware. Implementations decide how a
// raw code is acquired (sysfs, simulator, test script) and how the element is switched.

use super::HardwareError;

/// A single-channel analog input returning raw converter codes.
pub trait AnalogInput {
    fn read_raw_code(&mut self) -> Result<u16, HardwareError>;
}

/// A binary output driving the heating element.
pub trait HeaterOutput {
    fn write(&mut self, energized: bool) -> Result<(), HardwareError>;
}

impl<T: AnalogInput + ?Sized> AnalogInput for Box<T> {
    fn read_raw_code(&mut self) -> Result<u16, HardwareError> {
        (**self).read_raw_code()
    }
}

impl<T: HeaterOutput + ?Sized> HeaterOutput for Box<T> {
    fn write(&mut self, energized: bool) -> Result<(), HardwareError> {
        (**self).write(energized)
    }
}
