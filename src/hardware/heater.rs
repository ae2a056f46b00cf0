//! Heating element driver.

use super::hardware_traits::HeaterOutput;

/// Binary actuator over a [`HeaterOutput`].
///
/// Every command is written through, even when it repeats the previous one, so a glitched
/// output is re-asserted on the next tick. Dropping the actuator commands the element off.
#[derive(Debug)]
pub struct HeaterActuator<H: HeaterOutput> {
    output: H,
    energized: bool,
}

impl<H: HeaterOutput> HeaterActuator<H> {
    pub fn new(output: H) -> Self {
        Self {
            output,
            energized: false,
        }
    }

    pub fn output(&self) -> &H {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut H {
        &mut self.output
    }

    /// Last state successfully commanded.
    pub fn is_energized(&self) -> bool {
        self.energized
    }

    pub fn set(&mut self, energized: bool) {
        match self.output.write(energized) {
            Ok(()) => {
                if energized != self.energized {
                    tracing::info!("Heater {}", if energized { "ON" } else { "OFF" });
                }
                self.energized = energized;
            }
            Err(e) => {
                tracing::error!("Failed to switch heater {}: {}", if energized { "on" } else { "off" }, e);
                // An element we could not switch on is assumed off; one we could not switch off
                // keeps its last known state.
                if energized {
                    self.energized = false;
                }
            }
        }
    }

    pub fn off(&mut self) {
        self.set(false);
    }
}

impl<H: HeaterOutput> Drop for HeaterActuator<H> {
    fn drop(&mut self) {
        if let Err(e) = self.output.write(false) {
            tracing::error!("Failed to switch heater off on drop: {}", e);
        }
    }
}
