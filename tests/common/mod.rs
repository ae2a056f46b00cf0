// Shared fakes for the integration tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use heatctl::control::{ControlLoop, ControlSettings};
use heatctl::hardware::{
    AnalogInput, HardwareError, HeaterActuator, HeaterOutput, SensorCalibration, SensorReader,
};
use heatctl::terminal::{Console, TermEvent, TerminalGeometry};

/// volts = code / 100, celsius = (volts - 0.5) * 10. In band from 0.05 V to 9 V,
/// unsafe below 0 °C and above 50 °C.
pub fn calibration() -> SensorCalibration {
    SensorCalibration {
        reference_volts: 10.24,
        levels: 1024,
        offset_volts: 0.5,
        degrees_per_volt: 10.0,
        min_volts: 0.05,
        max_volts: 9.0,
        max_temp: 50.0,
    }
}

pub fn settings() -> ControlSettings {
    ControlSettings {
        default_setpoint: 21.0,
        tolerance: 2.0,
        max_temp: 50.0,
    }
}

/// Raw codes served in order; `None` is a failed acquisition. Once the script runs out the
/// steady code is returned.
#[derive(Debug, Default)]
pub struct ScriptedInput {
    script: VecDeque<Option<u16>>,
    steady: Option<u16>,
    pub reads: usize,
}

impl ScriptedInput {
    pub fn steady(code: u16) -> Self {
        Self {
            steady: Some(code),
            ..Self::default()
        }
    }

    pub fn script(codes: impl IntoIterator<Item = Option<u16>>) -> Self {
        Self {
            script: codes.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn set_celsius(&mut self, celsius: f64) {
        self.script.clear();
        self.steady = Some(calibration().code_for(celsius));
    }

    pub fn set_code(&mut self, code: u16) {
        self.script.clear();
        self.steady = Some(code);
    }
}

impl AnalogInput for ScriptedInput {
    fn read_raw_code(&mut self) -> Result<u16, HardwareError> {
        self.reads += 1;
        match self.script.pop_front() {
            Some(Some(code)) => Ok(code),
            Some(None) => Err(HardwareError::Unavailable("scripted failure".into())),
            None => self
                .steady
                .ok_or_else(|| HardwareError::Unavailable("script exhausted".into())),
        }
    }
}

/// Heater output that records every command into a shared log.
#[derive(Debug, Clone, Default)]
pub struct RecordingOutput {
    pub log: Rc<RefCell<Vec<bool>>>,
}

impl RecordingOutput {
    pub fn last(&self) -> Option<bool> {
        self.log.borrow().last().copied()
    }
}

impl HeaterOutput for RecordingOutput {
    fn write(&mut self, energized: bool) -> Result<(), HardwareError> {
        self.log.borrow_mut().push(energized);
        Ok(())
    }
}

pub fn control_loop(input: ScriptedInput) -> (ControlLoop<ScriptedInput, RecordingOutput>, RecordingOutput) {
    let output = RecordingOutput::default();
    let reader = SensorReader::new(input, calibration(), 3, Duration::ZERO);
    let control = ControlLoop::new(reader, HeaterActuator::new(output.clone()), settings());
    (control, output)
}

/// Console driven from a script of events and prompt replies.
#[derive(Debug)]
pub struct ScriptedConsole {
    pub geometry: TerminalGeometry,
    pub events: VecDeque<TermEvent>,
    pub replies: VecDeque<Option<String>>,
    pub prompts: Vec<String>,
}

impl ScriptedConsole {
    pub fn new(geometry: TerminalGeometry) -> Self {
        Self {
            geometry,
            events: VecDeque::new(),
            replies: VecDeque::new(),
            prompts: Vec::new(),
        }
    }

    pub fn key(mut self, key: char) -> Self {
        self.events.push_back(TermEvent::Key(key));
        self
    }

    pub fn event(mut self, event: TermEvent) -> Self {
        self.events.push_back(event);
        self
    }

    pub fn reply(mut self, line: Option<&str>) -> Self {
        self.replies.push_back(line.map(str::to_string));
        self
    }
}

impl Console for ScriptedConsole {
    fn geometry(&mut self) -> io::Result<TerminalGeometry> {
        Ok(self.geometry)
    }

    fn poll_event(&mut self) -> io::Result<Option<TermEvent>> {
        Ok(self.events.pop_front())
    }

    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        self.prompts.push(message.to_string());
        Ok(self.replies.pop_front().flatten())
    }
}
