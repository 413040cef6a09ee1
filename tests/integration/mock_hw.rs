//! Mock adapters for integration tests.
//!
//! Records every actuator and conversion call so tests can assert on the
//! full command history without touching real GPIO/ADC registers.

use latrinesensor::app::events::AppEvent;
use latrinesensor::app::ports::{
    ActuatorPort, EventSink, SensorPort, StorageError, StoragePort, TemperaturePort, UplinkPort,
};
use latrinesensor::sensors::Channel;
use latrinesensor::sensors::temperature::{TempSensor, TenthsDegC};
use std::collections::HashMap;

// ── Hardware call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HwCall {
    OutflowSense(bool),
    LevelSense(bool),
    StartConversion(TempSensor),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<HwCall>,
    /// Pulses waiting to be taken, per channel.
    pub pulses: [u16; Channel::COUNT],
    pub reflectance: u16,
    pub switch_closed: bool,
    pub temperatures: [TenthsDegC; TempSensor::COUNT],
    pub busy: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            pulses: [0; Channel::COUNT],
            reflectance: 3_000,
            switch_closed: false,
            temperatures: [TenthsDegC(215), TenthsDegC(240)],
            busy: false,
        }
    }

    pub fn add_pulses(&mut self, channel: Channel, n: u16) {
        self.pulses[channel as usize] += n;
    }

    pub fn outflow_sense_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                HwCall::OutflowSense(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn level_sense_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                HwCall::LevelSense(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn conversions(&self, sensor: TempSensor) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == HwCall::StartConversion(sensor))
            .count()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn take_pulses(&mut self, channel: Channel) -> u16 {
        core::mem::take(&mut self.pulses[channel as usize])
    }

    fn read_reflectance(&mut self) -> u16 {
        self.reflectance
    }

    fn level_switch_closed(&mut self) -> bool {
        self.switch_closed
    }
}

impl TemperaturePort for MockHardware {
    fn start_conversion(&mut self, sensor: TempSensor) {
        self.calls.push(HwCall::StartConversion(sensor));
    }

    fn conversion_in_progress(&self) -> bool {
        self.busy
    }

    fn last_reading(&self, sensor: TempSensor) -> TenthsDegC {
        self.temperatures[sensor as usize]
    }
}

impl ActuatorPort for MockHardware {
    fn enable_outflow_sense(&mut self, on: bool) {
        self.calls.push(HwCall::OutflowSense(on));
    }

    fn enable_level_sense(&mut self, on: bool) {
        self.calls.push(HwCall::LevelSense(on));
    }
}

// ── MockUplink ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockUplink {
    pub sent: Vec<String>,
}

impl UplinkPort for MockUplink {
    fn send(&mut self, message: &str) {
        self.sent.push(message.to_string());
    }
}

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    store: HashMap<String, Vec<u8>>,
    pub writes: usize,
}

impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let data = self
            .store
            .get(&format!("{}::{}", namespace, key))
            .ok_or(StorageError::NotFound)?;
        let len = data.len().min(buf.len());
        buf[..len].copy_from_slice(&data[..len]);
        Ok(len)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.writes += 1;
        self.store.insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }
}

/// Storage whose every write fails.
pub struct FullNvs;

impl StoragePort for FullNvs {
    fn read(&self, _namespace: &str, _key: &str, _buf: &mut [u8]) -> Result<usize, StorageError> {
        Err(StorageError::NotFound)
    }

    fn write(&mut self, _namespace: &str, _key: &str, _data: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::Full)
    }

    fn delete(&mut self, _namespace: &str, _key: &str) -> Result<(), StorageError> {
        Ok(())
    }

    fn exists(&self, _namespace: &str, _key: &str) -> bool {
        false
    }
}

// ── LogSink (captures events) ─────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}
