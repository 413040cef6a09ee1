//! Thermistor channels and the cached readings the FSM actions see.
//!
//! ADC conversion and the thermistor curve live behind
//! [`TemperaturePort`](crate::app::ports::TemperaturePort); this module
//! only names the channels and holds the last value read from each.

use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TempSensor {
    /// Thermistor in the outflow pipe.
    Outflow = 0,
    /// Thermistor measuring ambient air.
    Ambient = 1,
}

impl TempSensor {
    pub const COUNT: usize = 2;
    pub const ALL: [TempSensor; Self::COUNT] = [TempSensor::Outflow, TempSensor::Ambient];
}

/// Temperature in tenths of a degree Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TenthsDegC(pub i16);

impl fmt::Display for TenthsDegC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{}\u{00b0}C", sign, abs / 10, abs % 10)
    }
}

/// Last reading per sensor.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemperatureCache {
    readings: [TenthsDegC; TempSensor::COUNT],
}

impl TemperatureCache {
    pub fn store(&mut self, sensor: TempSensor, reading: TenthsDegC) {
        self.readings[sensor as usize] = reading;
    }

    pub fn get(&self, sensor: TempSensor) -> TenthsDegC {
        self.readings[sensor as usize]
    }
}
