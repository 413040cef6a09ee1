//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Pins come in as `embedded-hal` 1.0 traits; interrupt-fed data comes
//! in through the static handoff cells below.  The board support code
//! wires its ISRs to the `on_*` functions and hands the pins over here.
//!
//! ```text
//!  IR outflow ISR ──on_outflow_pulse()──▶ OUTFLOW_PULSES ─┐
//!  IR level ISR   ──on_level_pulse()────▶ LEVEL_PULSES ───┤
//!  ADC ISR        ──on_reflectance()────▶ REFLECTANCE ────┼──▶ HardwareAdapter
//!  ADC ISR        ──on_conversion_done()▶ TEMPERATURES ───┘      (ports)
//! ```

use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::app::ports::{ActuatorPort, SensorPort, TemperaturePort};
use crate::handoff::{PulseCounter, SampleCell, TickFlag};
use crate::sensors::Channel;
use crate::sensors::temperature::{TempSensor, TenthsDegC};

// ── ISR-shared cells ──────────────────────────────────────────

pub static OUTFLOW_PULSES: PulseCounter = PulseCounter::new();
pub static LEVEL_PULSES: PulseCounter = PulseCounter::new();
pub static REFLECTANCE: SampleCell = SampleCell::new(0);
/// Raw `i16` tenths of a degree, stored as bits.
pub static TEMPERATURES: [SampleCell; TempSensor::COUNT] = [SampleCell::new(0), SampleCell::new(0)];
pub static CONVERSION_DONE: TickFlag = TickFlag::new();

pub fn on_outflow_pulse() {
    OUTFLOW_PULSES.record();
}

pub fn on_level_pulse() {
    LEVEL_PULSES.record();
}

pub fn on_reflectance(sample: u16) {
    REFLECTANCE.publish(sample);
}

pub fn on_conversion_done(sensor: TempSensor, reading: TenthsDegC) {
    TEMPERATURES[sensor as usize].publish(reading.0 as u16);
    CONVERSION_DONE.raise();
}

/// Starts an ADC conversion on the given thermistor channel.
pub type ConversionTrigger = fn(TempSensor);

// ── Adapter ───────────────────────────────────────────────────

/// Concrete adapter that combines all hardware behind port traits.
///
/// `S` is the float switch (active low: closed pulls to ground); `O` and
/// `L` power the outflow and level IR emitters.
pub struct HardwareAdapter<S, O, L> {
    level_switch: S,
    outflow_emitter: O,
    level_emitter: L,
    trigger: ConversionTrigger,
    converting: Option<TempSensor>,
}

impl<S, O, L> HardwareAdapter<S, O, L>
where
    S: InputPin,
    O: OutputPin,
    L: OutputPin,
{
    pub fn new(level_switch: S, outflow_emitter: O, level_emitter: L, trigger: ConversionTrigger) -> Self {
        Self {
            level_switch,
            outflow_emitter,
            level_emitter,
            trigger,
            converting: None,
        }
    }

    fn set_pin(pin: &mut impl OutputPin, on: bool, what: &str) {
        let result = if on { pin.set_high() } else { pin.set_low() };
        if result.is_err() {
            warn!("HardwareAdapter: failed to switch {} emitter", what);
        }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<S, O, L> SensorPort for HardwareAdapter<S, O, L>
where
    S: InputPin,
    O: OutputPin,
    L: OutputPin,
{
    fn take_pulses(&mut self, channel: Channel) -> u16 {
        match channel {
            Channel::Outflow => OUTFLOW_PULSES.take(),
            Channel::Level => LEVEL_PULSES.take(),
        }
    }

    fn read_reflectance(&mut self) -> u16 {
        REFLECTANCE.latest()
    }

    fn level_switch_closed(&mut self) -> bool {
        match self.level_switch.is_low() {
            Ok(closed) => closed,
            Err(_) => {
                warn!("HardwareAdapter: level switch read failed");
                false
            }
        }
    }
}

// ── TemperaturePort implementation ────────────────────────────

impl<S, O, L> TemperaturePort for HardwareAdapter<S, O, L>
where
    S: InputPin,
    O: OutputPin,
    L: OutputPin,
{
    fn start_conversion(&mut self, sensor: TempSensor) {
        if CONVERSION_DONE.test_and_clear() {
            self.converting = None;
        }
        if self.converting.is_some() {
            return;
        }
        self.converting = Some(sensor);
        (self.trigger)(sensor);
    }

    fn conversion_in_progress(&self) -> bool {
        self.converting.is_some() && !CONVERSION_DONE.is_raised()
    }

    fn last_reading(&self, sensor: TempSensor) -> TenthsDegC {
        TenthsDegC(TEMPERATURES[sensor as usize].latest() as i16)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<S, O, L> ActuatorPort for HardwareAdapter<S, O, L>
where
    S: InputPin,
    O: OutputPin,
    L: OutputPin,
{
    fn enable_outflow_sense(&mut self, on: bool) {
        Self::set_pin(&mut self.outflow_emitter, on, "outflow");
    }

    fn enable_level_sense(&mut self, on: bool) {
        Self::set_pin(&mut self.level_emitter, on, "level");
    }
}
