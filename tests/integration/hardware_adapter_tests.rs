//! HardwareAdapter against fake embedded-hal pins.
//!
//! The ISR cells are process-wide statics, so everything touching them
//! lives in one test to keep parallel test threads from interfering.

use core::cell::Cell;
use core::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use latrinesensor::adapters::hardware::{self, HardwareAdapter};
use latrinesensor::app::ports::{ActuatorPort, SensorPort, TemperaturePort};
use latrinesensor::sensors::Channel;
use latrinesensor::sensors::temperature::{TempSensor, TenthsDegC};

/// Input pin whose level is shared with the test.
struct FakeInput(Rc<Cell<bool>>);

impl ErrorType for FakeInput {
    type Error = Infallible;
}

impl InputPin for FakeInput {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

/// Output pin that mirrors its level into a shared cell.
struct FakeOutput(Rc<Cell<bool>>);

impl ErrorType for FakeOutput {
    type Error = Infallible;
}

impl OutputPin for FakeOutput {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set(true);
        Ok(())
    }
}

/// Conversion that completes on the spot.
fn instant_conversion(sensor: TempSensor) {
    let reading = match sensor {
        TempSensor::Outflow => TenthsDegC(-35),
        TempSensor::Ambient => TenthsDegC(287),
    };
    hardware::on_conversion_done(sensor, reading);
}

#[test]
fn adapter_reads_isr_cells_and_drives_pins() {
    let switch_level = Rc::new(Cell::new(true));
    let outflow_on = Rc::new(Cell::new(false));
    let level_on = Rc::new(Cell::new(false));
    let mut hw = HardwareAdapter::new(
        FakeInput(switch_level.clone()),
        FakeOutput(outflow_on.clone()),
        FakeOutput(level_on.clone()),
        instant_conversion,
    );

    // Taking a counter zeroes it.
    for _ in 0..7 {
        hardware::on_outflow_pulse();
    }
    hardware::on_level_pulse();
    assert_eq!(hw.take_pulses(Channel::Outflow), 7);
    assert_eq!(hw.take_pulses(Channel::Outflow), 0);
    assert_eq!(hw.take_pulses(Channel::Level), 1);

    hardware::on_reflectance(2_345);
    assert_eq!(hw.read_reflectance(), 2_345);

    // Switch is active low.
    assert!(!hw.level_switch_closed());
    switch_level.set(false);
    assert!(hw.level_switch_closed());

    hw.enable_outflow_sense(true);
    hw.enable_level_sense(true);
    assert!(outflow_on.get());
    assert!(level_on.get());
    hw.enable_outflow_sense(false);
    assert!(!outflow_on.get());
    assert!(level_on.get());

    // Negative readings survive the u16 handoff.
    hw.start_conversion(TempSensor::Outflow);
    assert!(!hw.conversion_in_progress());
    assert_eq!(hw.last_reading(TempSensor::Outflow), TenthsDegC(-35));

    hw.start_conversion(TempSensor::Ambient);
    assert_eq!(hw.last_reading(TempSensor::Ambient), TenthsDegC(287));
    assert_eq!(hw.last_reading(TempSensor::Outflow), TenthsDegC(-35));
}
