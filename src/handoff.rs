//! Interrupt-to-main-loop handoff cells.
//!
//! Interrupt handlers only ever bump a counter, raise a flag or publish
//! a sample.  Everything else happens on the main loop.
//!
//! ```text
//! ┌──────────────┐  record()   ┌──────────────┐  take()
//! │ IR pulse ISR │────────────▶│ PulseCounter │───────────▶ snapshot
//! └──────────────┘             └──────────────┘
//! ┌──────────────┐  raise()    ┌──────────────┐  test_and_clear()
//! │ Conversion   │────────────▶│ TickFlag     │───────────▶ conversion_in_progress
//! │ done ISR     │  publish()  ├──────────────┤  latest()
//! │              │────────────▶│ SampleCell   │───────────▶ temperature cache
//! └──────────────┘             └──────────────┘
//! ┌──────────────┐  publish()  ┌──────────────┐  latest()
//! │ ADC ISR      │────────────▶│ SampleCell   │───────────▶ flow filter
//! └──────────────┘             └──────────────┘
//! ```
//!
//! All three are `const`-constructible so they can live in `static`s
//! shared with ISR callbacks.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use critical_section::Mutex;

/// Pulse counter incremented from an ISR and drained by the main loop.
///
/// The read-and-zero runs inside a critical section so no pulse can land
/// between the read and the reset.
pub struct PulseCounter {
    count: Mutex<Cell<u16>>,
}

impl PulseCounter {
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(Cell::new(0)),
        }
    }

    /// ISR side.  Saturates at `u16::MAX`.
    pub fn record(&self) {
        critical_section::with(|cs| {
            let cell = self.count.borrow(cs);
            cell.set(cell.get().saturating_add(1));
        });
    }

    /// Main-loop side.  Returns the pulses since the last call.
    pub fn take(&self) -> u16 {
        critical_section::with(|cs| self.count.borrow(cs).replace(0))
    }
}

impl Default for PulseCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// One-bit "something happened" flag.
pub struct TickFlag(AtomicBool);

impl TickFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// `true` if the flag was raised since the last call.
    pub fn test_and_clear(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for TickFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Latest ADC sample; newer samples overwrite older ones.
pub struct SampleCell(AtomicU16);

impl SampleCell {
    pub const fn new(initial: u16) -> Self {
        Self(AtomicU16::new(initial))
    }

    pub fn publish(&self, sample: u16) {
        self.0.store(sample, Ordering::Release);
    }

    pub fn latest(&self) -> u16 {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for SampleCell {
    fn default() -> Self {
        Self::new(0)
    }
}
