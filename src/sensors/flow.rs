//! Flush detection filter for the outflow reflectance reading.
//!
//! The reflectance ADC sits at a slowly drifting ambient level and drops
//! sharply while water runs past the sensor.  The filter keeps an *idle
//! baseline* that is only ever fed samples taken while not flushing, and
//! compares new samples against it.
//!
//! Two detection policies are available (see [`FilterPolicy`]):
//!
//! ```text
//!   Hysteresis                         DualAverage
//!   ──────────                         ───────────
//!   idle ──[s < A − T]──▶ flushing     flushing ⇔ short3 < A − T
//!   flushing ──[s > A − T/2]──▶ idle   on flush end: A := short3
//! ```
//!
//! Arithmetic is signed so a baseline below `T` can never underflow into
//! a false detection.

use serde::{Deserialize, Serialize};

use super::averager::Averager;

/// Samples in the idle baseline window.
pub const IDLE_WINDOW: usize = 10;
/// Samples in the short window.
pub const SHORT_WINDOW: usize = 3;

/// Which flush-detection policy the filter runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterPolicy {
    /// Short-window average against the idle baseline; the baseline is
    /// reseeded from the short average when a flush ends.
    DualAverage,
    /// Asymmetric enter/exit thresholds against the idle baseline.
    #[default]
    Hysteresis,
}

pub struct FlowFilter {
    policy: FilterPolicy,
    threshold: u16,
    idle: Averager<u16, IDLE_WINDOW>,
    short: Averager<u16, SHORT_WINDOW>,
    idle_average: u16,
    short_average: u16,
    flushing: bool,
}

impl FlowFilter {
    pub fn new(policy: FilterPolicy, threshold: u16) -> Self {
        Self {
            policy,
            threshold,
            idle: Averager::new(),
            short: Averager::new(),
            idle_average: 0,
            short_average: 0,
            flushing: false,
        }
    }

    /// Feed one sample.  Returns whether a flush is in progress.
    pub fn new_value(&mut self, reading: u16) -> bool {
        self.short.push(reading);
        self.short_average = self.short.current_average();

        match self.policy {
            FilterPolicy::DualAverage => self.dual_average(),
            FilterPolicy::Hysteresis => self.hysteresis(reading),
        }

        if !self.flushing {
            self.idle.push(reading);
            self.idle_average = self.idle.current_average();
        }

        self.flushing
    }

    fn dual_average(&mut self) {
        let limit = i32::from(self.idle_average) - i32::from(self.threshold);
        let flushing = i32::from(self.short_average) < limit;

        if self.flushing && !flushing {
            self.idle.reset(self.short_average);
            self.idle_average = self.short_average;
        }
        self.flushing = flushing;
    }

    fn hysteresis(&mut self, reading: u16) {
        let baseline = i32::from(self.idle_average);
        let threshold = i32::from(self.threshold);
        let sample = i32::from(reading);

        if self.flushing {
            if sample > baseline - threshold / 2 {
                self.flushing = false;
            }
        } else if sample < baseline - threshold {
            self.flushing = true;
        }
    }

    pub fn is_flushing(&self) -> bool {
        self.flushing
    }

    pub fn idle_average(&self) -> u16 {
        self.idle_average
    }

    pub fn short_average(&self) -> u16 {
        self.short_average
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: u16) {
        self.threshold = threshold;
    }
}
