//! Duration-based debounce counters, one per sensing channel.
//!
//! Raw pulse bursts have gaps shorter than a flush.  Each channel keeps
//! a "hold-open" grace countdown that every active tick reloads; only
//! when the countdown runs out is the signal considered stopped.  The
//! decision to report is made on accumulated *active time*, not pulse
//! count, so it does not depend on the tick rate.
//!
//! ```text
//!   activity ─┐  ┌┐ ┌──┐      ┌┐
//!             └──┘└─┘  └──────┘└──────────────────
//!   countdown  ██████████████████████████▇▆▅▄▃▂▁ 0 ──▶ stopped
//! ```

use serde::{Deserialize, Serialize};

use super::Channel;

/// Per-channel debounce parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceConfig {
    /// Grace period after the last active tick before the signal counts
    /// as stopped.
    pub hold_open_ms: u16,
    /// Accumulated active time that must be exceeded to trigger.
    pub detection_threshold_ms: u32,
    /// Subtracted from the accumulated time when reporting.
    pub report_trim_ms: u32,
}

impl DebounceConfig {
    pub const OUTFLOW: Self = Self {
        hold_open_ms: 10_000,
        detection_threshold_ms: 1_000,
        report_trim_ms: 0,
    };

    pub const LEVEL: Self = Self {
        hold_open_ms: 0,
        detection_threshold_ms: 500,
        report_trim_ms: 0,
    };
}

/// Debounce state for a single channel.
#[derive(Debug, Clone)]
pub struct DebounceCounter {
    config: DebounceConfig,
    /// Accumulated active time (ms).
    total_ms: u32,
    /// Signed so it can run past zero without wrapping.
    countdown_ms: i32,
}

impl DebounceCounter {
    pub const fn new(config: DebounceConfig) -> Self {
        Self {
            config,
            total_ms: 0,
            countdown_ms: 0,
        }
    }

    pub fn reset(&mut self) {
        self.total_ms = 0;
        self.countdown_ms = 0;
    }

    /// Account for one tick.  Returns `true` once the grace countdown has
    /// reached zero or below.
    pub fn update(&mut self, elapsed_ms: u16, activity: bool) -> bool {
        if activity {
            self.countdown_ms = i32::from(self.config.hold_open_ms);
            self.total_ms = self.total_ms.saturating_add(u32::from(elapsed_ms));
        } else {
            self.countdown_ms = self.countdown_ms.saturating_sub(i32::from(elapsed_ms));
        }
        self.countdown_ms <= 0
    }

    pub fn has_triggered(&self) -> bool {
        self.total_ms > self.config.detection_threshold_ms
    }

    pub fn total_duration_ms(&self) -> u32 {
        self.total_ms
    }

    /// Accumulated time less the configured trim, never below zero.
    pub fn reported_duration_ms(&self) -> u32 {
        self.total_ms.saturating_sub(self.config.report_trim_ms)
    }
}

/// The set of debounce counters, indexed by [`Channel`].
#[derive(Debug, Clone)]
pub struct DebounceBank {
    counters: [DebounceCounter; Channel::COUNT],
}

impl DebounceBank {
    pub fn new(outflow: DebounceConfig, level: DebounceConfig) -> Self {
        Self {
            counters: [DebounceCounter::new(outflow), DebounceCounter::new(level)],
        }
    }

    pub fn reset(&mut self, channel: Channel) {
        self.counters[channel as usize].reset();
    }

    pub fn update(&mut self, channel: Channel, elapsed_ms: u16, activity: bool) -> bool {
        self.counters[channel as usize].update(elapsed_ms, activity)
    }

    pub fn has_triggered(&self, channel: Channel) -> bool {
        self.counters[channel as usize].has_triggered()
    }

    pub fn total_duration(&self, channel: Channel) -> u32 {
        self.counters[channel as usize].total_duration_ms()
    }

    pub fn reported_duration(&self, channel: Channel) -> u32 {
        self.counters[channel as usize].reported_duration_ms()
    }
}

impl Default for DebounceBank {
    fn default() -> Self {
        Self::new(DebounceConfig::OUTFLOW, DebounceConfig::LEVEL)
    }
}
