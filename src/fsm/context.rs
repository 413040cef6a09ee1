//! Shared mutable context threaded through every FSM action.
//!
//! `SensorContext` is the single struct that actions read from and write
//! to.  It holds the latest sensor snapshot, the filters, the commands
//! actions leave for the main loop, and the outbox of uplink messages.
//! Nothing in here touches hardware; the application service applies the
//! commands through port traits after each dispatch.

use heapless::Vec;

use crate::app::events::AppEvent;
use crate::config::SystemConfig;
use crate::sensors::debounce::DebounceBank;
use crate::sensors::flow::FlowFilter;
use crate::sensors::temperature::{TempSensor, TemperatureCache};
use crate::uplink::UplinkMessage;

/// Messages one main-loop pass can queue.
pub const OUTBOX_CAP: usize = 4;
/// Application events one main-loop pass can queue.
pub const NOTICE_CAP: usize = 4;

// ---------------------------------------------------------------------------
// Sensor snapshot (written by the service before each Timer dispatch)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct SensorSnapshot {
    /// Outflow IR pulses counted since the last application tick.
    pub outflow_pulses: u16,
    /// Level IR pulses counted since the last application tick.
    pub level_pulses: u16,
    /// Latest reflectance ADC sample.
    pub reflectance: u16,
    /// Flow filter verdict for `reflectance`.
    pub flushing: bool,
    /// Level float switch: true = closed (pit full).
    pub level_switch_closed: bool,
    /// Length of the tick this snapshot covers (ms).
    pub elapsed_ms: u16,
}

// ---------------------------------------------------------------------------
// Commands (written by actions, applied by the service)
// ---------------------------------------------------------------------------

/// Application tick rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    SlowIdle,
    FastDetect,
    LevelTest,
}

impl Cadence {
    pub fn period_ms(self, config: &SystemConfig) -> u16 {
        match self {
            Self::SlowIdle => config.slow_idle_tick_ms,
            Self::FastDetect => config.fast_detect_tick_ms,
            Self::LevelTest => config.level_test_tick_ms,
        }
    }
}

/// Requests left by actions.  `None` means "no change".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Commands {
    pub cadence: Option<Cadence>,
    pub outflow_sense: Option<bool>,
    pub level_sense: Option<bool>,
    pub conversion: Option<TempSensor>,
}

impl Commands {
    /// Hand over the pending requests and clear them.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }
}

// ---------------------------------------------------------------------------
// SensorContext
// ---------------------------------------------------------------------------

pub struct SensorContext {
    pub config: SystemConfig,
    pub sensors: SensorSnapshot,
    pub debounce: DebounceBank,
    pub filter: FlowFilter,
    pub temperatures: TemperatureCache,
    pub commands: Commands,
    pub outbox: Vec<UplinkMessage, OUTBOX_CAP>,
    pub notices: Vec<AppEvent, NOTICE_CAP>,
}

impl SensorContext {
    pub fn new(config: SystemConfig, threshold: u16) -> Self {
        Self {
            debounce: DebounceBank::new(config.outflow, config.level),
            filter: FlowFilter::new(config.filter_policy, threshold),
            config,
            sensors: SensorSnapshot::default(),
            temperatures: TemperatureCache::default(),
            commands: Commands::default(),
            outbox: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Take a new snapshot and run the reflectance sample through the
    /// flow filter.
    pub fn sample(&mut self, mut snapshot: SensorSnapshot) {
        snapshot.flushing = self.filter.new_value(snapshot.reflectance);
        self.sensors = snapshot;
    }

    /// Queue an uplink message.  Returns `false` (and logs) if the outbox
    /// is full.
    pub fn queue(&mut self, message: UplinkMessage) -> bool {
        if self.outbox.push(message).is_err() {
            log::warn!("outbox full, dropping {:?}", message);
            return false;
        }
        true
    }

    /// Queue an application event for the sink.
    pub fn notify(&mut self, event: AppEvent) {
        if self.notices.push(event).is_err() {
            log::warn!("notice queue full, dropping event");
        }
    }
}
