//! System configuration parameters
//!
//! All tunable parameters for the latrine sensor.  Values can be
//! overridden via NV storage ([`ConfigPort`](crate::app::ports::ConfigPort))
//! or, on the host bench, from a JSON file.  The flush threshold is not
//! here: it has its own store (see [`crate::threshold`]).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::sensors::debounce::DebounceConfig;
use crate::sensors::flow::FilterPolicy;

/// Where outflow "activity" comes from during a counting cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetectionSource {
    /// Any IR beam-break pulse in the tick counts as activity.
    #[default]
    IrPulses,
    /// The reflectance flow filter reporting a flush counts as activity.
    Reflectance,
}

/// How the pit-full test is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LevelTestMode {
    /// Pulse the level IR beam for one level-test tick and debounce it.
    Ir,
    /// Read the float switch once.
    #[default]
    Switch,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Tick cadences ---
    /// Application tick while idle (milliseconds)
    pub slow_idle_tick_ms: u16,
    /// Application tick while counting outflow (milliseconds)
    pub fast_detect_tick_ms: u16,
    /// Application tick during an IR level test (milliseconds)
    pub level_test_tick_ms: u16,
    /// Ambient temperature conversion interval (milliseconds)
    pub ambient_adc_tick_ms: u32,
    /// Periodic pit-full test interval (milliseconds, 0 = manual only)
    pub level_test_interval_ms: u32,

    // --- Detection ---
    pub detection_source: DetectionSource,
    pub filter_policy: FilterPolicy,
    pub outflow: DebounceConfig,
    pub level: DebounceConfig,
    pub level_test_mode: LevelTestMode,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Cadences
            slow_idle_tick_ms: 2_500,
            fast_detect_tick_ms: 100,
            level_test_tick_ms: 1_000,
            ambient_adc_tick_ms: 30_000,
            level_test_interval_ms: 3_600_000, // hourly

            // Detection
            detection_source: DetectionSource::IrPulses,
            filter_policy: FilterPolicy::Hysteresis,
            outflow: DebounceConfig::OUTFLOW,
            level: DebounceConfig::LEVEL,
            level_test_mode: LevelTestMode::Switch,
        }
    }
}

impl SystemConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fast_detect_tick_ms == 0 || self.slow_idle_tick_ms == 0 || self.level_test_tick_ms == 0 {
            return Err(ConfigError::ValidationFailed("tick periods must be non-zero"));
        }
        if self.fast_detect_tick_ms > self.slow_idle_tick_ms {
            return Err(ConfigError::ValidationFailed(
                "fast_detect_tick_ms must not exceed slow_idle_tick_ms",
            ));
        }
        if self.ambient_adc_tick_ms < u32::from(self.slow_idle_tick_ms) {
            return Err(ConfigError::ValidationFailed(
                "ambient_adc_tick_ms must be at least slow_idle_tick_ms",
            ));
        }
        if self.outflow.hold_open_ms < self.fast_detect_tick_ms {
            return Err(ConfigError::ValidationFailed(
                "outflow hold_open_ms must cover at least one fast tick",
            ));
        }
        if self.outflow.detection_threshold_ms == 0 || self.level.detection_threshold_ms == 0 {
            return Err(ConfigError::ValidationFailed("detection thresholds must be non-zero"));
        }
        Ok(())
    }
}
