//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! whatever logger the host installed (UART on the target, stderr on the
//! bench).  A telemetry adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::fsm::StateId;
use crate::fsm::states::SensorState;

/// Adapter that logs every [`AppEvent`] as a one-line record.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

fn name(id: StateId) -> &'static str {
    SensorState::try_from(id).map_or("?", SensorState::name)
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={}", name(*state));
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", name(*from), name(*to));
            }
            AppEvent::FlushDetected {
                duration_ms,
                outflow_temp,
            } => {
                info!("FLUSH | duration={}ms | outflow={}", duration_ms, outflow_temp);
            }
            AppEvent::PitFull => {
                warn!("LEVEL | pit full");
            }
            AppEvent::MessageSent(message) => {
                info!("UPLINK | {}", message.encode());
            }
            AppEvent::ThresholdChanged { old, new } => {
                info!("CONFIG | threshold {} -> {}", old, new);
            }
        }
    }
}
