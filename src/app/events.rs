//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log, telemetry, test capture).

use crate::fsm::StateId;
use crate::sensors::temperature::TenthsDegC;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The FSM ended a main-loop pass in a different state.
    StateChanged { from: StateId, to: StateId },

    /// A flush passed the detection threshold.
    FlushDetected { duration_ms: u32, outflow_temp: TenthsDegC },

    /// The level test found the pit full.
    PitFull,

    /// An uplink message went out.
    MessageSent(crate::uplink::UplinkMessage),

    /// The flush detection threshold was changed and persisted.
    ThresholdChanged { old: u16, new: u16 },
}
