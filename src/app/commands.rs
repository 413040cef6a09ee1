//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (serial
//! console, host bench, downlink) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Change the flow filter threshold and persist it.
    SetThreshold(u16),

    /// Run a pit-full level test now instead of waiting for the timer.
    TriggerLevelTest,
}
