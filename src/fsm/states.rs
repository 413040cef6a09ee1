//! The latrine sensor's state machine: ids, static table, and actions.
//!
//! ```text
//!            ┌──[TEST_LEVEL]──▶ LEVEL_TEST ◀─┐
//!            │                   │  │  └─[TIMER]
//!            │        [PIT_NOT_FULL]  [PIT_FULL]
//!            │                   ▼  ▼
//!   ┌────── IDLE ◀──────────────┐  SENDING ──[SEND_COMPLETE]──▶ IDLE
//!   │        ▲                  │     ▲
//! [TIMER]    └──[NO_DETECT]─────┤     │
//!   │                           │  [DETECT]
//!   └──────────────────────▶ COUNTING ─┘
//!                             │  ▲
//!                             └──┘ [TIMER]
//! ```
//!
//! Actions never touch hardware.  They update the debounce bank and
//! leave [`Commands`](super::context::Commands) and outbox entries in the
//! [`SensorContext`] for the application service to apply.

use log::{debug, info, warn};

use super::context::{Cadence, SensorContext};
use super::{EventId, FsmError, FsmManager, InstanceHandle, State, StateId, Step, Transition};
use crate::app::events::AppEvent;
use crate::config::{DetectionSource, LevelTestMode};
use crate::sensors::Channel;
use crate::sensors::temperature::TempSensor;
use crate::uplink::UplinkMessage;

/// Instances the application registers.
pub const APP_INSTANCES: usize = 1;
/// Row budget handed to the manager; the table uses fewer.
pub const APP_TABLE_ENTRIES: usize = 16;

// ═══════════════════════════════════════════════════════════════════════════
//  Identifiers
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorState {
    Idle = 0,
    Counting = 1,
    Sending = 2,
    LevelTest = 3,
}

impl SensorState {
    pub const COUNT: u8 = 4;

    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Counting => "COUNTING",
            Self::Sending => "SENDING",
            Self::LevelTest => "LEVEL_TEST",
        }
    }
}

impl From<SensorState> for StateId {
    fn from(s: SensorState) -> Self {
        StateId(s as u8)
    }
}

impl TryFrom<StateId> for SensorState {
    type Error = FsmError;

    fn try_from(id: StateId) -> Result<Self, Self::Error> {
        match id.0 {
            0 => Ok(Self::Idle),
            1 => Ok(Self::Counting),
            2 => Ok(Self::Sending),
            3 => Ok(Self::LevelTest),
            _ => Err(FsmError::StateOutOfRange(id)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorEvent {
    Timer = 0,
    TestLevel = 1,
    /// Reserved; no row consumes it.
    Complete = 2,
    Detect = 3,
    NoDetect = 4,
    PitFull = 5,
    PitNotFull = 6,
    SendComplete = 7,
}

impl SensorEvent {
    pub const COUNT: u8 = 8;

    pub const fn name(self) -> &'static str {
        match self {
            Self::Timer => "TIMER",
            Self::TestLevel => "TEST_LEVEL",
            Self::Complete => "COMPLETE",
            Self::Detect => "DETECT",
            Self::NoDetect => "NO_DETECT",
            Self::PitFull => "PIT_FULL",
            Self::PitNotFull => "PIT_NOT_FULL",
            Self::SendComplete => "SEND_COMPLETE",
        }
    }
}

impl From<SensorEvent> for EventId {
    fn from(e: SensorEvent) -> Self {
        EventId(e as u8)
    }
}

impl TryFrom<EventId> for SensorEvent {
    type Error = FsmError;

    fn try_from(id: EventId) -> Result<Self, Self::Error> {
        match id.0 {
            0 => Ok(Self::Timer),
            1 => Ok(Self::TestLevel),
            2 => Ok(Self::Complete),
            3 => Ok(Self::Detect),
            4 => Ok(Self::NoDetect),
            5 => Ok(Self::PitFull),
            6 => Ok(Self::PitNotFull),
            7 => Ok(Self::SendComplete),
            _ => Err(FsmError::EventOutOfRange(id)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  States and table
// ═══════════════════════════════════════════════════════════════════════════

pub static IDLE: State<SensorContext> = State {
    id: StateId(SensorState::Idle as u8),
    name: SensorState::Idle.name(),
    on_enter: None,
    observer: Some(observe),
};

pub static COUNTING: State<SensorContext> = State {
    id: StateId(SensorState::Counting as u8),
    name: SensorState::Counting.name(),
    on_enter: None,
    observer: Some(observe),
};

pub static SENDING: State<SensorContext> = State {
    id: StateId(SensorState::Sending as u8),
    name: SensorState::Sending.name(),
    on_enter: None,
    observer: Some(observe),
};

pub static LEVEL_TEST: State<SensorContext> = State {
    id: StateId(SensorState::LevelTest as u8),
    name: SensorState::LevelTest.name(),
    on_enter: None,
    observer: Some(observe),
};

const fn ev(e: SensorEvent) -> EventId {
    EventId(e as u8)
}

pub static TABLE: [Transition<SensorContext>; 9] = [
    Transition { from: &IDLE, event: ev(SensorEvent::Timer), action: Some(start_counting), to: &COUNTING },
    Transition { from: &IDLE, event: ev(SensorEvent::TestLevel), action: Some(start_level_test), to: &LEVEL_TEST },
    Transition { from: &COUNTING, event: ev(SensorEvent::Timer), action: Some(test_count), to: &COUNTING },
    Transition { from: &COUNTING, event: ev(SensorEvent::NoDetect), action: None, to: &IDLE },
    Transition { from: &COUNTING, event: ev(SensorEvent::Detect), action: Some(send_flush), to: &SENDING },
    Transition { from: &LEVEL_TEST, event: ev(SensorEvent::Timer), action: Some(test_pit_full), to: &LEVEL_TEST },
    Transition { from: &LEVEL_TEST, event: ev(SensorEvent::PitFull), action: Some(send_pit_full), to: &SENDING },
    Transition { from: &LEVEL_TEST, event: ev(SensorEvent::PitNotFull), action: None, to: &IDLE },
    Transition { from: &SENDING, event: ev(SensorEvent::SendComplete), action: None, to: &IDLE },
];

/// Configure `manager`, register the sensor machine in IDLE and activate it.
pub fn setup_state_machine(manager: &mut FsmManager<SensorContext>) -> Result<InstanceHandle, FsmError> {
    manager.configure(APP_INSTANCES, APP_TABLE_ENTRIES)?;
    let handle = manager.register_instance(&IDLE, SensorEvent::COUNT, SensorState::COUNT, &TABLE)?;
    manager.set_active(handle, true)?;
    info!("Sensor FSM {} ready in {}", handle, IDLE.name);
    Ok(handle)
}

// ═══════════════════════════════════════════════════════════════════════════
//  Observer
// ═══════════════════════════════════════════════════════════════════════════

fn state_name(id: StateId) -> &'static str {
    SensorState::try_from(id).map_or("?", SensorState::name)
}

fn event_name(id: EventId) -> &'static str {
    SensorEvent::try_from(id).map_or("?", SensorEvent::name)
}

fn observe(step: Step) {
    debug!(
        "entering {} from {} on {}",
        state_name(step.to),
        state_name(step.from),
        event_name(step.event)
    );
}

// ═══════════════════════════════════════════════════════════════════════════
//  Actions
// ═══════════════════════════════════════════════════════════════════════════

/// Raise a follow-up event from inside an action.
fn raise(m: &mut FsmManager<SensorContext>, ctx: &mut SensorContext, step: Step, event: SensorEvent) {
    if let Err(e) = m.dispatch(step.instance, event.into(), ctx) {
        warn!("FSM {}: raising {} failed: {}", step.instance, event.name(), e);
    }
}

// ── Outflow ───────────────────────────────────────────────────

fn start_counting(_m: &mut FsmManager<SensorContext>, ctx: &mut SensorContext, _step: Step) {
    ctx.debounce.reset(Channel::Outflow);
    ctx.commands.outflow_sense = Some(true);
    ctx.commands.cadence = Some(Cadence::FastDetect);
    ctx.commands.conversion = Some(TempSensor::Outflow);
}

fn test_count(m: &mut FsmManager<SensorContext>, ctx: &mut SensorContext, step: Step) {
    let activity = match ctx.config.detection_source {
        DetectionSource::IrPulses => ctx.sensors.outflow_pulses > 0,
        DetectionSource::Reflectance => ctx.sensors.flushing,
    };
    let stopped = ctx.debounce.update(Channel::Outflow, ctx.sensors.elapsed_ms, activity);
    if !stopped {
        ctx.commands.conversion = Some(TempSensor::Outflow);
        return;
    }

    ctx.commands.outflow_sense = Some(false);
    ctx.commands.cadence = Some(Cadence::SlowIdle);
    let event = if ctx.debounce.has_triggered(Channel::Outflow) {
        SensorEvent::Detect
    } else {
        SensorEvent::NoDetect
    };
    debug!(
        "outflow stopped after {} ms, raising {}",
        ctx.debounce.total_duration(Channel::Outflow),
        event.name()
    );
    raise(m, ctx, step, event);
}

fn send_flush(_m: &mut FsmManager<SensorContext>, ctx: &mut SensorContext, _step: Step) {
    let duration_ms = ctx.debounce.reported_duration(Channel::Outflow);
    let outflow_temp = ctx.temperatures.get(TempSensor::Outflow);
    info!("Flush detected: {} ms at {}", duration_ms, outflow_temp);
    ctx.queue(UplinkMessage::Flush { duration_ms });
    ctx.notify(AppEvent::FlushDetected {
        duration_ms,
        outflow_temp,
    });
}

// ── Pit level ─────────────────────────────────────────────────

fn start_level_test(m: &mut FsmManager<SensorContext>, ctx: &mut SensorContext, step: Step) {
    match ctx.config.level_test_mode {
        LevelTestMode::Ir => {
            ctx.debounce.reset(Channel::Level);
            ctx.commands.level_sense = Some(true);
            ctx.commands.cadence = Some(Cadence::LevelTest);
        }
        LevelTestMode::Switch => {
            let event = if ctx.sensors.level_switch_closed {
                SensorEvent::PitFull
            } else {
                SensorEvent::PitNotFull
            };
            raise(m, ctx, step, event);
        }
    }
}

fn test_pit_full(m: &mut FsmManager<SensorContext>, ctx: &mut SensorContext, step: Step) {
    ctx.debounce
        .update(Channel::Level, ctx.sensors.elapsed_ms, ctx.sensors.level_pulses > 0);
    ctx.commands.level_sense = Some(false);
    ctx.commands.cadence = Some(Cadence::SlowIdle);
    let event = if ctx.debounce.has_triggered(Channel::Level) {
        SensorEvent::PitFull
    } else {
        SensorEvent::PitNotFull
    };
    raise(m, ctx, step, event);
}

fn send_pit_full(_m: &mut FsmManager<SensorContext>, ctx: &mut SensorContext, _step: Step) {
    warn!("Pit full");
    ctx.queue(UplinkMessage::PitFull);
    ctx.notify(AppEvent::PitFull);
}
