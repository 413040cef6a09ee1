//! Table-driven finite state machine engine.
//!
//! Classic embedded FSM pattern ported to Rust:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Transition table (const, one per FSM instance)              │
//! │  ┌───────────┬──────────────┬──────────────────┬───────────┐ │
//! │  │ from      │ event        │ action           │ to        │ │
//! │  ├───────────┼──────────────┼──────────────────┼───────────┤ │
//! │  │ &IDLE     │ TIMER        │ Some(fn)         │ &COUNTING │ │
//! │  │ &COUNTING │ NO_DETECT    │ None             │ &IDLE     │ │
//! │  │ …         │ …            │ …                │ …         │ │
//! │  └───────────┴──────────────┴──────────────────┴───────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//!            │ validated + flattened at registration
//!            ▼
//!   [state][event] → Option<row>   (O(1) dispatch)
//! ```
//!
//! The [`manager::FsmManager`] owns every registered instance.  Events go
//! in through [`manager::FsmManager::dispatch`]; a (state, event) pair
//! with no row is ignored.  Actions are plain `fn` pointers that get the
//! manager back, so they can raise follow-up events synchronously.
//!
//! [`context`] and [`states`] hold the latrine sensor's own machine.

pub mod context;
pub mod manager;
pub mod states;

use core::fmt;

pub use manager::FsmManager;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Opaque state identifier, dense from zero within one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u8);

/// Opaque event identifier, dense from zero within one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u8);

/// Slot index of a registered instance.  Stable for the instance's life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(u8);

impl InstanceHandle {
    pub(crate) const fn new(slot: u8) -> Self {
        Self(slot)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Callback signatures
// ---------------------------------------------------------------------------

/// What every callback learns about the transition being taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub instance: InstanceHandle,
    pub from: StateId,
    pub to: StateId,
    pub event: EventId,
}

/// Transition actions and state entry actions.
///
/// The manager is handed back so the callback may dispatch further
/// events; `C` is the application's context.
pub type ActionFn<C> = fn(&mut FsmManager<C>, &mut C, Step);

/// Diagnostic hook run whenever a state becomes current.
pub type ObserverFn = fn(Step);

// ---------------------------------------------------------------------------
// Table rows
// ---------------------------------------------------------------------------

/// Static descriptor for a single state.
pub struct State<C: 'static> {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<ActionFn<C>>,
    pub observer: Option<ObserverFn>,
}

/// One row of a transition table.
pub struct Transition<C: 'static> {
    pub from: &'static State<C>,
    pub event: EventId,
    pub action: Option<ActionFn<C>>,
    pub to: &'static State<C>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Configuration and handle errors.  Ignored events are not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmError {
    /// `register_instance` before `configure`.
    NotConfigured,
    /// `configure` called a second time.
    AlreadyConfigured,
    /// Requested capacity exceeds what the manager can hold.
    CapacityExceeded,
    /// Every configured instance slot is in use.
    InstancesExhausted,
    /// Table has more rows than the configured maximum.
    TableTooLarge,
    /// `max_states * max_events` does not fit the lookup grid.
    GridTooLarge,
    /// A state id at or above the declared `max_states`.
    StateOutOfRange(StateId),
    /// An event id at or above the declared `max_events`.
    EventOutOfRange(EventId),
    /// Two rows for the same (state, event) pair.
    DuplicateTransition { state: StateId, event: EventId },
    /// Handle does not name a registered instance.
    InvalidHandle,
    /// Actions raised events recursively past the nesting limit.
    DispatchTooDeep,
    /// `teardown` called from inside an action.
    DispatchInProgress,
}

impl fmt::Display for FsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => write!(f, "manager not configured"),
            Self::AlreadyConfigured => write!(f, "manager already configured"),
            Self::CapacityExceeded => write!(f, "requested capacity exceeds pool"),
            Self::InstancesExhausted => write!(f, "no free instance slots"),
            Self::TableTooLarge => write!(f, "transition table too large"),
            Self::GridTooLarge => write!(f, "state x event grid too large"),
            Self::StateOutOfRange(s) => write!(f, "state {} out of range", s.0),
            Self::EventOutOfRange(e) => write!(f, "event {} out of range", e.0),
            Self::DuplicateTransition { state, event } => {
                write!(f, "duplicate transition for state {} event {}", state.0, event.0)
            }
            Self::InvalidHandle => write!(f, "invalid instance handle"),
            Self::DispatchTooDeep => write!(f, "nested dispatch too deep"),
            Self::DispatchInProgress => write!(f, "dispatch in progress"),
        }
    }
}
