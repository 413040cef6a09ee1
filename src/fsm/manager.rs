//! Instance pool and event dispatch.
//!
//! One [`FsmManager`] exists per process (or per test).  It is configured
//! once with its capacity, then instances are registered against it.  At
//! registration each transition table is checked against the declared
//! bounds and flattened into a dense `[state][event]` grid of row
//! indices, so dispatch never scans the table.

use heapless::Vec;
use log::{debug, trace, warn};

use super::{EventId, FsmError, InstanceHandle, State, StateId, Step, Transition};

/// Instance slots the manager can ever hold.
pub const MAX_INSTANCES: usize = 4;
/// Cells in one instance's lookup grid (`max_states * max_events`).
pub const GRID_CAP: usize = 256;
/// Rows a single table may carry (row indices are stored as `u8`).
pub const MAX_TABLE_ROWS: usize = u8::MAX as usize;
/// How deep actions may nest `dispatch` calls.
pub const MAX_DISPATCH_DEPTH: u8 = 8;

#[derive(Debug, Clone, Copy)]
struct Capacity {
    max_instances: usize,
    max_table_entries: usize,
}

struct Instance<C: 'static> {
    table: &'static [Transition<C>],
    /// Row index per `state * max_events + event`.
    grid: Vec<Option<u8>, GRID_CAP>,
    max_events: u8,
    current: &'static State<C>,
    active: bool,
}

impl<C: 'static> Instance<C> {
    fn lookup(&self, event: EventId) -> Option<&'static Transition<C>> {
        if event.0 >= self.max_events {
            return None;
        }
        let cell = usize::from(self.current.id.0) * usize::from(self.max_events) + usize::from(event.0);
        let row = (*self.grid.get(cell)?)?;
        let table: &'static [Transition<C>] = self.table;
        table.get(usize::from(row))
    }
}

/// Owns every FSM instance and routes events to them.
pub struct FsmManager<C: 'static> {
    capacity: Option<Capacity>,
    instances: Vec<Instance<C>, MAX_INSTANCES>,
    depth: u8,
}

impl<C: 'static> FsmManager<C> {
    /// An unconfigured manager.  Call [`configure`](Self::configure) next.
    pub const fn new() -> Self {
        Self {
            capacity: None,
            instances: Vec::new(),
            depth: 0,
        }
    }

    /// Reserve capacity.  Allowed once per manager lifetime (or once after
    /// each [`teardown`](Self::teardown)).
    pub fn configure(&mut self, max_instances: usize, max_table_entries: usize) -> Result<(), FsmError> {
        if self.capacity.is_some() {
            warn!("FSM manager: configure called twice");
            return Err(FsmError::AlreadyConfigured);
        }
        if max_instances == 0
            || max_instances > MAX_INSTANCES
            || max_table_entries == 0
            || max_table_entries > MAX_TABLE_ROWS
        {
            warn!(
                "FSM manager: capacity {}x{} outside pool limits {}x{}",
                max_instances, max_table_entries, MAX_INSTANCES, MAX_TABLE_ROWS
            );
            return Err(FsmError::CapacityExceeded);
        }
        self.capacity = Some(Capacity {
            max_instances,
            max_table_entries,
        });
        debug!(
            "FSM manager: configured for {} instances, {} rows per table",
            max_instances, max_table_entries
        );
        Ok(())
    }

    /// Validate `table` and add a new (inactive) instance in `initial`.
    pub fn register_instance(
        &mut self,
        initial: &'static State<C>,
        max_events: u8,
        max_states: u8,
        table: &'static [Transition<C>],
    ) -> Result<InstanceHandle, FsmError> {
        let capacity = self.capacity.ok_or(FsmError::NotConfigured)?;
        if self.instances.len() >= capacity.max_instances {
            return Err(FsmError::InstancesExhausted);
        }
        if table.len() > capacity.max_table_entries {
            return Err(FsmError::TableTooLarge);
        }
        if initial.id.0 >= max_states {
            return Err(FsmError::StateOutOfRange(initial.id));
        }

        let cells = usize::from(max_states) * usize::from(max_events);
        let mut grid: Vec<Option<u8>, GRID_CAP> = Vec::new();
        grid.resize(cells, None).map_err(|()| FsmError::GridTooLarge)?;

        for (row, t) in table.iter().enumerate() {
            for state in [t.from.id, t.to.id] {
                if state.0 >= max_states {
                    return Err(FsmError::StateOutOfRange(state));
                }
            }
            if t.event.0 >= max_events {
                return Err(FsmError::EventOutOfRange(t.event));
            }
            let cell = usize::from(t.from.id.0) * usize::from(max_events) + usize::from(t.event.0);
            if grid[cell].is_some() {
                return Err(FsmError::DuplicateTransition {
                    state: t.from.id,
                    event: t.event,
                });
            }
            grid[cell] = Some(row as u8);
        }

        let handle = InstanceHandle::new(self.instances.len() as u8);
        self.instances
            .push(Instance {
                table,
                grid,
                max_events,
                current: initial,
                active: false,
            })
            .map_err(|_| FsmError::InstancesExhausted)?;

        debug!(
            "FSM {}: registered, {} rows, {} states x {} events, starting in {}",
            handle,
            table.len(),
            max_states,
            max_events,
            initial.name
        );
        Ok(handle)
    }

    /// Enable or disable dispatch for an instance.  Instances start inactive.
    pub fn set_active(&mut self, handle: InstanceHandle, active: bool) -> Result<(), FsmError> {
        let instance = self
            .instances
            .get_mut(handle.index())
            .ok_or(FsmError::InvalidHandle)?;
        instance.active = active;
        Ok(())
    }

    pub fn is_active(&self, handle: InstanceHandle) -> Result<bool, FsmError> {
        Ok(self.instance(handle)?.active)
    }

    /// Raise `event` on an instance and return its state afterwards.
    ///
    /// An inactive instance, or a (state, event) pair with no row, leaves
    /// the state untouched.  Otherwise the target state is committed
    /// first, then its observer and entry action run, then the row's
    /// action.  Any of these may dispatch again; nested transitions finish
    /// before this call returns.
    pub fn dispatch(&mut self, handle: InstanceHandle, event: EventId, ctx: &mut C) -> Result<StateId, FsmError> {
        let instance = self.instance(handle)?;
        let from = instance.current;
        if !instance.active {
            trace!("FSM {}: inactive, event {} ignored", handle, event.0);
            return Ok(from.id);
        }
        let Some(transition) = instance.lookup(event) else {
            trace!("FSM {}: no transition for event {} in {}", handle, event.0, from.name);
            return Ok(from.id);
        };
        if self.depth >= MAX_DISPATCH_DEPTH {
            warn!("FSM {}: event {} dropped, dispatch nested too deep", handle, event.0);
            return Err(FsmError::DispatchTooDeep);
        }

        let to = transition.to;
        self.instances[handle.index()].current = to;
        debug!("FSM {}: {} -> {} (event {})", handle, from.name, to.name, event.0);

        let step = Step {
            instance: handle,
            from: from.id,
            to: to.id,
            event,
        };

        self.depth += 1;
        if let Some(observe) = to.observer {
            observe(step);
        }
        if let Some(enter) = to.on_enter {
            enter(self, ctx, step);
        }
        if let Some(action) = transition.action {
            action(self, ctx, step);
        }
        self.depth -= 1;

        self.current_state(handle)
    }

    /// The instance's current state.
    pub fn current_state(&self, handle: InstanceHandle) -> Result<StateId, FsmError> {
        Ok(self.instance(handle)?.current.id)
    }

    /// Name of the instance's current state, for logs.
    pub fn current_state_name(&self, handle: InstanceHandle) -> Result<&'static str, FsmError> {
        Ok(self.instance(handle)?.current.name)
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn is_configured(&self) -> bool {
        self.capacity.is_some()
    }

    /// Drop every instance and return to the unconfigured state.
    /// Existing handles become invalid.  Refused from inside an action.
    pub fn teardown(&mut self) -> Result<(), FsmError> {
        if self.depth > 0 {
            warn!("FSM manager: teardown refused during dispatch");
            return Err(FsmError::DispatchInProgress);
        }
        self.instances.clear();
        self.capacity = None;
        Ok(())
    }

    fn instance(&self, handle: InstanceHandle) -> Result<&Instance<C>, FsmError> {
        self.instances.get(handle.index()).ok_or(FsmError::InvalidHandle)
    }
}

impl<C: 'static> Default for FsmManager<C> {
    fn default() -> Self {
        Self::new()
    }
}
