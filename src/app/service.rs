//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the FSM manager, the sensor context and the tick
//! scheduler.  It exposes a clean, hardware-agnostic API.  All I/O flows
//! through port traits injected at call sites, making the entire service
//! testable with mock adapters.
//!
//! ```text
//!      SensorPort ──▶ ┌──────────────────────────┐ ──▶ UplinkPort
//! TemperaturePort ◀─▶ │        AppService        │ ──▶ EventSink
//!    ActuatorPort ◀── │  Timers · FSM · Filters  │ ◀─▶ StoragePort
//!                     └──────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::error::Result;
use crate::fsm::context::{Commands, SensorContext, SensorSnapshot};
use crate::fsm::states::{SensorEvent, SensorState, setup_state_machine};
use crate::fsm::{FsmManager, InstanceHandle, StateId};
use crate::scheduler::{TickScheduler, TimerId};
use crate::sensors::Channel;
use crate::sensors::temperature::TempSensor;
use crate::threshold::ThresholdStore;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ActuatorPort, ConfigError, EventSink, SensorPort, StoragePort, TemperaturePort, UplinkPort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: FsmManager<SensorContext>,
    handle: InstanceHandle,
    ctx: SensorContext,
    timers: TickScheduler,
    app_tick: TimerId,
    ambient_tick: TimerId,
    level_trigger: Option<TimerId>,
    level_test_pending: bool,
    tick_count: u64,
}

impl AppService {
    /// Validate `config`, register the sensor FSM and arm the timers.
    ///
    /// `threshold` is the flow filter threshold, usually from
    /// [`ThresholdStore::load`].
    pub fn new(config: SystemConfig, threshold: u16) -> Result<Self> {
        config.validate()?;
        ThresholdStore::validate(threshold)?;

        let mut fsm = FsmManager::new();
        let handle = setup_state_machine(&mut fsm)?;

        let mut timers = TickScheduler::new();
        let app_tick = timers
            .add("app", u32::from(config.slow_idle_tick_ms))
            .ok_or(ConfigError::ValidationFailed("app tick period"))?;
        let ambient_tick = timers
            .add("ambient", config.ambient_adc_tick_ms)
            .ok_or(ConfigError::ValidationFailed("ambient tick period"))?;
        // A zero interval leaves level tests to explicit commands.
        let level_trigger = timers.add("level-test", config.level_test_interval_ms);

        Ok(Self {
            fsm,
            handle,
            ctx: SensorContext::new(config, threshold),
            timers,
            app_tick,
            ambient_tick,
            level_trigger,
            level_test_pending: false,
            tick_count: 0,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce the initial state.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        let state = self.state_id();
        sink.emit(&AppEvent::Started(state));
        info!(
            "AppService started in {}, threshold {}",
            self.state().name(),
            self.ctx.filter.threshold()
        );
    }

    // ── Per-pass orchestration ────────────────────────────────

    /// Run one main-loop pass covering `elapsed_ms` of wall time:
    /// timers → temperatures → FSM events → commands → uplink.
    ///
    /// The `hw` parameter satisfies every hardware port at once; this
    /// avoids juggling several mutable borrows of one peripheral set.
    pub fn poll(
        &mut self,
        elapsed_ms: u32,
        hw: &mut (impl SensorPort + TemperaturePort + ActuatorPort),
        uplink: &mut impl UplinkPort,
        sink: &mut impl EventSink,
    ) {
        let prev_state = self.state_id();

        // 1. Timers
        self.timers.advance(elapsed_ms);

        // 2. Temperatures
        if !hw.conversion_in_progress() {
            for sensor in TempSensor::ALL {
                self.ctx.temperatures.store(sensor, hw.last_reading(sensor));
            }
        }

        // 3. Application tick
        if self.timers.test_and_clear(self.app_tick) {
            self.tick_count += 1;
            // Debounce counts in cadence units: a late pass still reports
            // one period, not the wall time that actually passed.
            let period = self.timers.period_ms(self.app_tick).unwrap_or(0);
            let snapshot = SensorSnapshot {
                outflow_pulses: hw.take_pulses(Channel::Outflow),
                level_pulses: hw.take_pulses(Channel::Level),
                reflectance: hw.read_reflectance(),
                flushing: false,
                level_switch_closed: hw.level_switch_closed(),
                elapsed_ms: u16::try_from(period).unwrap_or(u16::MAX),
            };
            self.ctx.sample(snapshot);
            self.raise(SensorEvent::Timer);
        }

        // 4. Ambient temperature
        if self.timers.test_and_clear(self.ambient_tick) {
            hw.start_conversion(TempSensor::Ambient);
        }

        // 5. Level test (periodic or commanded), held until IDLE
        if self.level_trigger.is_some_and(|t| self.timers.test_and_clear(t)) {
            self.level_test_pending = true;
        }
        if self.level_test_pending && self.state() == SensorState::Idle {
            self.level_test_pending = false;
            self.ctx.sensors.level_switch_closed = hw.level_switch_closed();
            self.raise(SensorEvent::TestLevel);
        }

        // 6. Commands left by actions
        let commands = self.ctx.commands.take();
        self.apply_commands(commands, hw);

        // 7. Uplink
        self.flush_outbox(uplink, sink);

        // 8. Events and state change
        for notice in core::mem::take(&mut self.ctx.notices) {
            sink.emit(&notice);
        }
        let new_state = self.state_id();
        if new_state != prev_state {
            sink.emit(&AppEvent::StateChanged {
                from: prev_state,
                to: new_state,
            });
        }
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    ///
    /// `TriggerLevelTest` is serviced by the first [`poll`](Self::poll)
    /// that finds the FSM idle; the level switch is read fresh then.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        match cmd {
            AppCommand::SetThreshold(value) => {
                let old = self.ctx.filter.threshold();
                ThresholdStore::save(storage, value)?;
                self.ctx.filter.set_threshold(value);
                sink.emit(&AppEvent::ThresholdChanged { old, new: value });
            }
            AppCommand::TriggerLevelTest => {
                debug!("Level test requested");
                self.level_test_pending = true;
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current FSM state.
    pub fn state(&self) -> SensorState {
        SensorState::try_from(self.state_id()).unwrap_or(SensorState::Idle)
    }

    /// Application ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Current application tick period (ms).
    pub fn app_tick_period_ms(&self) -> u32 {
        self.timers.period_ms(self.app_tick).unwrap_or(0)
    }

    pub fn threshold(&self) -> u16 {
        self.ctx.filter.threshold()
    }

    /// A level test is waiting for the FSM to return to IDLE.
    pub fn level_test_pending(&self) -> bool {
        self.level_test_pending
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    /// Read-only view of the FSM context, for diagnostics.
    pub fn context(&self) -> &SensorContext {
        &self.ctx
    }

    // ── Internal ──────────────────────────────────────────────

    fn state_id(&self) -> StateId {
        self.fsm
            .current_state(self.handle)
            .unwrap_or(SensorState::Idle.into())
    }

    fn raise(&mut self, event: SensorEvent) {
        if let Err(e) = self.fsm.dispatch(self.handle, event.into(), &mut self.ctx) {
            warn!("FSM dispatch of {} failed: {}", event.name(), e);
        }
    }

    /// Translate FSM commands into port calls.
    fn apply_commands(&mut self, cmds: Commands, hw: &mut (impl TemperaturePort + ActuatorPort)) {
        if let Some(cadence) = cmds.cadence {
            let period = cadence.period_ms(&self.ctx.config);
            self.timers.set_reload(self.app_tick, u32::from(period));
        }
        if let Some(on) = cmds.outflow_sense {
            hw.enable_outflow_sense(on);
        }
        if let Some(on) = cmds.level_sense {
            hw.enable_level_sense(on);
        }
        if let Some(sensor) = cmds.conversion {
            hw.start_conversion(sensor);
        }
    }

    /// Send queued messages, then release the FSM from SENDING.
    fn flush_outbox(&mut self, uplink: &mut impl UplinkPort, sink: &mut impl EventSink) {
        for message in core::mem::take(&mut self.ctx.outbox) {
            let encoded = message.encode();
            uplink.send(&encoded);
            info!("Uplink: {}", encoded);
            sink.emit(&AppEvent::MessageSent(message));
        }
        if self.state() == SensorState::Sending {
            self.raise(SensorEvent::SendComplete);
        }
    }
}
