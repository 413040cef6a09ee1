//! AppService integration tests driven through mock ports.
//!
//! The loop is polled in 100 ms steps, as the board main loop does.

use crate::mock_hw::{FullNvs, HwCall, LogSink, MockHardware, MockNvs, MockUplink};
use latrinesensor::app::commands::AppCommand;
use latrinesensor::app::events::AppEvent;
use latrinesensor::app::service::AppService;
use latrinesensor::config::{DetectionSource, LevelTestMode, SystemConfig};
use latrinesensor::error::Error;
use latrinesensor::fsm::context::Cadence;
use latrinesensor::fsm::states::SensorState;
use latrinesensor::sensors::Channel;
use latrinesensor::sensors::temperature::{TempSensor, TenthsDegC};
use latrinesensor::threshold::ThresholdStore;
use latrinesensor::uplink::UplinkMessage;

const STEP_MS: u32 = 100;
/// Polls until the first idle tick with the default 2.5 s cadence.
const FIRST_TICK: usize = 25;

struct Rig {
    app: AppService,
    hw: MockHardware,
    uplink: MockUplink,
    sink: LogSink,
    nvs: MockNvs,
}

impl Rig {
    fn new(config: SystemConfig) -> Self {
        let mut rig = Self {
            app: AppService::new(config, 500).unwrap(),
            hw: MockHardware::new(),
            uplink: MockUplink::default(),
            sink: LogSink::new(),
            nvs: MockNvs::new(),
        };
        rig.app.start(&mut rig.sink);
        rig
    }

    fn poll(&mut self) {
        self.app.poll(STEP_MS, &mut self.hw, &mut self.uplink, &mut self.sink);
    }

    fn poll_n(&mut self, n: usize) {
        for _ in 0..n {
            self.poll();
        }
    }

    fn command(&mut self, cmd: AppCommand) -> Result<(), Error> {
        self.app.handle_command(cmd, &mut self.nvs, &mut self.sink)
    }
}

fn no_periodic_level_test() -> SystemConfig {
    SystemConfig {
        level_test_interval_ms: 0,
        ..SystemConfig::default()
    }
}

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn start_emits_started_in_idle() {
    let rig = Rig::new(SystemConfig::default());
    assert_eq!(rig.sink.events, vec![AppEvent::Started(SensorState::Idle.into())]);
    assert_eq!(rig.app.state(), SensorState::Idle);
    assert_eq!(rig.app.tick_count(), 0);
}

#[test]
fn idle_tick_starts_counting_then_quiet_tick_returns() {
    let mut rig = Rig::new(SystemConfig::default());

    rig.poll_n(FIRST_TICK - 1);
    assert_eq!(rig.app.state(), SensorState::Idle);
    assert!(rig.hw.calls.is_empty());

    rig.poll();
    assert_eq!(rig.app.state(), SensorState::Counting);
    assert_eq!(rig.app.tick_count(), 1);
    assert_eq!(
        rig.app.app_tick_period_ms(),
        u32::from(Cadence::FastDetect.period_ms(rig.app.config()))
    );
    assert_eq!(
        rig.hw.calls,
        vec![HwCall::OutflowSense(true), HwCall::StartConversion(TempSensor::Outflow)]
    );
    assert!(rig.sink.events.contains(&AppEvent::StateChanged {
        from: SensorState::Idle.into(),
        to: SensorState::Counting.into(),
    }));

    // Nothing seen for one fast tick: hold-open is not armed, so stop.
    rig.poll();
    assert_eq!(rig.app.state(), SensorState::Idle);
    assert_eq!(rig.app.app_tick_period_ms(), 2_500);
    assert!(!rig.hw.outflow_sense_on());
    assert!(rig.uplink.sent.is_empty());
}

// ── Outflow ───────────────────────────────────────────────────

#[test]
fn sustained_flush_is_reported_once() {
    let mut rig = Rig::new(no_periodic_level_test());
    rig.poll_n(FIRST_TICK);
    assert_eq!(rig.app.state(), SensorState::Counting);

    for _ in 0..20 {
        rig.hw.add_pulses(Channel::Outflow, 3);
        rig.poll();
        assert_eq!(rig.app.state(), SensorState::Counting);
    }
    // 10 s hold-open; the hundredth silent tick closes it.
    rig.poll_n(99);
    assert_eq!(rig.app.state(), SensorState::Counting);
    assert!(rig.uplink.sent.is_empty());
    rig.poll();

    assert_eq!(rig.uplink.sent, vec!["FLSH02000".to_string()]);
    assert_eq!(rig.app.state(), SensorState::Idle);
    assert!(!rig.hw.outflow_sense_on());
    assert!(rig.sink.events.contains(&AppEvent::FlushDetected {
        duration_ms: 2_000,
        outflow_temp: TenthsDegC(215),
    }));
    assert!(rig
        .sink
        .events
        .contains(&AppEvent::MessageSent(UplinkMessage::Flush { duration_ms: 2_000 })));
    // SENDING is entered and left inside the same pass.
    assert_eq!(
        rig.sink.events.last(),
        Some(&AppEvent::StateChanged {
            from: SensorState::Counting.into(),
            to: SensorState::Idle.into(),
        })
    );

    // Quiet afterwards: no second report.
    rig.poll_n(100);
    assert_eq!(rig.uplink.sent.len(), 1);
}

#[test]
fn late_pass_counts_one_cadence_period() {
    let mut rig = Rig::new(no_periodic_level_test());
    rig.poll_n(FIRST_TICK);
    rig.hw.add_pulses(Channel::Outflow, 3);
    rig.app.poll(300, &mut rig.hw, &mut rig.uplink, &mut rig.sink);
    assert_eq!(rig.app.context().debounce.total_duration(Channel::Outflow), 100);
}

#[test]
fn outflow_temperature_refreshes_between_conversions() {
    let mut rig = Rig::new(no_periodic_level_test());
    rig.hw.temperatures[TempSensor::Outflow as usize] = TenthsDegC(99);
    // Held readings are not cached while a conversion runs.
    rig.hw.busy = true;
    rig.poll_n(FIRST_TICK);
    for _ in 0..15 {
        rig.hw.add_pulses(Channel::Outflow, 1);
        rig.poll();
    }
    rig.hw.temperatures[TempSensor::Outflow as usize] = TenthsDegC(142);
    rig.hw.busy = false;
    rig.poll_n(100);

    assert_eq!(rig.uplink.sent, vec!["FLSH01500".to_string()]);
    assert!(rig.sink.events.contains(&AppEvent::FlushDetected {
        duration_ms: 1_500,
        outflow_temp: TenthsDegC(142),
    }));
}

#[test]
fn short_burst_below_threshold_is_not_reported() {
    let mut rig = Rig::new(no_periodic_level_test());
    rig.poll_n(FIRST_TICK);
    for _ in 0..10 {
        rig.hw.add_pulses(Channel::Outflow, 5);
        rig.poll();
    }
    rig.poll_n(100);
    // 1000 ms of activity does not exceed the 1000 ms threshold.
    assert!(rig.uplink.sent.is_empty());
    assert_eq!(rig.app.state(), SensorState::Idle);
}

#[test]
fn reflectance_source_detects_flush() {
    let mut rig = Rig::new(SystemConfig {
        detection_source: DetectionSource::Reflectance,
        level_test_interval_ms: 0,
        ..SystemConfig::default()
    });

    // Settle the idle baseline.
    rig.hw.reflectance = 3_000;
    rig.poll_n(300);
    assert!(!rig.app.context().filter.is_flushing());

    // Water darkens the sensor for 5 s; pulses never arrive.
    rig.hw.reflectance = 2_000;
    rig.poll_n(50);
    assert!(rig.app.context().filter.is_flushing());
    assert_eq!(rig.app.state(), SensorState::Counting);

    rig.hw.reflectance = 3_000;
    rig.poll_n(120);

    assert_eq!(rig.uplink.sent.len(), 1);
    assert!(rig.uplink.sent[0].starts_with("FLSH"));
    assert_eq!(rig.app.state(), SensorState::Idle);
    assert!(!rig.app.context().filter.is_flushing());
}

// ── Pit level ─────────────────────────────────────────────────

#[test]
fn commanded_level_test_reports_full_pit() {
    let mut rig = Rig::new(no_periodic_level_test());
    rig.hw.switch_closed = true;
    rig.command(AppCommand::TriggerLevelTest).unwrap();
    assert!(rig.app.level_test_pending());

    rig.poll();
    assert!(!rig.app.level_test_pending());
    assert_eq!(rig.uplink.sent, vec!["PITFULL".to_string()]);
    assert!(rig.sink.events.contains(&AppEvent::PitFull));
    assert_eq!(rig.app.state(), SensorState::Idle);
}

#[test]
fn commanded_level_test_with_open_switch_sends_nothing() {
    let mut rig = Rig::new(no_periodic_level_test());
    rig.command(AppCommand::TriggerLevelTest).unwrap();
    rig.poll();
    assert!(!rig.app.level_test_pending());
    assert!(rig.uplink.sent.is_empty());
    assert_eq!(rig.app.state(), SensorState::Idle);
}

#[test]
fn level_test_waits_for_counting_to_finish() {
    let mut rig = Rig::new(no_periodic_level_test());
    rig.poll_n(FIRST_TICK);
    rig.hw.switch_closed = true;
    rig.command(AppCommand::TriggerLevelTest).unwrap();

    rig.hw.add_pulses(Channel::Outflow, 2);
    rig.poll();
    assert_eq!(rig.app.state(), SensorState::Counting);
    assert!(rig.app.level_test_pending());
    assert!(rig.uplink.sent.is_empty());

    // Hold-open runs out, the cycle ends without a flush, the test runs.
    rig.poll_n(100);
    assert!(!rig.app.level_test_pending());
    assert_eq!(rig.uplink.sent, vec!["PITFULL".to_string()]);
}

#[test]
fn periodic_level_test_fires_on_interval() {
    let mut rig = Rig::new(SystemConfig {
        level_test_interval_ms: 5_000,
        ..SystemConfig::default()
    });
    rig.hw.switch_closed = true;

    rig.poll_n(49);
    assert!(rig.uplink.sent.is_empty());
    rig.poll();
    assert_eq!(rig.uplink.sent, vec!["PITFULL".to_string()]);
}

#[test]
fn ir_level_test_runs_for_one_level_tick() {
    let mut rig = Rig::new(SystemConfig {
        level_test_mode: LevelTestMode::Ir,
        level_test_interval_ms: 0,
        ..SystemConfig::default()
    });
    rig.command(AppCommand::TriggerLevelTest).unwrap();
    rig.poll();
    assert_eq!(rig.app.state(), SensorState::LevelTest);
    assert!(rig.hw.level_sense_on());
    assert_eq!(rig.app.app_tick_period_ms(), 1_000);

    rig.hw.add_pulses(Channel::Level, 4);
    rig.poll_n(9);
    assert_eq!(rig.app.state(), SensorState::LevelTest);
    rig.poll();

    assert_eq!(rig.uplink.sent, vec!["PITFULL".to_string()]);
    assert!(!rig.hw.level_sense_on());
    assert_eq!(rig.app.state(), SensorState::Idle);
    assert_eq!(rig.app.app_tick_period_ms(), 2_500);
}

#[test]
fn ir_level_test_without_obstruction_is_not_full() {
    let mut rig = Rig::new(SystemConfig {
        level_test_mode: LevelTestMode::Ir,
        level_test_interval_ms: 0,
        ..SystemConfig::default()
    });
    rig.command(AppCommand::TriggerLevelTest).unwrap();
    rig.poll_n(11);
    assert!(rig.uplink.sent.is_empty());
    assert!(!rig.hw.level_sense_on());
    assert_eq!(rig.app.state(), SensorState::Idle);
}

// ── Ambient temperature ───────────────────────────────────────

#[test]
fn ambient_conversion_runs_on_its_own_interval() {
    let mut rig = Rig::new(no_periodic_level_test());
    rig.poll_n(299);
    assert_eq!(rig.hw.conversions(TempSensor::Ambient), 0);
    rig.poll();
    assert_eq!(rig.hw.conversions(TempSensor::Ambient), 1);
}

// ── Threshold ─────────────────────────────────────────────────

#[test]
fn set_threshold_persists_and_applies() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.command(AppCommand::SetThreshold(800)).unwrap();

    assert_eq!(rig.app.threshold(), 800);
    assert_eq!(ThresholdStore::load(&rig.nvs), 800);
    assert_eq!(rig.nvs.writes, 1);
    assert_eq!(
        rig.sink.events.last(),
        Some(&AppEvent::ThresholdChanged { old: 500, new: 800 })
    );
}

#[test]
fn invalid_threshold_is_rejected_without_writing() {
    let mut rig = Rig::new(SystemConfig::default());
    let events_before = rig.sink.events.len();

    assert!(matches!(
        rig.command(AppCommand::SetThreshold(0)),
        Err(Error::Config(_))
    ));

    assert_eq!(rig.nvs.writes, 0);
    assert_eq!(rig.app.threshold(), 500);
    assert_eq!(rig.sink.events.len(), events_before);
}

#[test]
fn large_threshold_is_accepted() {
    let mut rig = Rig::new(SystemConfig::default());
    rig.command(AppCommand::SetThreshold(5_000)).unwrap();
    assert_eq!(rig.app.threshold(), 5_000);
    assert_eq!(ThresholdStore::load(&rig.nvs), 5_000);
}

#[test]
fn storage_failure_leaves_threshold_unchanged() {
    let mut app = AppService::new(SystemConfig::default(), 500).unwrap();
    let mut sink = LogSink::new();
    let result = app.handle_command(AppCommand::SetThreshold(700), &mut FullNvs, &mut sink);

    assert!(matches!(result, Err(Error::Storage(_))));
    assert_eq!(app.threshold(), 500);
    assert!(sink.events.is_empty());
}

#[test]
fn stored_threshold_survives_restart() {
    let mut nvs = MockNvs::new();
    let mut sink = LogSink::new();
    let mut app = AppService::new(SystemConfig::default(), ThresholdStore::load(&nvs)).unwrap();
    app.handle_command(AppCommand::SetThreshold(1_200), &mut nvs, &mut sink)
        .unwrap();
    drop(app);

    let app = AppService::new(SystemConfig::default(), ThresholdStore::load(&nvs)).unwrap();
    assert_eq!(app.threshold(), 1_200);
}
