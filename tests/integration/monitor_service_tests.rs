//! Integration tests for the scheduler → evaluation → arbitration →
//! mode → actuator pipeline.
//!
//! These run on the host (x86_64) and drive `MonitorService` tick by tick
//! through `MockHardware` with compressed heater timing.

use vanwatch::alerts::{AlertKind, Severity};
use vanwatch::app::events::{AppEvent, GasStatus};
use vanwatch::error::SensorError;
use vanwatch::fsm::ModeId;
use vanwatch::heating::HeaterPhase;
use vanwatch::sensors::{GasSensor, Rail, RailReading, SensorId};

use super::mock_hw::Rig;

// ── Startup and gating ────────────────────────────────────────

#[test]
fn starts_in_preheat_and_emits_started() {
    let rig = Rig::new();
    assert_eq!(rig.app.mode(), ModeId::Preheat);
    assert_eq!(rig.sink.events.first(), Some(&AppEvent::Started(ModeId::Preheat)));
}

#[test]
fn gas_cells_are_not_sampled_or_judged_while_preheating() {
    let mut rig = Rig::new();
    rig.hw.set_co(900.0);
    rig.hw.set_combustible(5_000.0, 1_000.0, 5_000.0);

    rig.run_until(480);

    assert_eq!(rig.hw.sample_count(SensorId::CarbonMonoxide), 0);
    assert_eq!(rig.hw.sample_count(SensorId::Combustible), 0);
    assert!(rig.app.alerts().is_empty());
    assert_eq!(rig.app.severity().level, Severity::None);

    let t = rig.app.build_telemetry();
    assert_eq!(t.co, GasStatus::Warming);
    assert_eq!(t.lpg, GasStatus::Warming);
    assert_eq!(t.smoke, GasStatus::Warming);
}

#[test]
fn combustible_gate_opens_after_its_own_preheat() {
    let mut rig = Rig::new();
    rig.hw.set_combustible(1_500.0, 10.0, 30.0);

    rig.run_until(480);
    assert!(rig.app.alerts().is_empty());

    rig.run_until(500);
    assert!(rig.sink.contains(&AppEvent::PreheatComplete(GasSensor::Combustible)));
    let lpg = rig.app.alerts().iter().find(|r| r.kind == AlertKind::LpgHigh);
    assert_eq!(lpg.map(|r| r.severity), Some(Severity::Warning));
    assert_eq!(rig.app.severity().primary, Some(AlertKind::LpgHigh));

    // CO is still warming, so the mode does not leave Preheat.
    assert_eq!(rig.app.mode(), ModeId::Preheat);
    assert!(rig.hw.buzzer_on());
}

#[test]
fn co_is_judged_only_in_the_measuring_phase() {
    let mut rig = Rig::new();
    rig.hw.set_co(250.0);

    rig.run_until(1_000);
    assert_eq!(rig.app.heater_phase(), HeaterPhase::High);
    assert!(rig.sink.contains(&AppEvent::PreheatComplete(GasSensor::CarbonMonoxide)));
    assert!(rig.sink.contains(&AppEvent::ModeChanged {
        from: ModeId::Preheat,
        to: ModeId::Normal,
    }));

    rig.run_until(1_480);
    assert_eq!(rig.hw.sample_count(SensorId::CarbonMonoxide), 0);
    assert_eq!(rig.app.build_telemetry().co, GasStatus::Purging);
    assert!(rig.app.alerts().is_empty());

    rig.run_until(1_500);
    assert_eq!(rig.app.heater_phase(), HeaterPhase::Low);
    let co = rig
        .app
        .alerts()
        .iter()
        .find(|r| r.kind == AlertKind::CoHigh)
        .copied()
        .expect("CO alert in Low phase");
    assert_eq!(co.severity, Severity::Warning);
    assert_eq!(co.measured, 250.0);
    assert_eq!(co.timestamp_ms, 1_500);

    // Back to High: the Low-phase value is dropped with its phase.
    rig.run_until(2_500);
    assert_eq!(rig.app.heater_phase(), HeaterPhase::High);
    assert_eq!(rig.app.sensors().co_ppm.get(), None);
    assert!(rig.app.alerts().is_empty());
    assert_eq!(rig.app.mode(), ModeId::Normal);
}

#[test]
fn heater_is_written_only_on_phase_change() {
    let mut rig = Rig::new();
    rig.run_until(2_500);
    // Preheat high, High (no write), Low, High.
    assert_eq!(rig.hw.heater_writes(), vec![true, false, true]);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::HeaterPhaseChanged(_))),
        3
    );
}

// ── Severity, navigation and mode ─────────────────────────────

#[test]
fn critical_co_forces_alert_mode_until_cleared() {
    let mut rig = Rig::new();
    rig.hw.set_co(450.0);

    rig.run_until(1_500);
    assert_eq!(rig.app.severity().level, Severity::Critical);
    assert!(rig.app.is_navigation_blocked());
    assert_eq!(rig.app.mode(), ModeId::Alert);
    assert!(rig.app.view().safety_view_forced);
    assert!(rig.hw.buzzer_on());
    assert!(rig.sink.contains(&AppEvent::SeverityChanged {
        from: Severity::None,
        to: Severity::Critical,
        primary: Some(AlertKind::CoHigh),
    }));
    assert!(rig.sink.contains(&AppEvent::ModeChanged {
        from: ModeId::Normal,
        to: ModeId::Alert,
    }));

    rig.hw.set_co(5.0);
    rig.run_until(1_600);
    assert_eq!(rig.app.severity().level, Severity::None);
    assert_eq!(rig.app.mode(), ModeId::Normal);
    assert!(!rig.app.view().safety_view_forced);
    assert!(!rig.hw.buzzer_on());
}

#[test]
fn warning_never_blocks_navigation() {
    let mut rig = Rig::new();
    rig.hw.set_climate(38.0, 45.0);
    rig.run_until(1_200);
    assert_eq!(rig.app.severity().level, Severity::Warning);
    assert_eq!(rig.app.severity().primary, Some(AlertKind::TemperatureHigh));
    assert!(!rig.app.is_navigation_blocked());
    assert_eq!(rig.app.mode(), ModeId::Normal);
}

#[test]
fn info_is_silent() {
    let mut rig = Rig::new();
    rig.hw.set_climate(21.0, 90.0);
    rig.run_until(200);
    assert_eq!(rig.app.severity().level, Severity::Info);
    assert_eq!(rig.hw.buzzer_writes(), vec![false]);
}

#[test]
fn danger_tilt_pulses_on_its_own_clock() {
    let mut rig = Rig::new();
    rig.hw.set_attitude(16.0, 0.0);

    rig.run_until(1_000);
    assert_eq!(rig.app.severity().level, Severity::Danger);
    assert_eq!(rig.app.mode(), ModeId::Alert);
    // 200 ms toggle: edges at 0, 200, 400, 600, 800, 1000.
    assert_eq!(
        rig.hw.buzzer_writes(),
        vec![true, false, true, false, true, false]
    );
}

#[test]
fn ten_concurrent_violations_fit_the_buffer() {
    let mut rig = Rig::new();
    rig.hw.set_co(450.0);
    rig.hw.set_combustible(3_500.0, 10.0, 1_200.0);
    rig.hw.set_rail(Rail::V12, 10.0, 25.0);
    rig.hw.set_rail(Rail::V5, 4.0, 4.0);
    rig.hw.set_climate(40.0, 90.0);
    rig.hw.set_attitude(20.0, 0.0);

    rig.run_until(1_500);

    let sev = rig.app.severity();
    assert_eq!(sev.level, Severity::Critical);
    assert_eq!(sev.primary, Some(AlertKind::CoHigh));
    assert_eq!(sev.active_count, 10);
    assert_eq!(sev.dropped, 0);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::AlertsDropped { .. })), 0);

    let kinds: Vec<AlertKind> = rig.app.alerts().iter().map(|r| r.kind).collect();
    assert_eq!(
        kinds,
        vec![
            AlertKind::CoHigh,
            AlertKind::LpgHigh,
            AlertKind::SmokeHigh,
            AlertKind::Rail12vLow,
            AlertKind::Current12vHigh,
            AlertKind::Rail5vLow,
            AlertKind::Current5vHigh,
            AlertKind::TemperatureHigh,
            AlertKind::HumidityHigh,
            AlertKind::TiltHigh,
        ]
    );
}

// ── Sensor faults ─────────────────────────────────────────────

#[test]
fn read_failure_marks_stale_without_raising_an_alert() {
    let mut rig = Rig::new();
    rig.hw.set_rail(Rail::V12, 10.0, 1.0);

    rig.run_until(0);
    assert_eq!(rig.app.severity().level, Severity::Danger);
    assert_eq!(rig.app.mode(), ModeId::Alert);

    rig.hw.fail(SensorId::Rail12v);
    rig.run_until(200);

    let faults = rig.sink.count(|e| {
        *e == AppEvent::SensorFault {
            sensor: SensorId::Rail12v,
            error: SensorError::BusReadFailed,
        }
    });
    assert_eq!(faults, 1, "one event per failure streak");
    assert_eq!(rig.app.sensors().rail_12v.get(), None);
    assert_eq!(rig.app.sensors().rail_12v.value.bus_voltage_v, 10.0);
    assert_eq!(rig.app.severity().level, Severity::None);
    assert_ne!(rig.app.mode(), ModeId::Alert);

    rig.hw.heal(SensorId::Rail12v);
    rig.run_until(300);
    assert!(rig.sink.contains(&AppEvent::SensorRecovered(SensorId::Rail12v)));
    assert_eq!(rig.app.severity().level, Severity::Danger);
    assert_eq!(rig.app.mode(), ModeId::Alert);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_follows_its_interval() {
    let mut rig = Rig::new();
    rig.run_until(2_000);

    let telem = rig.sink.telemetry();
    assert_eq!(telem.len(), 2);

    let first = telem[0];
    assert_eq!(first.mode, ModeId::Normal);
    assert_eq!(first.co, GasStatus::Purging);
    assert_eq!(first.lpg, GasStatus::Ppm(20.0));

    let second = telem[1];
    assert_eq!(second.heater, HeaterPhase::Low);
    assert_eq!(second.co, GasStatus::Ppm(5.0));
    assert_eq!(second.methane, GasStatus::Ppm(10.0));
    assert_eq!(second.temperature_c, Some(21.0));
    assert_eq!(second.exterior_c, Some(9.5));
    assert_eq!(second.tilt_deg, Some(0.0));
    assert_eq!(
        second.rail_12v,
        Some(RailReading {
            bus_voltage_v: 12.8,
            current_a: 2.0,
        })
    );
    assert_eq!(second.level, Severity::None);
    assert!(!second.navigation_blocked);
    assert_eq!(second.uptime_ms, 2_000);
}

#[test]
fn exterior_temperature_is_shown_never_alarmed() {
    let mut rig = Rig::new();
    rig.hw.set_exterior(58.0);
    rig.run_until(2_000);

    assert_eq!(rig.app.build_telemetry().exterior_c, Some(58.0));
    assert_eq!(rig.app.severity().level, Severity::None);
    assert!(rig.hw.buzzer_writes().iter().all(|on| !on));
}
