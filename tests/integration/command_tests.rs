//! Integration tests for operator commands: alarm acknowledgement,
//! sampling intervals and level calibration.

use vanwatch::alerts::Severity;
use vanwatch::app::commands::AppCommand;
use vanwatch::app::events::AppEvent;
use vanwatch::error::ConfigError;
use vanwatch::sensors::SensorId;

use super::mock_hw::{MockHardware, RecordingSink, Rig};

fn command(rig: &mut Rig, cmd: AppCommand) -> Result<(), ConfigError> {
    rig.app.handle_command(cmd, &mut rig.hw, &mut rig.sink)
}

// ── SilenceBuzzer ─────────────────────────────────────────────

#[test]
fn silence_mutes_audio_but_keeps_the_alert() {
    let mut rig = Rig::new();
    rig.hw.set_attitude(6.0, 0.0);
    rig.run_until(0);
    assert_eq!(rig.app.severity().level, Severity::Warning);
    assert!(rig.hw.buzzer_on());

    command(&mut rig, AppCommand::SilenceBuzzer).unwrap();
    assert!(!rig.hw.buzzer_on(), "buzzer must stop immediately");
    assert!(rig.sink.contains(&AppEvent::BuzzerSilenced));
    assert!(rig.app.view().silenced);

    let writes_before = rig.hw.buzzer_writes().len();
    rig.run_until(3_000);
    assert_eq!(rig.hw.buzzer_writes().len(), writes_before, "stays silent");
    assert_eq!(rig.app.severity().level, Severity::Warning);
    assert_eq!(rig.app.alerts().len(), 1);
    assert!(rig.app.build_telemetry().silenced);
}

#[test]
fn silence_lapses_when_the_level_changes() {
    let mut rig = Rig::new();
    rig.hw.set_attitude(6.0, 0.0);
    rig.run_until(0);
    command(&mut rig, AppCommand::SilenceBuzzer).unwrap();

    rig.hw.set_attitude(16.0, 0.0);
    rig.run_until(100);
    assert_eq!(rig.app.severity().level, Severity::Danger);
    assert!(!rig.app.view().silenced);
    assert!(rig.hw.buzzer_on());
}

#[test]
fn repeated_silence_emits_once() {
    let mut rig = Rig::new();
    rig.hw.set_attitude(16.0, 0.0);
    rig.run_until(0);
    command(&mut rig, AppCommand::SilenceBuzzer).unwrap();
    command(&mut rig, AppCommand::SilenceBuzzer).unwrap();
    assert_eq!(rig.sink.count(|e| *e == AppEvent::BuzzerSilenced), 1);
}

// ── SetSampleInterval ─────────────────────────────────────────

#[test]
fn sample_interval_change_applies_to_one_slot() {
    let mut rig = Rig::new();
    assert!(matches!(
        command(
            &mut rig,
            AppCommand::SetSampleInterval {
                sensor: SensorId::Climate,
                interval_ms: 0,
            }
        ),
        Err(ConfigError::ValidationFailed(_))
    ));

    command(
        &mut rig,
        AppCommand::SetSampleInterval {
            sensor: SensorId::Climate,
            interval_ms: 300,
        },
    )
    .unwrap();
    assert_eq!(rig.app.scheduler().interval_ms(SensorId::Climate), 300);

    rig.run_until(900);
    // 0, 300, 600, 900
    assert_eq!(rig.hw.sample_count(SensorId::Climate), 4);
    // 0, 100, ..., 900
    assert_eq!(rig.hw.sample_count(SensorId::Attitude), 10);
}

// ── Level calibration ─────────────────────────────────────────

#[test]
fn zero_level_absorbs_a_mounting_offset() {
    let mut rig = Rig::new();
    rig.hw.set_attitude(6.0, 0.0);
    rig.run_until(0);
    assert_eq!(rig.app.severity().level, Severity::Warning);

    command(&mut rig, AppCommand::ZeroLevel).unwrap();
    assert_eq!(rig.app.config().level.roll_offset_deg, 6.0);
    assert_eq!(rig.app.sensors().tilt_deg.get(), Some(0.0));

    // Next tick re-evaluates against the refreshed tilt.
    rig.tick();
    assert_eq!(rig.app.severity().level, Severity::None);
}

#[test]
fn level_offsets_are_validated_before_use() {
    let mut rig = Rig::new();
    let bad = AppCommand::SetLevelOffsets {
        roll_deg: 60.0,
        pitch_deg: 0.0,
    };
    assert!(command(&mut rig, bad).is_err());
    assert_eq!(rig.app.config().level.roll_offset_deg, 0.0);

    let good = AppCommand::SetLevelOffsets {
        roll_deg: 0.0,
        pitch_deg: -3.0,
    };
    command(&mut rig, good).unwrap();
    rig.hw.set_attitude(0.0, -3.0);
    rig.run_until(100);
    assert_eq!(rig.app.sensors().tilt_deg.get(), Some(0.0));
}

#[test]
fn commands_work_before_the_first_tick() {
    let mut app =
        vanwatch::app::service::MonitorService::new(super::mock_hw::fast_config(), 0).unwrap();
    let mut hw = MockHardware::new();
    let mut sink = RecordingSink::new();
    app.handle_command(AppCommand::SilenceBuzzer, &mut hw, &mut sink)
        .unwrap();
    assert!(hw.calls.is_empty());
    assert!(sink.events.is_empty());
}
