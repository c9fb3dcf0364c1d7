//! Application service: the hexagonal core.
//!
//! [`MonitorService`] owns the scheduler, the mode FSM, the cadence
//! engine and the shared context.  It exposes a hardware-agnostic API;
//! all I/O flows through port traits injected at call sites, so the
//! whole pipeline runs under test with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────────────┐ ──▶ EventSink
//!                 │            MonitorService             │
//! ActuatorPort ◀──│ schedule · evaluate · arbitrate · FSM │
//!                 └──────────────────────────────────────┘
//! ```
//!
//! One call to [`MonitorService::tick`] is one control-loop iteration.
//! Stages run strictly in order, and arbitration always sees the alert
//! set evaluation produced in the same iteration.

use log::{error, info, warn};

use crate::alerts::{AlertRecord, Severity};
use crate::arbitration::{SeverityState, arbitrate};
use crate::cadence::CadenceEngine;
use crate::config::{LevelCalibration, SystemConfig};
use crate::diagnostics::LoopTimingMonitor;
use crate::error::ConfigError;
use crate::evaluation::evaluate;
use crate::fsm::context::{MonitorContext, SensorStore};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, ModeId};
use crate::heating::HeaterPhase;
use crate::scheduler::{SensorScheduler, TickReport};

use super::commands::AppCommand;
use super::events::{AppEvent, GasStatus, TelemetryData};
use super::ports::{ActuatorPort, EventSink, SensorPort};

// ───────────────────────────────────────────────────────────────
// Read-only view
// ───────────────────────────────────────────────────────────────

/// Everything presentation consumers may read.  Borrowed, never mutable.
#[derive(Debug, Clone, Copy)]
pub struct MonitorView<'a> {
    pub mode: ModeId,
    pub severity: &'a SeverityState,
    pub alerts: &'a [AlertRecord],
    pub sensors: &'a SensorStore,
    /// Navigation is pinned to the safety view.
    pub safety_view_forced: bool,
    pub buzzer_on: bool,
    pub silenced: bool,
}

// ───────────────────────────────────────────────────────────────
// MonitorService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct MonitorService {
    fsm: Fsm,
    ctx: MonitorContext,
    scheduler: SensorScheduler,
    cadence: CadenceEngine,
    loop_timing: LoopTimingMonitor,
    /// Last level written to each actuator; `None` until the first tick.
    heater_high: Option<bool>,
    buzzer_on: Option<bool>,
    last_dropped: u8,
    last_telemetry_ms: u64,
    started_ms: u64,
}

impl MonitorService {
    /// Construct the service from a validated configuration.
    ///
    /// A rejected table is fatal: the caller must not enter the run loop.
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, now_ms: u64) -> Result<Self, ConfigError> {
        if let Err(e) = config.validate() {
            error!("Configuration rejected: {}", e);
            return Err(e);
        }

        let scheduler = SensorScheduler::new(&config.timing, now_ms);
        let loop_timing = LoopTimingMonitor::new(config.timing.control_loop_interval_ms);
        let ctx = MonitorContext::new(config, now_ms);
        let fsm = Fsm::new(build_state_table(), ModeId::Preheat);

        Ok(Self {
            fsm,
            ctx,
            scheduler,
            cadence: CadenceEngine::new(),
            loop_timing,
            heater_high: None,
            buzzer_on: None,
            last_dropped: 0,
            last_telemetry_ms: now_ms,
            started_ms: now_ms,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the mode FSM in `Preheat`.
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("MonitorService started in {:?}", self.fsm.current_state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle:
    /// sample → heater → evaluate → arbitrate → mode → buzzer → telemetry.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_ms = now_ms;

        // 1. Scheduler: gates first, then every due slot
        let report = self
            .scheduler
            .tick(now_ms, hw, &mut self.ctx.sensors, &self.ctx.config.level);
        Self::emit_report(&report, sink);

        // 2. Heater drive follows the phase, written only on change
        let high = self.scheduler.heater_phase().heater_high();
        if self.heater_high != Some(high) {
            hw.set_co_heater(high);
            self.heater_high = Some(high);
        }

        // 3. Evaluation (rebuilds the buffer)
        evaluate(&self.ctx.sensors, &self.ctx.config, &mut self.ctx.alerts);

        let dropped = self.ctx.alerts.dropped();
        if dropped != self.last_dropped {
            if dropped > 0 {
                warn!(
                    "Alert buffer full: {} violation(s) dropped this cycle",
                    dropped
                );
                sink.emit(&AppEvent::AlertsDropped { dropped });
            }
            self.last_dropped = dropped;
        }

        // 4. Arbitration
        let prev = self.ctx.severity;
        self.ctx.severity = arbitrate(&self.ctx.alerts, &self.ctx.config.alarm);
        let next = self.ctx.severity;
        if next.level != prev.level {
            let primary = next.primary.map_or("-", |k| k.name());
            if next.level > prev.level {
                warn!("Severity raised: {} -> {} ({})", prev.level, next.level, primary);
            } else {
                info!("Severity lowered: {} -> {} ({})", prev.level, next.level, primary);
            }
            sink.emit(&AppEvent::SeverityChanged {
                from: prev.level,
                to: next.level,
                primary: next.primary,
            });
        }

        // 5. Mode FSM
        if let Some((from, to)) = self.fsm.tick(&mut self.ctx) {
            sink.emit(&AppEvent::ModeChanged { from, to });
        }

        // 6. Buzzer cadence on its own clock
        let on = self.cadence.update(&self.ctx.severity, now_ms);
        self.apply_buzzer(on, hw);

        // 7. Telemetry
        let interval = u64::from(self.ctx.config.timing.telemetry_interval_ms);
        if now_ms.saturating_sub(self.last_telemetry_ms) >= interval {
            self.last_telemetry_ms = now_ms;
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    /// Feed the measured duration of the last loop iteration.
    pub fn record_loop_time(&mut self, duration_ms: u32, now_ms: u64) {
        self.loop_timing.record(duration_ms, now_ms);
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (button, menu, console).
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> Result<(), ConfigError> {
        match cmd {
            AppCommand::SilenceBuzzer => {
                if !self.ctx.severity.buzzer_active || self.cadence.is_silenced() {
                    return Ok(());
                }
                self.cadence.silence();
                self.apply_buzzer(false, hw);
                info!(
                    "Buzzer silenced by operator at {} (alert state unchanged)",
                    self.ctx.severity.level
                );
                sink.emit(&AppEvent::BuzzerSilenced);
            }
            AppCommand::SetSampleInterval {
                sensor,
                interval_ms,
            } => {
                self.scheduler.set_interval(sensor, interval_ms)?;
            }
            AppCommand::SetLevelOffsets {
                roll_deg,
                pitch_deg,
            } => {
                self.set_level(LevelCalibration {
                    roll_offset_deg: roll_deg,
                    pitch_offset_deg: pitch_deg,
                })?;
            }
            AppCommand::ZeroLevel => {
                let Some(a) = self.ctx.sensors.attitude.get() else {
                    warn!("Level zeroing refused: no valid attitude reading");
                    return Err(ConfigError::ValidationFailed(
                        "level: no valid attitude to zero against",
                    ));
                };
                self.set_level(LevelCalibration {
                    roll_offset_deg: a.roll_deg,
                    pitch_offset_deg: a.pitch_deg,
                })?;
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Borrow the published state for presentation.
    pub fn view(&self) -> MonitorView<'_> {
        MonitorView {
            mode: self.fsm.current_state(),
            severity: &self.ctx.severity,
            alerts: self.ctx.alerts.records(),
            sensors: &self.ctx.sensors,
            safety_view_forced: self.ctx.safety_view_forced,
            buzzer_on: self.buzzer_on.unwrap_or(false),
            silenced: self.cadence.is_silenced(),
        }
    }

    /// Build a telemetry snapshot from the current context.
    pub fn build_telemetry(&self) -> TelemetryData {
        let s = &self.ctx.sensors;
        let sev = &self.ctx.severity;
        TelemetryData {
            mode: self.fsm.current_state(),
            level: sev.level,
            primary: sev.primary,
            active_alerts: sev.active_count,
            dropped_alerts: sev.dropped,
            co: GasStatus::new(s.gates.co, &s.co_ppm),
            lpg: GasStatus::new(s.gates.combustible, &s.lpg_ppm),
            methane: GasStatus::new(s.gates.combustible, &s.methane_ppm),
            smoke: GasStatus::new(s.gates.combustible, &s.smoke_ppm),
            heater: self.scheduler.heater_phase(),
            temperature_c: s.temperature_c.get(),
            humidity_pct: s.humidity_pct.get(),
            exterior_c: s.exterior_c.get(),
            tilt_deg: s.tilt_deg.get(),
            rail_12v: s.rail_12v.get(),
            rail_5v: s.rail_5v.get(),
            buzzer_on: self.buzzer_on.unwrap_or(false),
            silenced: self.cadence.is_silenced(),
            navigation_blocked: sev.navigation_blocked,
            loop_stats: self.loop_timing.stats(),
            uptime_ms: self.ctx.now_ms.saturating_sub(self.started_ms),
        }
    }

    /// Current operating mode.
    pub fn mode(&self) -> ModeId {
        self.fsm.current_state()
    }

    pub fn severity(&self) -> &SeverityState {
        &self.ctx.severity
    }

    pub fn alerts(&self) -> &[AlertRecord] {
        self.ctx.alerts.records()
    }

    pub fn sensors(&self) -> &SensorStore {
        &self.ctx.sensors
    }

    pub fn heater_phase(&self) -> HeaterPhase {
        self.scheduler.heater_phase()
    }

    pub fn scheduler(&self) -> &SensorScheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    pub fn is_navigation_blocked(&self) -> bool {
        self.ctx.navigation_blocked()
    }

    // ── Internal ──────────────────────────────────────────────

    fn emit_report(report: &TickReport, sink: &mut impl EventSink) {
        for &(sensor, error) in &report.faults {
            sink.emit(&AppEvent::SensorFault { sensor, error });
        }
        for &sensor in &report.recovered {
            sink.emit(&AppEvent::SensorRecovered(sensor));
        }
        if let Some(phase) = report.heater_phase {
            sink.emit(&AppEvent::HeaterPhaseChanged(phase));
        }
        for &gas in &report.preheat_complete {
            sink.emit(&AppEvent::PreheatComplete(gas));
        }
    }

    fn apply_buzzer(&mut self, on: bool, hw: &mut impl ActuatorPort) {
        if self.buzzer_on != Some(on) {
            hw.set_buzzer(on);
            self.buzzer_on = Some(on);
        }
    }

    fn set_level(&mut self, level: LevelCalibration) -> Result<(), ConfigError> {
        level.validate()?;
        self.ctx.config.level = level;
        self.ctx.sensors.refresh_tilt(&level);
        info!(
            "Level offsets set: roll {:.2}°, pitch {:.2}°",
            level.roll_offset_deg, level.pitch_offset_deg
        );
        Ok(())
    }
}
