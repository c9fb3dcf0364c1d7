//! Outbound application events.
//!
//! The [`MonitorService`](super::service::MonitorService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: log to serial, refresh
//! the display, etc.

use crate::alerts::{AlertKind, Severity};
use crate::diagnostics::LoopStats;
use crate::error::SensorError;
use crate::fsm::ModeId;
use crate::fsm::context::Channel;
use crate::heating::{GasGate, HeaterPhase};
use crate::sensors::{GasSensor, RailReading, SensorId};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial mode).
    Started(ModeId),

    /// The mode FSM transitioned.
    ModeChanged { from: ModeId, to: ModeId },

    /// The arbitrated severity level changed.
    SeverityChanged {
        from: Severity,
        to: Severity,
        primary: Option<AlertKind>,
    },

    /// A gas cell finished its one-shot warm-up.
    PreheatComplete(GasSensor),

    /// The CO heater entered a new phase.
    HeaterPhaseChanged(HeaterPhase),

    /// Violations were lost to the alert buffer capacity this cycle.
    AlertsDropped { dropped: u8 },

    /// First failure of a read-failure streak.
    SensorFault { sensor: SensorId, error: SensorError },

    /// First good read after a failure streak.
    SensorRecovered(SensorId),

    /// The operator acknowledged the alarm.
    BuzzerSilenced,

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// What presentation may say about one gas quantity.
///
/// `Warming` and `Purging` are "no opinion" and must never render as a
/// safe value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GasStatus {
    Warming,
    Purging,
    /// Gate open but the last read failed or was implausible.
    Stale,
    Ppm(f32),
}

impl GasStatus {
    pub fn new(gate: GasGate, channel: &Channel<f32>) -> Self {
        match gate {
            GasGate::Preheating => Self::Warming,
            GasGate::Purging => Self::Purging,
            GasGate::Ready => channel.get().map_or(Self::Stale, Self::Ppm),
        }
    }

    pub fn ppm(&self) -> Option<f32> {
        match self {
            Self::Ppm(v) => Some(*v),
            _ => None,
        }
    }
}

/// A point-in-time telemetry snapshot suitable for logging or display.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub mode: ModeId,
    pub level: Severity,
    pub primary: Option<AlertKind>,
    pub active_alerts: u8,
    pub dropped_alerts: u8,

    pub co: GasStatus,
    pub lpg: GasStatus,
    pub methane: GasStatus,
    pub smoke: GasStatus,
    pub heater: HeaterPhase,

    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
    pub exterior_c: Option<f32>,
    pub tilt_deg: Option<f32>,
    pub rail_12v: Option<RailReading>,
    pub rail_5v: Option<RailReading>,

    pub buzzer_on: bool,
    pub silenced: bool,
    pub navigation_blocked: bool,

    pub loop_stats: LoopStats,
    pub uptime_ms: u64,
}
