//! Alert arbitration: many records in, one system severity out.
//!
//! Stateless transform, recomputed every cycle from the alert buffer:
//!
//! | Severity | buzzer | cadence           | navigation blocked |
//! |----------|--------|-------------------|--------------------|
//! | CRITICAL | on     | continuous tone   | yes                |
//! | DANGER   | on     | `danger_toggle_ms`  | yes              |
//! | WARNING  | on     | `warning_toggle_ms` | no               |
//! | INFO     | off    | -                 | no                 |
//! | NONE     | off    | -                 | no                 |
//!
//! The level comes from the buffer's pre-truncation peak, so a record
//! lost to the capacity limit still counts.

use crate::alerts::{AlertBuffer, AlertCategory, AlertKind, Severity};
use crate::config::AlarmConfig;

/// How the piezo should sound for the current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuzzerCadence {
    #[default]
    Silent,
    /// Square wave: toggle every `period_ms`.
    Pulsed { period_ms: u32 },
    Continuous,
}

/// The single system-wide safety state presentation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeverityState {
    pub level: Severity,
    /// Earliest-inserted record holding `level`.
    pub primary: Option<AlertKind>,
    /// Records stored this cycle (at most the buffer capacity).
    pub active_count: u8,
    /// Records lost to the capacity limit this cycle.
    pub dropped: u8,
    pub buzzer_active: bool,
    pub cadence: BuzzerCadence,
    pub navigation_blocked: bool,
}

impl SeverityState {
    pub fn primary_category(&self) -> Option<AlertCategory> {
        self.primary.map(AlertKind::category)
    }
}

/// Severity → buzzer cadence.
pub fn cadence_for(level: Severity, alarm: &AlarmConfig) -> BuzzerCadence {
    match level {
        Severity::Critical => BuzzerCadence::Continuous,
        Severity::Danger => BuzzerCadence::Pulsed {
            period_ms: alarm.danger_toggle_ms,
        },
        Severity::Warning => BuzzerCadence::Pulsed {
            period_ms: alarm.warning_toggle_ms,
        },
        Severity::Info | Severity::None => BuzzerCadence::Silent,
    }
}

/// Reduce this cycle's alert set to the system state.
pub fn arbitrate(alerts: &AlertBuffer, alarm: &AlarmConfig) -> SeverityState {
    let (level, primary) = match alerts.peak() {
        Some((level, kind)) => (level, Some(kind)),
        None => (Severity::None, None),
    };
    let cadence = cadence_for(level, alarm);

    SeverityState {
        level,
        primary,
        active_count: alerts.len() as u8,
        dropped: alerts.dropped(),
        buzzer_active: cadence != BuzzerCadence::Silent,
        cadence,
        navigation_blocked: level.blocks_navigation(),
    }
}
