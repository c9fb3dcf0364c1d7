//! Alert model: severity levels, alert kinds, and the capacity-bounded
//! per-cycle alert buffer.
//!
//! The buffer is rebuilt from scratch every evaluation cycle.  It keeps at
//! most [`ALERT_CAPACITY`] records; anything beyond that is dropped, but
//! the drop is counted and the highest severity among *all* offered
//! records is tracked, so arbitration never under-reports after
//! truncation.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Maximum number of concurrently stored alert records.
pub const ALERT_CAPACITY: usize = 10;

// ═══════════════════════════════════════════════════════════════
//  Severity
// ═══════════════════════════════════════════════════════════════

/// Totally ordered severity: `None < Info < Warning < Danger < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Severity {
    #[default]
    None = 0,
    Info = 1,
    Warning = 2,
    Danger = 3,
    Critical = 4,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Self::None,
        Self::Info,
        Self::Warning,
        Self::Danger,
        Self::Critical,
    ];

    /// Navigation is locked onto the safety view at `Danger` and above.
    pub const fn blocks_navigation(self) -> bool {
        matches!(self, Self::Danger | Self::Critical)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Danger => "DANGER",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Alert kinds and categories
// ═══════════════════════════════════════════════════════════════

/// Sensor domain an alert belongs to.  Evaluation walks categories in
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertCategory {
    Gas,
    Power,
    Environment,
    Tilt,
}

/// Every distinct condition the evaluator can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    CoHigh,
    LpgHigh,
    SmokeHigh,
    Rail12vLow,
    Rail12vHigh,
    Rail5vLow,
    Rail5vHigh,
    Current12vHigh,
    Current5vHigh,
    TemperatureHigh,
    TemperatureLow,
    HumidityHigh,
    TiltHigh,
}

impl AlertKind {
    pub const COUNT: usize = 13;

    pub const fn category(self) -> AlertCategory {
        match self {
            Self::CoHigh | Self::LpgHigh | Self::SmokeHigh => AlertCategory::Gas,
            Self::Rail12vLow
            | Self::Rail12vHigh
            | Self::Rail5vLow
            | Self::Rail5vHigh
            | Self::Current12vHigh
            | Self::Current5vHigh => AlertCategory::Power,
            Self::TemperatureHigh | Self::TemperatureLow | Self::HumidityHigh => {
                AlertCategory::Environment
            }
            Self::TiltHigh => AlertCategory::Tilt,
        }
    }

    /// Short display name for the safety screen.
    pub const fn name(self) -> &'static str {
        match self {
            Self::CoHigh => "CO",
            Self::LpgHigh => "LPG",
            Self::SmokeHigh => "SMOKE",
            Self::Rail12vLow => "12V LOW",
            Self::Rail12vHigh => "12V HIGH",
            Self::Rail5vLow => "5V LOW",
            Self::Rail5vHigh => "5V HIGH",
            Self::Current12vHigh => "12V CURRENT",
            Self::Current5vHigh => "5V CURRENT",
            Self::TemperatureHigh => "TEMP HIGH",
            Self::TemperatureLow => "TEMP LOW",
            Self::HumidityHigh => "HUMIDITY",
            Self::TiltHigh => "TILT",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Alert record
// ═══════════════════════════════════════════════════════════════

/// One threshold violation observed in the current cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertRecord {
    pub kind: AlertKind,
    pub severity: Severity,
    /// Value that crossed the threshold, in the channel's unit.
    pub measured: f32,
    /// The threshold that was crossed.
    pub threshold: f32,
    /// Monotonic ms at which the offending measurement was taken.
    pub timestamp_ms: u64,
    pub message: &'static str,
}

impl AlertRecord {
    pub fn category(&self) -> AlertCategory {
        self.kind.category()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Alert buffer
// ═══════════════════════════════════════════════════════════════

/// Fixed-capacity, insertion-ordered alert set for one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertBuffer {
    records: heapless::Vec<AlertRecord, ALERT_CAPACITY>,
    /// Records offered after the buffer was full.
    dropped: u8,
    /// Highest severity across every offered record, stored or not,
    /// with the kind of the earliest record that reached it.
    peak: Option<(Severity, AlertKind)>,
}

impl AlertBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous cycle.
    pub fn clear(&mut self) {
        self.records.clear();
        self.dropped = 0;
        self.peak = None;
    }

    /// Offer a record.  Returns `false` if it was dropped for capacity.
    pub fn push(&mut self, record: AlertRecord) -> bool {
        match self.peak {
            Some((sev, _)) if record.severity <= sev => {}
            _ => self.peak = Some((record.severity, record.kind)),
        }

        if self.records.push(record).is_err() {
            self.dropped = self.dropped.saturating_add(1);
            return false;
        }
        true
    }

    pub fn records(&self) -> &[AlertRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.dropped == 0
    }

    /// Number of records lost to the capacity limit this cycle.
    pub fn dropped(&self) -> u8 {
        self.dropped
    }

    pub fn overflowed(&self) -> bool {
        self.dropped > 0
    }

    /// Maximum severity offered this cycle and the earliest kind holding it.
    pub fn peak(&self) -> Option<(Severity, AlertKind)> {
        self.peak
    }

    /// The record for `kind`, if it was stored.
    pub fn find(&self, kind: AlertKind) -> Option<&AlertRecord> {
        self.records.iter().find(|r| r.kind == kind)
    }
}
