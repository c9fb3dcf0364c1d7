//! Control-loop timing diagnostics.
//!
//! The whole safety pipeline runs inside one cooperative loop, so any
//! iteration that overruns its budget delays sampling, evaluation and
//! buzzer cadence alike.  [`LoopTimingMonitor`] keeps the worst case and
//! counts overruns; the figures ride along in telemetry.

use log::warn;

/// Minimum spacing between two overrun warnings.
const OVERRUN_WARN_INTERVAL_MS: u64 = 10_000;

/// Snapshot published in telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopStats {
    pub last_ms: u32,
    pub worst_ms: u32,
    pub overruns: u32,
    pub iterations: u64,
}

pub struct LoopTimingMonitor {
    budget_ms: u32,
    stats: LoopStats,
    last_warn_ms: Option<u64>,
    /// Overruns since the last warning was printed.
    suppressed: u32,
}

impl LoopTimingMonitor {
    pub fn new(budget_ms: u32) -> Self {
        Self {
            budget_ms,
            stats: LoopStats::default(),
            last_warn_ms: None,
            suppressed: 0,
        }
    }

    /// Record one iteration that took `duration_ms`, finishing at `now_ms`.
    pub fn record(&mut self, duration_ms: u32, now_ms: u64) {
        let s = &mut self.stats;
        s.iterations = s.iterations.wrapping_add(1);
        s.last_ms = duration_ms;
        s.worst_ms = s.worst_ms.max(duration_ms);

        if duration_ms <= self.budget_ms {
            return;
        }
        s.overruns = s.overruns.saturating_add(1);

        let due = self
            .last_warn_ms
            .is_none_or(|t| now_ms.saturating_sub(t) >= OVERRUN_WARN_INTERVAL_MS);
        if due {
            warn!(
                "Control loop overran: {} ms (budget {} ms, worst {} ms, {} more since last report)",
                duration_ms, self.budget_ms, s.worst_ms, self.suppressed
            );
            self.last_warn_ms = Some(now_ms);
            self.suppressed = 0;
        } else {
            self.suppressed = self.suppressed.saturating_add(1);
        }
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn budget_ms(&self) -> u32 {
        self.budget_ms
    }
}
