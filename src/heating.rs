//! Gas-sensor heater timing.
//!
//! The MQ-7 CO cell only produces a meaningful reading while its heater
//! runs at the low voltage.  It must first warm up, then alternate
//! between a high-voltage cleaning phase and a low-voltage measuring
//! phase for as long as the system runs:
//!
//! ```text
//!  Preheating ──[co_preheat_ms]──▶ High ──[co_high_phase_ms]──▶ Low
//!                                   ▲                            │
//!                                   └─────[co_low_phase_ms]──────┘
//! ```
//!
//! Transitions depend only on the monotonic clock.  A failed read never
//! touches phase timing: the heater phase is an electrical fact, not a
//! software opinion.
//!
//! The MQ-2 combustible-gas cell needs only a one-shot [`PreheatTimer`].

use log::info;

use crate::config::TimingConfig;

// ═══════════════════════════════════════════════════════════════
//  Heater phase FSM
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaterPhase {
    Preheating,
    High,
    Low,
}

impl HeaterPhase {
    /// Heater drive level for this phase: `true` = full 5 V.
    pub const fn heater_high(self) -> bool {
        !matches!(self, Self::Low)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Preheating => "Preheating",
            Self::High => "High",
            Self::Low => "Low",
        }
    }
}

/// Phase durations copied out of [`TimingConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatingTiming {
    pub preheat_ms: u32,
    pub high_ms: u32,
    pub low_ms: u32,
}

impl From<&TimingConfig> for HeatingTiming {
    fn from(t: &TimingConfig) -> Self {
        Self {
            preheat_ms: t.co_preheat_ms,
            high_ms: t.co_high_phase_ms,
            low_ms: t.co_low_phase_ms,
        }
    }
}

/// Cyclic heater state machine for the CO cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatingCycle {
    phase: HeaterPhase,
    phase_started_ms: u64,
    timing: HeatingTiming,
    completed_cycles: u32,
}

impl HeatingCycle {
    pub fn new(timing: HeatingTiming, now_ms: u64) -> Self {
        Self {
            phase: HeaterPhase::Preheating,
            phase_started_ms: now_ms,
            timing,
            completed_cycles: 0,
        }
    }

    /// Advance on the clock.  Returns the new phase if a transition
    /// happened.  At most one transition per call, so a late call
    /// still walks every phase in order.
    pub fn update(&mut self, now_ms: u64) -> Option<HeaterPhase> {
        if self.time_in_phase(now_ms) < u64::from(self.phase_duration_ms()) {
            return None;
        }

        let next = match self.phase {
            HeaterPhase::Preheating | HeaterPhase::Low => HeaterPhase::High,
            HeaterPhase::High => HeaterPhase::Low,
        };
        if self.phase == HeaterPhase::Low {
            self.completed_cycles = self.completed_cycles.saturating_add(1);
        }
        if self.phase == HeaterPhase::Preheating {
            info!("CO heater: preheat complete, starting cleaning phase");
        }

        self.phase = next;
        self.phase_started_ms = now_ms;
        Some(next)
    }

    pub fn phase(&self) -> HeaterPhase {
        self.phase
    }

    /// A CO reading is authoritative only during the measuring phase.
    pub fn reading_valid(&self) -> bool {
        self.phase == HeaterPhase::Low
    }

    pub fn time_in_phase(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.phase_started_ms)
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        u64::from(self.phase_duration_ms()).saturating_sub(self.time_in_phase(now_ms))
    }

    /// Number of full High → Low cycles completed.
    pub fn completed_cycles(&self) -> u32 {
        self.completed_cycles
    }

    fn phase_duration_ms(&self) -> u32 {
        match self.phase {
            HeaterPhase::Preheating => self.timing.preheat_ms,
            HeaterPhase::High => self.timing.high_ms,
            HeaterPhase::Low => self.timing.low_ms,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  One-shot preheat
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreheatTimer {
    started_ms: u64,
    duration_ms: u32,
    complete: bool,
}

impl PreheatTimer {
    pub fn new(duration_ms: u32, now_ms: u64) -> Self {
        Self {
            started_ms: now_ms,
            duration_ms,
            complete: false,
        }
    }

    /// Returns `true` exactly once, on the call where the timer elapses.
    pub fn update(&mut self, now_ms: u64) -> bool {
        if self.complete {
            return false;
        }
        if now_ms.saturating_sub(self.started_ms) >= u64::from(self.duration_ms) {
            self.complete = true;
            return true;
        }
        false
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        if self.complete {
            return 0;
        }
        u64::from(self.duration_ms).saturating_sub(now_ms.saturating_sub(self.started_ms))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Readiness as seen by evaluation and presentation
// ═══════════════════════════════════════════════════════════════

/// Why a gas channel is or is not eligible for evaluation.
///
/// `Preheating` and `Purging` mean "no opinion"; they must never be shown
/// as safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GasGate {
    /// One-shot warm-up still running.
    #[default]
    Preheating,
    /// Warmed up but the heater is in its cleaning phase.
    Purging,
    /// Reading may be evaluated.
    Ready,
}

impl GasGate {
    pub fn is_open(self) -> bool {
        self == Self::Ready
    }

    pub fn from_cycle(cycle: &HeatingCycle) -> Self {
        match cycle.phase() {
            HeaterPhase::Preheating => Self::Preheating,
            HeaterPhase::High => Self::Purging,
            HeaterPhase::Low => Self::Ready,
        }
    }

    pub fn from_preheat(timer: &PreheatTimer) -> Self {
        if timer.is_complete() {
            Self::Ready
        } else {
            Self::Preheating
        }
    }
}

/// Gate of each gas cell, refreshed by the scheduler every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GasGates {
    pub co: GasGate,
    pub combustible: GasGate,
}

impl GasGates {
    /// Both one-shot warm-ups are over.  The CO cell may still be purging.
    pub fn warmed_up(&self) -> bool {
        self.co != GasGate::Preheating && self.combustible != GasGate::Preheating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMING: HeatingTiming = HeatingTiming {
        preheat_ms: 180_000,
        high_ms: 60_000,
        low_ms: 90_000,
    };

    #[test]
    fn starts_preheating_and_invalid() {
        let cycle = HeatingCycle::new(TIMING, 0);
        assert_eq!(cycle.phase(), HeaterPhase::Preheating);
        assert!(!cycle.reading_valid());
        assert_eq!(GasGate::from_cycle(&cycle), GasGate::Preheating);
    }

    #[test]
    fn full_cycle_sequence() {
        let mut cycle = HeatingCycle::new(TIMING, 1_000);

        assert_eq!(cycle.update(180_999), None);
        assert_eq!(cycle.update(181_000), Some(HeaterPhase::High));
        assert!(!cycle.reading_valid());

        assert_eq!(cycle.update(240_999), None);
        assert_eq!(cycle.update(241_000), Some(HeaterPhase::Low));
        assert!(cycle.reading_valid());

        assert_eq!(cycle.update(331_000), Some(HeaterPhase::High));
        assert_eq!(cycle.completed_cycles(), 1);
        assert_eq!(cycle.update(391_000), Some(HeaterPhase::Low));
    }

    #[test]
    fn late_update_never_skips_a_phase() {
        let mut cycle = HeatingCycle::new(TIMING, 0);
        // Far past preheat + high + low: still only one step.
        assert_eq!(cycle.update(1_000_000), Some(HeaterPhase::High));
        assert_eq!(cycle.phase(), HeaterPhase::High);
        assert_eq!(cycle.time_in_phase(1_000_000), 0);
    }

    #[test]
    fn heater_drive_follows_phase() {
        assert!(HeaterPhase::Preheating.heater_high());
        assert!(HeaterPhase::High.heater_high());
        assert!(!HeaterPhase::Low.heater_high());
    }

    #[test]
    fn remaining_counts_down() {
        let cycle = HeatingCycle::new(TIMING, 0);
        assert_eq!(cycle.remaining_ms(30_000), 150_000);
        assert_eq!(cycle.remaining_ms(500_000), 0);
    }

    #[test]
    fn preheat_timer_fires_once() {
        let mut t = PreheatTimer::new(60_000, 0);
        assert!(!t.update(59_999));
        assert_eq!(t.remaining_ms(59_999), 1);
        assert!(t.update(60_000));
        assert!(!t.update(70_000));
        assert!(t.is_complete());
        assert_eq!(GasGate::from_preheat(&t), GasGate::Ready);
    }

    #[test]
    fn purging_counts_as_warmed_up() {
        let gates = GasGates {
            co: GasGate::Purging,
            combustible: GasGate::Ready,
        };
        assert!(gates.warmed_up());
        assert!(!GasGates::default().warmed_up());
    }

    #[test]
    fn clock_going_backwards_does_not_underflow() {
        let mut t = PreheatTimer::new(60_000, 10_000);
        assert!(!t.update(5_000));
        let mut c = HeatingCycle::new(TIMING, 10_000);
        assert_eq!(c.update(5_000), None);
    }
}
