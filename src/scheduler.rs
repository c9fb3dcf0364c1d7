//! Cooperative multi-sensor scheduler.
//!
//! Each physical sensor owns one [`SensorSlot`] with its own interval.
//! `tick(now)` runs once per control-loop iteration, samples every slot
//! that is due and writes the result into the [`SensorStore`].
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  tick(now)                                                   │
//! │                                                              │
//! │  1. advance heater FSM + one-shot preheat  ──▶ store.gates   │
//! │     (CO channel invalidated on every phase change)           │
//! │                                                              │
//! │  2. for each slot:                                           │
//! │       due?  now - last >= interval   (last := now, no drift) │
//! │       gate closed? ── skip sample, bookkeeping still moves   │
//! │       sample ──ok──▶ store.apply()                           │
//! │              └─err─▶ store.invalidate()  (warn once/streak)  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here blocks.  The only wait in a tick is inside the climate
//! driver's forced conversion, bounded by
//! [`CLIMATE_CONVERSION_BUDGET_MS`](crate::sensors::bme280::CLIMATE_CONVERSION_BUDGET_MS).
//! Missed intervals are never queued or backfilled.

use log::{info, warn};

use crate::app::ports::SensorPort;
use crate::config::{LevelCalibration, TimingConfig};
use crate::error::{ConfigError, SensorError};
use crate::fsm::context::SensorStore;
use crate::heating::{GasGate, GasGates, HeaterPhase, HeatingCycle, HeatingTiming, PreheatTimer};
use crate::sensors::{GasSensor, SensorId};

// ═══════════════════════════════════════════════════════════════
//  Slots
// ═══════════════════════════════════════════════════════════════

/// What decides whether a due slot may actually sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Always,
    /// CO cell: cyclic heater, sample only in the Low phase.
    HeatingCycle(HeatingCycle),
    /// Combustible cell: one-shot warm-up.
    Preheat(PreheatTimer),
}

impl Readiness {
    pub fn gate(&self) -> GasGate {
        match self {
            Self::Always => GasGate::Ready,
            Self::HeatingCycle(cycle) => GasGate::from_cycle(cycle),
            Self::Preheat(timer) => GasGate::from_preheat(timer),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSlot {
    pub id: SensorId,
    last_sample_ms: Option<u64>,
    interval_ms: u32,
    readiness: Readiness,
    /// Inside a run of consecutive read failures.
    failing: bool,
}

impl SensorSlot {
    fn new(id: SensorId, interval_ms: u32, readiness: Readiness) -> Self {
        Self {
            id,
            last_sample_ms: None,
            interval_ms,
            readiness,
            failing: false,
        }
    }

    /// First tick is always due.
    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_sample_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= u64::from(self.interval_ms),
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn last_sample_ms(&self) -> Option<u64> {
        self.last_sample_ms
    }

    pub fn readiness(&self) -> &Readiness {
        &self.readiness
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tick report
// ═══════════════════════════════════════════════════════════════

/// What happened during one [`SensorScheduler::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Slots that were sampled successfully.
    pub sampled: heapless::Vec<SensorId, { SensorId::COUNT }>,
    /// First failure of a new failure streak.
    pub faults: heapless::Vec<(SensorId, SensorError), { SensorId::COUNT }>,
    /// First success after a failure streak.
    pub recovered: heapless::Vec<SensorId, { SensorId::COUNT }>,
    pub heater_phase: Option<HeaterPhase>,
    pub preheat_complete: heapless::Vec<GasSensor, 2>,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

pub struct SensorScheduler {
    /// Indexed by `SensorId as usize`.
    slots: [SensorSlot; SensorId::COUNT],
}

impl SensorScheduler {
    /// Build every slot; heater and preheat clocks start at `now_ms`.
    pub fn new(timing: &TimingConfig, now_ms: u64) -> Self {
        let iv = &timing.intervals;
        let cycle = HeatingCycle::new(HeatingTiming::from(timing), now_ms);
        let preheat = PreheatTimer::new(timing.combustible_preheat_ms, now_ms);
        Self {
            slots: [
                SensorSlot::new(SensorId::Climate, iv.climate_ms, Readiness::Always),
                SensorSlot::new(SensorId::Attitude, iv.attitude_ms, Readiness::Always),
                SensorSlot::new(SensorId::Rail12v, iv.rail_ms, Readiness::Always),
                SensorSlot::new(SensorId::Rail5v, iv.rail_ms, Readiness::Always),
                SensorSlot::new(
                    SensorId::CarbonMonoxide,
                    iv.co_ms,
                    Readiness::HeatingCycle(cycle),
                ),
                SensorSlot::new(
                    SensorId::Combustible,
                    iv.combustible_ms,
                    Readiness::Preheat(preheat),
                ),
                SensorSlot::new(SensorId::Exterior, iv.exterior_ms, Readiness::Always),
            ],
        }
    }

    /// Run one scheduling pass.
    pub fn tick(
        &mut self,
        now_ms: u64,
        port: &mut impl SensorPort,
        store: &mut SensorStore,
        level: &LevelCalibration,
    ) -> TickReport {
        let mut report = TickReport::default();

        self.advance_gates(now_ms, store, &mut report);

        for slot in &mut self.slots {
            if !slot.is_due(now_ms) {
                continue;
            }
            slot.last_sample_ms = Some(now_ms);

            if !slot.readiness.gate().is_open() {
                continue;
            }

            match port.sample(slot.id) {
                // Background conversion still running; keep what we have.
                Err(SensorError::NotReady) => {}
                Ok(reading) => {
                    store.apply(reading, now_ms, level);
                    if slot.failing {
                        slot.failing = false;
                        info!("Sensor {}: recovered", slot.id.name());
                        let _ = report.recovered.push(slot.id);
                    }
                    let _ = report.sampled.push(slot.id);
                }
                Err(e) => {
                    store.invalidate(slot.id);
                    if !slot.failing {
                        slot.failing = true;
                        warn!("Sensor {}: read failed ({}), value marked stale", slot.id.name(), e);
                        let _ = report.faults.push((slot.id, e));
                    }
                }
            }
        }

        report
    }

    /// Phase timing first, independent of any I/O outcome.
    fn advance_gates(&mut self, now_ms: u64, store: &mut SensorStore, report: &mut TickReport) {
        if let Readiness::HeatingCycle(cycle) =
            &mut self.slots[SensorId::CarbonMonoxide as usize].readiness
        {
            let was_preheating = cycle.phase() == HeaterPhase::Preheating;
            if let Some(phase) = cycle.update(now_ms) {
                // A Low-phase value must never outlive its phase.
                store.invalidate(SensorId::CarbonMonoxide);
                report.heater_phase = Some(phase);
                if was_preheating {
                    let _ = report.preheat_complete.push(GasSensor::CarbonMonoxide);
                }
            }
        }

        if let Readiness::Preheat(timer) = &mut self.slots[SensorId::Combustible as usize].readiness {
            if timer.update(now_ms) {
                info!("Combustible gas cell: preheat complete");
                let _ = report.preheat_complete.push(GasSensor::Combustible);
            }
        }

        store.gates = self.gates();
    }

    // ── Runtime adjustment ────────────────────────────────────

    /// Change one slot's interval.  Takes effect from its next due check.
    pub fn set_interval(&mut self, id: SensorId, interval_ms: u32) -> Result<(), ConfigError> {
        if interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "sample interval must be non-zero",
            ));
        }
        self.slots[id as usize].interval_ms = interval_ms;
        info!("Scheduler: {} interval set to {} ms", id.name(), interval_ms);
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn slot(&self, id: SensorId) -> &SensorSlot {
        &self.slots[id as usize]
    }

    pub fn interval_ms(&self, id: SensorId) -> u32 {
        self.slots[id as usize].interval_ms
    }

    pub fn gates(&self) -> GasGates {
        GasGates {
            co: self.slots[SensorId::CarbonMonoxide as usize].readiness.gate(),
            combustible: self.slots[SensorId::Combustible as usize]
                .readiness
                .gate(),
        }
    }

    pub fn heating_cycle(&self) -> Option<&HeatingCycle> {
        match &self.slots[SensorId::CarbonMonoxide as usize].readiness {
            Readiness::HeatingCycle(cycle) => Some(cycle),
            _ => None,
        }
    }

    /// Current CO heater phase (drives the heater output).
    pub fn heater_phase(&self) -> HeaterPhase {
        self.heating_cycle()
            .map_or(HeaterPhase::Preheating, HeatingCycle::phase)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
