//! Shared mutable context threaded through every FSM handler.
//!
//! `MonitorContext` is the blackboard of one control-loop iteration: the
//! scheduler writes the sensor store, evaluation rebuilds the alert
//! buffer, arbitration replaces the severity state, and the mode FSM
//! reads all three.  Exactly one writer per field per iteration.

use crate::alerts::AlertBuffer;
use crate::arbitration::SeverityState;
use crate::config::{LevelCalibration, SystemConfig};
use crate::heating::GasGates;
use crate::sensors::{
    AttitudeReading, HUMIDITY_RANGE_PCT, Rail, RailReading, SensorId, SensorReading,
    TEMPERATURE_RANGE_C, VOLTAGE_RANGE_V, saturate_ppm, within,
};

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// One measured quantity: last good value, validity, and when it was taken.
///
/// A failed or implausible read clears `valid` but keeps `value`, so the
/// store is stale-but-flagged, never garbage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Channel<T> {
    pub value: T,
    pub valid: bool,
    pub updated_ms: u64,
}

impl<T: Copy> Channel<T> {
    /// The value, if it may be evaluated.
    pub fn get(&self) -> Option<T> {
        self.valid.then_some(self.value)
    }

    fn accept(&mut self, value: T, plausible: bool, now_ms: u64) {
        if plausible {
            self.value = value;
            self.valid = true;
            self.updated_ms = now_ms;
        } else {
            self.valid = false;
        }
    }

    fn invalidate(&mut self) {
        self.valid = false;
    }
}

impl Channel<f32> {
    /// Concentrations above the plausibility ceiling are stored pinned to
    /// it and stay valid, so the top alarm tier still fires.
    fn accept_ppm(&mut self, ppm: f32, now_ms: u64) {
        match saturate_ppm(ppm) {
            Some(ppm) => self.accept(ppm, true, now_ms),
            None => self.invalidate(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor store
// ---------------------------------------------------------------------------

/// Latest value of every quantity the evaluator reads.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorStore {
    pub temperature_c: Channel<f32>,
    pub humidity_pct: Channel<f32>,
    /// Raw accelerometer attitude, before level offsets.
    pub attitude: Channel<AttitudeReading>,
    /// Inclination magnitude after level offsets (degrees).
    pub tilt_deg: Channel<f32>,
    pub rail_12v: Channel<RailReading>,
    pub rail_5v: Channel<RailReading>,
    pub co_ppm: Channel<f32>,
    pub lpg_ppm: Channel<f32>,
    pub methane_ppm: Channel<f32>,
    pub smoke_ppm: Channel<f32>,
    /// Outside air (DS18B20).  Shown, never evaluated.
    pub exterior_c: Channel<f32>,
    /// Whether each gas cell's readings may be evaluated at all.
    pub gates: GasGates,
}

impl SensorStore {
    /// Record a successful sample taken at `now_ms`.
    pub fn apply(&mut self, reading: SensorReading, now_ms: u64, level: &LevelCalibration) {
        match reading {
            SensorReading::Climate(c) => {
                self.temperature_c.accept(
                    c.temperature_c,
                    within(c.temperature_c, TEMPERATURE_RANGE_C),
                    now_ms,
                );
                self.humidity_pct.accept(
                    c.humidity_pct,
                    within(c.humidity_pct, HUMIDITY_RANGE_PCT),
                    now_ms,
                );
            }
            SensorReading::Attitude(a) => {
                let finite = a.roll_deg.is_finite() && a.pitch_deg.is_finite();
                self.attitude.accept(a, finite, now_ms);
                self.refresh_tilt(level);
            }
            SensorReading::Rail(rail, r) => {
                let plausible = within(r.bus_voltage_v, VOLTAGE_RANGE_V) && r.current_a.is_finite();
                match rail {
                    Rail::V12 => self.rail_12v.accept(r, plausible, now_ms),
                    Rail::V5 => self.rail_5v.accept(r, plausible, now_ms),
                }
            }
            SensorReading::CarbonMonoxide { ppm } => self.co_ppm.accept_ppm(ppm, now_ms),
            SensorReading::Combustible(c) => {
                self.lpg_ppm.accept_ppm(c.lpg_ppm, now_ms);
                self.methane_ppm.accept_ppm(c.methane_ppm, now_ms);
                self.smoke_ppm.accept_ppm(c.smoke_ppm, now_ms);
            }
            SensorReading::Exterior { temperature_c } => {
                self.exterior_c.accept(
                    temperature_c,
                    within(temperature_c, TEMPERATURE_RANGE_C),
                    now_ms,
                );
            }
        }
    }

    /// Clear validity of every quantity `id` produces.
    pub fn invalidate(&mut self, id: SensorId) {
        match id {
            SensorId::Climate => {
                self.temperature_c.invalidate();
                self.humidity_pct.invalidate();
            }
            SensorId::Attitude => {
                self.attitude.invalidate();
                self.tilt_deg.invalidate();
            }
            SensorId::Rail12v => self.rail_12v.invalidate(),
            SensorId::Rail5v => self.rail_5v.invalidate(),
            SensorId::CarbonMonoxide => self.co_ppm.invalidate(),
            SensorId::Combustible => {
                self.lpg_ppm.invalidate();
                self.methane_ppm.invalidate();
                self.smoke_ppm.invalidate();
            }
            SensorId::Exterior => self.exterior_c.invalidate(),
        }
    }

    /// Recompute tilt from the raw attitude, e.g. after the offsets change.
    /// Keeps the attitude's measurement timestamp.
    pub fn refresh_tilt(&mut self, level: &LevelCalibration) {
        match self.attitude.get() {
            Some(a) => {
                let roll = a.roll_deg - level.roll_offset_deg;
                let pitch = a.pitch_deg - level.pitch_offset_deg;
                let tilt = roll.hypot(pitch);
                self.tilt_deg
                    .accept(tilt, tilt.is_finite(), self.attitude.updated_ms);
            }
            None => self.tilt_deg.invalidate(),
        }
    }
}

// ---------------------------------------------------------------------------
// MonitorContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct MonitorContext {
    // -- Timing --
    /// Monotonic time of the current iteration.
    pub now_ms: u64,
    /// Time spent in the current mode.
    pub ms_in_state: u64,

    // -- Pipeline --
    pub sensors: SensorStore,
    /// Rebuilt from scratch every iteration.
    pub alerts: AlertBuffer,
    pub severity: SeverityState,

    // -- Presentation --
    /// Safety view pinned; set and cleared by the `Alert` mode.
    pub safety_view_forced: bool,

    // -- Configuration --
    pub config: SystemConfig,
}

impl MonitorContext {
    pub fn new(config: SystemConfig, now_ms: u64) -> Self {
        Self {
            now_ms,
            ms_in_state: 0,
            sensors: SensorStore::default(),
            alerts: AlertBuffer::new(),
            severity: SeverityState::default(),
            safety_view_forced: false,
            config,
        }
    }

    pub fn navigation_blocked(&self) -> bool {
        self.severity.navigation_blocked
    }

    pub fn gas_warmed_up(&self) -> bool {
        self.sensors.gates.warmed_up()
    }
}
