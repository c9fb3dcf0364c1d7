//! Mock hardware adapter for integration tests.
//!
//! Answers every [`SensorPort::sample`] from a scripted reading table,
//! can inject read failures per sensor, and records every actuator call
//! so tests can assert on the full output history without touching real
//! GPIO/LEDC registers.

use std::collections::{HashMap, HashSet};

use vanwatch::app::events::{AppEvent, TelemetryData};
use vanwatch::app::ports::{ActuatorPort, EventSink, SensorPort};
use vanwatch::app::service::MonitorService;
use vanwatch::config::{SampleIntervals, SystemConfig};
use vanwatch::error::SensorError;
use vanwatch::sensors::{
    AttitudeReading, ClimateReading, CombustibleReading, Rail, RailReading, SensorId,
    SensorReading,
};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Buzzer(bool),
    CoHeater(bool),
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    readings: HashMap<SensorId, SensorReading>,
    failing: HashSet<SensorId>,
    pub sampled: Vec<SensorId>,
    pub calls: Vec<ActuatorCall>,
}

#[allow(dead_code)]
impl MockHardware {
    /// Every sensor reports a calm, parked van.
    pub fn new() -> Self {
        let mut hw = Self {
            readings: HashMap::new(),
            failing: HashSet::new(),
            sampled: Vec::new(),
            calls: Vec::new(),
        };
        hw.set_climate(21.0, 45.0);
        hw.set_attitude(0.0, 0.0);
        hw.set_rail(Rail::V12, 12.8, 2.0);
        hw.set_rail(Rail::V5, 5.05, 0.5);
        hw.set_co(5.0);
        hw.set_combustible(20.0, 10.0, 30.0);
        hw.set_exterior(9.5);
        hw
    }

    pub fn set_climate(&mut self, temperature_c: f32, humidity_pct: f32) {
        self.readings.insert(
            SensorId::Climate,
            SensorReading::Climate(ClimateReading {
                temperature_c,
                humidity_pct,
            }),
        );
    }

    pub fn set_attitude(&mut self, roll_deg: f32, pitch_deg: f32) {
        self.readings.insert(
            SensorId::Attitude,
            SensorReading::Attitude(AttitudeReading {
                roll_deg,
                pitch_deg,
            }),
        );
    }

    pub fn set_rail(&mut self, rail: Rail, bus_voltage_v: f32, current_a: f32) {
        let id = match rail {
            Rail::V12 => SensorId::Rail12v,
            Rail::V5 => SensorId::Rail5v,
        };
        self.readings.insert(
            id,
            SensorReading::Rail(
                rail,
                RailReading {
                    bus_voltage_v,
                    current_a,
                },
            ),
        );
    }

    pub fn set_co(&mut self, ppm: f32) {
        self.readings
            .insert(SensorId::CarbonMonoxide, SensorReading::CarbonMonoxide { ppm });
    }

    pub fn set_combustible(&mut self, lpg_ppm: f32, methane_ppm: f32, smoke_ppm: f32) {
        self.readings.insert(
            SensorId::Combustible,
            SensorReading::Combustible(CombustibleReading {
                lpg_ppm,
                methane_ppm,
                smoke_ppm,
            }),
        );
    }

    pub fn set_exterior(&mut self, temperature_c: f32) {
        self.readings
            .insert(SensorId::Exterior, SensorReading::Exterior { temperature_c });
    }

    /// Every subsequent read of `id` fails until [`heal`](Self::heal).
    pub fn fail(&mut self, id: SensorId) {
        self.failing.insert(id);
    }

    pub fn heal(&mut self, id: SensorId) {
        self.failing.remove(&id);
    }

    pub fn sample_count(&self, id: SensorId) -> usize {
        self.sampled.iter().filter(|s| **s == id).count()
    }

    pub fn buzzer_writes(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::Buzzer(on) => Some(*on),
                ActuatorCall::CoHeater(_) => None,
            })
            .collect()
    }

    pub fn heater_writes(&self) -> Vec<bool> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::CoHeater(high) => Some(*high),
                ActuatorCall::Buzzer(_) => None,
            })
            .collect()
    }

    pub fn buzzer_on(&self) -> bool {
        self.buzzer_writes().last().copied().unwrap_or(false)
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn sample(&mut self, id: SensorId) -> Result<SensorReading, SensorError> {
        self.sampled.push(id);
        if self.failing.contains(&id) {
            return Err(SensorError::BusReadFailed);
        }
        self.readings.get(&id).copied().ok_or(SensorError::NotPresent)
    }
}

impl ActuatorPort for MockHardware {
    fn set_buzzer(&mut self, on: bool) {
        self.calls.push(ActuatorCall::Buzzer(on));
    }

    fn set_co_heater(&mut self, high: bool) {
        self.calls.push(ActuatorCall::CoHeater(high));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn telemetry(&self) -> Vec<&TelemetryData> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Telemetry(t) => Some(t),
                _ => None,
            })
            .collect()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Control-loop period used by every rig.
pub const STEP_MS: u64 = 20;

/// Compressed timing so a full heater cycle fits in a few seconds:
///
/// ```text
/// combustible preheat  0 ─ 500
/// CO preheat           0 ─ 1000
/// CO High (purging)    1000 ─ 1500, 2500 ─ 3000, ...
/// CO Low (measuring)   1500 ─ 2500, 3000 ─ 4000, ...
/// ```
pub fn fast_config() -> SystemConfig {
    let mut c = SystemConfig::default();
    c.timing.co_preheat_ms = 1_000;
    c.timing.co_high_phase_ms = 500;
    c.timing.co_low_phase_ms = 1_000;
    c.timing.combustible_preheat_ms = 500;
    c.timing.telemetry_interval_ms = 1_000;
    c.timing.intervals = SampleIntervals {
        climate_ms: 100,
        attitude_ms: 100,
        rail_ms: 100,
        co_ms: 100,
        combustible_ms: 100,
        exterior_ms: 1_000,
    };
    c
}

pub struct Rig {
    pub app: MonitorService,
    pub hw: MockHardware,
    pub sink: RecordingSink,
    /// Timestamp of the next tick.
    pub now: u64,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        let mut app = MonitorService::new(fast_config(), 0).expect("fast config is valid");
        let mut sink = RecordingSink::new();
        app.start(&mut sink);
        Self {
            app,
            hw: MockHardware::new(),
            sink,
            now: 0,
        }
    }

    pub fn tick(&mut self) {
        self.app.tick(self.now, &mut self.hw, &mut self.sink);
        self.now += STEP_MS;
    }

    /// Tick every `STEP_MS` up to and including `t`.
    pub fn run_until(&mut self, t: u64) {
        while self.now <= t {
            self.tick();
        }
    }
}
