//! Fuzz target: evaluation + arbitration
//!
//! Decodes arbitrary bytes into sensor readings (NaN, infinities and
//! out-of-range values included), pushes them through the store, and
//! verifies:
//! - No panics anywhere in apply / evaluate / arbitrate
//! - Every record carries a finite measurement (NaN is dropped, overrange saturates)
//! - Navigation is blocked exactly at DANGER and above
//!
//! cargo fuzz run fuzz_evaluate

#![no_main]

use libfuzzer_sys::fuzz_target;
use vanwatch::alerts::{AlertBuffer, Severity};
use vanwatch::arbitration::arbitrate;
use vanwatch::config::SystemConfig;
use vanwatch::evaluation::evaluate;
use vanwatch::fsm::context::SensorStore;
use vanwatch::heating::{GasGate, GasGates};
use vanwatch::sensors::{
    AttitudeReading, ClimateReading, CombustibleReading, Rail, RailReading, SensorReading,
};

fn gate(b: u8) -> GasGate {
    match b % 3 {
        0 => GasGate::Preheating,
        1 => GasGate::Purging,
        _ => GasGate::Ready,
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let config = SystemConfig::default();
    let level = config.level;
    let mut store = SensorStore::default();
    store.gates = GasGates {
        co: gate(data[0]),
        combustible: gate(data[1]),
    };

    let mut floats = data[2..]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]));
    let mut next = || floats.next().unwrap_or(0.0);

    let readings = [
        SensorReading::Climate(ClimateReading {
            temperature_c: next(),
            humidity_pct: next(),
        }),
        SensorReading::Attitude(AttitudeReading {
            roll_deg: next(),
            pitch_deg: next(),
        }),
        SensorReading::Rail(
            Rail::V12,
            RailReading {
                bus_voltage_v: next(),
                current_a: next(),
            },
        ),
        SensorReading::Rail(
            Rail::V5,
            RailReading {
                bus_voltage_v: next(),
                current_a: next(),
            },
        ),
        SensorReading::CarbonMonoxide { ppm: next() },
        SensorReading::Combustible(CombustibleReading {
            lpg_ppm: next(),
            methane_ppm: next(),
            smoke_ppm: next(),
        }),
        SensorReading::Exterior {
            temperature_c: next(),
        },
    ];
    for (i, r) in readings.into_iter().enumerate() {
        store.apply(r, i as u64, &level);
    }

    let mut out = AlertBuffer::new();
    evaluate(&store, &config, &mut out);

    for r in out.records() {
        assert!(r.measured.is_finite(), "record from implausible value: {r:?}");
    }

    let state = arbitrate(&out, &config.alarm);
    assert_eq!(state.navigation_blocked, state.level >= Severity::Danger);
    assert!(usize::from(state.active_count) <= vanwatch::alerts::ALERT_CAPACITY);
});
