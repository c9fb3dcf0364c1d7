//! Sensor subsystem: reading types, plausibility ranges, leaf drivers,
//! and the aggregating [`SensorHub`].
//!
//! Drivers convert raw bus/analog values into physical units and nothing
//! more.  Scheduling, gating and threshold logic live in the core.
//!
//! | Sensor   | Bus        | Quantity                          |
//! |----------|------------|-----------------------------------|
//! | BME280   | I²C 0x76   | cabin temperature, humidity       |
//! | MPU6050  | I²C 0x68   | roll, pitch                       |
//! | INA226   | I²C 0x40   | 12 V rail voltage / current       |
//! | INA226   | I²C 0x41   | 5 V rail voltage / current        |
//! | MQ-7     | ADC1       | carbon monoxide                   |
//! | MQ-2     | ADC1       | LPG, methane, smoke               |
//! | DS18B20  | 1-Wire     | exterior temperature              |

pub mod bme280;
pub mod ds18b20;
pub mod ina226;
pub mod mpu6050;
pub mod mq;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::SensorError;
use bme280::Bme280;
use ds18b20::{Ds18b20, OneWire};
use ina226::Ina226;
use mpu6050::Mpu6050;
use mq::{Mq2Sensor, Mq7Sensor};

// ═══════════════════════════════════════════════════════════════
//  Identity
// ═══════════════════════════════════════════════════════════════

/// One scheduling slot per physical sensor channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SensorId {
    Climate = 0,
    Attitude = 1,
    Rail12v = 2,
    Rail5v = 3,
    CarbonMonoxide = 4,
    Combustible = 5,
    Exterior = 6,
}

impl SensorId {
    pub const COUNT: usize = 7;

    pub const ALL: [SensorId; Self::COUNT] = [
        Self::Climate,
        Self::Attitude,
        Self::Rail12v,
        Self::Rail5v,
        Self::CarbonMonoxide,
        Self::Combustible,
        Self::Exterior,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Climate => "climate",
            Self::Attitude => "attitude",
            Self::Rail12v => "rail-12v",
            Self::Rail5v => "rail-5v",
            Self::CarbonMonoxide => "co",
            Self::Combustible => "combustible",
            Self::Exterior => "exterior",
        }
    }
}

/// The two gas cells that need heater gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GasSensor {
    /// MQ-7 carbon monoxide (cyclic heater).
    CarbonMonoxide,
    /// MQ-2 LPG / methane / smoke (one-shot preheat).
    Combustible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rail {
    V12,
    V5,
}

// ═══════════════════════════════════════════════════════════════
//  Readings
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClimateReading {
    pub temperature_c: f32,
    pub humidity_pct: f32,
}

/// Raw attitude from the accelerometer, before calibration offsets.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttitudeReading {
    pub roll_deg: f32,
    pub pitch_deg: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RailReading {
    pub bus_voltage_v: f32,
    pub current_a: f32,
}

impl RailReading {
    pub fn power_w(&self) -> f32 {
        self.bus_voltage_v * self.current_a
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CombustibleReading {
    pub lpg_ppm: f32,
    pub methane_ppm: f32,
    pub smoke_ppm: f32,
}

/// One successful sample, tagged by source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorReading {
    Climate(ClimateReading),
    Attitude(AttitudeReading),
    Rail(Rail, RailReading),
    CarbonMonoxide { ppm: f32 },
    Combustible(CombustibleReading),
    /// Outside air, telemetry only.
    Exterior { temperature_c: f32 },
}

// ═══════════════════════════════════════════════════════════════
//  Plausibility
// ═══════════════════════════════════════════════════════════════

pub const TEMPERATURE_RANGE_C: (f32, f32) = (-50.0, 100.0);
pub const HUMIDITY_RANGE_PCT: (f32, f32) = (0.0, 100.0);
pub const VOLTAGE_RANGE_V: (f32, f32) = (0.0, 20.0);
pub const PPM_RANGE: (f32, f32) = (0.0, 10_000.0);

/// Inclusive range check that also rejects NaN.
pub fn within(value: f32, (lo, hi): (f32, f32)) -> bool {
    value >= lo && value <= hi
}

/// Pin a concentration to the top of [`PPM_RANGE`].  Above the ceiling
/// the cell is saturated, not broken, so the value stays usable.
/// `None` for NaN or negative input.
pub fn saturate_ppm(ppm: f32) -> Option<f32> {
    (ppm >= PPM_RANGE.0).then(|| ppm.min(PPM_RANGE.1))
}

// ═══════════════════════════════════════════════════════════════
//  Sensor hub
// ═══════════════════════════════════════════════════════════════

/// Owns the shared I²C bus, the conversion delay, and every driver.
pub struct SensorHub<I, D, W> {
    i2c: I,
    delay: D,
    pub climate: Bme280,
    pub attitude: Mpu6050,
    pub rail_12v: Ina226,
    pub rail_5v: Ina226,
    pub co: Mq7Sensor,
    pub combustible: Mq2Sensor,
    pub exterior: Ds18b20<W>,
}

impl<I: I2c, D: DelayNs, W: OneWire> SensorHub<I, D, W> {
    pub fn new(i2c: I, delay: D, wire: W) -> Self {
        Self {
            i2c,
            delay,
            climate: Bme280::new(bme280::DEFAULT_ADDRESS),
            attitude: Mpu6050::new(mpu6050::DEFAULT_ADDRESS),
            rail_12v: Ina226::new(ina226::ADDRESS_12V, ina226::SHUNT_12V_OHMS),
            rail_5v: Ina226::new(ina226::ADDRESS_5V, ina226::SHUNT_5V_OHMS),
            co: Mq7Sensor::new(),
            combustible: Mq2Sensor::new(),
            exterior: Ds18b20::new(wire),
        }
    }

    /// Sample one sensor.  Only the climate path waits on a conversion,
    /// and only for [`bme280::CLIMATE_CONVERSION_BUDGET_MS`].
    pub fn sample(&mut self, id: SensorId) -> Result<SensorReading, SensorError> {
        match id {
            SensorId::Climate => self
                .climate
                .sample(&mut self.i2c, &mut self.delay)
                .map(SensorReading::Climate),
            SensorId::Attitude => self
                .attitude
                .sample(&mut self.i2c)
                .map(SensorReading::Attitude),
            SensorId::Rail12v => self
                .rail_12v
                .sample(&mut self.i2c)
                .map(|r| SensorReading::Rail(Rail::V12, r)),
            SensorId::Rail5v => self
                .rail_5v
                .sample(&mut self.i2c)
                .map(|r| SensorReading::Rail(Rail::V5, r)),
            SensorId::CarbonMonoxide => self
                .co
                .sample()
                .map(|ppm| SensorReading::CarbonMonoxide { ppm }),
            SensorId::Combustible => self.combustible.sample().map(SensorReading::Combustible),
            SensorId::Exterior => self
                .exterior
                .sample()
                .map(|temperature_c| SensorReading::Exterior { temperature_c }),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Test bus
// ═══════════════════════════════════════════════════════════════
