//! MQ-7 (CO) and MQ-2 (LPG / methane / smoke) metal-oxide gas cells.
//!
//! Both read the analog output of a load-resistor divider through an
//! ESP32-S3 ADC1 channel.  The sensing resistance `Rs` is recovered from
//! the divider, normalised against the clean-air resistance `R0`, and
//! mapped to ppm with the cell's log-log response curve.
//!
//! Heater timing is not handled here; the scheduler decides whether a
//! reading is worth taking.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from static `AtomicU16`s for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use super::{CombustibleReading, saturate_ppm};
use crate::error::SensorError;

#[cfg(not(target_os = "espidf"))]
static SIM_MQ7_ADC: AtomicU16 = AtomicU16::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_MQ2_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_mq7_adc(raw: u16) {
    SIM_MQ7_ADC.store(raw, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_mq2_adc(raw: u16) {
    SIM_MQ2_ADC.store(raw, Ordering::Relaxed);
}

const ADC_FULL_SCALE: f32 = 4095.0;
const ADC_REF_V: f32 = 3.3;
/// 10 k / 20 k divider between the 5 V module output and the ADC pin.
const DIVIDER_GAIN: f32 = 1.5;
const SUPPLY_V: f32 = 5.0;
/// Below this the module is unplugged or the heater is dead.
const MIN_SIGNAL_V: f32 = 0.05;

/// Power-law response `ppm = (ratio / scale) ^ exponent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    pub scale: f32,
    pub exponent: f32,
}

impl Curve {
    pub fn ppm(&self, ratio: f32) -> f32 {
        (ratio / self.scale).powf(self.exponent)
    }
}

pub const CO_CURVE: Curve = Curve { scale: 4.0, exponent: -1.49 };
pub const LPG_CURVE: Curve = Curve { scale: 2.5, exponent: -2.08 };
pub const METHANE_CURVE: Curve = Curve { scale: 3.3, exponent: -2.63 };
pub const SMOKE_CURVE: Curve = Curve { scale: 2.0, exponent: -2.22 };

/// Load resistor and clean-air baseline for one cell (kΩ).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellCalibration {
    pub load_kohm: f32,
    pub r0_kohm: f32,
}

impl Default for CellCalibration {
    fn default() -> Self {
        Self {
            load_kohm: 10.0,
            r0_kohm: 10.0,
        }
    }
}

impl CellCalibration {
    /// `Rs / R0` from a raw 12-bit ADC sample.
    pub fn ratio(&self, raw: u16) -> Result<f32, SensorError> {
        let volts = f32::from(raw) / ADC_FULL_SCALE * ADC_REF_V * DIVIDER_GAIN;
        if volts < MIN_SIGNAL_V || volts >= SUPPLY_V {
            return Err(SensorError::OutOfRange);
        }
        let rs = (SUPPLY_V - volts) / volts * self.load_kohm;
        Ok(rs / self.r0_kohm)
    }
}

fn curve_ppm(curve: &Curve, ratio: f32) -> Result<f32, SensorError> {
    saturate_ppm(curve.ppm(ratio)).ok_or(SensorError::OutOfRange)
}

/// All three MQ-2 curves at one `Rs / R0`.  Each gas saturates on its
/// own; methane pinning at the ceiling does not hide LPG or smoke.
pub fn combustible_at(ratio: f32) -> Result<CombustibleReading, SensorError> {
    Ok(CombustibleReading {
        lpg_ppm: curve_ppm(&LPG_CURVE, ratio)?,
        methane_ppm: curve_ppm(&METHANE_CURVE, ratio)?,
        smoke_ppm: curve_ppm(&SMOKE_CURVE, ratio)?,
    })
}

// ── MQ-7 ──────────────────────────────────────────────────────

pub struct Mq7Sensor {
    cal: CellCalibration,
}

impl Default for Mq7Sensor {
    fn default() -> Self {
        Self::new()
    }
}

impl Mq7Sensor {
    pub fn new() -> Self {
        Self {
            cal: CellCalibration::default(),
        }
    }

    pub fn set_calibration(&mut self, cal: CellCalibration) {
        self.cal = cal;
    }

    /// CO concentration in ppm.
    pub fn sample(&mut self) -> Result<f32, SensorError> {
        let ratio = self.cal.ratio(read_adc(Cell::Mq7)?)?;
        curve_ppm(&CO_CURVE, ratio)
    }
}

// ── MQ-2 ──────────────────────────────────────────────────────

pub struct Mq2Sensor {
    cal: CellCalibration,
}

impl Default for Mq2Sensor {
    fn default() -> Self {
        Self::new()
    }
}

impl Mq2Sensor {
    pub fn new() -> Self {
        Self {
            cal: CellCalibration::default(),
        }
    }

    pub fn set_calibration(&mut self, cal: CellCalibration) {
        self.cal = cal;
    }

    pub fn sample(&mut self) -> Result<CombustibleReading, SensorError> {
        let ratio = self.cal.ratio(read_adc(Cell::Mq2)?)?;
        combustible_at(ratio)
    }
}

// ── ADC access ────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Cell {
    Mq7,
    Mq2,
}

#[cfg(target_os = "espidf")]
fn read_adc(cell: Cell) -> Result<u16, SensorError> {
    use crate::drivers::hw_init;
    let channel = match cell {
        Cell::Mq7 => hw_init::ADC1_CH_MQ7,
        Cell::Mq2 => hw_init::ADC1_CH_MQ2,
    };
    hw_init::adc1_read(channel).ok_or(SensorError::AdcReadFailed)
}

#[cfg(not(target_os = "espidf"))]
fn read_adc(cell: Cell) -> Result<u16, SensorError> {
    Ok(match cell {
        Cell::Mq7 => SIM_MQ7_ADC.load(Ordering::Relaxed),
        Cell::Mq2 => SIM_MQ2_ADC.load(Ordering::Relaxed),
    })
}
