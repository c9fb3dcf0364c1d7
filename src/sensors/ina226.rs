//! TI INA226 rail monitor (one per supply rail).
//!
//! Reads bus voltage and shunt voltage directly; current is derived from
//! the shunt resistance, so the calibration register is never used.

use embedded_hal::i2c::I2c;

use super::{RailReading, VOLTAGE_RANGE_V, within};
use crate::error::SensorError;

pub const ADDRESS_12V: u8 = 0x40;
pub const ADDRESS_5V: u8 = 0x41;

/// 2 mΩ shunt on the 12 V house rail (±40 A full scale).
pub const SHUNT_12V_OHMS: f32 = 0.002;
/// 10 mΩ shunt on the 5 V rail (±8 A full scale).
pub const SHUNT_5V_OHMS: f32 = 0.010;

const REG_CONFIG: u8 = 0x00;
const REG_SHUNT: u8 = 0x01;
const REG_BUS: u8 = 0x02;
const REG_MANUFACTURER: u8 = 0xFE;

const MANUFACTURER_TI: u16 = 0x5449;
/// 16 averages, 1.1 ms bus and shunt conversion, continuous shunt + bus.
const CONFIG_CONTINUOUS_AVG16: u16 = 0x4527;

const BUS_LSB_V: f32 = 0.001_25;
const SHUNT_LSB_V: f32 = 0.000_002_5;

pub struct Ina226 {
    address: u8,
    shunt_ohms: f32,
    configured: bool,
}

impl Ina226 {
    pub fn new(address: u8, shunt_ohms: f32) -> Self {
        Self {
            address,
            shunt_ohms,
            configured: false,
        }
    }

    fn read_reg<I: I2c>(&self, i2c: &mut I, reg: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        i2c.write_read(self.address, &[reg], &mut buf)
            .map_err(|_| SensorError::BusReadFailed)?;
        Ok(u16::from_be_bytes(buf))
    }

    fn configure<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        if self.read_reg(i2c, REG_MANUFACTURER)? != MANUFACTURER_TI {
            return Err(SensorError::NotPresent);
        }
        let [hi, lo] = CONFIG_CONTINUOUS_AVG16.to_be_bytes();
        i2c.write(self.address, &[REG_CONFIG, hi, lo])
            .map_err(|_| SensorError::BusReadFailed)?;
        self.configured = true;
        Ok(())
    }

    pub fn sample<I: I2c>(&mut self, i2c: &mut I) -> Result<RailReading, SensorError> {
        if !self.configured {
            self.configure(i2c)?;
        }

        let bus_raw = self.read_reg(i2c, REG_BUS)?;
        let shunt_raw = self.read_reg(i2c, REG_SHUNT)? as i16;

        let reading = RailReading {
            bus_voltage_v: f32::from(bus_raw) * BUS_LSB_V,
            current_a: f32::from(shunt_raw) * SHUNT_LSB_V / self.shunt_ohms,
        };
        if !within(reading.bus_voltage_v, VOLTAGE_RANGE_V) {
            return Err(SensorError::OutOfRange);
        }
        Ok(reading)
    }
}
