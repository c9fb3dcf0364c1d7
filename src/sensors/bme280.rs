//! Bosch BME280 cabin climate sensor (temperature + humidity).
//!
//! Runs in forced mode: each sample triggers one conversion, waits a
//! fixed bounded time for it to finish, then reads the result.  This is
//! the only blocking wait in the control loop.
//!
//! Compensation uses the integer formulas from the Bosch datasheet
//! (section 4.2.3), evaluated in `i64` so out-of-range raw values cannot
//! overflow.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::{ClimateReading, HUMIDITY_RANGE_PCT, TEMPERATURE_RANGE_C, within};
use crate::error::SensorError;

pub const DEFAULT_ADDRESS: u8 = 0x76;

/// Worst-case wait for one forced-mode conversion at 1× oversampling
/// (datasheet t_measure,max = 9.3 ms).  Delays the whole control loop.
pub const CLIMATE_CONVERSION_BUDGET_MS: u32 = 10;

const REG_CHIP_ID: u8 = 0xD0;
const REG_CALIB_00: u8 = 0x88;
const REG_CALIB_26: u8 = 0xE1;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_STATUS: u8 = 0xF3;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_DATA: u8 = 0xF7;

const CHIP_ID: u8 = 0x60;
/// osrs_h = 1×
const CTRL_HUM_X1: u8 = 0x01;
/// osrs_t = 1×, osrs_p = 1×, mode = forced
const CTRL_MEAS_FORCED: u8 = 0b001_001_01;
const STATUS_MEASURING: u8 = 0x08;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Calibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    pub h4: i16,
    pub h5: i16,
    pub h6: i8,
}

impl Calibration {
    /// Decode the 0x88..0xA1 block (26 bytes) and the 0xE1..0xE7 block (7 bytes).
    pub fn parse(block0: &[u8; 26], block1: &[u8; 7]) -> Self {
        Self {
            t1: u16::from_le_bytes([block0[0], block0[1]]),
            t2: i16::from_le_bytes([block0[2], block0[3]]),
            t3: i16::from_le_bytes([block0[4], block0[5]]),
            h1: block0[25],
            h2: i16::from_le_bytes([block1[0], block1[1]]),
            h3: block1[2],
            h4: (i16::from(block1[3] as i8) << 4) | i16::from(block1[4] & 0x0F),
            h5: (i16::from(block1[5] as i8) << 4) | i16::from(block1[4] >> 4),
            h6: block1[6] as i8,
        }
    }

    /// Returns (`t_fine`, temperature in 0.01 °C).
    pub fn compensate_temperature(&self, adc_t: i32) -> (i64, i64) {
        let adc_t = i64::from(adc_t);
        let t1 = i64::from(self.t1);
        let var1 = (((adc_t >> 3) - (t1 << 1)) * i64::from(self.t2)) >> 11;
        let d = (adc_t >> 4) - t1;
        let var2 = (((d * d) >> 12) * i64::from(self.t3)) >> 14;
        let t_fine = var1 + var2;
        (t_fine, (t_fine * 5 + 128) >> 8)
    }

    /// Relative humidity in Q22.10 %RH, clamped to 0..=100 %.
    pub fn compensate_humidity(&self, adc_h: i32, t_fine: i64) -> u32 {
        let adc_h = i64::from(adc_h);
        let v = t_fine - 76_800;
        let mut x = ((((adc_h << 14) - (i64::from(self.h4) << 20) - (i64::from(self.h5) * v))
            + 16_384)
            >> 15)
            * (((((((v * i64::from(self.h6)) >> 10)
                * (((v * i64::from(self.h3)) >> 11) + 32_768))
                >> 10)
                + 2_097_152)
                * i64::from(self.h2)
                + 8_192)
                >> 14);
        x -= ((((x >> 15) * (x >> 15)) >> 7) * i64::from(self.h1)) >> 4;
        x = x.clamp(0, 419_430_400);
        (x >> 12) as u32
    }
}

pub struct Bme280 {
    address: u8,
    calibration: Option<Calibration>,
}

impl Bme280 {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            calibration: None,
        }
    }

    pub fn is_initialised(&self) -> bool {
        self.calibration.is_some()
    }

    /// Identify the chip and load its trim parameters.  Called lazily by
    /// [`sample`](Self::sample) so a sensor plugged in late is picked up.
    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> Result<Calibration, SensorError> {
        let mut id = [0u8; 1];
        i2c.write_read(self.address, &[REG_CHIP_ID], &mut id)
            .map_err(|_| SensorError::BusReadFailed)?;
        if id[0] != CHIP_ID {
            return Err(SensorError::NotPresent);
        }

        let mut block0 = [0u8; 26];
        let mut block1 = [0u8; 7];
        i2c.write_read(self.address, &[REG_CALIB_00], &mut block0)
            .map_err(|_| SensorError::BusReadFailed)?;
        i2c.write_read(self.address, &[REG_CALIB_26], &mut block1)
            .map_err(|_| SensorError::BusReadFailed)?;
        i2c.write(self.address, &[REG_CTRL_HUM, CTRL_HUM_X1])
            .map_err(|_| SensorError::BusReadFailed)?;

        let cal = Calibration::parse(&block0, &block1);
        self.calibration = Some(cal);
        Ok(cal)
    }

    pub fn sample<I: I2c, D: DelayNs>(
        &mut self,
        i2c: &mut I,
        delay: &mut D,
    ) -> Result<ClimateReading, SensorError> {
        let cal = match self.calibration {
            Some(cal) => cal,
            None => self.init(i2c)?,
        };

        i2c.write(self.address, &[REG_CTRL_MEAS, CTRL_MEAS_FORCED])
            .map_err(|_| SensorError::BusReadFailed)?;
        delay.delay_ms(CLIMATE_CONVERSION_BUDGET_MS);

        let mut status = [0u8; 1];
        i2c.write_read(self.address, &[REG_STATUS], &mut status)
            .map_err(|_| SensorError::BusReadFailed)?;
        if status[0] & STATUS_MEASURING != 0 {
            return Err(SensorError::ConversionTimeout);
        }

        let mut raw = [0u8; 8];
        i2c.write_read(self.address, &[REG_DATA], &mut raw)
            .map_err(|_| SensorError::BusReadFailed)?;

        let adc_t =
            (i32::from(raw[3]) << 12) | (i32::from(raw[4]) << 4) | (i32::from(raw[5]) >> 4);
        let adc_h = (i32::from(raw[6]) << 8) | i32::from(raw[7]);

        let (t_fine, centi_c) = cal.compensate_temperature(adc_t);
        let humidity = cal.compensate_humidity(adc_h, t_fine);

        let reading = ClimateReading {
            temperature_c: centi_c as f32 / 100.0,
            humidity_pct: humidity as f32 / 1024.0,
        };
        if !within(reading.temperature_c, TEMPERATURE_RANGE_C)
            || !within(reading.humidity_pct, HUMIDITY_RANGE_PCT)
        {
            return Err(SensorError::OutOfRange);
        }
        Ok(reading)
    }
}
