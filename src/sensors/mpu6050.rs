//! InvenSense MPU6050 accelerometer used as an inclinometer.
//!
//! Roll and pitch come from the gravity vector only; the van is parked
//! when this matters, so no gyro fusion is needed.

use embedded_hal::i2c::I2c;

use super::AttitudeReading;
use crate::error::SensorError;

pub const DEFAULT_ADDRESS: u8 = 0x68;

const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_WHO_AM_I: u8 = 0x75;

const WHO_AM_I: u8 = 0x68;
/// ±2 g full scale.
const ACCEL_FS_2G: u8 = 0x00;

pub struct Mpu6050 {
    address: u8,
    awake: bool,
}

impl Mpu6050 {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            awake: false,
        }
    }

    fn wake<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        let mut id = [0u8; 1];
        i2c.write_read(self.address, &[REG_WHO_AM_I], &mut id)
            .map_err(|_| SensorError::BusReadFailed)?;
        if id[0] != WHO_AM_I {
            return Err(SensorError::NotPresent);
        }
        i2c.write(self.address, &[REG_PWR_MGMT_1, 0x00])
            .map_err(|_| SensorError::BusReadFailed)?;
        i2c.write(self.address, &[REG_ACCEL_CONFIG, ACCEL_FS_2G])
            .map_err(|_| SensorError::BusReadFailed)?;
        self.awake = true;
        Ok(())
    }

    pub fn sample<I: I2c>(&mut self, i2c: &mut I) -> Result<AttitudeReading, SensorError> {
        if !self.awake {
            self.wake(i2c)?;
        }

        let mut raw = [0u8; 6];
        i2c.write_read(self.address, &[REG_ACCEL_XOUT_H], &mut raw)
            .map_err(|_| SensorError::BusReadFailed)?;
        let ax = f32::from(i16::from_be_bytes([raw[0], raw[1]]));
        let ay = f32::from(i16::from_be_bytes([raw[2], raw[3]]));
        let az = f32::from(i16::from_be_bytes([raw[4], raw[5]]));

        if ax == 0.0 && ay == 0.0 && az == 0.0 {
            // A powered accelerometer always sees gravity.
            return Err(SensorError::OutOfRange);
        }

        Ok(attitude_from_accel(ax, ay, az))
    }
}

/// Roll/pitch (degrees) from a gravity vector in any consistent unit.
pub fn attitude_from_accel(ax: f32, ay: f32, az: f32) -> AttitudeReading {
    AttitudeReading {
        roll_deg: ay.atan2(az).to_degrees(),
        pitch_deg: (-ax).atan2(ay.hypot(az)).to_degrees(),
    }
}
