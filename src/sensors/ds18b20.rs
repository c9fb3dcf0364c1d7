//! DS18B20 exterior temperature sensor on a bit-banged 1-Wire bus.
//!
//! A single sensor sits on the bus, so every transaction is addressed
//! with SKIP ROM.  The driver never waits out the 750 ms conversion:
//! each sample collects the result of the conversion the previous sample
//! started, then starts the next one.  At the default 10 s interval the
//! result is always ready; if it is not, the sample reports
//! [`SensorError::NotReady`] and the stored value is left alone.
//!
//! Bus time per sample is two reset pulses plus a dozen bytes, about
//! 8 ms, all spent inside the slot timing below.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use log::warn;

use crate::error::SensorError;

const CMD_SKIP_ROM: u8 = 0xCC;
const CMD_CONVERT_T: u8 = 0x44;
const CMD_READ_SCRATCHPAD: u8 = 0xBE;

/// Temperature register after power-up (+85 °C), before any conversion.
const POWER_ON_RAW: i16 = 0x0550;

/// Measurement range from the datasheet.
pub const SENSOR_RANGE_C: (f32, f32) = (-55.0, 125.0);

// ═══════════════════════════════════════════════════════════════
//  Bus
// ═══════════════════════════════════════════════════════════════

/// Bit-level 1-Wire master.  Bytes go out and come back LSB first.
pub trait OneWire {
    /// Reset pulse.  `true` if a device answered with a presence pulse.
    fn reset(&mut self) -> Result<bool, SensorError>;
    fn write_bit(&mut self, bit: bool) -> Result<(), SensorError>;
    fn read_bit(&mut self) -> Result<bool, SensorError>;

    fn write_byte(&mut self, byte: u8) -> Result<(), SensorError> {
        for i in 0..8 {
            self.write_bit((byte >> i) & 1 == 1)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> Result<u8, SensorError> {
        let mut byte = 0;
        for i in 0..8 {
            if self.read_bit()? {
                byte |= 1 << i;
            }
        }
        Ok(byte)
    }
}

/// 1-Wire master on one open-drain GPIO with an external 4.7 k pull-up.
/// `set_high` releases the line; `set_low` drives it.
pub struct GpioOneWire<P, D> {
    pin: P,
    delay: D,
}

impl<P: InputPin + OutputPin, D: DelayNs> GpioOneWire<P, D> {
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    fn drive_low(&mut self) -> Result<(), SensorError> {
        self.pin.set_low().map_err(|_| SensorError::BusReadFailed)
    }

    fn release(&mut self) -> Result<(), SensorError> {
        self.pin.set_high().map_err(|_| SensorError::BusReadFailed)
    }

    fn line_high(&mut self) -> Result<bool, SensorError> {
        self.pin.is_high().map_err(|_| SensorError::BusReadFailed)
    }
}

impl<P: InputPin + OutputPin, D: DelayNs> OneWire for GpioOneWire<P, D> {
    fn reset(&mut self) -> Result<bool, SensorError> {
        self.drive_low()?;
        self.delay.delay_us(480);
        self.release()?;
        self.delay.delay_us(70);
        let present = !self.line_high()?;
        self.delay.delay_us(410);
        Ok(present)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), SensorError> {
        self.drive_low()?;
        if bit {
            self.delay.delay_us(6);
            self.release()?;
            self.delay.delay_us(64);
        } else {
            self.delay.delay_us(60);
            self.release()?;
            self.delay.delay_us(10);
        }
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, SensorError> {
        self.drive_low()?;
        self.delay.delay_us(6);
        self.release()?;
        self.delay.delay_us(9);
        let bit = self.line_high()?;
        self.delay.delay_us(55);
        Ok(bit)
    }
}

/// Dallas/Maxim CRC-8 (x^8 + x^5 + x^4 + 1, reflected).
pub fn crc8(bytes: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &b in bytes {
        let mut byte = b;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            byte >>= 1;
        }
    }
    crc
}

// ═══════════════════════════════════════════════════════════════
//  Sensor
// ═══════════════════════════════════════════════════════════════

pub struct Ds18b20<W> {
    bus: W,
    /// A Convert T is outstanding.
    converting: bool,
}

impl<W: OneWire> Ds18b20<W> {
    pub fn new(bus: W) -> Self {
        Self {
            bus,
            converting: false,
        }
    }

    /// Temperature in °C from the last finished conversion.
    pub fn sample(&mut self) -> Result<f32, SensorError> {
        if !self.converting {
            self.start_conversion()?;
            return Err(SensorError::NotReady);
        }
        // Externally powered sensors answer read slots with 0 while busy.
        if !self.bus.read_bit()? {
            return Err(SensorError::NotReady);
        }

        let reading = self.read_temperature();
        self.converting = false;
        if let Err(e) = self.start_conversion() {
            warn!("DS18B20: next conversion not started ({})", e);
        }
        reading
    }

    fn select(&mut self) -> Result<(), SensorError> {
        if !self.bus.reset()? {
            return Err(SensorError::NotPresent);
        }
        self.bus.write_byte(CMD_SKIP_ROM)
    }

    fn start_conversion(&mut self) -> Result<(), SensorError> {
        self.select()?;
        self.bus.write_byte(CMD_CONVERT_T)?;
        self.converting = true;
        Ok(())
    }

    fn read_temperature(&mut self) -> Result<f32, SensorError> {
        self.select()?;
        self.bus.write_byte(CMD_READ_SCRATCHPAD)?;
        let mut pad = [0u8; 9];
        for b in &mut pad {
            *b = self.bus.read_byte()?;
        }
        // A released, unanswered line reads as all ones.
        if pad.iter().all(|b| *b == 0xFF) {
            return Err(SensorError::NotPresent);
        }
        if crc8(&pad[..8]) != pad[8] {
            return Err(SensorError::BusReadFailed);
        }

        let raw = i16::from_le_bytes([pad[0], pad[1]]);
        if raw == POWER_ON_RAW {
            // The sensor browned out and lost its conversion.
            return Err(SensorError::NotReady);
        }
        // 12-bit power-on resolution: 1/16 °C per LSB.
        let celsius = f32::from(raw) / 16.0;
        if celsius < SENSOR_RANGE_C.0 || celsius > SENSOR_RANGE_C.1 {
            return Err(SensorError::OutOfRange);
        }
        Ok(celsius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testbus::NoDelay;
    use std::collections::VecDeque;

    /// Byte-level script of one sensor: answers resets, logs writes, and
    /// serves queued read bits (ones once the queue runs dry).
    #[derive(Default)]
    struct FakeWire {
        absent: bool,
        resets: usize,
        written: Vec<bool>,
        replies: VecDeque<bool>,
    }

    impl FakeWire {
        fn queue_bit(&mut self, bit: bool) {
            self.replies.push_back(bit);
        }

        fn queue_scratchpad(&mut self, raw: i16) {
            let [lo, hi] = raw.to_le_bytes();
            let mut pad = [lo, hi, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0];
            pad[8] = crc8(&pad[..8]);
            self.queue_pad(pad);
        }

        fn queue_pad(&mut self, pad: [u8; 9]) {
            for b in pad {
                for i in 0..8 {
                    self.queue_bit((b >> i) & 1 == 1);
                }
            }
        }

        fn written_bytes(&self) -> Vec<u8> {
            self.written
                .chunks(8)
                .map(|bits| {
                    bits.iter()
                        .enumerate()
                        .fold(0u8, |acc, (i, b)| acc | (u8::from(*b) << i))
                })
                .collect()
        }
    }

    impl OneWire for FakeWire {
        fn reset(&mut self) -> Result<bool, SensorError> {
            self.resets += 1;
            Ok(!self.absent)
        }

        fn write_bit(&mut self, bit: bool) -> Result<(), SensorError> {
            self.written.push(bit);
            Ok(())
        }

        fn read_bit(&mut self) -> Result<bool, SensorError> {
            Ok(self.replies.pop_front().unwrap_or(true))
        }
    }

    #[test]
    fn crc_matches_maxim_app_note_example() {
        let rom = [0x02, 0x1C, 0xB8, 0x01, 0x00, 0x00, 0x00];
        assert_eq!(crc8(&rom), 0xA2);
    }

    #[test]
    fn first_sample_only_starts_a_conversion() {
        let mut dev = Ds18b20::new(FakeWire::default());
        assert_eq!(dev.sample(), Err(SensorError::NotReady));
        assert_eq!(dev.bus.written_bytes(), [CMD_SKIP_ROM, CMD_CONVERT_T]);
    }

    #[test]
    fn busy_sensor_is_not_ready() {
        let mut dev = Ds18b20::new(FakeWire::default());
        let _ = dev.sample();
        dev.bus.queue_bit(false);
        assert_eq!(dev.sample(), Err(SensorError::NotReady));
        assert_eq!(dev.bus.resets, 1);
    }

    #[test]
    fn finished_conversion_is_read_and_next_one_started() {
        let mut dev = Ds18b20::new(FakeWire::default());
        let _ = dev.sample();

        // Datasheet examples: +25.0625 °C and -10.125 °C.
        for (raw, expected) in [(0x0191, 25.0625), (0xFF5Eu16 as i16, -10.125)] {
            dev.bus.queue_bit(true);
            dev.bus.queue_scratchpad(raw);
            assert_eq!(dev.sample(), Ok(expected));
        }
        assert_eq!(
            dev.bus.written_bytes(),
            [
                CMD_SKIP_ROM,
                CMD_CONVERT_T,
                CMD_SKIP_ROM,
                CMD_READ_SCRATCHPAD,
                CMD_SKIP_ROM,
                CMD_CONVERT_T,
                CMD_SKIP_ROM,
                CMD_READ_SCRATCHPAD,
                CMD_SKIP_ROM,
                CMD_CONVERT_T,
            ]
        );
    }

    #[test]
    fn corrupt_frame_is_rejected_but_cycle_continues() {
        let mut dev = Ds18b20::new(FakeWire::default());
        let _ = dev.sample();
        let mut pad = [0x91, 0x01, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x00];
        pad[8] = crc8(&pad[..8]).wrapping_add(1);
        dev.bus.queue_bit(true);
        dev.bus.queue_pad(pad);
        assert_eq!(dev.sample(), Err(SensorError::BusReadFailed));
        assert!(dev.converting);
    }

    #[test]
    fn power_on_value_is_not_a_reading() {
        let mut dev = Ds18b20::new(FakeWire::default());
        let _ = dev.sample();
        dev.bus.queue_bit(true);
        dev.bus.queue_scratchpad(POWER_ON_RAW);
        assert_eq!(dev.sample(), Err(SensorError::NotReady));
    }

    #[test]
    fn silent_bus_means_no_sensor() {
        let wire = FakeWire {
            absent: true,
            ..FakeWire::default()
        };
        let mut dev = Ds18b20::new(wire);
        assert_eq!(dev.sample(), Err(SensorError::NotPresent));
        assert!(!dev.converting);
    }

    // ── GPIO master ───────────────────────────────────────────

    /// Open-drain line: low while driven, otherwise whatever the
    /// device side holds it at.
    struct FakePin {
        driven_low: bool,
        device_pulls_low: bool,
    }

    impl embedded_hal::digital::ErrorType for FakePin {
        type Error = core::convert::Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.driven_low = true;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.driven_low = false;
            Ok(())
        }
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(!(self.driven_low || self.device_pulls_low))
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|h| !h)
        }
    }

    fn gpio_bus(device_pulls_low: bool) -> GpioOneWire<FakePin, NoDelay> {
        GpioOneWire::new(
            FakePin {
                driven_low: false,
                device_pulls_low,
            },
            NoDelay,
        )
    }

    #[test]
    fn gpio_reset_sees_presence_pulse() {
        assert_eq!(gpio_bus(true).reset(), Ok(true));
        assert_eq!(gpio_bus(false).reset(), Ok(false));
    }

    #[test]
    fn gpio_master_releases_line_after_each_slot() {
        let mut bus = gpio_bus(false);
        bus.write_byte(0xA5).unwrap();
        assert!(!bus.pin.driven_low);
        assert_eq!(bus.read_byte(), Ok(0xFF));
    }
}
