//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and both actuator drivers, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  This is the only module
//! in the system that touches actual hardware.  On non-espidf targets
//! the underlying drivers fall back to their simulation paths.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::buzzer::Buzzer;
use crate::drivers::heater::HeaterSwitch;
use crate::error::SensorError;
use crate::sensors::ds18b20::OneWire;
use crate::sensors::{SensorHub, SensorId, SensorReading};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I, D, W> {
    sensor_hub: SensorHub<I, D, W>,
    buzzer: Buzzer,
    heater: HeaterSwitch,
}

impl<I: I2c, D: DelayNs, W: OneWire> HardwareAdapter<I, D, W> {
    pub fn new(sensor_hub: SensorHub<I, D, W>, buzzer: Buzzer, heater: HeaterSwitch) -> Self {
        Self {
            sensor_hub,
            buzzer,
            heater,
        }
    }

    /// Driver access for calibration at boot.
    pub fn sensor_hub_mut(&mut self) -> &mut SensorHub<I, D, W> {
        &mut self.sensor_hub
    }

    /// Force every output to its safe idle level.
    pub fn all_off(&mut self) {
        self.buzzer.set(false);
        self.heater.set_high(false);
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<I: I2c, D: DelayNs, W: OneWire> SensorPort for HardwareAdapter<I, D, W> {
    fn sample(&mut self, id: SensorId) -> Result<SensorReading, SensorError> {
        self.sensor_hub.sample(id)
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<I: I2c, D: DelayNs, W: OneWire> ActuatorPort for HardwareAdapter<I, D, W> {
    fn set_buzzer(&mut self, on: bool) {
        self.buzzer.set(on);
    }

    fn set_co_heater(&mut self, high: bool) {
        self.heater.set_high(high);
    }
}
