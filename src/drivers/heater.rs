//! MQ-7 heater switch.
//!
//! A logic-level MOSFET selects between the 5 V cleaning supply and the
//! 1.4 V measuring supply.  Which one is right at any moment is decided
//! by the heating cycle in the core; this driver just drives the GPIO.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: GPIO output via hw_init.
//! On host/test: tracks state in-memory only.

use log::debug;

use crate::drivers::hw_init;
use crate::pins;

pub struct HeaterSwitch {
    high: bool,
}

impl Default for HeaterSwitch {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaterSwitch {
    /// Boots at full voltage, matching `hw_init`.
    pub fn new() -> Self {
        Self { high: true }
    }

    pub fn set_high(&mut self, high: bool) {
        hw_init::gpio_write(pins::CO_HEATER_GPIO, high);
        if high != self.high {
            debug!("CO heater -> {}", if high { "5.0 V" } else { "1.4 V" });
        }
        self.high = high;
    }

    pub fn is_high(&self) -> bool {
        self.high
    }
}
