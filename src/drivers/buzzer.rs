//! Piezo buzzer driver.
//!
//! A passive piezo on one LEDC channel: a fixed 1 kHz square wave at
//! 50 % duty when on, zero duty when off.  Cadence (pulsed vs
//! continuous) is decided upstream; this driver only switches the tone.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes LEDC duty via hw_init.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;

pub struct Buzzer {
    on: bool,
    switch_count: u32,
}

impl Default for Buzzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buzzer {
    pub fn new() -> Self {
        Self {
            on: false,
            switch_count: 0,
        }
    }

    pub fn set(&mut self, on: bool) {
        let duty = if on { hw_init::BUZZER_DUTY_ON } else { 0 };
        hw_init::ledc_set(hw_init::LEDC_CH_BUZZER, duty);
        if on != self.on {
            self.switch_count = self.switch_count.wrapping_add(1);
        }
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Number of on/off edges written since boot.
    pub fn switch_count(&self) -> u32 {
        self.switch_count
    }
}
