//! Actuator drivers, hardware initialisation, and operator input.

pub mod buzzer;
pub mod heater;
pub mod hw_init;
pub mod silence_button;
pub mod watchdog;
