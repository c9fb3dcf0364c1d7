//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements     | Connects to                   |
//! |------------|----------------|-------------------------------|
//! | `hardware` | SensorPort     | I²C sensors, ADC1 gas cells   |
//! |            | ActuatorPort   | LEDC buzzer, heater GPIO      |
//! | `log_sink` | EventSink      | Serial log output             |
//! | `time`     | -              | ESP32 high-resolution timer   |

pub mod hardware;
pub mod log_sink;
pub mod time;
