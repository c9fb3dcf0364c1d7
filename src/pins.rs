//! GPIO / peripheral pin assignments for the VanWatch safety board
//! (ESP32-S3).
//!
//! Single source of truth: every driver references this module rather
//! than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Gas cells (analog, ADC1)
// ---------------------------------------------------------------------------

/// MQ-7 CO module analog output through a 10 k / 20 k divider.
/// ADC1 channel 4 (GPIO 5 on ESP32-S3).
pub const MQ7_ADC_GPIO: i32 = 5;
/// MQ-2 LPG / methane / smoke module analog output, same divider.
/// ADC1 channel 5 (GPIO 6 on ESP32-S3).
pub const MQ2_ADC_GPIO: i32 = 6;

/// Logic-level MOSFET switching the MQ-7 heater between 5 V and 1.4 V.
/// HIGH = full 5 V (cleaning), LOW = 1.4 V (measuring).
pub const CO_HEATER_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// I²C bus: BME280, MPU6050, INA226 ×2
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 14;
pub const I2C_SCL_GPIO: i32 = 15;
/// Standard mode.  The longest cable run is the 12 V shunt monitor.
pub const I2C_BAUD_HZ: u32 = 100_000;

// ---------------------------------------------------------------------------
// 1-Wire: DS18B20 exterior sensor
// ---------------------------------------------------------------------------

/// Open-drain data line, 4.7 k pull-up to 3.3 V.
pub const ONEWIRE_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Alarm outputs
// ---------------------------------------------------------------------------

/// Passive piezo driven by an LEDC square wave.
pub const BUZZER_GPIO: i32 = 4;
/// Tone frequency (Hz).
pub const BUZZER_TONE_HZ: u32 = 1_000;
/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;

// ---------------------------------------------------------------------------
// Operator input
// ---------------------------------------------------------------------------

/// Alarm acknowledge push-button (encoder switch), active-low with pull-up.
pub const SILENCE_BUTTON_GPIO: i32 = 16;
