//! VanWatch firmware: main entry point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink      MonotonicClock       │
//! │  (Sensor+Actuator)      (EventSink)       (ms timebase)        │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            MonitorService (pure logic)                 │    │
//! │  │  Scheduler · Evaluation · Arbitration · Cadence · FSM  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single cooperative loop: one `tick()` every `control_loop_interval_ms`.
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::{Delay, Ets, FreeRtos};
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use log::{error, info, warn};

use vanwatch::adapters::hardware::HardwareAdapter;
use vanwatch::adapters::log_sink::LogEventSink;
use vanwatch::adapters::time::MonotonicClock;
use vanwatch::app::commands::AppCommand;
use vanwatch::app::service::MonitorService;
use vanwatch::config::SystemConfig;
use vanwatch::drivers::buzzer::Buzzer;
use vanwatch::drivers::heater::HeaterSwitch;
use vanwatch::drivers::silence_button::SilenceButton;
use vanwatch::drivers::watchdog::Watchdog;
use vanwatch::{drivers, pins, sensors};

/// TWDT timeout.  Far above one loop iteration, well below human patience.
const WATCHDOG_TIMEOUT_MS: u32 = 10_000;

/// Park the main task forever.  Nothing has subscribed to the watchdog
/// yet, so the board stays put with the error on the console.
fn halt() -> ! {
    loop {
        FreeRtos::delay_ms(1_000);
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  VanWatch v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = drivers::hw_init::init_peripherals() {
        error!("HAL init failed: {}, halting", e);
        halt();
    }

    let peripherals = Peripherals::take()?;
    let i2c_config = I2cConfig::new().baudrate(pins::I2C_BAUD_HZ.Hz());
    // GPIO 14 / 15, see pins::I2C_SDA_GPIO and pins::I2C_SCL_GPIO.
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio14,
        peripherals.pins.gpio15,
        &i2c_config,
    )?;
    info!(
        "I2C0 up (SDA={}, SCL={}, {} Hz)",
        pins::I2C_SDA_GPIO,
        pins::I2C_SCL_GPIO,
        pins::I2C_BAUD_HZ
    );

    // GPIO 17, see pins::ONEWIRE_GPIO.
    let mut onewire_pin = PinDriver::input_output_od(peripherals.pins.gpio17)?;
    onewire_pin.set_high()?;
    let onewire = sensors::ds18b20::GpioOneWire::new(onewire_pin, Ets);
    info!("1-Wire up (GPIO {})", pins::ONEWIRE_GPIO);

    let sensor_hub = sensors::SensorHub::new(i2c, Delay::new_default(), onewire);
    let mut hw = HardwareAdapter::new(sensor_hub, Buzzer::new(), HeaterSwitch::new());
    hw.all_off();

    // ── 3. Configuration ──────────────────────────────────────
    // Deployed thresholds are compiled in; a bad table never reaches the loop.
    let config = SystemConfig::default();
    let loop_interval_ms = config.timing.control_loop_interval_ms;

    let clock = MonotonicClock::new();
    let mut sink = LogEventSink::new();

    let mut service = match MonitorService::new(config, clock.now_ms()) {
        Ok(service) => service,
        Err(e) => {
            error!("Configuration rejected: {}, halting", e);
            halt();
        }
    };
    service.start(&mut sink);

    let mut button = SilenceButton::new();
    let mut watchdog = Watchdog::new(WATCHDOG_TIMEOUT_MS);

    info!("System ready. Entering control loop ({} ms).", loop_interval_ms);

    // ── 4. Control loop ───────────────────────────────────────
    loop {
        let started_ms = clock.now_ms();

        service.tick(started_ms, &mut hw, &mut sink);

        if button.tick(started_ms) {
            if let Err(e) = service.handle_command(AppCommand::SilenceBuzzer, &mut hw, &mut sink) {
                warn!("Silence command failed: {}", e);
            }
        }

        let elapsed_ms = clock.now_ms().saturating_sub(started_ms);
        service.record_loop_time(elapsed_ms.min(u64::from(u32::MAX)) as u32, started_ms);

        watchdog.feed();

        // Always yield at least one tick so the idle task can run.
        let remaining = u64::from(loop_interval_ms).saturating_sub(elapsed_ms).max(1);
        FreeRtos::delay_ms(remaining as u32);
    }
}
