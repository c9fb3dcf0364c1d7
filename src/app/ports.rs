//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MonitorService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, event sinks) implement these
//! traits.  The [`MonitorService`](super::service::MonitorService) consumes
//! them via generics, so the domain core never touches hardware directly.

use crate::error::SensorError;
use crate::sensors::{SensorId, SensorReading};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the scheduler calls this when a slot is due.
pub trait SensorPort {
    /// Take one sample from `id`.
    ///
    /// Must return within a bounded time.  A failure leaves the stored
    /// value untouched; the scheduler only clears its validity flag.
    fn sample(&mut self, id: SensorId) -> Result<SensorReading, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port.  Only called when the requested level changes.
pub trait ActuatorPort {
    /// Piezo tone on or off.
    fn set_buzzer(&mut self, on: bool);

    /// MQ-7 heater drive: `true` = full 5 V (cleaning), `false` = low (measuring).
    fn set_co_heater(&mut self, high: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// display task, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
