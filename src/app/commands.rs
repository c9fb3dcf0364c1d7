//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (front-panel
//! button, encoder menu, serial console) that the
//! [`MonitorService`](super::service::MonitorService) interprets and
//! acts upon.  None of them can lower the safety state.

use crate::sensors::SensorId;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// Acknowledge the alarm: buzzer off until the severity level changes.
    /// Severity and navigation blocking are untouched.
    SilenceBuzzer,

    /// Change one sensor's sampling interval.  Zero is rejected.
    SetSampleInterval { sensor: SensorId, interval_ms: u32 },

    /// Set the mounting offsets subtracted before tilt is computed.
    SetLevelOffsets { roll_deg: f32, pitch_deg: f32 },

    /// Take the current raw attitude as the level reference.
    ZeroLevel,
}
