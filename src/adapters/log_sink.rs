//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Every line starts with a fixed tag so a serial capture can be grepped.

use core::fmt;

use log::{info, warn};

use crate::app::events::{AppEvent, GasStatus};
use crate::app::ports::EventSink;
use crate::sensors::RailReading;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// Gas column: warming and purging never print as a number.
struct Gas(GasStatus);

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            GasStatus::Warming => f.write_str("warming"),
            GasStatus::Purging => f.write_str("purging"),
            GasStatus::Stale => f.write_str("--"),
            GasStatus::Ppm(v) => write!(f, "{:.0}ppm", v),
        }
    }
}

/// Optional scalar column with a unit suffix.
struct Opt(Option<f32>, &'static str);

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{:.1}{}", v, self.1),
            None => f.write_str("--"),
        }
    }
}

struct RailCol(Option<RailReading>);

impl fmt::Display for RailCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(r) => write!(f, "{:.2}V/{:.2}A", r.bus_voltage_v, r.current_a),
            None => f.write_str("--"),
        }
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | mode={} level={} primary={} alerts={} dropped={} | \
                     CO={} LPG={} CH4={} smoke={} heater={} | \
                     T={} RH={} ext={} tilt={} | 12V={} 5V={} | \
                     buzzer={} silenced={} nav_blocked={} | \
                     loop={}ms worst={}ms overruns={} up={}s",
                    t.mode.name(),
                    t.level,
                    t.primary.map_or("-", |k| k.name()),
                    t.active_alerts,
                    t.dropped_alerts,
                    Gas(t.co),
                    Gas(t.lpg),
                    Gas(t.methane),
                    Gas(t.smoke),
                    t.heater.name(),
                    Opt(t.temperature_c, "\u{00b0}C"),
                    Opt(t.humidity_pct, "%"),
                    Opt(t.exterior_c, "\u{00b0}C"),
                    Opt(t.tilt_deg, "\u{00b0}"),
                    RailCol(t.rail_12v),
                    RailCol(t.rail_5v),
                    if t.buzzer_on { "ON" } else { "off" },
                    t.silenced,
                    t.navigation_blocked,
                    t.loop_stats.last_ms,
                    t.loop_stats.worst_ms,
                    t.loop_stats.overruns,
                    t.uptime_ms / 1_000,
                );
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE | {} -> {}", from.name(), to.name());
            }
            AppEvent::SeverityChanged { from, to, primary } => {
                let primary = primary.map_or("-", |k| k.name());
                if to > from {
                    warn!("SEVERITY | {} -> {} (primary={})", from, to, primary);
                } else {
                    info!("SEVERITY | {} -> {} (primary={})", from, to, primary);
                }
            }
            AppEvent::PreheatComplete(sensor) => {
                info!("HEATER | {:?} preheat complete", sensor);
            }
            AppEvent::HeaterPhaseChanged(phase) => {
                info!("HEATER | CO phase -> {}", phase.name());
            }
            AppEvent::AlertsDropped { dropped } => {
                warn!("ALERT | buffer full, {} violation(s) dropped", dropped);
            }
            AppEvent::SensorFault { sensor, error } => {
                warn!("SENSOR | {} fault: {}", sensor.name(), error);
            }
            AppEvent::SensorRecovered(sensor) => {
                info!("SENSOR | {} recovered", sensor.name());
            }
            AppEvent::BuzzerSilenced => {
                info!("ALARM | buzzer silenced by operator");
            }
            AppEvent::Started(mode) => {
                info!("START | initial_mode={}", mode.name());
            }
        }
    }
}
