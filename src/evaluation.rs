//! Alert evaluation: sensor store in, alert records out.
//!
//! Every call rebuilds the buffer from scratch.  Rule groups run in a
//! fixed order (gas, power, environment, tilt) and inside each group
//! the tiers are checked most-severe first, so a group emits at most one
//! record.  Insertion order is what arbitration uses to break ties.
//!
//! Upper limits trigger at `>=`, lower limits below the threshold.
//!
//! A gas group whose gate is closed, and any channel whose `valid` flag
//! is clear, emits nothing at all.  Neither case is treated as safe.

use crate::alerts::{AlertBuffer, AlertKind, AlertRecord, Severity};
use crate::config::{GasThresholds, RailThresholds, SystemConfig};
use crate::fsm::context::{Channel, SensorStore};
use crate::sensors::RailReading;

/// One tier of a first-match-wins rule group.
struct Tier {
    severity: Severity,
    threshold: f32,
    message: &'static str,
}

/// Rebuild `out` from the current store.
pub fn evaluate(store: &SensorStore, config: &SystemConfig, out: &mut AlertBuffer) {
    out.clear();

    // ── Gas ───────────────────────────────────────────────────
    if store.gates.co.is_open() {
        gas_group(
            out,
            AlertKind::CoHigh,
            &store.co_ppm,
            &config.gas.co,
            ["CO CRITICAL", "CO elevated", "CO detected"],
        );
    }
    if store.gates.combustible.is_open() {
        gas_group(
            out,
            AlertKind::LpgHigh,
            &store.lpg_ppm,
            &config.gas.lpg,
            ["LPG CRITICAL", "LPG elevated", "LPG detected"],
        );
        gas_group(
            out,
            AlertKind::SmokeHigh,
            &store.smoke_ppm,
            &config.gas.smoke,
            ["SMOKE DANGER", "Smoke detected", "Light smoke"],
        );
    }

    // ── Power ─────────────────────────────────────────────────
    rail_group(
        out,
        &store.rail_12v,
        &config.rail_12v,
        [AlertKind::Rail12vLow, AlertKind::Rail12vHigh, AlertKind::Current12vHigh],
        ["BATTERY CRITICAL", "Battery low", "12V over-voltage", "12V over-current"],
    );
    rail_group(
        out,
        &store.rail_5v,
        &config.rail_5v,
        [AlertKind::Rail5vLow, AlertKind::Rail5vHigh, AlertKind::Current5vHigh],
        ["5V CRITICAL", "5V low", "5V over-voltage", "5V over-current"],
    );

    // ── Environment ───────────────────────────────────────────
    let climate = &config.climate;
    if let Some(t) = store.temperature_c.get() {
        if t >= climate.temp_high_c {
            push(
                out,
                AlertKind::TemperatureHigh,
                Severity::Warning,
                t,
                climate.temp_high_c,
                store.temperature_c.updated_ms,
                "Temperature high",
            );
        } else if t < climate.temp_low_c {
            push(
                out,
                AlertKind::TemperatureLow,
                Severity::Warning,
                t,
                climate.temp_low_c,
                store.temperature_c.updated_ms,
                "Temperature low",
            );
        }
    }
    if let Some(h) = store.humidity_pct.get()
        && h >= climate.humidity_high_pct
    {
        push(
            out,
            AlertKind::HumidityHigh,
            Severity::Info,
            h,
            climate.humidity_high_pct,
            store.humidity_pct.updated_ms,
            "Humidity high",
        );
    }

    // ── Tilt ──────────────────────────────────────────────────
    let tilt = &config.tilt;
    upper_tiers(
        out,
        AlertKind::TiltHigh,
        &store.tilt_deg,
        &[
            Tier {
                severity: Severity::Danger,
                threshold: tilt.danger_deg,
                message: "TILT DANGER",
            },
            Tier {
                severity: Severity::Warning,
                threshold: tilt.warning_deg,
                message: "Vehicle tilted",
            },
        ],
    );
}

// ═══════════════════════════════════════════════════════════════
//  Rule groups
// ═══════════════════════════════════════════════════════════════

fn gas_group(
    out: &mut AlertBuffer,
    kind: AlertKind,
    channel: &Channel<f32>,
    th: &GasThresholds,
    [danger, warning, info]: [&'static str; 3],
) {
    upper_tiers(
        out,
        kind,
        channel,
        &[
            Tier {
                severity: th.danger_severity,
                threshold: th.danger_ppm,
                message: danger,
            },
            Tier {
                severity: Severity::Warning,
                threshold: th.warning_ppm,
                message: warning,
            },
            Tier {
                severity: Severity::Info,
                threshold: th.info_ppm,
                message: info,
            },
        ],
    );
}

/// Voltage window first, then current.  Each is its own group.
fn rail_group(
    out: &mut AlertBuffer,
    channel: &Channel<RailReading>,
    th: &RailThresholds,
    [low, high, over_current]: [AlertKind; 3],
    [low_danger, low_warning, high_msg, current_msg]: [&'static str; 4],
) {
    let Some(r) = channel.get() else {
        return;
    };
    let at = channel.updated_ms;
    let v = r.bus_voltage_v;

    if v < th.under_voltage_danger_v {
        push(out, low, Severity::Danger, v, th.under_voltage_danger_v, at, low_danger);
    } else if let Some(warn_v) = th.under_voltage_warning_v
        && v < warn_v
    {
        push(out, low, Severity::Warning, v, warn_v, at, low_warning);
    } else if v >= th.over_voltage_warning_v {
        push(out, high, Severity::Warning, v, th.over_voltage_warning_v, at, high_msg);
    }

    let amps = r.current_a.abs();
    if amps >= th.over_current_warning_a {
        push(
            out,
            over_current,
            Severity::Warning,
            amps,
            th.over_current_warning_a,
            at,
            current_msg,
        );
    }
}

/// Push the first tier whose threshold the value reaches.
fn upper_tiers(out: &mut AlertBuffer, kind: AlertKind, channel: &Channel<f32>, tiers: &[Tier]) {
    let Some(value) = channel.get() else {
        return;
    };
    if let Some(tier) = tiers.iter().find(|t| value >= t.threshold) {
        push(
            out,
            kind,
            tier.severity,
            value,
            tier.threshold,
            channel.updated_ms,
            tier.message,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn push(
    out: &mut AlertBuffer,
    kind: AlertKind,
    severity: Severity,
    measured: f32,
    threshold: f32,
    timestamp_ms: u64,
    message: &'static str,
) {
    let _ = out.push(AlertRecord {
        kind,
        severity,
        measured,
        threshold,
        timestamp_ms,
        message,
    });
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
