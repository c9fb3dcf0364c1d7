//! Fuzz target: `SystemConfig::from_json`
//!
//! Feeds arbitrary bytes to the JSON loader and verifies:
//! - No panics on malformed, truncated or hostile input
//! - Every accepted table satisfies the threshold ordering rules
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use vanwatch::alerts::Severity;
use vanwatch::config::{GasThresholds, SystemConfig};

fn assert_gas(name: &str, g: &GasThresholds) {
    assert!(
        g.info_ppm >= 0.0 && g.info_ppm < g.warning_ppm && g.warning_ppm < g.danger_ppm,
        "{name}: accepted unordered thresholds {g:?}"
    );
    assert!(g.danger_severity > Severity::Warning, "{name}: weak danger tier");
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(config) = SystemConfig::from_json(text) else {
        return;
    };

    assert_gas("co", &config.gas.co);
    assert_gas("lpg", &config.gas.lpg);
    assert_gas("smoke", &config.gas.smoke);

    for rail in [&config.rail_12v, &config.rail_5v] {
        let low = rail
            .under_voltage_warning_v
            .unwrap_or(rail.under_voltage_danger_v);
        assert!(rail.under_voltage_danger_v <= low && low < rail.over_voltage_warning_v);
        assert!(rail.over_current_warning_a > 0.0);
    }

    assert!(config.climate.temp_low_c < config.climate.temp_high_c);
    assert!(config.tilt.warning_deg > 0.0 && config.tilt.warning_deg < config.tilt.danger_deg);
    assert!(config.alarm.danger_toggle_ms < config.alarm.warning_toggle_ms);

    // Accepted tables must round-trip through the validator unchanged.
    assert_eq!(config.validate(), Ok(()));
});
