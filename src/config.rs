//! System configuration parameters
//!
//! Threshold table, sensor timing, alarm cadence and tilt calibration.
//! Loaded once at startup (defaults or JSON) and validated before the
//! monitor enters its run loop.

use serde::{Deserialize, Serialize};

use crate::alerts::Severity;
use crate::error::ConfigError;

/// Info / warning / danger tiers for one gas channel (ppm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasThresholds {
    pub info_ppm: f32,
    pub warning_ppm: f32,
    pub danger_ppm: f32,
    /// Severity emitted when the danger tier is crossed.
    pub danger_severity: Severity,
}

impl GasThresholds {
    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        let ordered = self.info_ppm >= 0.0
            && self.info_ppm < self.warning_ppm
            && self.warning_ppm < self.danger_ppm;
        if !ordered {
            return Err(ConfigError::ValidationFailed(field));
        }
        if self.danger_severity <= Severity::Warning {
            return Err(ConfigError::ValidationFailed(field));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasConfig {
    pub co: GasThresholds,
    pub lpg: GasThresholds,
    pub smoke: GasThresholds,
}

/// Voltage window and current limit for one supply rail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RailThresholds {
    /// Below this the rail raises `Danger`.
    pub under_voltage_danger_v: f32,
    /// Below this (but above danger) the rail raises `Warning`.
    pub under_voltage_warning_v: Option<f32>,
    /// At or above this the rail raises `Warning`.
    pub over_voltage_warning_v: f32,
    /// At or above this the rail current raises `Warning`.
    pub over_current_warning_a: f32,
}

impl RailThresholds {
    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        let upper_low = self
            .under_voltage_warning_v
            .unwrap_or(self.under_voltage_danger_v);
        let ordered = self.under_voltage_danger_v > 0.0
            && self.under_voltage_danger_v <= upper_low
            && upper_low < self.over_voltage_warning_v;
        if !ordered || self.over_current_warning_a <= 0.0 {
            return Err(ConfigError::ValidationFailed(field));
        }
        if matches!(self.under_voltage_warning_v, Some(w) if w <= self.under_voltage_danger_v) {
            return Err(ConfigError::ValidationFailed(field));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateThresholds {
    pub temp_high_c: f32,
    pub temp_low_c: f32,
    pub humidity_high_pct: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TiltThresholds {
    pub warning_deg: f32,
    pub danger_deg: f32,
}

/// Per-sensor sampling intervals (ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleIntervals {
    pub climate_ms: u32,
    pub attitude_ms: u32,
    pub rail_ms: u32,
    pub co_ms: u32,
    pub combustible_ms: u32,
    /// Must exceed the DS18B20's 750 ms conversion time.
    #[serde(default = "default_exterior_ms")]
    pub exterior_ms: u32,
}

fn default_exterior_ms() -> u32 {
    10_000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// One-shot warm-up of the CO cell before its first heating cycle.
    pub co_preheat_ms: u32,
    /// Heater-high cleaning phase (CO reading not valid).
    pub co_high_phase_ms: u32,
    /// Heater-low measuring phase (CO reading valid).
    pub co_low_phase_ms: u32,
    /// One-shot warm-up of the LPG/methane/smoke cell.
    pub combustible_preheat_ms: u32,
    pub control_loop_interval_ms: u32,
    pub telemetry_interval_ms: u32,
    pub intervals: SampleIntervals,
}

/// Buzzer toggle periods.  `Critical` is a continuous tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmConfig {
    pub danger_toggle_ms: u32,
    pub warning_toggle_ms: u32,
}

/// Largest accepted mounting offset on either axis.
pub const MAX_LEVEL_OFFSET_DEG: f32 = 45.0;

/// Mounting offsets subtracted from the raw attitude before tilt is computed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelCalibration {
    pub roll_offset_deg: f32,
    pub pitch_offset_deg: f32,
}

impl LevelCalibration {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = |v: f32| v.is_finite() && v.abs() <= MAX_LEVEL_OFFSET_DEG;
        if !ok(self.roll_offset_deg) || !ok(self.pitch_offset_deg) {
            return Err(ConfigError::ValidationFailed(
                "level: offsets must be finite and within 45 degrees",
            ));
        }
        Ok(())
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    pub gas: GasConfig,
    pub rail_12v: RailThresholds,
    pub rail_5v: RailThresholds,
    pub climate: ClimateThresholds,
    pub tilt: TiltThresholds,
    pub timing: TimingConfig,
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub level: LevelCalibration,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            gas: GasConfig {
                co: GasThresholds {
                    info_ppm: 50.0,
                    warning_ppm: 200.0,
                    danger_ppm: 400.0,
                    danger_severity: Severity::Critical,
                },
                lpg: GasThresholds {
                    info_ppm: 500.0,
                    warning_ppm: 1000.0,
                    danger_ppm: 3000.0,
                    danger_severity: Severity::Critical,
                },
                smoke: GasThresholds {
                    info_ppm: 1000.0,
                    warning_ppm: 1500.0,
                    danger_ppm: 2000.0,
                    danger_severity: Severity::Danger,
                },
            },
            rail_12v: RailThresholds {
                under_voltage_danger_v: 10.5,
                under_voltage_warning_v: Some(11.5),
                over_voltage_warning_v: 14.5,
                over_current_warning_a: 20.0,
            },
            rail_5v: RailThresholds {
                under_voltage_danger_v: 4.5,
                under_voltage_warning_v: None,
                over_voltage_warning_v: 5.5,
                over_current_warning_a: 3.0,
            },
            climate: ClimateThresholds {
                temp_high_c: 35.0,
                temp_low_c: 0.0,
                humidity_high_pct: 80.0,
            },
            tilt: TiltThresholds {
                warning_deg: 5.0,
                danger_deg: 15.0,
            },
            timing: TimingConfig {
                co_preheat_ms: 180_000,         // 3 min
                co_high_phase_ms: 60_000,       // 60 s at 5 V
                co_low_phase_ms: 90_000,        // 90 s at 1.4 V
                combustible_preheat_ms: 60_000, // 1 min
                control_loop_interval_ms: 20,   // 50 Hz
                telemetry_interval_ms: 10_000,
                intervals: SampleIntervals {
                    climate_ms: 10_000,
                    attitude_ms: 500,
                    rail_ms: 2_000,
                    co_ms: 2_000,
                    combustible_ms: 2_000,
                    exterior_ms: default_exterior_ms(),
                },
            },
            alarm: AlarmConfig {
                danger_toggle_ms: 200,
                warning_toggle_ms: 1_000,
            },
            level: LevelCalibration::default(),
        }
    }
}

impl SystemConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject any table that would make arbitration ambiguous.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gas.co.validate("gas.co: need 0 <= info < warning < danger")?;
        self.gas.lpg.validate("gas.lpg: need 0 <= info < warning < danger")?;
        self.gas
            .smoke
            .validate("gas.smoke: need 0 <= info < warning < danger")?;

        self.rail_12v
            .validate("rail_12v: need danger < warning < over-voltage, current > 0")?;
        self.rail_5v
            .validate("rail_5v: need danger < warning < over-voltage, current > 0")?;

        let c = &self.climate;
        if c.temp_low_c >= c.temp_high_c {
            return Err(ConfigError::ValidationFailed(
                "climate: temp_low_c must be below temp_high_c",
            ));
        }
        if !(c.humidity_high_pct > 0.0 && c.humidity_high_pct <= 100.0) {
            return Err(ConfigError::ValidationFailed(
                "climate: humidity_high_pct must be in (0, 100]",
            ));
        }

        let t = &self.tilt;
        if !(t.warning_deg > 0.0 && t.warning_deg < t.danger_deg) {
            return Err(ConfigError::ValidationFailed(
                "tilt: need 0 < warning_deg < danger_deg",
            ));
        }

        let tm = &self.timing;
        let iv = &tm.intervals;
        let durations = [
            tm.co_preheat_ms,
            tm.co_high_phase_ms,
            tm.co_low_phase_ms,
            tm.combustible_preheat_ms,
            tm.control_loop_interval_ms,
            tm.telemetry_interval_ms,
            iv.climate_ms,
            iv.attitude_ms,
            iv.rail_ms,
            iv.co_ms,
            iv.combustible_ms,
            iv.exterior_ms,
        ];
        if durations.contains(&0) {
            return Err(ConfigError::ValidationFailed(
                "timing: durations and intervals must be non-zero",
            ));
        }

        let a = &self.alarm;
        if a.danger_toggle_ms == 0 || a.danger_toggle_ms >= a.warning_toggle_ms {
            return Err(ConfigError::ValidationFailed(
                "alarm: need 0 < danger_toggle_ms < warning_toggle_ms",
            ));
        }

        self.level.validate()

    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SystemConfig::default().validate(), Ok(()));
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2 = SystemConfig::from_json(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn missing_level_block_defaults_to_zero_offsets() {
        let mut value = serde_json::to_value(SystemConfig::default()).unwrap();
        value.as_object_mut().unwrap().remove("level");
        let c = SystemConfig::from_json(&serde_json::to_string(&value).unwrap()).unwrap();
        assert_eq!(c.level, LevelCalibration::default());
    }

    #[test]
    fn missing_exterior_interval_gets_default() {
        let mut value = serde_json::to_value(SystemConfig::default()).unwrap();
        value["timing"]["intervals"]
            .as_object_mut()
            .unwrap()
            .remove("exterior_ms");
        let c = SystemConfig::from_json(&serde_json::to_string(&value).unwrap()).unwrap();
        assert_eq!(c.timing.intervals.exterior_ms, 10_000);
    }

    #[test]
    fn level_offsets_from_json_are_bounded() {
        let mut value = serde_json::to_value(SystemConfig::default()).unwrap();
        value["level"]["roll_offset_deg"] = serde_json::json!(60.0);
        assert!(matches!(
            SystemConfig::from_json(&serde_json::to_string(&value).unwrap()),
            Err(ConfigError::ValidationFailed(msg)) if msg.starts_with("level")
        ));

        let mut c = SystemConfig::default();
        c.level.pitch_offset_deg = -MAX_LEVEL_OFFSET_DEG;
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            SystemConfig::from_json("{not json"),
            Err(ConfigError::Malformed)
        );
    }

    #[test]
    fn warning_at_or_above_danger_is_rejected() {
        let mut c = SystemConfig::default();
        c.gas.co.warning_ppm = c.gas.co.danger_ppm;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::ValidationFailed(msg)) if msg.starts_with("gas.co")
        ));
    }

    #[test]
    fn gas_danger_must_escalate_past_warning() {
        let mut c = SystemConfig::default();
        c.gas.smoke.danger_severity = Severity::Warning;
        assert!(c.validate().is_err());
    }

    #[test]
    fn rail_warning_below_danger_is_rejected() {
        let mut c = SystemConfig::default();
        c.rail_12v.under_voltage_warning_v = Some(10.0);
        assert!(c.validate().is_err());
    }

    #[test]
    fn rail_without_warning_tier_is_accepted() {
        let mut c = SystemConfig::default();
        c.rail_12v.under_voltage_warning_v = None;
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn inverted_temperature_window_is_rejected() {
        let mut c = SystemConfig::default();
        c.climate.temp_low_c = 40.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut c = SystemConfig::default();
        c.timing.intervals.attitude_ms = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn cadence_must_be_faster_for_danger() {
        let mut c = SystemConfig::default();
        c.alarm.danger_toggle_ms = c.alarm.warning_toggle_ms;
        assert!(c.validate().is_err());
    }

    #[test]
    fn timing_ratios_make_sense() {
        let t = SystemConfig::default().timing;
        assert!(
            t.control_loop_interval_ms < t.intervals.attitude_ms,
            "loop must run faster than the fastest sensor"
        );
        assert!(t.co_preheat_ms > t.co_high_phase_ms);
    }
}
