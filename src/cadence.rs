//! Buzzer cadence engine.
//!
//! Turns the arbitrated [`BuzzerCadence`] into an on/off level for the
//! piezo.  The main loop calls `update()` every iteration; the engine
//! keeps its own toggle clock, independent of sensor sampling.
//!
//! | Cadence      | Output                                  |
//! |--------------|-----------------------------------------|
//! | Continuous   | on                                      |
//! | Pulsed(p)    | square wave, toggles every `p` ms       |
//! | Silent       | off                                     |
//!
//! A new cadence or severity level restarts the pattern with the tone
//! on, and clears any silence acknowledgement.

use crate::alerts::Severity;
use crate::arbitration::{BuzzerCadence, SeverityState};

pub struct CadenceEngine {
    level: Severity,
    cadence: BuzzerCadence,
    /// Pattern output before silencing is applied.
    tone: bool,
    last_toggle_ms: u64,
    silenced: bool,
    toggles: u32,
}

impl Default for CadenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CadenceEngine {
    pub fn new() -> Self {
        Self {
            level: Severity::None,
            cadence: BuzzerCadence::Silent,
            tone: false,
            last_toggle_ms: 0,
            silenced: false,
            toggles: 0,
        }
    }

    /// Advance the pattern and return whether the buzzer should sound.
    pub fn update(&mut self, state: &SeverityState, now_ms: u64) -> bool {
        if state.level != self.level || state.cadence != self.cadence {
            self.level = state.level;
            self.cadence = state.cadence;
            self.tone = state.cadence != BuzzerCadence::Silent;
            self.last_toggle_ms = now_ms;
            self.silenced = false;
        }

        if let BuzzerCadence::Pulsed { period_ms } = self.cadence {
            let period = u64::from(period_ms);
            let elapsed = now_ms.saturating_sub(self.last_toggle_ms);
            if elapsed >= period {
                self.tone = !self.tone;
                self.toggles = self.toggles.wrapping_add(1);
                // Phase-locked to the first edge; a stalled loop resyncs
                // instead of toggling in a burst.
                self.last_toggle_ms = if elapsed >= 2 * period {
                    now_ms
                } else {
                    self.last_toggle_ms + period
                };
            }
        }

        self.output()
    }

    /// Audio-only acknowledgement.  Holds until the level changes.
    pub fn silence(&mut self) {
        self.silenced = true;
    }

    pub fn is_silenced(&self) -> bool {
        self.silenced
    }

    pub fn output(&self) -> bool {
        self.tone && !self.silenced
    }

    /// Pattern toggles since boot (diagnostics).
    pub fn toggle_count(&self) -> u32 {
        self.toggles
    }

    pub fn cadence(&self) -> BuzzerCadence {
        self.cadence
    }
}
