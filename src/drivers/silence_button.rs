//! Polled, debounced alarm-acknowledge button.
//!
//! Active-low momentary switch with pull-up.  The control loop already
//! runs at 50 Hz, so the pin is sampled from `tick()` rather than from an
//! ISR; a press is reported once, after the level has been stable for
//! [`DEBOUNCE_MS`].
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the GPIO via hw_init.
//! On host/test: reads a static `AtomicBool` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

const DEBOUNCE_MS: u64 = 50;

#[cfg(not(target_os = "espidf"))]
static SIM_PRESSED: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_pressed(pressed: bool) {
    SIM_PRESSED.store(pressed, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PressState {
    Released,
    Bouncing { since_ms: u64 },
    Held,
}

pub struct SilenceButton {
    state: PressState,
}

impl Default for SilenceButton {
    fn default() -> Self {
        Self::new()
    }
}

impl SilenceButton {
    pub fn new() -> Self {
        Self {
            state: PressState::Released,
        }
    }

    /// Returns `true` once per debounced press.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        self.update(Self::is_pressed_hw(), now_ms)
    }

    fn update(&mut self, pressed: bool, now_ms: u64) -> bool {
        match (self.state, pressed) {
            (_, false) => {
                self.state = PressState::Released;
                false
            }
            (PressState::Released, true) => {
                self.state = PressState::Bouncing { since_ms: now_ms };
                false
            }
            (PressState::Bouncing { since_ms }, true) => {
                if now_ms.saturating_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = PressState::Held;
                    return true;
                }
                false
            }
            (PressState::Held, true) => false,
        }
    }

    #[cfg(target_os = "espidf")]
    fn is_pressed_hw() -> bool {
        !crate::drivers::hw_init::gpio_read(crate::pins::SILENCE_BUTTON_GPIO)
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_pressed_hw() -> bool {
        SIM_PRESSED.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_reported_once_after_debounce() {
        let mut b = SilenceButton::new();
        assert!(!b.update(true, 0));
        assert!(!b.update(true, 30));
        assert!(b.update(true, 60));
        assert!(!b.update(true, 500));
        assert!(!b.update(false, 520));
        assert!(!b.update(true, 540));
        assert!(b.update(true, 600));
    }

    #[test]
    fn glitch_shorter_than_debounce_is_ignored() {
        let mut b = SilenceButton::new();
        b.update(true, 0);
        b.update(false, 20);
        assert!(!b.update(true, 40));
        assert!(!b.update(true, 80));
        assert!(b.update(true, 90));
    }
}
