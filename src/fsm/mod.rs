//! Function-pointer finite state machine engine.
//!
//! Drives the system operating mode that presentation follows:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌─────────┬───────────┬──────────┬───────────────────┐  │
//! │  │ ModeId  │ on_enter  │ on_exit  │ on_update         │  │
//! │  ├─────────┼───────────┼──────────┼───────────────────┤  │
//! │  │ Preheat │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ Normal  │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  │ Alert   │ fn(ctx)   │ fn(ctx)  │ fn(ctx)->Option<> │  │
//! │  └─────────┴───────────┴──────────┴───────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the **current** mode.
//! If it returns `Some(next_id)`, the engine runs `on_exit` for the
//! current mode, then `on_enter` for the next, and updates the
//! current pointer.  All functions receive `&mut MonitorContext`.
//!
//! Time in mode is measured on the monotonic clock (`ctx.now_ms`), not
//! in ticks, so a jittery loop does not stretch it.

pub mod context;
pub mod states;

use context::MonitorContext;
use log::info;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Enumeration of all operating modes.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ModeId {
    Preheat = 0,
    Normal = 1,
    Alert = 2,
}

impl ModeId {
    /// Total number of modes, used to size the table array.
    pub const COUNT: usize = 3;

    /// Convert an index back to `ModeId`.  Panics on out-of-range in
    /// debug builds; returns `Alert` in release (safe fallback).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Preheat,
            1 => Self::Normal,
            2 => Self::Alert,
            _ => {
                debug_assert!(false, "invalid mode index: {idx}");
                Self::Alert
            }
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Preheat => "Preheat",
            Self::Normal => "Normal",
            Self::Alert => "Alert",
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
/// These run exactly once on each transition.
pub type StateActionFn = fn(&mut MonitorContext);

/// Signature for the per-tick update handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut MonitorContext) -> Option<ModeId>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single mode.
/// Stored in a fixed-size array: no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: ModeId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine.
///
/// Owns the state table (array of [`StateDescriptor`]); the
/// [`MonitorContext`] is threaded through every handler call.
pub struct Fsm {
    /// Fixed-size table indexed by `ModeId as usize`.
    table: [StateDescriptor; ModeId::COUNT],
    /// Index of the currently active mode.
    current: usize,
    /// Monotonic time at which the current mode was entered.
    state_entry_ms: u64,
}

impl Fsm {
    /// Construct a new FSM with the given state table, starting in `initial`.
    pub fn new(table: [StateDescriptor; ModeId::COUNT], initial: ModeId) -> Self {
        Self {
            table,
            current: initial as usize,
            state_entry_ms: 0,
        }
    }

    /// Run the initial `on_enter` for the starting mode.
    /// Call once after construction, before the first `tick()`.
    pub fn start(&mut self, ctx: &mut MonitorContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        self.state_entry_ms = ctx.now_ms;
        ctx.ms_in_state = 0;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance the FSM by one tick.
    ///
    /// 1. Refresh `ctx.ms_in_state`.
    /// 2. Call `on_update` for the current mode.
    /// 3. If it returns `Some(next)`, execute the transition:
    ///    `on_exit(current)` → update pointer → `on_enter(next)`.
    ///
    /// Returns the `(from, to)` pair when a transition happened.
    pub fn tick(&mut self, ctx: &mut MonitorContext) -> Option<(ModeId, ModeId)> {
        ctx.ms_in_state = ctx.now_ms.saturating_sub(self.state_entry_ms);

        let next = (self.table[self.current].on_update)(ctx)?;
        let from = self.current_state();
        if next == from {
            return None;
        }
        self.transition(next, ctx);
        Some((from, next))
    }

    /// The current mode's identity.
    pub fn current_state(&self) -> ModeId {
        ModeId::from_index(self.current)
    }

    /// How long the FSM has been in the current mode.
    pub fn ms_in_current_state(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.state_entry_ms)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next_id: ModeId, ctx: &mut MonitorContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_ms = ctx.now_ms;
        ctx.ms_in_state = 0;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::context::MonitorContext;
    use super::*;
    use crate::alerts::Severity;
    use crate::config::SystemConfig;
    use crate::heating::{GasGate, GasGates};

    fn make_ctx() -> MonitorContext {
        MonitorContext::new(SystemConfig::default(), 0)
    }

    fn make_fsm() -> Fsm {
        Fsm::new(states::build_state_table(), ModeId::Preheat)
    }

    fn warm(ctx: &mut MonitorContext, co: GasGate) {
        ctx.sensors.gates = GasGates {
            co,
            combustible: GasGate::Ready,
        };
    }

    fn block(ctx: &mut MonitorContext, blocked: bool) {
        ctx.severity.level = if blocked { Severity::Danger } else { Severity::None };
        ctx.severity.navigation_blocked = blocked;
    }

    #[test]
    fn starts_in_preheat() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        assert_eq!(fsm.current_state(), ModeId::Preheat);
        assert!(!ctx.safety_view_forced);
    }

    #[test]
    fn preheat_holds_until_both_cells_warm() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);

        ctx.sensors.gates.combustible = GasGate::Ready;
        assert_eq!(fsm.tick(&mut ctx), None);

        warm(&mut ctx, GasGate::Purging);
        assert_eq!(fsm.tick(&mut ctx), Some((ModeId::Preheat, ModeId::Normal)));
    }

    #[test]
    fn purge_phase_does_not_bounce_back_to_preheat() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        warm(&mut ctx, GasGate::Ready);
        fsm.tick(&mut ctx);

        for co in [GasGate::Purging, GasGate::Ready, GasGate::Purging] {
            warm(&mut ctx, co);
            fsm.tick(&mut ctx);
            assert_eq!(fsm.current_state(), ModeId::Normal);
        }
    }

    #[test]
    fn blocked_navigation_enters_alert_from_any_mode() {
        for start in [ModeId::Preheat, ModeId::Normal] {
            let mut fsm = make_fsm();
            let mut ctx = make_ctx();
            fsm.start(&mut ctx);
            if start == ModeId::Normal {
                warm(&mut ctx, GasGate::Ready);
                fsm.tick(&mut ctx);
            }
            assert_eq!(fsm.current_state(), start);

            block(&mut ctx, true);
            fsm.tick(&mut ctx);
            assert_eq!(fsm.current_state(), ModeId::Alert, "from {start:?}");
            assert!(ctx.safety_view_forced);
        }
    }

    #[test]
    fn alert_clears_override_on_first_calm_tick() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        warm(&mut ctx, GasGate::Ready);
        block(&mut ctx, true);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), ModeId::Alert);

        block(&mut ctx, false);
        assert_eq!(fsm.tick(&mut ctx), Some((ModeId::Alert, ModeId::Normal)));
        assert!(!ctx.safety_view_forced);
    }

    #[test]
    fn alert_falls_back_to_preheat_when_cells_cold() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        block(&mut ctx, true);
        fsm.tick(&mut ctx);

        block(&mut ctx, false);
        fsm.tick(&mut ctx);
        assert_eq!(fsm.current_state(), ModeId::Preheat);
    }

    #[test]
    fn time_in_mode_follows_clock() {
        let mut fsm = make_fsm();
        let mut ctx = make_ctx();
        fsm.start(&mut ctx);
        ctx.now_ms = 1_500;
        fsm.tick(&mut ctx);
        assert_eq!(ctx.ms_in_state, 1_500);

        warm(&mut ctx, GasGate::Ready);
        ctx.now_ms = 2_000;
        fsm.tick(&mut ctx);
        assert_eq!(fsm.ms_in_current_state(2_300), 300);
    }

    #[test]
    fn mode_from_index_roundtrip() {
        for i in 0..ModeId::COUNT {
            assert_eq!(ModeId::from_index(i) as usize, i);
        }
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn mode_from_invalid_index_returns_alert() {
        assert_eq!(ModeId::from_index(99), ModeId::Alert);
    }
}
