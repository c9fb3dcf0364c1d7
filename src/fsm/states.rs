//! Concrete mode handler functions and table builder.
//!
//! Each mode is defined by three plain `fn` pointers: no closures, no
//! dynamic dispatch, no heap.
//!
//! ```text
//!  PREHEAT ──[both cells warm]──▶ NORMAL
//!     │                             │
//!     └──[nav blocked]──▶ ALERT ◀───┘
//!                           │
//!          [clear] ─────────┴──▶ NORMAL (warm) / PREHEAT (cold)
//! ```
//!
//! The CO cell's recurring purge phase counts as warm.

use super::context::MonitorContext;
use super::{ModeId, StateDescriptor};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static mode table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; ModeId::COUNT] {
    [
        // Index 0: Preheat
        StateDescriptor {
            id: ModeId::Preheat,
            name: "Preheat",
            on_enter: Some(preheat_enter),
            on_exit: None,
            on_update: preheat_update,
        },
        // Index 1: Normal
        StateDescriptor {
            id: ModeId::Normal,
            name: "Normal",
            on_enter: Some(normal_enter),
            on_exit: None,
            on_update: normal_update,
        },
        // Index 2: Alert
        StateDescriptor {
            id: ModeId::Alert,
            name: "Alert",
            on_enter: Some(alert_enter),
            on_exit: Some(alert_exit),
            on_update: alert_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  PREHEAT: gas cells warming, no gas opinion yet
// ═══════════════════════════════════════════════════════════════════════════

fn preheat_enter(ctx: &mut MonitorContext) {
    info!(
        "PREHEAT: gas cells warming (CO {:?}, combustible {:?})",
        ctx.sensors.gates.co, ctx.sensors.gates.combustible
    );
}

fn preheat_update(ctx: &mut MonitorContext) -> Option<ModeId> {
    if ctx.navigation_blocked() {
        return Some(ModeId::Alert);
    }
    if ctx.gas_warmed_up() {
        return Some(ModeId::Normal);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  NORMAL
// ═══════════════════════════════════════════════════════════════════════════

fn normal_enter(_ctx: &mut MonitorContext) {
    info!("NORMAL: all sensors trusted, monitoring");
}

fn normal_update(ctx: &mut MonitorContext) -> Option<ModeId> {
    if ctx.navigation_blocked() {
        return Some(ModeId::Alert);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ALERT: safety view pinned while DANGER or CRITICAL holds
// ═══════════════════════════════════════════════════════════════════════════

fn alert_enter(ctx: &mut MonitorContext) {
    ctx.safety_view_forced = true;
    match ctx.severity.primary {
        Some(kind) => warn!(
            "ALERT: {} at {}, navigation locked",
            kind, ctx.severity.level
        ),
        None => warn!("ALERT: navigation locked"),
    }
}

fn alert_exit(ctx: &mut MonitorContext) {
    ctx.safety_view_forced = false;
    info!(
        "ALERT cleared after {} ms, navigation unlocked",
        ctx.ms_in_state
    );
}

fn alert_update(ctx: &mut MonitorContext) -> Option<ModeId> {
    if ctx.navigation_blocked() {
        return None;
    }
    if ctx.gas_warmed_up() {
        Some(ModeId::Normal)
    } else {
        Some(ModeId::Preheat)
    }
}
