//! VanWatch firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod alerts;
pub mod app;
pub mod arbitration;
pub mod cadence;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod evaluation;
pub mod fsm;
pub mod heating;
pub mod scheduler;

// Hardware-facing modules; the actual implementations are guarded by
// cfg attributes inside, with simulation paths on the host.
pub mod adapters;
pub mod drivers;
pub mod pins;
pub mod sensors;
