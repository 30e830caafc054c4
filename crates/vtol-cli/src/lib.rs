//! VTOL CLI - Terminal drivers for the hub traffic engine.
//!
//! This crate provides the CLI binaries:
//! - run_scenario: headless tick driver with optional real-time pacing
//! - separation_probe: monitor + resolver on canned encounters

pub mod config;
pub mod logging;
pub mod sim;

pub use config::Config;
pub use logging::init_tracing;
