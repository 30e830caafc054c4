//! Canned traffic for exercising the monitor and resolver.

pub mod scenarios;

pub use scenarios::{all_scenarios, scenario_by_name, Encounter};
