//! Runtime settings from environment.
//!
//! Command-line flags override anything read here.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Scenario JSON file; the built-in two-hub scenario when unset
    pub scenario_path: Option<PathBuf>,
    pub ticks: u64,
    pub delta_s: f64,
    pub playback_speed: f64,
    pub safety_score: f64,
    pub json_logs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenario_path: None,
            ticks: 600,
            delta_s: 1.0,
            playback_speed: 1.0,
            safety_score: 100.0,
            json_logs: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            scenario_path: env::var("VTOL_SCENARIO").ok().map(PathBuf::from),
            ticks: parse_var("VTOL_TICKS").unwrap_or(defaults.ticks),
            delta_s: parse_var("VTOL_TICK_DELTA_S").unwrap_or(defaults.delta_s),
            playback_speed: parse_var("VTOL_PLAYBACK_SPEED").unwrap_or(defaults.playback_speed),
            safety_score: parse_var("VTOL_SAFETY_SCORE").unwrap_or(defaults.safety_score),
            json_logs: env::var("VTOL_LOG_FORMAT")
                .map(|format| format.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.json_logs),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}
