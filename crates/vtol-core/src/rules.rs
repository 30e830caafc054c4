//! Separation standards, severity breakpoints and maneuver limits.

use serde::{Deserialize, Serialize};

/// Minimum separation considered safe between two airborne aircraft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeparationStandards {
    /// Minimum horizontal separation in meters
    pub min_horizontal_separation_m: f64,
    /// Minimum vertical separation in meters
    pub min_vertical_separation_m: f64,
    /// Minimum time-to-collision in seconds
    pub min_time_to_collision_s: f64,
    /// Pairs farther apart than this (horizontally) are never examined
    pub proximity_radius_m: f64,
    /// Closing rates below this are treated as diverging/parallel
    pub closing_rate_epsilon_mps: f64,
    pub breakpoints: SeverityBreakpoints,
}

impl Default for SeparationStandards {
    fn default() -> Self {
        Self {
            min_horizontal_separation_m: 150.0,
            min_vertical_separation_m: 60.0,
            min_time_to_collision_s: 30.0,
            proximity_radius_m: 300.0,
            closing_rate_epsilon_mps: 0.01,
            breakpoints: SeverityBreakpoints::default(),
        }
    }
}

/// Fractions of each standard at which severity escalates.
///
/// A separation fraction is `measured / standard`; the worst fraction across
/// horizontal and vertical separation selects the tier, and the time-to-collision
/// fraction can only raise it further.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityBreakpoints {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub ttc_critical: f64,
    pub ttc_high: f64,
    pub ttc_medium: f64,
}

impl Default for SeverityBreakpoints {
    fn default() -> Self {
        Self {
            critical: 0.5,
            high: 0.75,
            medium: 1.0,
            ttc_critical: 0.25,
            ttc_high: 0.5,
            ttc_medium: 1.0,
        }
    }
}

/// Bounds on the corrective actions the maneuver resolver may propose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManeuverLimits {
    /// Vertical separation the resolver aims for after a climb/descend split
    pub target_vertical_separation_m: f64,
    pub min_altitude_change_m: f64,
    pub max_altitude_change_m: f64,
    pub min_climb_angle_deg: f64,
    pub max_climb_angle_deg: f64,
    pub min_turn_deg: f64,
    pub max_turn_deg: f64,
    /// Extra turn attached to a vertical maneuver when both dimensions are critical
    pub combined_turn_deg: f64,
    /// Fractional speed change, e.g. 0.1 = 10 %
    pub min_speed_change: f64,
    pub max_speed_change: f64,
    pub vertical_rate_mps: f64,
    pub turn_rate_deg_per_s: f64,
    pub speed_settle_s: f64,
    /// Closing rate at which confidence takes its full penalty
    pub high_closing_rate_mps: f64,
    /// Horizon used for confidence when time-to-collision is infinite
    pub unbounded_ttc_horizon_s: f64,
}

impl Default for ManeuverLimits {
    fn default() -> Self {
        Self {
            target_vertical_separation_m: 90.0,
            min_altitude_change_m: 5.0,
            max_altitude_change_m: 120.0,
            min_climb_angle_deg: 3.0,
            max_climb_angle_deg: 25.0,
            min_turn_deg: 10.0,
            max_turn_deg: 60.0,
            combined_turn_deg: 15.0,
            min_speed_change: 0.05,
            max_speed_change: 0.3,
            vertical_rate_mps: 5.0,
            turn_rate_deg_per_s: 6.0,
            speed_settle_s: 8.0,
            high_closing_rate_mps: 60.0,
            unbounded_ttc_horizon_s: 120.0,
        }
    }
}
