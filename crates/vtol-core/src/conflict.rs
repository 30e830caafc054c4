//! Separation monitor.
//!
//! Scans a snapshot of airborne aircraft for pairs that violate the
//! configured separation standards and classifies how bad each violation is.
//! The monitor is stateless: it reads tracks and returns new conflict values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::rules::{SeparationStandards, SeverityBreakpoints};

/// Severity tiers, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictSeverity {
    /// Inside the warning zone only
    Low,
    Medium,
    High,
    /// Immediate loss of separation or imminent collision
    Critical,
}

/// Planar position and velocity of one aircraft at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPosition {
    pub aircraft_id: String,
    pub x_m: f64,
    pub y_m: f64,
    pub altitude_m: f64,
    /// Compass heading of the horizontal velocity
    pub heading_deg: f64,
    pub speed_mps: f64,
    pub vertical_rate_mps: f64,
}

impl TrackPosition {
    /// Create a stationary track.
    pub fn new(aircraft_id: impl Into<String>, x_m: f64, y_m: f64, altitude_m: f64) -> Self {
        Self {
            aircraft_id: aircraft_id.into(),
            x_m,
            y_m,
            altitude_m,
            heading_deg: 0.0,
            speed_mps: 0.0,
            vertical_rate_mps: 0.0,
        }
    }

    /// Set heading, ground speed and vertical rate.
    pub fn with_velocity(mut self, heading_deg: f64, speed_mps: f64, vertical_rate_mps: f64) -> Self {
        self.heading_deg = heading_deg;
        self.speed_mps = speed_mps;
        self.vertical_rate_mps = vertical_rate_mps;
        self
    }

    pub fn planar(&self) -> (f64, f64) {
        (self.x_m, self.y_m)
    }

    /// Velocity vector `(vx, vy, vz)` in m/s.
    pub fn velocity(&self) -> (f64, f64, f64) {
        let (vx, vy) = crate::spatial::velocity_from_heading(self.heading_deg, self.speed_mps);
        (vx, vy, self.vertical_rate_mps)
    }
}

/// Detected separation violation between two aircraft.
///
/// `aircraft_a` is always the lexicographically smaller id, so a pair has a
/// single representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub aircraft_a: String,
    pub aircraft_b: String,
    pub horizontal_m: f64,
    pub vertical_m: f64,
    /// Seconds until collision at the current closing rate; infinite when
    /// the pair is diverging or parallel
    pub time_to_collision_s: f64,
    pub closing_rate_mps: f64,
    pub horizontal_violated: bool,
    pub vertical_violated: bool,
    pub severity: ConflictSeverity,
}

impl Conflict {
    pub fn conflict_id(&self) -> String {
        format!("{}:{}", self.aircraft_a, self.aircraft_b)
    }
}

/// Full separation picture for one pair, conflict or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparationAssessment {
    pub horizontal_m: f64,
    pub vertical_m: f64,
    pub time_to_collision_s: f64,
    pub closing_rate_mps: f64,
    /// Measured / standard; below 1.0 means the standard is violated
    pub horizontal_fraction: f64,
    pub vertical_fraction: f64,
    pub ttc_fraction: f64,
    pub horizontal_violated: bool,
    pub vertical_violated: bool,
    pub overall_safe: bool,
    pub severity: ConflictSeverity,
}

/// Tier a set of fractions against the configured breakpoints.
///
/// The worst separation fraction picks a tier, the time-to-collision
/// fraction picks another, and the more severe of the two wins.
pub fn classify_severity(
    horizontal_fraction: f64,
    vertical_fraction: f64,
    ttc_fraction: f64,
    breakpoints: &SeverityBreakpoints,
) -> ConflictSeverity {
    let separation = horizontal_fraction.min(vertical_fraction);
    let by_separation = tier(
        separation,
        breakpoints.critical,
        breakpoints.high,
        breakpoints.medium,
    );
    let by_ttc = tier(
        ttc_fraction,
        breakpoints.ttc_critical,
        breakpoints.ttc_high,
        breakpoints.ttc_medium,
    );
    by_separation.max(by_ttc)
}

fn tier(fraction: f64, critical: f64, high: f64, medium: f64) -> ConflictSeverity {
    if fraction.is_nan() || fraction < critical {
        ConflictSeverity::Critical
    } else if fraction < high {
        ConflictSeverity::High
    } else if fraction < medium {
        ConflictSeverity::Medium
    } else {
        ConflictSeverity::Low
    }
}

/// Pairwise separation monitor.
#[derive(Debug, Clone, Default)]
pub struct SeparationMonitor {
    standards: SeparationStandards,
}

impl SeparationMonitor {
    pub fn new(standards: SeparationStandards) -> Self {
        Self { standards }
    }

    pub fn standards(&self) -> &SeparationStandards {
        &self.standards
    }

    /// Measure one pair against the standards.
    pub fn assess_pair(&self, a: &TrackPosition, b: &TrackPosition) -> SeparationAssessment {
        let std = &self.standards;
        let horizontal_m = crate::spatial::planar_distance(a.planar(), b.planar());
        let vertical_m = (a.altitude_m - b.altitude_m).abs();
        let (time_to_collision_s, closing_rate_mps) =
            time_to_collision(a, b, std.closing_rate_epsilon_mps);

        let horizontal_fraction = horizontal_m / std.min_horizontal_separation_m;
        let vertical_fraction = vertical_m / std.min_vertical_separation_m;
        let ttc_fraction = time_to_collision_s / std.min_time_to_collision_s;

        let horizontal_violated = horizontal_m < std.min_horizontal_separation_m;
        let vertical_violated = vertical_m < std.min_vertical_separation_m;

        SeparationAssessment {
            horizontal_m,
            vertical_m,
            time_to_collision_s,
            closing_rate_mps,
            horizontal_fraction,
            vertical_fraction,
            ttc_fraction,
            horizontal_violated,
            vertical_violated,
            overall_safe: !(horizontal_violated || vertical_violated),
            severity: classify_severity(
                horizontal_fraction,
                vertical_fraction,
                ttc_fraction,
                &std.breakpoints,
            ),
        }
    }

    /// Check all tracks for conflicts.
    ///
    /// The result does not depend on input order: tracks are sorted by id,
    /// each unordered pair is visited once, and conflicts come back sorted by
    /// pair.
    pub fn detect_conflicts(&self, tracks: &[TrackPosition]) -> Vec<Conflict> {
        let mut sorted: Vec<&TrackPosition> = tracks.iter().collect();
        sorted.sort_by(|a, b| a.aircraft_id.cmp(&b.aircraft_id));
        sorted.dedup_by(|a, b| a.aircraft_id == b.aircraft_id);

        let mut conflicts = Vec::new();
        if sorted.len() < 2 {
            return conflicts;
        }

        let radius = self.standards.proximity_radius_m;
        let cell_size_m = radius.max(1.0);
        let cell_of = |track: &TrackPosition| {
            (
                (track.x_m / cell_size_m).floor() as i64,
                (track.y_m / cell_size_m).floor() as i64,
            )
        };

        let mut grid: HashMap<(i64, i64), Vec<usize>> = HashMap::new();
        for (idx, track) in sorted.iter().copied().enumerate() {
            grid.entry(cell_of(track)).or_default().push(idx);
        }

        // Neighbouring cells only; anything farther is beyond the proximity radius.
        for (i, first) in sorted.iter().copied().enumerate() {
            let (cell_x, cell_y) = cell_of(first);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    let Some(indices) = grid.get(&(cell_x + dx, cell_y + dy)) else {
                        continue;
                    };
                    for &j in indices {
                        if j <= i {
                            continue;
                        }
                        let second = sorted[j];

                        // Bounding box before the precise distance.
                        if (first.x_m - second.x_m).abs() > radius
                            || (first.y_m - second.y_m).abs() > radius
                        {
                            continue;
                        }

                        let assessment = self.assess_pair(first, second);
                        if assessment.horizontal_m > radius || assessment.overall_safe {
                            continue;
                        }

                        conflicts.push(Conflict {
                            aircraft_a: first.aircraft_id.clone(),
                            aircraft_b: second.aircraft_id.clone(),
                            horizontal_m: assessment.horizontal_m,
                            vertical_m: assessment.vertical_m,
                            time_to_collision_s: assessment.time_to_collision_s,
                            closing_rate_mps: assessment.closing_rate_mps,
                            horizontal_violated: assessment.horizontal_violated,
                            vertical_violated: assessment.vertical_violated,
                            severity: assessment.severity,
                        });
                    }
                }
            }
        }

        conflicts.sort_by(|a, b| {
            a.aircraft_a
                .cmp(&b.aircraft_a)
                .then_with(|| a.aircraft_b.cmp(&b.aircraft_b))
        });
        conflicts
    }
}

/// Time to collision and closing rate from relative velocity projected onto
/// the separation vector.
fn time_to_collision(a: &TrackPosition, b: &TrackPosition, epsilon: f64) -> (f64, f64) {
    let d = (b.x_m - a.x_m, b.y_m - a.y_m, b.altitude_m - a.altitude_m);
    let (avx, avy, avz) = a.velocity();
    let (bvx, bvy, bvz) = b.velocity();
    let v = (bvx - avx, bvy - avy, bvz - avz);

    let distance = (d.0 * d.0 + d.1 * d.1 + d.2 * d.2).sqrt();
    if distance < 1e-9 {
        return (0.0, (v.0 * v.0 + v.1 * v.1 + v.2 * v.2).sqrt());
    }

    let closing_rate = -(d.0 * v.0 + d.1 * v.1 + d.2 * v.2) / distance;
    if closing_rate < epsilon {
        (f64::INFINITY, closing_rate)
    } else {
        (distance / closing_rate, closing_rate)
    }
}
