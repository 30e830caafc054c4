//! Maneuver resolver.
//!
//! Given a detected conflict and both aircraft's tracks, propose one bounded
//! corrective action per aircraft. Proposals are never clamped into bounds:
//! anything outside the configured maneuver limits comes back `Rejected`
//! with a reason, and the caller asks again on a later tick.

use serde::{Deserialize, Serialize};

use crate::conflict::{Conflict, TrackPosition};
use crate::rules::{ManeuverLimits, SeparationStandards};
use crate::spatial::{compass_bearing, signed_angle_delta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ManeuverKind {
    Climb,
    Descend,
    TurnLeft,
    TurnRight,
    SpeedUp,
    SlowDown,
}

impl ManeuverKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ManeuverKind::Climb => "climb",
            ManeuverKind::Descend => "descend",
            ManeuverKind::TurnLeft => "turn left",
            ManeuverKind::TurnRight => "turn right",
            ManeuverKind::SpeedUp => "speed up",
            ManeuverKind::SlowDown => "slow down",
        }
    }
}

/// Which family of maneuvers a resolution uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStrategy {
    Vertical,
    Horizontal,
    /// Vertical split with a bounded turn attached
    Combined,
    Speed,
}

/// Turn attached to a vertical action by the combined strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnAdvice {
    pub kind: ManeuverKind,
    pub degrees: f64,
}

/// One corrective action for one aircraft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManeuverAction {
    pub aircraft_id: String,
    pub kind: ManeuverKind,
    /// Meters for climb/descend, degrees for turns, fraction of current
    /// speed for speed changes
    pub magnitude: f64,
    pub duration_s: f64,
    pub confidence: f64,
    /// Flight-path angle of a vertical action
    pub climb_angle_deg: Option<f64>,
    pub combined_turn: Option<TurnAdvice>,
}

/// Lifecycle of a proposed resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolutionStatus {
    Pending,
    /// Accepted by the external authority
    Executed,
    /// Applied; waiting for the re-check
    Monitoring,
    Resolved,
    /// Infeasible proposal; request a new one later
    Rejected { reason: String },
}

impl ResolutionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionStatus::Pending => "PENDING",
            ResolutionStatus::Executed => "EXECUTED",
            ResolutionStatus::Monitoring => "MONITORING",
            ResolutionStatus::Resolved => "RESOLVED",
            ResolutionStatus::Rejected { .. } => "REJECTED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolutionError {
    #[error("resolution {conflict_id} cannot go from {from} to {to}")]
    InvalidTransition {
        conflict_id: String,
        from: &'static str,
        to: &'static str,
    },
}

/// Proposed pair of corrective actions for one conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub conflict_id: String,
    pub strategy: ResolutionStrategy,
    /// One action per aircraft, `aircraft_a` first. Empty when the request
    /// itself was stale.
    pub actions: Vec<ManeuverAction>,
    /// Weakest action confidence
    pub confidence: f64,
    pub status: ResolutionStatus,
}

impl Resolution {
    /// A rejection with no actions, for requests that cannot be evaluated.
    pub fn rejected(conflict_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            conflict_id: conflict_id.into(),
            strategy: ResolutionStrategy::Speed,
            actions: Vec::new(),
            confidence: 0.0,
            status: ResolutionStatus::Rejected {
                reason: reason.into(),
            },
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.status, ResolutionStatus::Rejected { .. })
    }

    pub fn action_for(&self, aircraft_id: &str) -> Option<&ManeuverAction> {
        self.actions.iter().find(|action| action.aircraft_id == aircraft_id)
    }

    /// PENDING to EXECUTED.
    pub fn execute(&mut self) -> Result<(), ResolutionError> {
        self.transition(ResolutionStatus::Pending, ResolutionStatus::Executed)
    }

    /// EXECUTED to MONITORING.
    pub fn begin_monitoring(&mut self) -> Result<(), ResolutionError> {
        self.transition(ResolutionStatus::Executed, ResolutionStatus::Monitoring)
    }

    /// Re-check a monitored resolution.
    ///
    /// Returns `Ok(true)` when the conflict has cleared and the resolution is
    /// now RESOLVED; `Ok(false)` when the conflict persists and the caller
    /// should request a fresh resolution.
    pub fn recheck(&mut self, still_in_conflict: bool) -> Result<bool, ResolutionError> {
        if self.status != ResolutionStatus::Monitoring {
            return Err(self.invalid("RESOLVED"));
        }
        if still_in_conflict {
            return Ok(false);
        }
        self.status = ResolutionStatus::Resolved;
        Ok(true)
    }

    fn transition(
        &mut self,
        from: ResolutionStatus,
        to: ResolutionStatus,
    ) -> Result<(), ResolutionError> {
        if self.status != from {
            return Err(self.invalid(to.label()));
        }
        self.status = to;
        Ok(())
    }

    fn invalid(&self, to: &'static str) -> ResolutionError {
        ResolutionError::InvalidTransition {
            conflict_id: self.conflict_id.clone(),
            from: self.status.label(),
            to,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManeuverResolver {
    limits: ManeuverLimits,
    standards: SeparationStandards,
}

impl ManeuverResolver {
    pub fn new(limits: ManeuverLimits, standards: SeparationStandards) -> Self {
        Self { limits, standards }
    }

    pub fn limits(&self) -> &ManeuverLimits {
        &self.limits
    }

    /// Propose corrective actions for `conflict`. The tracks may be passed
    /// in either order but must belong to the conflicting pair.
    pub fn resolve(&self, conflict: &Conflict, a: &TrackPosition, b: &TrackPosition) -> Resolution {
        let conflict_id = conflict.conflict_id();
        let ordered = if a.aircraft_id == conflict.aircraft_a && b.aircraft_id == conflict.aircraft_b {
            Some((a, b))
        } else if b.aircraft_id == conflict.aircraft_a && a.aircraft_id == conflict.aircraft_b {
            Some((b, a))
        } else {
            None
        };
        let Some((first, second)) = ordered else {
            return Resolution::rejected(
                conflict_id,
                format!(
                    "tracks {} and {} do not match the conflicting pair",
                    a.aircraft_id, b.aircraft_id
                ),
            );
        };

        let critical = self.standards.breakpoints.critical;
        let horizontal_fraction = conflict.horizontal_m / self.standards.min_horizontal_separation_m;
        let vertical_fraction = conflict.vertical_m / self.standards.min_vertical_separation_m;
        let horizontal_critical = horizontal_fraction < critical;
        let vertical_critical = vertical_fraction < critical;

        let (strategy, mut actions) = match (horizontal_critical, vertical_critical) {
            (false, true) => (ResolutionStrategy::Vertical, self.vertical_split(conflict, first, second)),
            (true, false) => (ResolutionStrategy::Horizontal, self.turn_away(first, second)),
            (true, true) => {
                let mut actions = self.vertical_split(conflict, first, second);
                let turns = self.turn_away(first, second);
                for (action, turn) in actions.iter_mut().zip(turns) {
                    action.combined_turn = Some(TurnAdvice {
                        kind: turn.kind,
                        degrees: self.limits.combined_turn_deg,
                    });
                    action.duration_s = action
                        .duration_s
                        .max(self.limits.combined_turn_deg / self.limits.turn_rate_deg_per_s);
                }
                (ResolutionStrategy::Combined, actions)
            }
            (false, false) => (
                ResolutionStrategy::Speed,
                self.speed_split(horizontal_fraction.min(vertical_fraction), first, second),
            ),
        };

        for action in &mut actions {
            action.confidence = self.action_confidence(action.duration_s, conflict);
        }
        let confidence = actions
            .iter()
            .map(|action| action.confidence)
            .fold(1.0_f64, f64::min)
            .clamp(0.0, 1.0);

        let status = match actions.iter().find_map(|action| self.infeasibility(action)) {
            Some(reason) => ResolutionStatus::Rejected { reason },
            None => ResolutionStatus::Pending,
        };

        Resolution {
            conflict_id,
            strategy,
            actions,
            confidence,
            status,
        }
    }

    /// Lower aircraft climbs, upper descends, each by half the shortfall to
    /// the target vertical separation. Equal altitudes: `first` climbs.
    fn vertical_split(
        &self,
        conflict: &Conflict,
        first: &TrackPosition,
        second: &TrackPosition,
    ) -> Vec<ManeuverAction> {
        let shortfall = (self.limits.target_vertical_separation_m - conflict.vertical_m).max(0.0);
        let change = shortfall / 2.0;
        let (climber, descender) = if second.altitude_m < first.altitude_m {
            (second, first)
        } else {
            (first, second)
        };

        let mut actions = vec![
            self.vertical_action(climber, ManeuverKind::Climb, change),
            self.vertical_action(descender, ManeuverKind::Descend, change),
        ];
        actions.sort_by(|x, y| x.aircraft_id.cmp(&y.aircraft_id));
        actions
    }

    fn vertical_action(&self, track: &TrackPosition, kind: ManeuverKind, change_m: f64) -> ManeuverAction {
        let rate = self.limits.vertical_rate_mps;
        let path_angle = rate.atan2(track.speed_mps.max(0.0)).to_degrees();
        ManeuverAction {
            aircraft_id: track.aircraft_id.clone(),
            kind,
            magnitude: change_m,
            duration_s: change_m / rate,
            confidence: 0.0,
            climb_angle_deg: Some(path_angle.max(self.limits.min_climb_angle_deg)),
            combined_turn: None,
        }
    }

    /// Both aircraft turn away from each other. Head-on geometry gets the
    /// largest turn, same-direction traffic the smallest.
    fn turn_away(&self, first: &TrackPosition, second: &TrackPosition) -> Vec<ManeuverAction> {
        let relative_heading = signed_angle_delta(first.heading_deg, second.heading_deg).abs();
        let span = self.limits.max_turn_deg - self.limits.min_turn_deg;
        let degrees = self.limits.min_turn_deg + span * (relative_heading / 180.0);

        [(first, second), (second, first)]
            .into_iter()
            .map(|(own, other)| {
                let bearing = compass_bearing(own.planar(), other.planar());
                // Traffic to the right means turn left; dead ahead turns right.
                let kind = if signed_angle_delta(own.heading_deg, bearing) > 1e-6 {
                    ManeuverKind::TurnLeft
                } else {
                    ManeuverKind::TurnRight
                };
                ManeuverAction {
                    aircraft_id: own.aircraft_id.clone(),
                    kind,
                    magnitude: degrees,
                    duration_s: degrees / self.limits.turn_rate_deg_per_s,
                    confidence: 0.0,
                    climb_angle_deg: None,
                    combined_turn: None,
                }
            })
            .collect()
    }

    /// The aircraft ahead along the direction of travel speeds up and the
    /// one behind slows down. The closer the pair is to the critical tier,
    /// the larger the change.
    fn speed_split(
        &self,
        worst_fraction: f64,
        first: &TrackPosition,
        second: &TrackPosition,
    ) -> Vec<ManeuverAction> {
        let (fvx, fvy, _) = first.velocity();
        let (svx, svy, _) = second.velocity();
        let mean = ((fvx + svx) / 2.0, (fvy + svy) / 2.0);
        let separation = (second.x_m - first.x_m, second.y_m - first.y_m);
        let second_ahead = mean.0 * separation.0 + mean.1 * separation.1 >= 0.0;

        let critical = self.standards.breakpoints.critical;
        let urgency = ((1.0 - worst_fraction) / (1.0 - critical).max(1e-9)).clamp(0.0, 1.0);
        let fraction = self.limits.min_speed_change
            + (self.limits.max_speed_change - self.limits.min_speed_change) * urgency;

        let action = |track: &TrackPosition, kind| ManeuverAction {
            aircraft_id: track.aircraft_id.clone(),
            kind,
            magnitude: fraction,
            duration_s: self.limits.speed_settle_s,
            confidence: 0.0,
            climb_angle_deg: None,
            combined_turn: None,
        };
        if second_ahead {
            vec![action(first, ManeuverKind::SlowDown), action(second, ManeuverKind::SpeedUp)]
        } else {
            vec![action(first, ManeuverKind::SpeedUp), action(second, ManeuverKind::SlowDown)]
        }
    }

    /// Margin between time-to-collision and the time the action needs,
    /// discounted for fast closure.
    fn action_confidence(&self, duration_s: f64, conflict: &Conflict) -> f64 {
        let available = if conflict.time_to_collision_s.is_finite() {
            conflict.time_to_collision_s
        } else {
            self.limits.unbounded_ttc_horizon_s
        };
        if !(available > 0.0) || !duration_s.is_finite() {
            return 0.0;
        }
        let timing = (1.0 - duration_s / available).clamp(0.0, 1.0);
        let closure =
            (conflict.closing_rate_mps.max(0.0) / self.limits.high_closing_rate_mps).clamp(0.0, 1.0);
        (timing * (1.0 - 0.5 * closure)).clamp(0.0, 1.0)
    }

    fn infeasibility(&self, action: &ManeuverAction) -> Option<String> {
        let limits = &self.limits;
        let (lo, hi, unit) = match action.kind {
            ManeuverKind::Climb | ManeuverKind::Descend => {
                (limits.min_altitude_change_m, limits.max_altitude_change_m, "m")
            }
            ManeuverKind::TurnLeft | ManeuverKind::TurnRight => {
                (limits.min_turn_deg, limits.max_turn_deg, "deg")
            }
            ManeuverKind::SpeedUp | ManeuverKind::SlowDown => {
                (limits.min_speed_change, limits.max_speed_change, "")
            }
        };
        if !action.magnitude.is_finite() || action.magnitude < lo || action.magnitude > hi {
            return Some(format!(
                "{} for {} of {:.2}{unit} is outside [{lo}, {hi}]",
                action.kind.as_str(),
                action.aircraft_id,
                action.magnitude
            ));
        }
        if let Some(angle) = action.climb_angle_deg {
            if !angle.is_finite() || angle > limits.max_climb_angle_deg {
                return Some(format!(
                    "{} for {} needs a {angle:.1} deg path angle, above the {} deg limit",
                    action.kind.as_str(),
                    action.aircraft_id,
                    limits.max_climb_angle_deg
                ));
            }
        }
        if let Some(turn) = action.combined_turn {
            if turn.degrees < limits.min_turn_deg || turn.degrees > limits.max_turn_deg {
                return Some(format!(
                    "combined turn of {:.1} deg for {} is outside [{}, {}]",
                    turn.degrees, action.aircraft_id, limits.min_turn_deg, limits.max_turn_deg
                ));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::SeparationMonitor;

    fn resolver() -> ManeuverResolver {
        ManeuverResolver::new(ManeuverLimits::default(), SeparationStandards::default())
    }

    fn conflict_for(a: &TrackPosition, b: &TrackPosition) -> Conflict {
        let monitor = SeparationMonitor::new(SeparationStandards::default());
        let conflicts = monitor.detect_conflicts(&[a.clone(), b.clone()]);
        assert_eq!(conflicts.len(), 1, "expected a conflict");
        conflicts.into_iter().next().unwrap()
    }

    fn assert_within_limits(resolution: &Resolution, limits: &ManeuverLimits) {
        for action in &resolution.actions {
            match action.kind {
                ManeuverKind::Climb | ManeuverKind::Descend => {
                    assert!(action.magnitude >= limits.min_altitude_change_m);
                    assert!(action.magnitude <= limits.max_altitude_change_m);
                    let angle = action.climb_angle_deg.unwrap();
                    assert!(angle >= limits.min_climb_angle_deg && angle <= limits.max_climb_angle_deg);
                }
                ManeuverKind::TurnLeft | ManeuverKind::TurnRight => {
                    assert!(action.magnitude >= limits.min_turn_deg);
                    assert!(action.magnitude <= limits.max_turn_deg);
                }
                ManeuverKind::SpeedUp | ManeuverKind::SlowDown => {
                    assert!(action.magnitude >= limits.min_speed_change);
                    assert!(action.magnitude <= limits.max_speed_change);
                }
            }
            assert!((0.0..=1.0).contains(&action.confidence));
        }
        assert!((0.0..=1.0).contains(&resolution.confidence));
    }

    #[test]
    fn same_level_traffic_splits_vertically() {
        // 200 m apart horizontally, 10 m vertically: only vertical is critical.
        let a = TrackPosition::new("EV-001", 0.0, 0.0, 450.0).with_velocity(90.0, 40.0, 0.0);
        let b = TrackPosition::new("EV-002", 200.0, 0.0, 460.0).with_velocity(0.0, 40.0, 0.0);
        let conflict = conflict_for(&a, &b);

        let resolution = resolver().resolve(&conflict, &b, &a);
        assert_eq!(resolution.strategy, ResolutionStrategy::Vertical);
        assert_eq!(resolution.status, ResolutionStatus::Pending);

        let lower = resolution.action_for("EV-001").unwrap();
        let upper = resolution.action_for("EV-002").unwrap();
        assert_eq!(lower.kind, ManeuverKind::Climb);
        assert_eq!(upper.kind, ManeuverKind::Descend);
        // Shortfall to 90 m is 80 m, split evenly.
        assert!((lower.magnitude - 40.0).abs() < 1e-9);
        assert!((upper.magnitude - 40.0).abs() < 1e-9);
        assert_within_limits(&resolution, resolver().limits());
    }

    #[test]
    fn equal_altitude_lower_id_climbs() {
        let a = TrackPosition::new("EV-010", 0.0, 0.0, 450.0).with_velocity(90.0, 40.0, 0.0);
        let b = TrackPosition::new("EV-003", 200.0, 0.0, 450.0).with_velocity(90.0, 40.0, 0.0);
        let conflict = conflict_for(&a, &b);
        let resolution = resolver().resolve(&conflict, &a, &b);
        assert_eq!(resolution.action_for("EV-003").unwrap().kind, ManeuverKind::Climb);
        assert_eq!(resolution.action_for("EV-010").unwrap().kind, ManeuverKind::Descend);
    }

    #[test]
    fn head_on_pair_turns_right_with_large_turn() {
        // Same vertical band check fails only horizontally: stacked 70 m apart.
        let a = TrackPosition::new("EV-001", 0.0, 0.0, 450.0).with_velocity(90.0, 40.0, 0.0);
        let b = TrackPosition::new("EV-002", 60.0, 0.0, 520.0).with_velocity(270.0, 40.0, 0.0);
        let conflict = conflict_for(&a, &b);

        let resolution = resolver().resolve(&conflict, &a, &b);
        assert_eq!(resolution.strategy, ResolutionStrategy::Horizontal);
        for action in &resolution.actions {
            assert_eq!(action.kind, ManeuverKind::TurnRight);
            assert!((action.magnitude - 60.0).abs() < 1e-9);
        }
        assert_within_limits(&resolution, resolver().limits());
    }

    #[test]
    fn both_dimensions_critical_combines() {
        let a = TrackPosition::new("EV-001", 0.0, 0.0, 450.0).with_velocity(90.0, 40.0, 0.0);
        let b = TrackPosition::new("EV-002", 50.0, 0.0, 455.0).with_velocity(270.0, 40.0, 0.0);
        let conflict = conflict_for(&a, &b);

        let resolution = resolver().resolve(&conflict, &a, &b);
        assert_eq!(resolution.strategy, ResolutionStrategy::Combined);
        for action in &resolution.actions {
            let turn = action.combined_turn.unwrap();
            assert_eq!(turn.degrees, 15.0);
            assert!(matches!(action.kind, ManeuverKind::Climb | ManeuverKind::Descend));
        }
    }

    #[test]
    fn mild_conflict_uses_speed() {
        // h = 120 of 150 (0.8), v = 50 of 60 (0.83): neither critical.
        let a = TrackPosition::new("EV-001", 0.0, 0.0, 450.0).with_velocity(90.0, 40.0, 0.0);
        let b = TrackPosition::new("EV-002", 120.0, 0.0, 500.0).with_velocity(90.0, 35.0, 0.0);
        let conflict = conflict_for(&a, &b);

        let resolution = resolver().resolve(&conflict, &a, &b);
        assert_eq!(resolution.strategy, ResolutionStrategy::Speed);
        assert_eq!(resolution.action_for("EV-002").unwrap().kind, ManeuverKind::SpeedUp);
        assert_eq!(resolution.action_for("EV-001").unwrap().kind, ManeuverKind::SlowDown);
        assert_within_limits(&resolution, resolver().limits());
    }

    #[test]
    fn oversized_climb_is_rejected_not_clamped() {
        let limits = ManeuverLimits {
            max_altitude_change_m: 20.0,
            ..ManeuverLimits::default()
        };
        let resolver = ManeuverResolver::new(limits, SeparationStandards::default());
        let a = TrackPosition::new("EV-001", 0.0, 0.0, 450.0).with_velocity(90.0, 40.0, 0.0);
        let b = TrackPosition::new("EV-002", 200.0, 0.0, 450.0).with_velocity(0.0, 40.0, 0.0);
        let conflict = conflict_for(&a, &b);

        let resolution = resolver.resolve(&conflict, &a, &b);
        assert!(resolution.is_rejected());
        assert!((resolution.actions[0].magnitude - 45.0).abs() < 1e-9);
    }

    #[test]
    fn hovering_aircraft_cannot_meet_climb_angle() {
        let a = TrackPosition::new("EV-001", 0.0, 0.0, 450.0);
        let b = TrackPosition::new("EV-002", 200.0, 0.0, 450.0);
        let conflict = conflict_for(&a, &b);
        let resolution = resolver().resolve(&conflict, &a, &b);
        match resolution.status {
            ResolutionStatus::Rejected { reason } => assert!(reason.contains("path angle")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn shallow_climb_angle_is_raised_to_minimum() {
        let a = TrackPosition::new("EV-001", 0.0, 0.0, 450.0).with_velocity(90.0, 200.0, 0.0);
        let b = TrackPosition::new("EV-002", 200.0, 0.0, 455.0).with_velocity(0.0, 200.0, 0.0);
        let conflict = conflict_for(&a, &b);
        let resolution = resolver().resolve(&conflict, &a, &b);
        let action = resolution.action_for("EV-001").unwrap();
        assert_eq!(action.climb_angle_deg, Some(3.0));
    }

    #[test]
    fn mismatched_tracks_are_rejected() {
        let a = TrackPosition::new("EV-001", 0.0, 0.0, 450.0);
        let b = TrackPosition::new("EV-002", 50.0, 0.0, 450.0);
        let conflict = conflict_for(&a, &b);
        let stranger = TrackPosition::new("EV-099", 50.0, 0.0, 450.0);

        let resolution = resolver().resolve(&conflict, &a, &stranger);
        assert!(resolution.is_rejected());
        assert!(resolution.actions.is_empty());
        assert_eq!(resolution.confidence, 0.0);
    }

    #[test]
    fn imminent_fast_closure_lowers_confidence() {
        let a = TrackPosition::new("EV-001", 0.0, 0.0, 450.0).with_velocity(90.0, 60.0, 0.0);
        let b = TrackPosition::new("EV-002", 100.0, 0.0, 455.0).with_velocity(270.0, 60.0, 0.0);
        let conflict = conflict_for(&a, &b);
        let urgent = resolver().resolve(&conflict, &a, &b);

        let calm_a = TrackPosition::new("EV-001", 0.0, 0.0, 450.0).with_velocity(0.0, 40.0, 0.0);
        let calm_b = TrackPosition::new("EV-002", 200.0, 0.0, 455.0).with_velocity(0.0, 40.0, 0.0);
        let calm_conflict = conflict_for(&calm_a, &calm_b);
        let calm = resolver().resolve(&calm_conflict, &calm_a, &calm_b);

        assert!(urgent.confidence < calm.confidence);
        assert!(calm.confidence > 0.5);
    }

    #[test]
    fn lifecycle_follows_order() {
        let a = TrackPosition::new("EV-001", 0.0, 0.0, 450.0).with_velocity(90.0, 40.0, 0.0);
        let b = TrackPosition::new("EV-002", 200.0, 0.0, 455.0).with_velocity(0.0, 40.0, 0.0);
        let mut resolution = resolver().resolve(&conflict_for(&a, &b), &a, &b);

        assert!(resolution.begin_monitoring().is_err());
        resolution.execute().unwrap();
        assert!(resolution.execute().is_err());
        resolution.begin_monitoring().unwrap();
        assert!(!resolution.recheck(true).unwrap());
        assert_eq!(resolution.status, ResolutionStatus::Monitoring);
        assert!(resolution.recheck(false).unwrap());
        assert_eq!(resolution.status, ResolutionStatus::Resolved);

        let err = resolution.execute().unwrap_err();
        assert!(err.to_string().contains("RESOLVED"));
    }

    #[test]
    fn rejected_resolution_cannot_execute() {
        let a = TrackPosition::new("EV-001", 0.0, 0.0, 450.0);
        let b = TrackPosition::new("EV-002", 200.0, 0.0, 450.0);
        let mut resolution = resolver().resolve(&conflict_for(&a, &b), &a, &b);
        assert!(resolution.is_rejected());
        assert!(resolution.execute().is_err());
    }
}
