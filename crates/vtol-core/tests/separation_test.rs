//! Separation monitor and maneuver resolver integration tests.
//!
//! Checks the grid-indexed detector against a brute-force pass, and walks a
//! detected conflict through the resolver lifecycle.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vtol_core::{
    Conflict, ConflictSeverity, ManeuverKind, ManeuverLimits, ManeuverResolver, ResolutionStatus,
    ResolutionStrategy, SeparationMonitor, SeparationStandards, SeverityBreakpoints,
    TrackPosition,
};

fn random_tracks(rng: &mut ChaCha8Rng, count: usize) -> Vec<TrackPosition> {
    (0..count)
        .map(|n| {
            TrackPosition::new(
                format!("EV-{n:04}"),
                rng.random_range(-1_500.0..1_500.0),
                rng.random_range(-1_500.0..1_500.0),
                rng.random_range(300.0..600.0),
            )
            .with_velocity(
                rng.random_range(0.0..360.0),
                rng.random_range(0.0..40.0),
                rng.random_range(-5.0..5.0),
            )
        })
        .collect()
}

/// Every pair, no index. Tracks must already be in id order.
fn brute_force(monitor: &SeparationMonitor, tracks: &[TrackPosition]) -> Vec<Conflict> {
    let radius = monitor.standards().proximity_radius_m;
    let mut conflicts = Vec::new();
    for (i, first) in tracks.iter().enumerate() {
        for second in &tracks[i + 1..] {
            let assessment = monitor.assess_pair(first, second);
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
    conflicts
}

#[test]
fn test_grid_matches_brute_force() {
    let monitor = SeparationMonitor::default();
    let mut rng = ChaCha8Rng::seed_from_u64(21);

    for _ in 0..5 {
        let tracks = random_tracks(&mut rng, 200);
        let expected = brute_force(&monitor, &tracks);
        assert!(!expected.is_empty(), "dense traffic should produce conflicts");
        assert_eq!(monitor.detect_conflicts(&tracks), expected);
    }
}

#[test]
fn test_detection_ignores_input_order() {
    let monitor = SeparationMonitor::default();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut tracks = random_tracks(&mut rng, 120);
    let baseline = monitor.detect_conflicts(&tracks);

    for _ in 0..3 {
        tracks.shuffle(&mut rng);
        assert_eq!(monitor.detect_conflicts(&tracks), baseline);
    }
    for conflict in &baseline {
        assert!(conflict.aircraft_a < conflict.aircraft_b);
        assert!(conflict.horizontal_violated || conflict.vertical_violated);
    }
}

#[test]
fn test_horizontal_shortfall_alone_is_a_conflict() {
    let standards = SeparationStandards {
        min_horizontal_separation_m: 100.0,
        min_vertical_separation_m: 30.0,
        ..SeparationStandards::default()
    };
    let tracks = vec![
        TrackPosition::new("EV-0001", 0.0, 0.0, 400.0),
        TrackPosition::new("EV-0002", 99.0, 0.0, 450.0),
    ];

    let conflicts = SeparationMonitor::new(standards.clone()).detect_conflicts(&tracks);
    assert_eq!(conflicts.len(), 1);
    assert!(conflicts[0].horizontal_violated);
    assert!(!conflicts[0].vertical_violated);
    assert_eq!(conflicts[0].severity, ConflictSeverity::Medium);

    let relaxed = SeparationStandards {
        breakpoints: SeverityBreakpoints {
            medium: 0.95,
            ..SeverityBreakpoints::default()
        },
        ..standards
    };
    let conflicts = SeparationMonitor::new(relaxed).detect_conflicts(&tracks);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].severity, ConflictSeverity::Low);
}

#[test]
fn test_severity_eases_as_pair_separates() {
    let monitor = SeparationMonitor::default();
    let mut previous = ConflictSeverity::Critical;
    for step in 0..30 {
        let gap = 5.0 + step as f64 * 5.0;
        let a = TrackPosition::new("EV-0001", 0.0, 0.0, 450.0);
        let b = TrackPosition::new("EV-0002", gap, 0.0, 450.0);
        let severity = monitor.assess_pair(&a, &b).severity;
        assert!(severity <= previous, "gap {gap}: {severity:?} after {previous:?}");
        previous = severity;
    }
}

#[test]
fn test_severity_eases_as_altitude_gap_opens() {
    let monitor = SeparationMonitor::default();
    let mut previous = ConflictSeverity::Critical;
    for step in 0..30 {
        let gap = 2.0 + step as f64 * 3.0;
        // Laterally clear of the horizontal standard, so only the vertical gap counts.
        let a = TrackPosition::new("EV-0001", 0.0, 0.0, 450.0);
        let b = TrackPosition::new("EV-0002", 200.0, 0.0, 450.0 + gap);
        let assessment = monitor.assess_pair(&a, &b);
        assert!(!assessment.horizontal_violated);
        assert!(
            assessment.severity <= previous,
            "gap {gap}: {:?} after {previous:?}",
            assessment.severity
        );
        previous = assessment.severity;
    }
    assert_eq!(previous, ConflictSeverity::Low);
}

#[test]
fn test_resolution_lifecycle_for_detected_conflict() {
    let standards = SeparationStandards::default();
    let monitor = SeparationMonitor::new(standards.clone());
    let resolver = ManeuverResolver::new(ManeuverLimits::default(), standards);

    // Side by side, 10 m apart vertically: only the vertical standard is critical.
    let upper = TrackPosition::new("EV-0001", 0.0, 0.0, 450.0).with_velocity(90.0, 20.0, 0.0);
    let lower = TrackPosition::new("EV-0002", 100.0, 0.0, 440.0).with_velocity(90.0, 20.0, 0.0);
    let conflicts = monitor.detect_conflicts(&[lower.clone(), upper.clone()]);
    assert_eq!(conflicts.len(), 1);

    let mut resolution = resolver.resolve(&conflicts[0], &lower, &upper);
    assert_eq!(resolution.strategy, ResolutionStrategy::Vertical);
    assert_eq!(resolution.status, ResolutionStatus::Pending);
    assert_eq!(resolution.conflict_id, "EV-0001:EV-0002");

    let climb = resolution.action_for("EV-0002").unwrap();
    assert_eq!(climb.kind, ManeuverKind::Climb);
    assert_eq!(climb.magnitude, 40.0);
    let descend = resolution.action_for("EV-0001").unwrap();
    assert_eq!(descend.kind, ManeuverKind::Descend);
    assert!(resolution.confidence > 0.0 && resolution.confidence <= 1.0);

    assert!(resolution.begin_monitoring().is_err());
    resolution.execute().unwrap();
    resolution.begin_monitoring().unwrap();
    assert!(!resolution.recheck(true).unwrap());
    assert_eq!(resolution.status, ResolutionStatus::Monitoring);
    assert!(resolution.recheck(false).unwrap());
    assert_eq!(resolution.status, ResolutionStatus::Resolved);
    assert!(resolution.execute().is_err());
}
