//! Pre-defined two-aircraft encounters for probing the separation monitor.
//!
//! Positions are planar meters around `center` (x east, y north); headings
//! are compass degrees. Under the default standards each encounter lands in
//! a different resolution strategy.

use vtol_core::TrackPosition;

/// A named encounter: a handful of tracks frozen at one instant.
#[derive(Debug, Clone)]
pub struct Encounter {
    pub name: String,
    pub description: String,
    pub tracks: Vec<TrackPosition>,
}

/// Two aircraft on perpendicular courses, slightly short of both standards.
///
/// - EV-0001: flying west to east
/// - EV-0002: flying south to north, 40 m higher
pub fn create_crossing_scenario(center: (f64, f64)) -> Encounter {
    let (cx, cy) = center;
    Encounter {
        name: "crossing".to_string(),
        description: "perpendicular courses, mild shortfall in both dimensions".to_string(),
        tracks: vec![
            TrackPosition::new("EV-0001", cx - 100.0, cy, 450.0).with_velocity(90.0, 20.0, 0.0),
            TrackPosition::new("EV-0002", cx, cy - 100.0, 490.0).with_velocity(0.0, 20.0, 0.0),
        ],
    }
}

/// Opposite headings, well split vertically but far too close laterally.
pub fn create_head_on_scenario(center: (f64, f64)) -> Encounter {
    let (cx, cy) = center;
    Encounter {
        name: "head-on".to_string(),
        description: "reciprocal headings 60 m apart".to_string(),
        tracks: vec![
            TrackPosition::new("EV-0001", cx - 30.0, cy, 450.0).with_velocity(90.0, 10.0, 0.0),
            TrackPosition::new("EV-0002", cx + 30.0, cy, 520.0).with_velocity(270.0, 10.0, 0.0),
        ],
    }
}

/// Same heading, 20 m of vertical separation.
pub fn create_vertical_stack_scenario(center: (f64, f64)) -> Encounter {
    let (cx, cy) = center;
    Encounter {
        name: "vertical-stack".to_string(),
        description: "side by side with 20 m vertical separation".to_string(),
        tracks: vec![
            TrackPosition::new("EV-0001", cx, cy, 450.0).with_velocity(0.0, 15.0, 0.0),
            TrackPosition::new("EV-0002", cx + 100.0, cy, 430.0).with_velocity(0.0, 15.0, 0.0),
        ],
    }
}

/// A faster aircraft cutting in close above a slower one.
pub fn create_merge_scenario(center: (f64, f64)) -> Encounter {
    let (cx, cy) = center;
    Encounter {
        name: "merge".to_string(),
        description: "critical in both dimensions".to_string(),
        tracks: vec![
            TrackPosition::new("EV-0001", cx, cy, 450.0).with_velocity(0.0, 15.0, 0.0),
            TrackPosition::new("EV-0002", cx + 50.0, cy, 470.0).with_velocity(340.0, 25.0, 0.0),
        ],
    }
}

/// Parallel tracks that meet both standards.
pub fn create_parallel_scenario(center: (f64, f64)) -> Encounter {
    let (cx, cy) = center;
    Encounter {
        name: "parallel".to_string(),
        description: "parallel tracks clear of both standards".to_string(),
        tracks: vec![
            TrackPosition::new("EV-0001", cx, cy, 450.0).with_velocity(0.0, 20.0, 0.0),
            TrackPosition::new("EV-0002", cx + 200.0, cy, 530.0).with_velocity(0.0, 20.0, 0.0),
        ],
    }
}

/// Four aircraft converging on the center from the cardinal directions.
pub fn create_converging_scenario(center: (f64, f64)) -> Encounter {
    let (cx, cy) = center;
    let offset_m = 100.0;
    let bearings: [f64; 4] = [0.0, 90.0, 180.0, 270.0];

    let tracks = bearings
        .iter()
        .enumerate()
        .map(|(i, &bearing)| {
            let rad = bearing.to_radians();
            let inbound = (bearing + 180.0) % 360.0;
            TrackPosition::new(
                format!("EV-{:04}", i + 1),
                cx + offset_m * rad.sin(),
                cy + offset_m * rad.cos(),
                450.0,
            )
            .with_velocity(inbound, 8.0, 0.0)
        })
        .collect();

    Encounter {
        name: "converging".to_string(),
        description: "four aircraft inbound to one point at the same altitude".to_string(),
        tracks,
    }
}

pub fn all_scenarios(center: (f64, f64)) -> Vec<Encounter> {
    vec![
        create_crossing_scenario(center),
        create_head_on_scenario(center),
        create_vertical_stack_scenario(center),
        create_merge_scenario(center),
        create_parallel_scenario(center),
        create_converging_scenario(center),
    ]
}

pub fn scenario_by_name(name: &str, center: (f64, f64)) -> Option<Encounter> {
    all_scenarios(center)
        .into_iter()
        .find(|encounter| encounter.name == name)
}
