//! Positions and velocities derived from each aircraft's phase.
//!
//! The engine only stores polar parameters (or corridor progress); anything
//! that needs planar coordinates or a velocity vector goes through here.

use crate::config::ScenarioConfig;
use crate::conflict::TrackPosition;
use crate::models::{Aircraft, Corridor, FlightPhase, Gate};
use crate::spatial::{heading_from_velocity, local_to_geodetic, planar_distance, polar_to_local};

/// Planar position `(x, y, altitude)` of an aircraft, or `None` when its
/// city or corridor no longer resolves.
pub fn aircraft_position(
    aircraft: &Aircraft,
    config: &ScenarioConfig,
    corridors: &[Corridor],
) -> Option<(f64, f64, f64)> {
    match &aircraft.phase {
        FlightPhase::CorridorTransit {
            corridor_id,
            progress,
            ..
        } => {
            let corridor = corridors.iter().find(|c| &c.corridor_id == corridor_id)?;
            let origin = config.city(&corridor.origin_city)?.center();
            let destination = config.city(&corridor.destination_city)?.center();
            let t = progress.clamp(0.0, 1.0);
            Some((
                origin.0 + (destination.0 - origin.0) * t,
                origin.1 + (destination.1 - origin.1) * t,
                corridor.altitude_m,
            ))
        }
        _ => {
            let center = config.city(&aircraft.city_id)?.center();
            let (x, y) = polar_to_local(center, aircraft.angle_deg, aircraft.radial_m);
            Some((x, y, aircraft.altitude_m))
        }
    }
}

/// Planar position of a gate.
pub fn gate_position(gate: &Gate, config: &ScenarioConfig) -> Option<(f64, f64)> {
    let center = config.city(&gate.city_id)?.center();
    Some(polar_to_local(center, gate.angle_deg, gate.radial_m))
}

/// Nominal velocity `(vx, vy, vz)` in m/s for a monitored aircraft.
///
/// Uses unthrottled rates: the monitor reasons about the closure the
/// aircraft would have at normal speed.
pub fn aircraft_velocity(
    aircraft: &Aircraft,
    config: &ScenarioConfig,
    gates: &[Gate],
) -> (f64, f64, f64) {
    let rates = &config.rates;
    let angle_rad = aircraft.angle_deg.to_radians();
    match &aircraft.phase {
        FlightPhase::Orbit => {
            let omega_rad = (aircraft.speed_factor * rates.angular_rate_deg_per_s).to_radians();
            let tangential = omega_rad * aircraft.radial_m;
            (-tangential * angle_rad.sin(), tangential * angle_rad.cos(), 0.0)
        }
        FlightPhase::Descending { gate_id } => {
            let center = config
                .city(&aircraft.city_id)
                .map(|city| city.center())
                .unwrap_or_default();
            let here = polar_to_local(center, aircraft.angle_deg, aircraft.radial_m);
            let target = gates
                .iter()
                .find(|gate| &gate.gate_id == gate_id)
                .and_then(|gate| gate_position(gate, config));
            let (vx, vy) = match target {
                Some(target) => {
                    let distance = planar_distance(here, target);
                    if distance < 1e-6 {
                        (0.0, 0.0)
                    } else {
                        let speed = rates.approach_radial_rate_mps;
                        (
                            speed * (target.0 - here.0) / distance,
                            speed * (target.1 - here.1) / distance,
                        )
                    }
                }
                None => (0.0, 0.0),
            };
            (vx, vy, -rates.descent_rate_mps)
        }
        FlightPhase::Ascending { .. } => {
            let ring_radius = config
                .ring(aircraft.ring_level)
                .map(|ring| ring.radius_m)
                .unwrap_or(aircraft.radial_m);
            let outward = if aircraft.radial_m < ring_radius {
                rates.approach_radial_rate_mps
            } else {
                0.0
            };
            (
                outward * angle_rad.cos(),
                outward * angle_rad.sin(),
                rates.ascent_rate_mps,
            )
        }
        FlightPhase::Landed { .. } | FlightPhase::CorridorTransit { .. } => (0.0, 0.0, 0.0),
    }
}

/// Tracks for every aircraft the separation monitor should see.
pub fn monitored_tracks(
    aircraft: &[Aircraft],
    gates: &[Gate],
    corridors: &[Corridor],
    config: &ScenarioConfig,
) -> Vec<TrackPosition> {
    aircraft
        .iter()
        .filter(|a| a.phase.is_monitored())
        .filter_map(|a| {
            let (x_m, y_m, altitude_m) = aircraft_position(a, config, corridors)?;
            let (vx, vy, vz) = aircraft_velocity(a, config, gates);
            Some(TrackPosition {
                aircraft_id: a.aircraft_id.clone(),
                x_m,
                y_m,
                altitude_m,
                heading_deg: heading_from_velocity(vx, vy),
                speed_mps: vx.hypot(vy),
                vertical_rate_mps: vz,
            })
        })
        .collect()
}

/// Latitude/longitude/altitude for renderers, when the scenario carries a
/// geo reference.
pub fn geodetic_position(
    aircraft: &Aircraft,
    config: &ScenarioConfig,
    corridors: &[Corridor],
) -> Option<(f64, f64, f64)> {
    let geo = config.geo_reference?;
    let (x, y, altitude) = aircraft_position(aircraft, config, corridors)?;
    let (lat, lon) = local_to_geodetic(geo.lat, geo.lon, x, y);
    Some((lat, lon, altitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orbiting(angle_deg: f64) -> Aircraft {
        Aircraft {
            aircraft_id: "EV-001".to_string(),
            operator: "Joby".to_string(),
            city_id: "SFO".to_string(),
            ring_level: 2,
            phase: FlightPhase::Orbit,
            angle_deg,
            radial_m: 1_600.0,
            altitude_m: 450.0,
            speed_factor: 1.0,
        }
    }

    #[test]
    fn orbit_velocity_is_tangential() {
        let config = ScenarioConfig::default();
        let aircraft = orbiting(0.0);
        let (vx, vy, vz) = aircraft_velocity(&aircraft, &config, &[]);
        // At angle 0 (east of center) counter-clockwise motion heads north.
        assert!(vx.abs() < 1e-9);
        assert!(vy > 0.0);
        assert_eq!(vz, 0.0);
        let expected = 1.5_f64.to_radians() * 1_600.0;
        assert!((vy - expected).abs() < 1e-9);
    }

    #[test]
    fn landed_aircraft_are_not_tracked() {
        let config = ScenarioConfig::default();
        let mut landed = orbiting(10.0);
        landed.aircraft_id = "EV-002".to_string();
        landed.phase = FlightPhase::Landed {
            gate_id: "SFO-G01".to_string(),
        };
        let tracks = monitored_tracks(&[orbiting(0.0), landed], &[], &[], &config);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].aircraft_id, "EV-001");
        assert!((tracks[0].heading_deg - 0.0).abs() < 1e-6);
    }

    #[test]
    fn unknown_city_has_no_position() {
        let config = ScenarioConfig::default();
        let mut aircraft = orbiting(0.0);
        aircraft.city_id = "NOWHERE".to_string();
        assert!(aircraft_position(&aircraft, &config, &[]).is_none());
    }

    #[test]
    fn geodetic_export_uses_reference() {
        let config = ScenarioConfig::default();
        let aircraft = orbiting(90.0);
        let (lat, _lon, alt) = geodetic_position(&aircraft, &config, &[]).unwrap();
        assert!(lat > 37.6213);
        assert_eq!(alt, 450.0);
    }
}
