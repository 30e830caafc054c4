//! Spatial math for hub geometry, separation checks and renderer export.
//!
//! Positions live in a local planar frame per scenario: `x` grows east,
//! `y` grows north, both in meters. Aircraft around a hub are described by a
//! polar angle (degrees, 0 = east, counter-clockwise) and a radial distance
//! from the hub center. Headings use the compass convention (0 = north,
//! clockwise) so they read the same way as bearings.

/// Mean Earth radius in meters, used for geodetic export.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Wrap an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can return 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Shortest signed rotation from `from_deg` to `to_deg`, in `(-180, 180]`.
pub fn signed_angle_delta(from_deg: f64, to_deg: f64) -> f64 {
    let delta = normalize_degrees(to_deg - from_deg);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Move a scalar toward a target by at most `max_step`.
pub fn step_toward(current: f64, target: f64, max_step: f64) -> f64 {
    let max_step = max_step.max(0.0);
    let diff = target - current;
    if diff.abs() <= max_step {
        target
    } else {
        current + max_step.copysign(diff)
    }
}

/// Rotate an angle toward a target along the shortest arc by at most
/// `max_step_deg`. The result is normalized.
pub fn step_angle_toward(current_deg: f64, target_deg: f64, max_step_deg: f64) -> f64 {
    let delta = signed_angle_delta(current_deg, target_deg);
    let max_step = max_step_deg.max(0.0);
    if delta.abs() <= max_step {
        normalize_degrees(target_deg)
    } else {
        normalize_degrees(current_deg + max_step.copysign(delta))
    }
}

/// Convert a polar offset around `center` into local planar coordinates.
pub fn polar_to_local(center: (f64, f64), angle_deg: f64, radial_m: f64) -> (f64, f64) {
    let angle_rad = angle_deg.to_radians();
    (
        center.0 + radial_m * angle_rad.cos(),
        center.1 + radial_m * angle_rad.sin(),
    )
}

/// Euclidean distance between two planar points.
pub fn planar_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (b.0 - a.0).hypot(b.1 - a.1)
}

/// Compass bearing from `from` to `to` in degrees (0 = north, clockwise).
pub fn compass_bearing(from: (f64, f64), to: (f64, f64)) -> f64 {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
        return 0.0;
    }
    normalize_degrees(dx.atan2(dy).to_degrees())
}

/// Planar velocity `(vx, vy)` for a compass heading and ground speed.
pub fn velocity_from_heading(heading_deg: f64, speed_mps: f64) -> (f64, f64) {
    let heading_rad = heading_deg.to_radians();
    (speed_mps * heading_rad.sin(), speed_mps * heading_rad.cos())
}

/// Compass heading of a planar velocity. Zero velocity reads as north.
pub fn heading_from_velocity(vx: f64, vy: f64) -> f64 {
    if vx.abs() < f64::EPSILON && vy.abs() < f64::EPSILON {
        return 0.0;
    }
    normalize_degrees(vx.atan2(vy).to_degrees())
}

/// Convert a local planar point into latitude/longitude around a geo
/// reference placed at the frame origin.
///
/// Walks the great circle from the reference along the point's compass
/// bearing.
pub fn local_to_geodetic(ref_lat: f64, ref_lon: f64, x_m: f64, y_m: f64) -> (f64, f64) {
    let distance_m = x_m.hypot(y_m);
    if distance_m <= f64::EPSILON {
        return (ref_lat, ref_lon);
    }
    let bearing = x_m.atan2(y_m);
    let delta = distance_m / EARTH_RADIUS_M;
    let (phi1, lambda1) = (ref_lat.to_radians(), ref_lon.to_radians());

    let sin_phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * bearing.cos())
        .clamp(-1.0, 1.0);
    let phi2 = sin_phi2.asin();
    let lambda2 = lambda1
        + (bearing.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

    (phi2.to_degrees(), normalize_longitude(lambda2.to_degrees()))
}

/// Wrap a longitude into [-180, 180).
fn normalize_longitude(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}
