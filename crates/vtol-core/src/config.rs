//! Scenario configuration.
//!
//! A scenario is loaded once (JSON file or in-code default), validated, and
//! then shared immutably with the engine. Every rate, probability, capacity and
//! fee the engine uses comes from here, so a different scenario file changes
//! behaviour without code changes.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::ConflictSeverity;
use crate::events::FeeType;
use crate::rules::{ManeuverLimits, SeparationStandards};
use crate::weather::WeatherBands;

/// Ring level every corridor arrival is placed on.
pub const ARRIVAL_RING_LEVEL: u8 = 2;

/// Errors raised while loading or validating a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read scenario file: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse scenario JSON: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid scenario configuration: {}", problems.join("; "))]
    Invalid { problems: Vec<String> },
}

/// A hub site aircraft orbit around and land at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConfig {
    pub city_id: String,
    pub name: String,
    /// Hub center in the scenario's planar frame (meters east)
    pub center_x_m: f64,
    /// Hub center in the scenario's planar frame (meters north)
    pub center_y_m: f64,
}

impl CityConfig {
    pub fn center(&self) -> (f64, f64) {
        (self.center_x_m, self.center_y_m)
    }
}

/// One concentric orbit band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingConfig {
    pub level: u8,
    pub radius_m: f64,
    pub altitude_m: f64,
}

/// Per-second trigger probabilities. The engine multiplies by the effective
/// tick delta, so a value of 1.0 with a 1 s tick always fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerProbabilities {
    pub descent: f64,
    pub transfer: f64,
    pub departure: f64,
}

impl Default for TriggerProbabilities {
    fn default() -> Self {
        Self {
            descent: 0.01,
            transfer: 0.005,
            departure: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionRates {
    /// Orbit angular rate at speed factor 1.0
    pub angular_rate_deg_per_s: f64,
    pub approach_angular_rate_deg_per_s: f64,
    pub approach_radial_rate_mps: f64,
    pub descent_rate_mps: f64,
    pub ascent_rate_mps: f64,
    /// Altitude at or below which a descending aircraft counts as landed
    pub ground_threshold_m: f64,
}

impl Default for MotionRates {
    fn default() -> Self {
        Self {
            angular_rate_deg_per_s: 1.5,
            approach_angular_rate_deg_per_s: 4.0,
            approach_radial_rate_mps: 40.0,
            descent_rate_mps: 6.0,
            ascent_rate_mps: 5.0,
            ground_threshold_m: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorConfig {
    pub capacity: u32,
    pub transit_duration_s: f64,
    /// Altitude of the middle variant
    pub base_altitude_m: f64,
    /// Altitude offset between adjacent variants
    pub variant_spacing_m: f64,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            capacity: 30,
            transit_duration_s: 240.0,
            base_altitude_m: 750.0,
            variant_spacing_m: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeeSchedule {
    pub landing_fee: f64,
    pub departure_fee: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            landing_fee: 45.0,
            departure_fee: 30.0,
        }
    }
}

impl FeeSchedule {
    pub fn amount(&self, fee_type: FeeType) -> f64 {
        match fee_type {
            FeeType::LandingFee => self.landing_fee,
            FeeType::DepartureFee => self.departure_fee,
        }
    }
}

/// Latitude/longitude of the planar frame origin, for renderers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoReference {
    pub lat: f64,
    pub lon: f64,
}

/// Complete, immutable description of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub name: String,
    /// RNG seed. Same seed = same run.
    pub seed: u64,
    /// Wall-clock instant the simulated clock starts at
    pub start_time: DateTime<Utc>,
    pub cities: Vec<CityConfig>,
    pub rings: Vec<RingConfig>,
    pub aircraft_per_city: u32,
    /// Relative weights for ring levels 1, 2 and 3 at spawn
    pub ring_distribution: Vec<f64>,
    pub operators: Vec<String>,
    pub speed_factor_min: f64,
    pub speed_factor_max: f64,
    pub gates_per_city: u32,
    pub gate_radius_m: f64,
    pub gate_congestion_radius_m: f64,
    pub gate_congestion_threshold: u32,
    /// Gate ids under maintenance for the whole run
    pub disabled_gates: Vec<String>,
    pub corridors: CorridorConfig,
    pub probabilities: TriggerProbabilities,
    pub rates: MotionRates,
    pub fees: FeeSchedule,
    pub separation: SeparationStandards,
    pub maneuvers: ManeuverLimits,
    pub weather: WeatherBands,
    /// Largest tick delta (before playback scaling) the driver accepts
    pub max_tick_delta_s: f64,
    pub max_playback_speed: f64,
    pub event_log_capacity: usize,
    /// Conflicts at or above this severity open an incident record
    pub incident_min_severity: ConflictSeverity,
    pub geo_reference: Option<GeoReference>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: "two-hub".to_string(),
            seed: 42,
            // 2030-01-01T06:00:00Z
            start_time: DateTime::from_timestamp(1_893_477_600, 0).unwrap_or_default(),
            cities: vec![
                CityConfig {
                    city_id: "SFO".to_string(),
                    name: "San Francisco Hub".to_string(),
                    center_x_m: 0.0,
                    center_y_m: 0.0,
                },
                CityConfig {
                    city_id: "OAK".to_string(),
                    name: "Oakland Hub".to_string(),
                    center_x_m: 14_000.0,
                    center_y_m: 3_000.0,
                },
            ],
            rings: vec![
                RingConfig { level: 1, radius_m: 1_200.0, altitude_m: 300.0 },
                RingConfig { level: 2, radius_m: 1_600.0, altitude_m: 450.0 },
                RingConfig { level: 3, radius_m: 2_000.0, altitude_m: 600.0 },
            ],
            aircraft_per_city: 40,
            ring_distribution: vec![0.3, 0.4, 0.3],
            operators: vec![
                "Archer".to_string(),
                "Joby".to_string(),
                "Wisk".to_string(),
            ],
            speed_factor_min: 0.8,
            speed_factor_max: 1.2,
            gates_per_city: 12,
            gate_radius_m: 250.0,
            gate_congestion_radius_m: 400.0,
            gate_congestion_threshold: 3,
            disabled_gates: Vec::new(),
            corridors: CorridorConfig::default(),
            probabilities: TriggerProbabilities::default(),
            rates: MotionRates::default(),
            fees: FeeSchedule::default(),
            separation: SeparationStandards::default(),
            maneuvers: ManeuverLimits::default(),
            weather: WeatherBands::default(),
            max_tick_delta_s: 5.0,
            max_playback_speed: 50.0,
            event_log_capacity: 500,
            incident_min_severity: ConflictSeverity::High,
            geo_reference: Some(GeoReference {
                lat: 37.6213,
                lon: -122.3790,
            }),
        }
    }
}

impl ScenarioConfig {
    /// Load and validate a scenario from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate a scenario from a JSON string. Missing fields take
    /// their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn city(&self, city_id: &str) -> Option<&CityConfig> {
        self.cities.iter().find(|city| city.city_id == city_id)
    }

    pub fn ring(&self, level: u8) -> Option<&RingConfig> {
        self.rings.iter().find(|ring| ring.level == level)
    }

    /// Gate ids generated for a city, in layout order.
    pub fn gate_ids(&self, city_id: &str) -> Vec<String> {
        (1..=self.gates_per_city)
            .map(|n| format!("{city_id}-G{n:02}"))
            .collect()
    }

    /// Check the scenario before any engine is built from it.
    ///
    /// Collects every problem instead of stopping at the first one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if self.cities.len() < 2 {
            problems.push("at least two cities are required".to_string());
        }
        for (idx, city) in self.cities.iter().enumerate() {
            if city.city_id.trim().is_empty() {
                problems.push(format!("cities[{idx}] has an empty city_id"));
            }
            if !city.center_x_m.is_finite() || !city.center_y_m.is_finite() {
                problems.push(format!("city {} has a non-finite center", city.city_id));
            }
            if self.cities[..idx].iter().any(|c| c.city_id == city.city_id) {
                problems.push(format!("duplicate city_id {}", city.city_id));
            }
        }

        for level in 1..=3u8 {
            match self.rings.iter().filter(|ring| ring.level == level).count() {
                0 => problems.push(format!("ring level {level} is missing")),
                1 => {}
                _ => problems.push(format!("ring level {level} is defined more than once")),
            }
        }
        for ring in &self.rings {
            if !(1..=3).contains(&ring.level) {
                problems.push(format!("ring level {} is outside 1..=3", ring.level));
            }
            check_positive(&mut problems, &format!("rings[{}].radius_m", ring.level), ring.radius_m);
            check_positive(&mut problems, &format!("rings[{}].altitude_m", ring.level), ring.altitude_m);
        }

        if self.ring_distribution.len() != 3 {
            problems.push("ring_distribution must have exactly three weights".to_string());
        } else if self
            .ring_distribution
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
            || self.ring_distribution.iter().sum::<f64>() <= 0.0
        {
            problems.push("ring_distribution weights must be non-negative with a positive sum".to_string());
        }

        if self.operators.is_empty() {
            problems.push("operators must not be empty".to_string());
        }
        check_positive(&mut problems, "speed_factor_min", self.speed_factor_min);
        check_positive(&mut problems, "speed_factor_max", self.speed_factor_max);
        if self.speed_factor_min > self.speed_factor_max {
            problems.push("speed_factor_min exceeds speed_factor_max".to_string());
        }

        if self.gates_per_city == 0 {
            problems.push("gates_per_city must be positive".to_string());
        }
        check_positive(&mut problems, "gate_radius_m", self.gate_radius_m);
        check_positive(&mut problems, "gate_congestion_radius_m", self.gate_congestion_radius_m);
        if self.gate_congestion_threshold == 0 {
            problems.push("gate_congestion_threshold must be positive".to_string());
        }
        for gate_id in &self.disabled_gates {
            let known = self
                .cities
                .iter()
                .any(|city| self.gate_ids(&city.city_id).iter().any(|id| id == gate_id));
            if !known {
                problems.push(format!("disabled gate {gate_id} does not exist"));
            }
        }

        if self.corridors.capacity == 0 {
            problems.push("corridors.capacity must be positive".to_string());
        }
        check_positive(&mut problems, "corridors.transit_duration_s", self.corridors.transit_duration_s);
        check_positive(&mut problems, "corridors.base_altitude_m", self.corridors.base_altitude_m);
        check_non_negative(&mut problems, "corridors.variant_spacing_m", self.corridors.variant_spacing_m);

        for (name, p) in [
            ("probabilities.descent", self.probabilities.descent),
            ("probabilities.transfer", self.probabilities.transfer),
            ("probabilities.departure", self.probabilities.departure),
        ] {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                problems.push(format!("{name} must be within [0, 1], got {p}"));
            }
        }

        check_positive(&mut problems, "rates.angular_rate_deg_per_s", self.rates.angular_rate_deg_per_s);
        check_positive(&mut problems, "rates.approach_angular_rate_deg_per_s", self.rates.approach_angular_rate_deg_per_s);
        check_positive(&mut problems, "rates.approach_radial_rate_mps", self.rates.approach_radial_rate_mps);
        check_positive(&mut problems, "rates.descent_rate_mps", self.rates.descent_rate_mps);
        check_positive(&mut problems, "rates.ascent_rate_mps", self.rates.ascent_rate_mps);
        check_non_negative(&mut problems, "rates.ground_threshold_m", self.rates.ground_threshold_m);

        check_non_negative(&mut problems, "fees.landing_fee", self.fees.landing_fee);
        check_non_negative(&mut problems, "fees.departure_fee", self.fees.departure_fee);

        let sep = &self.separation;
        check_positive(&mut problems, "separation.min_horizontal_separation_m", sep.min_horizontal_separation_m);
        check_positive(&mut problems, "separation.min_vertical_separation_m", sep.min_vertical_separation_m);
        check_positive(&mut problems, "separation.min_time_to_collision_s", sep.min_time_to_collision_s);
        check_positive(&mut problems, "separation.proximity_radius_m", sep.proximity_radius_m);
        check_positive(&mut problems, "separation.closing_rate_epsilon_mps", sep.closing_rate_epsilon_mps);
        if sep.proximity_radius_m < sep.min_horizontal_separation_m {
            problems.push("separation.proximity_radius_m must be at least the horizontal standard".to_string());
        }
        let bp = &sep.breakpoints;
        if !(0.0 < bp.critical && bp.critical <= bp.high && bp.high <= bp.medium) {
            problems.push("separation breakpoints must satisfy 0 < critical <= high <= medium".to_string());
        }
        if !(0.0 < bp.ttc_critical && bp.ttc_critical <= bp.ttc_high && bp.ttc_high <= bp.ttc_medium) {
            problems.push("ttc breakpoints must satisfy 0 < critical <= high <= medium".to_string());
        }

        let m = &self.maneuvers;
        for (name, lo, hi) in [
            ("maneuvers altitude change", m.min_altitude_change_m, m.max_altitude_change_m),
            ("maneuvers climb angle", m.min_climb_angle_deg, m.max_climb_angle_deg),
            ("maneuvers turn", m.min_turn_deg, m.max_turn_deg),
            ("maneuvers speed change", m.min_speed_change, m.max_speed_change),
        ] {
            if !lo.is_finite() || !hi.is_finite() || lo < 0.0 || lo > hi {
                problems.push(format!("{name} bounds must satisfy 0 <= min <= max"));
            }
        }
        if m.max_climb_angle_deg >= 90.0 {
            problems.push("maneuvers.max_climb_angle_deg must be below 90".to_string());
        }
        check_positive(&mut problems, "maneuvers.target_vertical_separation_m", m.target_vertical_separation_m);
        check_positive(&mut problems, "maneuvers.vertical_rate_mps", m.vertical_rate_mps);
        check_positive(&mut problems, "maneuvers.turn_rate_deg_per_s", m.turn_rate_deg_per_s);
        check_positive(&mut problems, "maneuvers.speed_settle_s", m.speed_settle_s);
        check_positive(&mut problems, "maneuvers.high_closing_rate_mps", m.high_closing_rate_mps);
        check_positive(&mut problems, "maneuvers.unbounded_ttc_horizon_s", m.unbounded_ttc_horizon_s);

        problems.extend(self.weather.validate());

        check_positive(&mut problems, "max_tick_delta_s", self.max_tick_delta_s);
        check_positive(&mut problems, "max_playback_speed", self.max_playback_speed);
        if self.event_log_capacity == 0 {
            problems.push("event_log_capacity must be positive".to_string());
        }

        if let Some(geo) = self.geo_reference {
            if !(-90.0..=90.0).contains(&geo.lat) || !(-180.0..=180.0).contains(&geo.lon) {
                problems.push("geo_reference is outside valid latitude/longitude".to_string());
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }
}

fn check_positive(problems: &mut Vec<String>, name: &str, value: f64) {
    if !value.is_finite() || value <= 0.0 {
        problems.push(format!("{name} must be a positive number, got {value}"));
    }
}

fn check_non_negative(problems: &mut Vec<String>, name: &str, value: f64) {
    if !value.is_finite() || value < 0.0 {
        problems.push(format!("{name} must be a non-negative number, got {value}"));
    }
}
