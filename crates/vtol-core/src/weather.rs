//! Weather throttle: external safety score to speed factor and grounding flag.

use serde::{Deserialize, Serialize};

/// Signal supplied by the external weather collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherSignal {
    /// 0 (unflyable) to 100 (ideal)
    pub safety_score: f64,
    pub clear_for_flight: bool,
}

impl Default for WeatherSignal {
    fn default() -> Self {
        Self {
            safety_score: 100.0,
            clear_for_flight: true,
        }
    }
}

/// Scores at or above `min_score` fly at `speed_factor`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrottleBand {
    pub min_score: f64,
    pub speed_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherBands {
    /// Scores below this ground new commitments
    pub grounding_score: f64,
    pub bands: Vec<ThrottleBand>,
}

impl Default for WeatherBands {
    fn default() -> Self {
        Self {
            grounding_score: 30.0,
            bands: vec![
                ThrottleBand { min_score: 80.0, speed_factor: 1.0 },
                ThrottleBand { min_score: 60.0, speed_factor: 0.85 },
                ThrottleBand { min_score: 40.0, speed_factor: 0.6 },
                ThrottleBand { min_score: 0.0, speed_factor: 0.3 },
            ],
        }
    }
}

impl WeatherBands {
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !self.grounding_score.is_finite() || !(0.0..=100.0).contains(&self.grounding_score) {
            problems.push(format!(
                "weather.grounding_score must be within [0, 100], got {}",
                self.grounding_score
            ));
        }
        if self.bands.is_empty() {
            problems.push("weather.bands must not be empty".to_string());
        }
        for (idx, band) in self.bands.iter().enumerate() {
            if !band.min_score.is_finite() || !(0.0..=100.0).contains(&band.min_score) {
                problems.push(format!("weather.bands[{idx}].min_score must be within [0, 100]"));
            }
            if !band.speed_factor.is_finite() || band.speed_factor <= 0.0 || band.speed_factor > 1.0 {
                problems.push(format!("weather.bands[{idx}].speed_factor must be within (0, 1]"));
            }
        }
        problems
    }
}

/// What the tick engine does with the weather this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrottleDecision {
    pub speed_factor: f64,
    /// New transfers and departures are suppressed
    pub grounded: bool,
}

#[derive(Debug, Clone)]
pub struct WeatherThrottle {
    grounding_score: f64,
    /// Sorted by `min_score`, highest first
    bands: Vec<ThrottleBand>,
}

impl WeatherThrottle {
    pub fn new(config: &WeatherBands) -> Self {
        let mut bands = config.bands.clone();
        bands.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
        Self {
            grounding_score: config.grounding_score,
            bands,
        }
    }

    pub fn assess(&self, signal: &WeatherSignal, emergency_override: bool) -> ThrottleDecision {
        let score = if signal.safety_score.is_finite() {
            signal.safety_score.clamp(0.0, 100.0)
        } else {
            tracing::warn!(
                "Non-finite weather safety score {}; treating as 0",
                signal.safety_score
            );
            0.0
        };

        // Highest band the score reaches; below every band falls back to the lowest one.
        let speed_factor = self
            .bands
            .iter()
            .find(|band| score >= band.min_score)
            .or_else(|| self.bands.last())
            .map(|band| band.speed_factor)
            .unwrap_or(1.0);

        let unsafe_conditions = !signal.clear_for_flight || score < self.grounding_score;
        ThrottleDecision {
            speed_factor,
            grounded: unsafe_conditions && !emergency_override,
        }
    }
}
