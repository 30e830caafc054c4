//! Tick engine: one discrete simulation step.
//!
//! A step reads one immutable prior snapshot, applies every aircraft's phase
//! rule against a fresh allocator working set, commits the working set onto
//! the new snapshot, and runs the separation monitor over the result. The
//! prior snapshot is never touched, so a caller that rejects the outcome
//! simply keeps the old one.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::allocator::ResourceAllocator;
use crate::config::{ConfigError, ScenarioConfig, ARRIVAL_RING_LEVEL};
use crate::conflict::{Conflict, SeparationMonitor};
use crate::events::{EventKind, EventSeverity, FeeTransaction, FeeType, SimEvent};
use crate::kinematics::{aircraft_position, gate_position, monitored_tracks};
use crate::models::{Aircraft, Corridor, CorridorVariant, FlightPhase, Gate};
use crate::spatial::{normalize_degrees, planar_distance, step_angle_toward, step_toward};
use crate::weather::{ThrottleDecision, WeatherSignal, WeatherThrottle};

/// Reroute is flagged when the runner-up corridor is above this utilization...
const REROUTE_RUNNER_UP_UTILIZATION: f64 = 0.8;
/// ...while the chosen corridor is below this one.
const REROUTE_CHOSEN_UTILIZATION: f64 = 0.5;

/// Cumulative counters since the start of the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficStats {
    pub descents: u64,
    pub landings: u64,
    pub departures: u64,
    pub transfers: u64,
    pub arrivals: u64,
    pub reroutes: u64,
    /// Descent rolls that found no free gate
    pub gate_refusals: u64,
    /// Transfer rolls that found no corridor with spare capacity
    pub corridor_refusals: u64,
    pub stale_holds: u64,
}

/// Aircraft count per phase, for dashboards and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCounts {
    pub orbit: usize,
    pub descending: usize,
    pub landed: usize,
    pub ascending: usize,
    pub corridor_transit: usize,
}

/// Complete simulation snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub tick: u64,
    /// Simulated seconds since the scenario start
    pub sim_time_s: f64,
    pub sim_time: DateTime<Utc>,
    pub aircraft: Vec<Aircraft>,
    pub gates: Vec<Gate>,
    pub corridors: Vec<Corridor>,
    pub stats: TrafficStats,
}

impl SimulationState {
    /// Build the tick-zero snapshot for a scenario.
    ///
    /// Aircraft get ring levels drawn from `ring_distribution`, random
    /// angles, speed factors uniform in the configured range, and operators
    /// round-robin. Gates are spaced evenly around each hub; one corridor
    /// exists per ordered city pair and variant.
    pub fn initial<R: Rng>(config: &ScenarioConfig, rng: &mut R) -> Self {
        let mut gates = Vec::new();
        for city in &config.cities {
            let count = config.gates_per_city.max(1) as f64;
            for (idx, gate_id) in config.gate_ids(&city.city_id).into_iter().enumerate() {
                let mut gate = Gate {
                    maintenance: config.disabled_gates.contains(&gate_id),
                    gate_id,
                    city_id: city.city_id.clone(),
                    angle_deg: idx as f64 * 360.0 / count,
                    radial_m: config.gate_radius_m,
                    reserved_by: None,
                    nearby_aircraft: 0,
                    status: Default::default(),
                };
                gate.status = gate.derive_status(config.gate_congestion_threshold);
                gates.push(gate);
            }
        }

        let mut corridors = Vec::new();
        for origin in &config.cities {
            for destination in &config.cities {
                if origin.city_id == destination.city_id {
                    continue;
                }
                for variant in CorridorVariant::ALL {
                    corridors.push(Corridor {
                        corridor_id: Corridor::corridor_id_for(
                            &origin.city_id,
                            &destination.city_id,
                            variant,
                        ),
                        origin_city: origin.city_id.clone(),
                        destination_city: destination.city_id.clone(),
                        variant,
                        capacity: config.corridors.capacity,
                        occupants: 0,
                        transit_duration_s: config.corridors.transit_duration_s,
                        altitude_m: config.corridors.base_altitude_m
                            + variant.offset_steps() * config.corridors.variant_spacing_m,
                    });
                }
            }
        }

        let mut aircraft = Vec::new();
        let mut serial = 0usize;
        for city in &config.cities {
            for _ in 0..config.aircraft_per_city {
                let level = pick_ring_level(&config.ring_distribution, rng);
                let Some(ring) = config.ring(level) else {
                    continue;
                };
                let operator = config
                    .operators
                    .get(serial % config.operators.len().max(1))
                    .cloned()
                    .unwrap_or_default();
                serial += 1;
                aircraft.push(Aircraft {
                    aircraft_id: format!("EV-{serial:04}"),
                    operator,
                    city_id: city.city_id.clone(),
                    ring_level: level,
                    phase: FlightPhase::Orbit,
                    angle_deg: rng.random_range(0.0..360.0),
                    radial_m: ring.radius_m,
                    altitude_m: ring.altitude_m,
                    speed_factor: if config.speed_factor_min < config.speed_factor_max {
                        rng.random_range(config.speed_factor_min..=config.speed_factor_max)
                    } else {
                        config.speed_factor_min
                    },
                });
            }
        }

        tracing::info!(
            "Initialized scenario {}: {} aircraft, {} gates, {} corridors",
            config.name,
            aircraft.len(),
            gates.len(),
            corridors.len()
        );

        Self {
            tick: 0,
            sim_time_s: 0.0,
            sim_time: config.start_time,
            aircraft,
            gates,
            corridors,
            stats: TrafficStats::default(),
        }
    }

    pub fn aircraft(&self, aircraft_id: &str) -> Option<&Aircraft> {
        self.aircraft.iter().find(|a| a.aircraft_id == aircraft_id)
    }

    pub fn gate(&self, gate_id: &str) -> Option<&Gate> {
        self.gates.iter().find(|g| g.gate_id == gate_id)
    }

    pub fn corridor(&self, corridor_id: &str) -> Option<&Corridor> {
        self.corridors.iter().find(|c| c.corridor_id == corridor_id)
    }

    pub fn phase_counts(&self) -> PhaseCounts {
        let mut counts = PhaseCounts::default();
        for aircraft in &self.aircraft {
            match aircraft.phase {
                FlightPhase::Orbit => counts.orbit += 1,
                FlightPhase::Descending { .. } => counts.descending += 1,
                FlightPhase::Landed { .. } => counts.landed += 1,
                FlightPhase::Ascending { .. } => counts.ascending += 1,
                FlightPhase::CorridorTransit { .. } => counts.corridor_transit += 1,
            }
        }
        counts
    }
}

fn pick_ring_level<R: Rng>(weights: &[f64], rng: &mut R) -> u8 {
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total <= 0.0 {
        return ARRIVAL_RING_LEVEL;
    }
    let mut roll = rng.random::<f64>() * total;
    for (idx, weight) in weights.iter().enumerate() {
        if !weight.is_finite() || *weight <= 0.0 {
            continue;
        }
        if roll < *weight {
            return idx as u8 + 1;
        }
        roll -= weight;
    }
    weights
        .iter()
        .rposition(|w| w.is_finite() && *w > 0.0)
        .map(|idx| idx as u8 + 1)
        .unwrap_or(ARRIVAL_RING_LEVEL)
}

/// External inputs for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Wall-clock seconds covered by this tick
    pub delta_s: f64,
    pub playback_speed: f64,
    pub weather: WeatherSignal,
    pub emergency_override: bool,
}

impl Default for TickInput {
    fn default() -> Self {
        Self {
            delta_s: 1.0,
            playback_speed: 1.0,
            weather: WeatherSignal::default(),
            emergency_override: false,
        }
    }
}

/// Everything one tick produced.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub state: SimulationState,
    pub events: Vec<SimEvent>,
    pub fees: Vec<FeeTransaction>,
    /// Conflicts on the new snapshot
    pub conflicts: Vec<Conflict>,
    pub throttle: ThrottleDecision,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TickError {
    #[error("tick delta {delta_s} s must be positive, finite and at most {max_s} s")]
    InvalidDelta { delta_s: f64, max_s: f64 },

    #[error("playback speed {speed} must be positive, finite and at most {max}")]
    InvalidPlayback { speed: f64, max: f64 },
}

/// Advances snapshots. Owns the scenario, the monitor and the RNG.
#[derive(Debug)]
pub struct TickEngine<R: Rng = ChaCha8Rng> {
    config: Arc<ScenarioConfig>,
    monitor: SeparationMonitor,
    throttle: WeatherThrottle,
    rng: R,
}

impl<R: Rng> TickEngine<R> {
    /// Validate the scenario and build an engine around it.
    pub fn new(config: Arc<ScenarioConfig>, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            monitor: SeparationMonitor::new(config.separation.clone()),
            throttle: WeatherThrottle::new(&config.weather),
            config,
            rng,
        })
    }

    pub fn config(&self) -> &Arc<ScenarioConfig> {
        &self.config
    }

    pub fn monitor(&self) -> &SeparationMonitor {
        &self.monitor
    }

    /// Tick-zero snapshot, drawn from the engine's own RNG.
    pub fn initial_state(&mut self) -> SimulationState {
        SimulationState::initial(&self.config, &mut self.rng)
    }

    fn check_input(&self, input: &TickInput) -> Result<(), TickError> {
        let max_s = self.config.max_tick_delta_s;
        if !input.delta_s.is_finite() || input.delta_s <= 0.0 || input.delta_s > max_s {
            return Err(TickError::InvalidDelta {
                delta_s: input.delta_s,
                max_s,
            });
        }
        let max = self.config.max_playback_speed;
        if !input.playback_speed.is_finite()
            || input.playback_speed <= 0.0
            || input.playback_speed > max
        {
            return Err(TickError::InvalidPlayback {
                speed: input.playback_speed,
                max,
            });
        }
        Ok(())
    }

    /// Advance `prior` by one tick.
    pub fn step(
        &mut self,
        prior: &SimulationState,
        input: &TickInput,
    ) -> Result<TickOutcome, TickError> {
        self.check_input(input)?;

        let throttle = self.throttle.assess(&input.weather, input.emergency_override);
        let clock_s = input.delta_s * input.playback_speed;
        let tick = prior.tick + 1;
        let sim_time_s = prior.sim_time_s + clock_s;
        let sim_time =
            self.config.start_time + Duration::milliseconds((sim_time_s * 1000.0).round() as i64);

        let mut aircraft = prior.aircraft.clone();
        let mut ctx = PhaseContext {
            config: &self.config,
            prior,
            allocator: ResourceAllocator::from_snapshot(&prior.gates, &prior.corridors),
            rng: &mut self.rng,
            dt: clock_s * throttle.speed_factor,
            grounded: throttle.grounded,
            tick,
            sim_time,
            events: Vec::new(),
            fees: Vec::new(),
            stats: prior.stats.clone(),
        };
        for entry in aircraft.iter_mut() {
            ctx.advance(entry);
        }

        let PhaseContext {
            allocator,
            events,
            fees,
            stats,
            ..
        } = ctx;

        let mut gates = prior.gates.clone();
        let mut corridors = prior.corridors.clone();
        allocator.commit(&mut gates, &mut corridors);
        self.refresh_gate_status(&mut gates, &aircraft, &corridors);

        let tracks = monitored_tracks(&aircraft, &gates, &corridors, &self.config);
        let conflicts = self.monitor.detect_conflicts(&tracks);

        tracing::debug!(
            "Tick {}: {} events, {} fees, {} conflicts, dt {:.3}s{}",
            tick,
            events.len(),
            fees.len(),
            conflicts.len(),
            clock_s * throttle.speed_factor,
            if throttle.grounded { " (grounded)" } else { "" }
        );

        Ok(TickOutcome {
            state: SimulationState {
                tick,
                sim_time_s,
                sim_time,
                aircraft,
                gates,
                corridors,
                stats,
            },
            events,
            fees,
            conflicts,
            throttle,
        })
    }

    /// Recount airborne traffic near each gate and derive its status.
    fn refresh_gate_status(
        &self,
        gates: &mut [Gate],
        aircraft: &[Aircraft],
        corridors: &[Corridor],
    ) {
        let radius = self.config.gate_congestion_radius_m;
        let positions: Vec<(&str, (f64, f64))> = aircraft
            .iter()
            .filter(|a| a.phase.is_monitored())
            .filter_map(|a| {
                let (x, y, _) = aircraft_position(a, &self.config, corridors)?;
                Some((a.city_id.as_str(), (x, y)))
            })
            .collect();

        for gate in gates.iter_mut() {
            gate.nearby_aircraft = match gate_position(gate, &self.config) {
                Some(here) => positions
                    .iter()
                    .filter(|(city_id, pos)| {
                        *city_id == gate.city_id && planar_distance(here, *pos) <= radius
                    })
                    .count() as u32,
                None => 0,
            };
            gate.status = gate.derive_status(self.config.gate_congestion_threshold);
        }
    }
}

/// Mutable working state for one tick's phase updates.
struct PhaseContext<'a, R: Rng> {
    config: &'a ScenarioConfig,
    prior: &'a SimulationState,
    allocator: ResourceAllocator,
    rng: &'a mut R,
    /// Effective delta: clock seconds scaled by the weather throttle
    dt: f64,
    grounded: bool,
    tick: u64,
    sim_time: DateTime<Utc>,
    events: Vec<SimEvent>,
    fees: Vec<FeeTransaction>,
    stats: TrafficStats,
}

impl<R: Rng> PhaseContext<'_, R> {
    fn advance(&mut self, aircraft: &mut Aircraft) {
        match aircraft.phase.clone() {
            FlightPhase::Orbit => self.orbit(aircraft),
            FlightPhase::Descending { gate_id } => self.descend(aircraft, gate_id),
            FlightPhase::Landed { gate_id } => self.parked(aircraft, gate_id),
            FlightPhase::Ascending { gate_id } => self.ascend(aircraft, gate_id),
            FlightPhase::CorridorTransit {
                corridor_id,
                variant,
                progress,
            } => self.transit(aircraft, corridor_id, variant, progress),
        }
    }

    /// Per-second probability scaled to this tick, rolled once.
    fn roll(&mut self, per_second: f64) -> bool {
        let p = (per_second * self.dt).clamp(0.0, 1.0);
        p > 0.0 && self.rng.random_bool(p)
    }

    fn emit(&mut self, severity: EventSeverity, kind: EventKind, message: String) {
        self.events.push(SimEvent {
            tick: self.tick,
            sim_time: self.sim_time,
            severity,
            kind,
            message,
        });
    }

    fn charge(&mut self, fee_type: FeeType, aircraft: &Aircraft) {
        self.fees.push(FeeTransaction {
            fee_type,
            operator: aircraft.operator.clone(),
            city_id: aircraft.city_id.clone(),
            amount: self.config.fees.amount(fee_type),
            aircraft_id: aircraft.aircraft_id.clone(),
            tick: self.tick,
            sim_time: self.sim_time,
        });
    }

    fn stale(&mut self, aircraft: &Aircraft, reference: &str) {
        self.stats.stale_holds += 1;
        tracing::warn!(
            "{} holding in {}: {} no longer resolves",
            aircraft.aircraft_id,
            aircraft.phase.label(),
            reference
        );
        self.emit(
            EventSeverity::Warning,
            EventKind::StaleReference {
                aircraft_id: aircraft.aircraft_id.clone(),
                reference: reference.to_string(),
            },
            format!(
                "{} holding position: {} no longer resolves",
                aircraft.aircraft_id, reference
            ),
        );
    }

    fn orbit(&mut self, aircraft: &mut Aircraft) {
        let rates = &self.config.rates;
        aircraft.angle_deg = normalize_degrees(
            aircraft.angle_deg + aircraft.speed_factor * self.dt * rates.angular_rate_deg_per_s,
        );

        if self.roll(self.config.probabilities.descent) && self.start_descent(aircraft) {
            return;
        }
        if !self.grounded && self.roll(self.config.probabilities.transfer) {
            self.start_transfer(aircraft);
        }
    }

    fn start_descent(&mut self, aircraft: &mut Aircraft) -> bool {
        let free = self.allocator.free_gates(&aircraft.city_id);
        if free.is_empty() {
            self.stats.gate_refusals += 1;
            tracing::debug!("{} found no free gate at {}", aircraft.aircraft_id, aircraft.city_id);
            return false;
        }
        let gate_id = free[self.rng.random_range(0..free.len())].clone();
        if !self.allocator.try_reserve_gate(&gate_id, &aircraft.aircraft_id) {
            self.stats.gate_refusals += 1;
            return false;
        }

        self.stats.descents += 1;
        tracing::debug!("{} descending to {}", aircraft.aircraft_id, gate_id);
        self.emit(
            EventSeverity::Info,
            EventKind::DescentStarted {
                aircraft_id: aircraft.aircraft_id.clone(),
                gate_id: gate_id.clone(),
            },
            format!("{} cleared to descend to {}", aircraft.aircraft_id, gate_id),
        );
        aircraft.phase = FlightPhase::Descending { gate_id };
        true
    }

    fn start_transfer(&mut self, aircraft: &mut Aircraft) {
        let candidates = self.allocator.corridor_candidates(&aircraft.city_id);
        let Some(chosen) = candidates.first() else {
            self.stats.corridor_refusals += 1;
            tracing::debug!(
                "{} found no corridor capacity from {}",
                aircraft.aircraft_id,
                aircraft.city_id
            );
            return;
        };
        let Some(corridor) = self.prior.corridor(&chosen.corridor_id) else {
            self.stale(aircraft, &chosen.corridor_id);
            return;
        };
        if !self.allocator.try_admit_corridor(&corridor.corridor_id) {
            self.stats.corridor_refusals += 1;
            return;
        }

        let corridor_id = corridor.corridor_id.clone();
        let variant = corridor.variant;
        let altitude_m = corridor.altitude_m;

        if let Some(runner_up) = candidates.get(1) {
            if runner_up.utilization > REROUTE_RUNNER_UP_UTILIZATION
                && chosen.utilization < REROUTE_CHOSEN_UTILIZATION
            {
                self.stats.reroutes += 1;
                self.emit(
                    EventSeverity::Info,
                    EventKind::Rerouted {
                        aircraft_id: aircraft.aircraft_id.clone(),
                        corridor_id: corridor_id.clone(),
                        avoided_corridor_id: runner_up.corridor_id.clone(),
                    },
                    format!(
                        "{} rerouted via {} to avoid congested {}",
                        aircraft.aircraft_id, corridor_id, runner_up.corridor_id
                    ),
                );
            }
        }

        self.stats.transfers += 1;
        tracing::debug!("{} entering corridor {}", aircraft.aircraft_id, corridor_id);
        self.emit(
            EventSeverity::Info,
            EventKind::TransferStarted {
                aircraft_id: aircraft.aircraft_id.clone(),
                corridor_id: corridor_id.clone(),
            },
            format!("{} entered corridor {}", aircraft.aircraft_id, corridor_id),
        );
        aircraft.altitude_m = altitude_m;
        aircraft.phase = FlightPhase::CorridorTransit {
            corridor_id,
            variant,
            progress: 0.0,
        };
    }

    fn descend(&mut self, aircraft: &mut Aircraft, gate_id: String) {
        let target = self
            .prior
            .gate(&gate_id)
            .filter(|_| self.allocator.gate_holder(&gate_id) == Some(aircraft.aircraft_id.as_str()))
            .map(|gate| (gate.angle_deg, gate.radial_m));
        let Some((gate_angle, gate_radial)) = target else {
            self.stale(aircraft, &gate_id);
            return;
        };

        let rates = &self.config.rates;
        aircraft.angle_deg = step_angle_toward(
            aircraft.angle_deg,
            gate_angle,
            rates.approach_angular_rate_deg_per_s * self.dt,
        );
        aircraft.radial_m = step_toward(
            aircraft.radial_m,
            gate_radial,
            rates.approach_radial_rate_mps * self.dt,
        );
        aircraft.altitude_m = (aircraft.altitude_m - rates.descent_rate_mps * self.dt).max(0.0);

        if aircraft.altitude_m > rates.ground_threshold_m {
            return;
        }

        aircraft.angle_deg = normalize_degrees(gate_angle);
        aircraft.radial_m = gate_radial;
        aircraft.altitude_m = 0.0;
        self.stats.landings += 1;
        tracing::debug!("{} landed at {}", aircraft.aircraft_id, gate_id);
        self.emit(
            EventSeverity::Success,
            EventKind::Landed {
                aircraft_id: aircraft.aircraft_id.clone(),
                gate_id: gate_id.clone(),
            },
            format!("{} landed at {}", aircraft.aircraft_id, gate_id),
        );
        self.charge(FeeType::LandingFee, aircraft);
        aircraft.phase = FlightPhase::Landed { gate_id };
    }

    fn parked(&mut self, aircraft: &mut Aircraft, gate_id: String) {
        let held = self.prior.gate(&gate_id).is_some()
            && self.allocator.gate_holder(&gate_id) == Some(aircraft.aircraft_id.as_str());
        if !held {
            self.stale(aircraft, &gate_id);
            return;
        }
        if self.grounded || !self.roll(self.config.probabilities.departure) {
            return;
        }
        self.allocator.release_gate(&gate_id, &aircraft.aircraft_id);
        self.stats.departures += 1;
        tracing::debug!("{} departing {}", aircraft.aircraft_id, gate_id);
        self.emit(
            EventSeverity::Info,
            EventKind::Departed {
                aircraft_id: aircraft.aircraft_id.clone(),
                gate_id: gate_id.clone(),
            },
            format!("{} departed {}", aircraft.aircraft_id, gate_id),
        );
        self.charge(FeeType::DepartureFee, aircraft);
        aircraft.phase = FlightPhase::Ascending { gate_id };
    }

    fn ascend(&mut self, aircraft: &mut Aircraft, gate_id: String) {
        let Some((ring_radius, ring_altitude)) = self
            .config
            .ring(aircraft.ring_level)
            .map(|ring| (ring.radius_m, ring.altitude_m))
        else {
            self.stale(aircraft, &format!("ring {}", aircraft.ring_level));
            return;
        };
        let rates = &self.config.rates;
        aircraft.altitude_m =
            (aircraft.altitude_m + rates.ascent_rate_mps * self.dt).min(ring_altitude);
        aircraft.radial_m = step_toward(
            aircraft.radial_m,
            ring_radius,
            rates.approach_radial_rate_mps * self.dt,
        );
        if aircraft.altitude_m < ring_altitude {
            return;
        }

        aircraft.altitude_m = ring_altitude;
        aircraft.radial_m = ring_radius;
        let ring_level = aircraft.ring_level;
        tracing::debug!(
            "{} back in orbit on ring {} after {}",
            aircraft.aircraft_id,
            ring_level,
            gate_id
        );
        self.emit(
            EventSeverity::Info,
            EventKind::ReachedOrbit {
                aircraft_id: aircraft.aircraft_id.clone(),
                ring_level,
            },
            format!("{} reached ring {}", aircraft.aircraft_id, ring_level),
        );
        aircraft.phase = FlightPhase::Orbit;
    }

    fn transit(
        &mut self,
        aircraft: &mut Aircraft,
        corridor_id: String,
        variant: CorridorVariant,
        progress: f64,
    ) {
        let Some(corridor) = self.prior.corridor(&corridor_id) else {
            self.stale(aircraft, &corridor_id);
            return;
        };
        let destination = corridor.destination_city.clone();
        let progress = progress + aircraft.speed_factor * self.dt / corridor.transit_duration_s;

        if progress < 1.0 {
            aircraft.phase = FlightPhase::CorridorTransit {
                corridor_id,
                variant,
                progress,
            };
            return;
        }

        let Some(ring) = self.config.ring(ARRIVAL_RING_LEVEL) else {
            self.stale(aircraft, &format!("ring {ARRIVAL_RING_LEVEL}"));
            return;
        };
        let (radius_m, altitude_m) = (ring.radius_m, ring.altitude_m);

        self.allocator.release_corridor(&corridor_id);
        self.stats.arrivals += 1;
        aircraft.city_id = destination.clone();
        aircraft.ring_level = ARRIVAL_RING_LEVEL;
        aircraft.angle_deg = self.rng.random_range(0.0..360.0);
        aircraft.radial_m = radius_m;
        aircraft.altitude_m = altitude_m;
        aircraft.phase = FlightPhase::Orbit;

        tracing::debug!("{} arrived at {} via {}", aircraft.aircraft_id, destination, corridor_id);
        self.emit(
            EventSeverity::Success,
            EventKind::CorridorArrival {
                aircraft_id: aircraft.aircraft_id.clone(),
                city_id: destination.clone(),
            },
            format!("{} arrived at {} via {}", aircraft.aircraft_id, destination, corridor_id),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn engine(config: ScenarioConfig) -> TickEngine {
        TickEngine::new(Arc::new(config), ChaCha8Rng::seed_from_u64(7)).unwrap()
    }

    fn small_config() -> ScenarioConfig {
        ScenarioConfig {
            aircraft_per_city: 4,
            gates_per_city: 3,
            ..ScenarioConfig::default()
        }
    }

    #[test]
    fn initial_state_layout() {
        let mut engine = engine(small_config());
        let state = engine.initial_state();

        assert_eq!(state.aircraft.len(), 8);
        assert_eq!(state.gates.len(), 6);
        // Two ordered pairs times three variants.
        assert_eq!(state.corridors.len(), 6);
        assert!(state.aircraft.iter().all(|a| a.phase == FlightPhase::Orbit));
        for aircraft in &state.aircraft {
            let ring = engine.config().ring(aircraft.ring_level).unwrap();
            assert_eq!(aircraft.radial_m, ring.radius_m);
            assert!((0.8..=1.2).contains(&aircraft.speed_factor));
        }
        let middle = state.corridor("SFO-OAK-middle").unwrap();
        assert_eq!(middle.altitude_m, 750.0);
        assert_eq!(state.corridor("OAK-SFO-low").unwrap().altitude_m, 690.0);
        assert_eq!(state.aircraft[0].operator, "Archer");
        assert_eq!(state.aircraft[1].operator, "Joby");
    }

    #[test]
    fn disabled_gates_start_occupied() {
        let mut config = small_config();
        config.disabled_gates = vec!["SFO-G02".to_string()];
        let mut engine = engine(config);
        let state = engine.initial_state();
        let gate = state.gate("SFO-G02").unwrap();
        assert!(gate.maintenance);
        assert_eq!(gate.status, crate::models::GateStatus::Occupied);
    }

    #[test]
    fn ring_weights_pick_only_weighted_levels() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..200 {
            assert_eq!(pick_ring_level(&[0.0, 0.0, 1.0], &mut rng), 3);
            let level = pick_ring_level(&[1.0, 0.0, 1.0], &mut rng);
            assert!(level == 1 || level == 3);
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = small_config();
        config.corridors.capacity = 0;
        let result = TickEngine::new(Arc::new(config), ChaCha8Rng::seed_from_u64(1));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn bad_delta_is_an_error() {
        let mut engine = engine(small_config());
        let state = engine.initial_state();
        for delta_s in [0.0, -1.0, f64::NAN, f64::INFINITY, 60.0] {
            let input = TickInput {
                delta_s,
                ..TickInput::default()
            };
            assert!(matches!(
                engine.step(&state, &input),
                Err(TickError::InvalidDelta { .. })
            ));
        }
        let input = TickInput {
            playback_speed: 0.0,
            ..TickInput::default()
        };
        assert!(matches!(
            engine.step(&state, &input),
            Err(TickError::InvalidPlayback { .. })
        ));
    }

    #[test]
    fn orbit_advances_angle_and_clock() {
        let mut config = small_config();
        config.probabilities.descent = 0.0;
        config.probabilities.transfer = 0.0;
        let mut engine = engine(config);
        let state = engine.initial_state();
        let input = TickInput {
            delta_s: 2.0,
            playback_speed: 1.5,
            ..TickInput::default()
        };
        let outcome = engine.step(&state, &input).unwrap();

        assert_eq!(outcome.state.tick, 1);
        assert_eq!(outcome.state.sim_time_s, 3.0);
        assert_eq!(outcome.state.sim_time, state.sim_time + Duration::seconds(3));
        let before = &state.aircraft[0];
        let after = &outcome.state.aircraft[0];
        let expected = normalize_degrees(before.angle_deg + before.speed_factor * 3.0 * 1.5);
        assert!((after.angle_deg - expected).abs() < 1e-9);
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn weather_slows_motion_but_not_the_clock() {
        let mut config = small_config();
        config.probabilities.descent = 0.0;
        config.probabilities.transfer = 0.0;
        let mut engine = engine(config);
        let state = engine.initial_state();
        let input = TickInput {
            weather: WeatherSignal {
                safety_score: 50.0,
                clear_for_flight: true,
            },
            ..TickInput::default()
        };
        let outcome = engine.step(&state, &input).unwrap();
        assert_eq!(outcome.throttle.speed_factor, 0.6);
        assert_eq!(outcome.state.sim_time_s, 1.0);

        let before = &state.aircraft[0];
        let after = &outcome.state.aircraft[0];
        let expected = normalize_degrees(before.angle_deg + before.speed_factor * 0.6 * 1.5);
        assert!((after.angle_deg - expected).abs() < 1e-9);
    }

    #[test]
    fn stale_gate_holds_position() {
        let mut engine = engine(small_config());
        let mut state = engine.initial_state();
        state.aircraft[0].phase = FlightPhase::Descending {
            gate_id: "SFO-G77".to_string(),
        };
        let before = state.aircraft[0].clone();

        let outcome = engine.step(&state, &TickInput::default()).unwrap();
        assert_eq!(outcome.state.aircraft[0], before);
        assert_eq!(outcome.state.stats.stale_holds, 1);
        assert!(outcome.events.iter().any(|e| matches!(
            &e.kind,
            EventKind::StaleReference { reference, .. } if reference == "SFO-G77"
        )));
    }

    #[test]
    fn stale_corridor_holds_position() {
        let mut engine = engine(small_config());
        let mut state = engine.initial_state();
        state.aircraft[1].phase = FlightPhase::CorridorTransit {
            corridor_id: "SFO-LAX-middle".to_string(),
            variant: CorridorVariant::Middle,
            progress: 0.4,
        };
        let before = state.aircraft[1].clone();
        let outcome = engine.step(&state, &TickInput::default()).unwrap();
        assert_eq!(outcome.state.aircraft[1], before);
        assert_eq!(outcome.state.stats.stale_holds, 1);
    }

    fn departures_only(mut config: ScenarioConfig) -> ScenarioConfig {
        config.probabilities = crate::config::TriggerProbabilities {
            descent: 0.0,
            transfer: 0.0,
            departure: 1.0,
        };
        config
    }

    #[test]
    fn landed_on_vanished_gate_holds_position() {
        let mut engine = engine(departures_only(small_config()));
        let mut state = engine.initial_state();
        state.aircraft[0].phase = FlightPhase::Landed {
            gate_id: "SFO-G77".to_string(),
        };
        state.aircraft[0].altitude_m = 0.0;
        let before = state.aircraft[0].clone();

        let outcome = engine.step(&state, &TickInput::default()).unwrap();
        assert_eq!(outcome.state.aircraft[0], before);
        assert_eq!(outcome.state.stats.stale_holds, 1);
        assert_eq!(outcome.state.stats.departures, 0);
        assert!(outcome.fees.is_empty());
        assert!(outcome.events.iter().any(|e| matches!(
            &e.kind,
            EventKind::StaleReference { reference, .. } if reference == "SFO-G77"
        )));
    }

    #[test]
    fn landed_without_reservation_cannot_free_anothers_gate() {
        let mut engine = engine(departures_only(small_config()));
        let mut state = engine.initial_state();
        let holder = state.aircraft[1].aircraft_id.clone();
        state.aircraft[0].phase = FlightPhase::Landed {
            gate_id: "SFO-G01".to_string(),
        };
        state.aircraft[0].altitude_m = 0.0;
        state.aircraft[1].phase = FlightPhase::Descending {
            gate_id: "SFO-G01".to_string(),
        };
        if let Some(gate) = state.gates.iter_mut().find(|g| g.gate_id == "SFO-G01") {
            gate.reserved_by = Some(holder.clone());
        }
        let before = state.aircraft[0].clone();

        let outcome = engine.step(&state, &TickInput::default()).unwrap();
        assert_eq!(outcome.state.aircraft[0], before);
        assert_eq!(outcome.state.stats.stale_holds, 1);
        assert_eq!(outcome.state.stats.departures, 0);
        assert!(outcome.fees.is_empty());

        let gate = outcome.state.gate("SFO-G01").unwrap();
        assert_eq!(gate.reserved_by.as_deref(), Some(holder.as_str()));
        assert_eq!(gate.status, crate::models::GateStatus::Occupied);
        assert_eq!(
            outcome.state.aircraft[1].phase,
            FlightPhase::Descending {
                gate_id: "SFO-G01".to_string()
            }
        );
        assert_ne!(outcome.state.aircraft[1].radial_m, state.aircraft[1].radial_m);
    }

    #[test]
    fn corridor_arrival_lands_on_ring_two_at_destination() {
        let mut config = small_config();
        config.probabilities = crate::config::TriggerProbabilities {
            descent: 0.0,
            transfer: 0.0,
            departure: 0.0,
        };
        let mut engine = engine(config);
        let mut state = engine.initial_state();
        state.aircraft[0].phase = FlightPhase::CorridorTransit {
            corridor_id: "SFO-OAK-high".to_string(),
            variant: CorridorVariant::High,
            progress: 0.999,
        };
        state.aircraft[0].city_id = "SFO".to_string();
        let high = state.corridors.iter_mut().find(|c| c.corridor_id == "SFO-OAK-high");
        if let Some(corridor) = high {
            corridor.occupants = 1;
        }

        let outcome = engine.step(&state, &TickInput::default()).unwrap();
        let arrived = &outcome.state.aircraft[0];
        assert_eq!(arrived.phase, FlightPhase::Orbit);
        assert_eq!(arrived.city_id, "OAK");
        assert_eq!(arrived.ring_level, 2);
        assert_eq!(arrived.radial_m, 1_600.0);
        assert_eq!(arrived.altitude_m, 450.0);
        assert_eq!(outcome.state.corridor("SFO-OAK-high").unwrap().occupants, 0);
        assert_eq!(outcome.state.stats.arrivals, 1);
    }

    #[test]
    fn phase_counts_cover_every_aircraft() {
        let mut engine = engine(small_config());
        let state = engine.initial_state();
        let counts = state.phase_counts();
        assert_eq!(counts.orbit, state.aircraft.len());
        let busy = counts.landed + counts.descending + counts.ascending + counts.corridor_transit;
        assert_eq!(busy, 0);
    }
}
