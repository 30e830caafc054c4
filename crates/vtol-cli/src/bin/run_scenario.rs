//! Headless hub traffic run.
//!
//! Steps a scenario for a fixed number of ticks, logging the event stream as
//! it drains, and prints a JSON summary on stdout when done.
//!
//! Usage:
//!   cargo run -p vtol-cli --bin run_scenario -- --ticks 1200 --advise
//!   cargo run -p vtol-cli --bin run_scenario -- --scenario scenarios/two_hub.json --realtime

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use serde::Serialize;
use tokio::time::{interval, MissedTickBehavior};
use vtol_cli::{init_tracing, Config};
use vtol_core::{
    Conflict, EventSeverity, GeodeticPosition, IncidentRecord, PhaseCounts, ResolutionStatus,
    ScenarioConfig, SimEvent, Simulation, SimulationState, TickInput, TickReport, TrafficStats,
    WeatherSignal,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run an eVTOL hub traffic scenario")]
struct Args {
    /// Scenario JSON file (default: built-in two-hub scenario)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to run
    #[arg(long)]
    ticks: Option<u64>,

    /// Seconds per tick
    #[arg(long)]
    delta: Option<f64>,

    /// Simulated seconds per tick second
    #[arg(long)]
    playback: Option<f64>,

    /// Weather safety score, 0-100
    #[arg(long)]
    safety_score: Option<f64>,

    /// Report the sky as not clear for flight
    #[arg(long, default_value_t = false)]
    grounded: bool,

    /// Ignore weather grounding
    #[arg(long, default_value_t = false)]
    emergency_override: bool,

    /// Ask the resolver for advice on every newly opened conflict
    #[arg(long, default_value_t = false)]
    advise: bool,

    /// Pace ticks against the wall clock
    #[arg(long, default_value_t = false)]
    realtime: bool,

    /// Log a phase summary every N ticks (0 disables)
    #[arg(long, default_value_t = 60)]
    report_every: u64,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Write the final snapshot and renderer positions to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    scenario: &'a str,
    seed: u64,
    ticks: u64,
    sim_time: DateTime<Utc>,
    skipped_ticks: u64,
    dropped_events: u64,
    phases: PhaseCounts,
    stats: &'a TrafficStats,
    active_conflicts: usize,
    incidents: Vec<IncidentRecord>,
    /// Fee totals per operator
    revenue: BTreeMap<String, f64>,
}

#[derive(Serialize)]
struct FinalState<'a> {
    snapshot: &'a SimulationState,
    positions: Vec<GeodeticPosition>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let env_config = Config::from_env();

    init_tracing(
        &["run_scenario=info", "vtol_core=info"],
        args.json_logs || env_config.json_logs,
    )?;

    let scenario_path = args.scenario.clone().or(env_config.scenario_path.clone());
    let mut scenario = match &scenario_path {
        Some(path) => ScenarioConfig::from_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => ScenarioConfig::default(),
    };
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }

    let ticks = args.ticks.unwrap_or(env_config.ticks);
    let input = TickInput {
        delta_s: args.delta.unwrap_or(env_config.delta_s),
        playback_speed: args.playback.unwrap_or(env_config.playback_speed),
        weather: WeatherSignal {
            safety_score: args.safety_score.unwrap_or(env_config.safety_score),
            clear_for_flight: !args.grounded,
        },
        emergency_override: args.emergency_override,
    };

    tracing::info!(
        "Running scenario '{}' (seed {}) for {} ticks of {}s at {}x",
        scenario.name,
        scenario.seed,
        ticks,
        input.delta_s,
        input.playback_speed
    );

    let mut sim = Simulation::new(scenario).context("invalid scenario")?;

    // Invalid deltas are rejected by the driver; pace those at 1 Hz.
    let mut ticker = args.realtime.then(|| {
        let period = if input.delta_s.is_finite() && input.delta_s > 0.0 {
            input.delta_s.min(3600.0)
        } else {
            1.0
        };
        let mut ticker = interval(Duration::from_secs_f64(period));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    });

    let mut advised = BTreeSet::new();
    let mut incidents = Vec::new();
    let mut revenue: BTreeMap<String, f64> = BTreeMap::new();

    for _ in 0..ticks {
        if let Some(ticker) = ticker.as_mut() {
            ticker.tick().await;
        }

        let report = sim.advance(&input);
        for event in sim.drain_events() {
            log_event(&event);
        }
        for fee in sim.drain_fees() {
            *revenue.entry(fee.operator).or_default() += fee.amount;
        }
        for incident in sim.drain_incidents() {
            tracing::warn!(
                "Incident {}: {} / {} {:?} at {:.0}m horizontal, {:.0}m vertical",
                incident.incident_id,
                incident.aircraft_a,
                incident.aircraft_b,
                incident.severity,
                incident.horizontal_m,
                incident.vertical_m
            );
            incidents.push(incident);
        }

        let TickReport::Applied { tick, conflicts, .. } = report else {
            continue;
        };
        if args.advise {
            advise(&sim, &mut advised);
        }
        if args.report_every > 0 && tick % args.report_every == 0 {
            let phases = sim.snapshot().phase_counts();
            tracing::info!(
                "Tick {}: {} orbit, {} descending, {} landed, {} ascending, {} in corridors, {} conflicts",
                tick,
                phases.orbit,
                phases.descending,
                phases.landed,
                phases.ascending,
                phases.corridor_transit,
                conflicts
            );
        }
    }

    let snapshot = sim.snapshot();
    let summary = RunSummary {
        scenario: &sim.config().name,
        seed: sim.config().seed,
        ticks: snapshot.tick,
        sim_time: snapshot.sim_time,
        skipped_ticks: sim.skipped_ticks(),
        dropped_events: sim.dropped_events(),
        phases: snapshot.phase_counts(),
        stats: &snapshot.stats,
        active_conflicts: sim.active_conflicts().len(),
        incidents,
        revenue,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = &args.output {
        let final_state = FinalState {
            snapshot,
            positions: sim.geodetic_positions(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&final_state)?)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!("Wrote final snapshot to {}", path.display());
    }

    Ok(())
}

fn log_event(event: &SimEvent) {
    match event.severity {
        EventSeverity::Info => tracing::debug!("[{}] {}", event.tick, event.message),
        EventSeverity::Success => tracing::info!("[{}] {}", event.tick, event.message),
        EventSeverity::Warning => tracing::warn!("[{}] {}", event.tick, event.message),
        EventSeverity::Error => tracing::error!("[{}] {}", event.tick, event.message),
    }
}

/// Request one resolution per conflict, the first tick it is seen open.
fn advise(sim: &Simulation, advised: &mut BTreeSet<String>) {
    let active: Vec<Conflict> = sim.active_conflicts().into_iter().cloned().collect();
    advised.retain(|id: &String| active.iter().any(|conflict| conflict.conflict_id() == *id));

    for conflict in &active {
        if !advised.insert(conflict.conflict_id()) {
            continue;
        }
        let resolution = sim.propose_resolution(conflict);
        if let ResolutionStatus::Rejected { reason } = &resolution.status {
            tracing::warn!("No resolution for {}: {}", resolution.conflict_id, reason);
            continue;
        }
        for action in &resolution.actions {
            tracing::info!(
                "Advise {} {} {:.1} over {:.1}s (confidence {:.2}, {:?})",
                action.aircraft_id,
                action.kind.as_str(),
                action.magnitude,
                action.duration_s,
                action.confidence,
                resolution.strategy
            );
        }
    }
}
