//! Separation probe: run the monitor and resolver over canned encounters.
//!
//! Prints one JSON report per encounter on stdout.
//!
//! Usage:
//!   cargo run -p vtol-cli --bin separation_probe
//!   cargo run -p vtol-cli --bin separation_probe -- --encounter head-on

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use vtol_cli::init_tracing;
use vtol_cli::sim::{all_scenarios, scenario_by_name, Encounter};
use vtol_core::{
    Conflict, ManeuverResolver, Resolution, ScenarioConfig, SeparationMonitor, TrackPosition,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Probe separation monitoring and maneuver advice")]
struct Args {
    /// Encounter to run (default: all)
    #[arg(long)]
    encounter: Option<String>,

    /// Take separation standards and maneuver limits from this scenario file
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Encounter center, meters east
    #[arg(long, default_value_t = 0.0)]
    center_x: f64,

    /// Encounter center, meters north
    #[arg(long, default_value_t = 0.0)]
    center_y: f64,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[derive(Serialize)]
struct ProbeReport<'a> {
    encounter: &'a str,
    description: &'a str,
    tracks: &'a [TrackPosition],
    conflicts: Vec<Conflict>,
    resolutions: Vec<Resolution>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&["separation_probe=info", "vtol_core=info"], args.json_logs)?;

    let scenario = match &args.scenario {
        Some(path) => ScenarioConfig::from_file(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => ScenarioConfig::default(),
    };
    let monitor = SeparationMonitor::new(scenario.separation.clone());
    let resolver = ManeuverResolver::new(scenario.maneuvers.clone(), scenario.separation.clone());

    let center = (args.center_x, args.center_y);
    let encounters = match &args.encounter {
        Some(name) => match scenario_by_name(name, center) {
            Some(encounter) => vec![encounter],
            None => {
                let known: Vec<String> = all_scenarios(center).into_iter().map(|e| e.name).collect();
                bail!("unknown encounter '{}' (known: {})", name, known.join(", "));
            }
        },
        None => all_scenarios(center),
    };

    for encounter in &encounters {
        let report = probe(encounter, &monitor, &resolver);
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn probe<'a>(
    encounter: &'a Encounter,
    monitor: &SeparationMonitor,
    resolver: &ManeuverResolver,
) -> ProbeReport<'a> {
    let conflicts = monitor.detect_conflicts(&encounter.tracks);
    tracing::info!("{}: {} conflict(s)", encounter.name, conflicts.len());

    let find = |id: &str| encounter.tracks.iter().find(|track| track.aircraft_id == id);
    let mut resolutions = Vec::with_capacity(conflicts.len());
    for conflict in &conflicts {
        let resolution = match (find(&conflict.aircraft_a), find(&conflict.aircraft_b)) {
            (Some(a), Some(b)) => resolver.resolve(conflict, a, b),
            _ => Resolution::rejected(conflict.conflict_id(), "track missing from encounter"),
        };
        tracing::info!(
            "  {} {:?}: {:?} strategy, {} (confidence {:.2})",
            resolution.conflict_id,
            conflict.severity,
            resolution.strategy,
            resolution.status.label(),
            resolution.confidence
        );
        resolutions.push(resolution);
    }

    ProbeReport {
        encounter: &encounter.name,
        description: &encounter.description,
        tracks: &encounter.tracks,
        conflicts,
        resolutions,
    }
}
