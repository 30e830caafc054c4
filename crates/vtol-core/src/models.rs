//! Core data models for the hub traffic engine.

use serde::{Deserialize, Serialize};

/// Flight phase of an aircraft. Each variant carries the reference that is
/// authoritative for that phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlightPhase {
    /// Cruising on the aircraft's ring
    Orbit,
    /// Approaching a reserved gate
    Descending { gate_id: String },
    /// Parked on a reserved gate
    Landed { gate_id: String },
    /// Climbing back to the ring; the gate is already released
    Ascending { gate_id: String },
    /// Flying a corridor toward another hub
    CorridorTransit {
        corridor_id: String,
        variant: CorridorVariant,
        progress: f64,
    },
}

impl FlightPhase {
    /// Short label for logs and event messages.
    pub fn label(&self) -> &'static str {
        match self {
            FlightPhase::Orbit => "ORBIT",
            FlightPhase::Descending { .. } => "DESCENDING",
            FlightPhase::Landed { .. } => "LANDED",
            FlightPhase::Ascending { .. } => "ASCENDING",
            FlightPhase::CorridorTransit { .. } => "CORRIDOR_TRANSIT",
        }
    }

    /// Airborne aircraft around a hub take part in separation checks.
    /// Landed and corridor traffic is separated by construction.
    pub fn is_monitored(&self) -> bool {
        matches!(
            self,
            FlightPhase::Orbit | FlightPhase::Descending { .. } | FlightPhase::Ascending { .. }
        )
    }

    /// Gate this phase holds a reservation on.
    pub fn reserved_gate(&self) -> Option<&str> {
        match self {
            FlightPhase::Descending { gate_id } | FlightPhase::Landed { gate_id } => {
                Some(gate_id.as_str())
            }
            _ => None,
        }
    }

    /// Corridor this phase occupies.
    pub fn occupied_corridor(&self) -> Option<&str> {
        match self {
            FlightPhase::CorridorTransit { corridor_id, .. } => Some(corridor_id.as_str()),
            _ => None,
        }
    }
}

/// A simulated eVTOL aircraft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
    pub aircraft_id: String,
    /// Operator tag, used for coloring and fee accounting
    pub operator: String,
    /// Hub the aircraft currently belongs to
    pub city_id: String,
    /// Ring level 1..=3
    pub ring_level: u8,
    pub phase: FlightPhase,
    /// Polar angle around the hub center in degrees
    pub angle_deg: f64,
    /// Distance from the hub center in meters
    pub radial_m: f64,
    pub altitude_m: f64,
    pub speed_factor: f64,
}

/// Derived gate status, recomputed every tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    #[default]
    Available,
    Congested,
    Occupied,
}

/// A ground position an aircraft reserves for landing and parking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub gate_id: String,
    pub city_id: String,
    pub angle_deg: f64,
    pub radial_m: f64,
    /// Permanently disabled by the scenario
    pub maintenance: bool,
    /// Aircraft holding the reservation, written back by the allocator
    pub reserved_by: Option<String>,
    /// Airborne aircraft of the same hub within the congestion radius
    pub nearby_aircraft: u32,
    pub status: GateStatus,
}

impl Gate {
    /// Status from reservation, maintenance flag and the nearby-aircraft count.
    pub fn derive_status(&self, congestion_threshold: u32) -> GateStatus {
        if self.maintenance || self.reserved_by.is_some() {
            GateStatus::Occupied
        } else if self.nearby_aircraft >= congestion_threshold {
            GateStatus::Congested
        } else {
            GateStatus::Available
        }
    }
}

/// One of three parallel corridor lanes between two hubs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorridorVariant {
    Low,
    Middle,
    High,
}

impl CorridorVariant {
    pub const ALL: [CorridorVariant; 3] = [
        CorridorVariant::Low,
        CorridorVariant::Middle,
        CorridorVariant::High,
    ];

    /// Altitude offset in multiples of the configured variant spacing.
    pub fn offset_steps(self) -> f64 {
        match self {
            CorridorVariant::Low => -1.0,
            CorridorVariant::Middle => 0.0,
            CorridorVariant::High => 1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CorridorVariant::Low => "low",
            CorridorVariant::Middle => "middle",
            CorridorVariant::High => "high",
        }
    }
}

/// A capacity-limited aerial route between two hubs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Corridor {
    pub corridor_id: String,
    pub origin_city: String,
    pub destination_city: String,
    pub variant: CorridorVariant,
    pub capacity: u32,
    /// Aircraft currently bound to this corridor
    pub occupants: u32,
    pub transit_duration_s: f64,
    pub altitude_m: f64,
}

impl Corridor {
    pub fn corridor_id_for(origin: &str, destination: &str, variant: CorridorVariant) -> String {
        format!("{origin}-{destination}-{}", variant.as_str())
    }
}
