//! Records the engine hands to external collaborators: the event log for
//! presentation, fee transactions for the ledger, incident records for
//! compliance logging.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::{Conflict, ConflictSeverity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSeverity {
    Info,
    Success,
    Warning,
    Error,
}

/// What happened, with the ids a consumer needs to correlate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    DescentStarted { aircraft_id: String, gate_id: String },
    Landed { aircraft_id: String, gate_id: String },
    Departed { aircraft_id: String, gate_id: String },
    ReachedOrbit { aircraft_id: String, ring_level: u8 },
    TransferStarted { aircraft_id: String, corridor_id: String },
    /// Least-utilized corridor chosen while the runner-up was nearly full
    Rerouted {
        aircraft_id: String,
        corridor_id: String,
        avoided_corridor_id: String,
    },
    CorridorArrival { aircraft_id: String, city_id: String },
    StaleReference { aircraft_id: String, reference: String },
    ConflictOpened { aircraft_a: String, aircraft_b: String, severity: ConflictSeverity },
    ConflictCleared { aircraft_a: String, aircraft_b: String },
    TickSkipped { reason: String },
}

/// A human-readable state transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub sim_time: DateTime<Utc>,
    pub severity: EventSeverity,
    pub kind: EventKind,
    pub message: String,
}

/// Bounded, time-ordered buffer. The oldest entries fall off once capacity
/// is reached; the presentation layer drains it at its own pace. Events,
/// fees and incidents each get their own log.
#[derive(Debug, Clone)]
pub struct EventLog<T = SimEvent> {
    capacity: usize,
    entries: VecDeque<T>,
    dropped: u64,
}

impl<T> EventLog<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            dropped: 0,
        }
    }

    pub fn push(&mut self, event: T) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
            self.dropped += 1;
        }
        self.entries.push_back(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = T>) {
        for event in events {
            self.push(event);
        }
    }

    /// Remove and return everything currently buffered, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        self.entries.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries evicted because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeType {
    LandingFee,
    DepartureFee,
}

/// A fee owed by an operator, for the external ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeTransaction {
    pub fee_type: FeeType,
    pub operator: String,
    pub city_id: String,
    pub amount: f64,
    pub aircraft_id: String,
    pub tick: u64,
    pub sim_time: DateTime<Utc>,
}

/// A conflict worth recording for the compliance collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    pub incident_id: String,
    pub conflict_id: String,
    pub aircraft_a: String,
    pub aircraft_b: String,
    pub severity: ConflictSeverity,
    pub horizontal_m: f64,
    pub vertical_m: f64,
    /// `None` when the pair is diverging
    pub time_to_collision_s: Option<f64>,
    pub tick: u64,
    pub sim_time: DateTime<Utc>,
}

impl IncidentRecord {
    pub fn from_conflict(conflict: &Conflict, tick: u64, sim_time: DateTime<Utc>) -> Self {
        Self {
            incident_id: format!("INC-{tick:06}-{}", conflict.conflict_id()),
            conflict_id: conflict.conflict_id(),
            aircraft_a: conflict.aircraft_a.clone(),
            aircraft_b: conflict.aircraft_b.clone(),
            severity: conflict.severity,
            horizontal_m: conflict.horizontal_m,
            vertical_m: conflict.vertical_m,
            time_to_collision_s: conflict
                .time_to_collision_s
                .is_finite()
                .then_some(conflict.time_to_collision_s),
            tick,
            sim_time,
        }
    }
}
