//! Gate and corridor capacity bookkeeping.
//!
//! The allocator is a per-tick working set seeded from the prior snapshot.
//! Every reservation attempt in a tick goes through the same working set, so
//! a later attempt always sees the outcome of an earlier one. Refusal is an
//! ordinary `false`; the caller keeps its aircraft in the current phase and
//! tries again on a later tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Corridor, Gate};

#[derive(Debug, Clone)]
struct GateSlot {
    city_id: String,
    maintenance: bool,
    holder: Option<String>,
}

#[derive(Debug, Clone)]
struct CorridorSlot {
    origin_city: String,
    capacity: u32,
    occupants: u32,
}

impl CorridorSlot {
    fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 1.0;
        }
        self.occupants as f64 / self.capacity as f64
    }
}

/// A corridor with spare capacity, as seen by the working set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorridorCandidate {
    pub corridor_id: String,
    pub utilization: f64,
}

/// Working set of gate reservations and corridor occupancy for one tick.
#[derive(Debug, Clone, Default)]
pub struct ResourceAllocator {
    gates: BTreeMap<String, GateSlot>,
    corridors: BTreeMap<String, CorridorSlot>,
}

impl ResourceAllocator {
    /// Seed the working set from the committed snapshot.
    pub fn from_snapshot(gates: &[Gate], corridors: &[Corridor]) -> Self {
        let gates = gates
            .iter()
            .map(|gate| {
                (
                    gate.gate_id.clone(),
                    GateSlot {
                        city_id: gate.city_id.clone(),
                        maintenance: gate.maintenance,
                        holder: gate.reserved_by.clone(),
                    },
                )
            })
            .collect();
        let corridors = corridors
            .iter()
            .map(|corridor| {
                (
                    corridor.corridor_id.clone(),
                    CorridorSlot {
                        origin_city: corridor.origin_city.clone(),
                        capacity: corridor.capacity,
                        occupants: corridor.occupants,
                    },
                )
            })
            .collect();
        Self { gates, corridors }
    }

    /// Reserve a gate for an aircraft.
    ///
    /// Refused for unknown gates, gates under maintenance, and gates another
    /// aircraft already holds. Re-reserving a gate the same aircraft holds
    /// succeeds.
    pub fn try_reserve_gate(&mut self, gate_id: &str, aircraft_id: &str) -> bool {
        let Some(slot) = self.gates.get_mut(gate_id) else {
            return false;
        };
        if slot.maintenance {
            return false;
        }
        match &slot.holder {
            Some(holder) => holder == aircraft_id,
            None => {
                slot.holder = Some(aircraft_id.to_string());
                true
            }
        }
    }

    /// Release a gate reservation held by `aircraft_id`. Returns false, and
    /// leaves the gate untouched, when someone else holds it.
    pub fn release_gate(&mut self, gate_id: &str, aircraft_id: &str) -> bool {
        match self.gates.get_mut(gate_id) {
            Some(slot) if slot.holder.as_deref() == Some(aircraft_id) => {
                slot.holder = None;
                true
            }
            _ => false,
        }
    }

    /// Admit one aircraft to a corridor if it is under capacity.
    pub fn try_admit_corridor(&mut self, corridor_id: &str) -> bool {
        let Some(slot) = self.corridors.get_mut(corridor_id) else {
            return false;
        };
        if slot.occupants >= slot.capacity {
            return false;
        }
        slot.occupants += 1;
        true
    }

    /// Release one corridor slot. Never goes below zero.
    pub fn release_corridor(&mut self, corridor_id: &str) {
        if let Some(slot) = self.corridors.get_mut(corridor_id) {
            slot.occupants = slot.occupants.saturating_sub(1);
        }
    }

    pub fn gate_holder(&self, gate_id: &str) -> Option<&str> {
        self.gates.get(gate_id).and_then(|slot| slot.holder.as_deref())
    }

    pub fn corridor_occupants(&self, corridor_id: &str) -> Option<u32> {
        self.corridors.get(corridor_id).map(|slot| slot.occupants)
    }

    /// Gates of a city that are neither under maintenance nor reserved, in
    /// id order.
    pub fn free_gates(&self, city_id: &str) -> Vec<String> {
        self.gates
            .iter()
            .filter(|(_, slot)| slot.city_id == city_id && !slot.maintenance && slot.holder.is_none())
            .map(|(gate_id, _)| gate_id.clone())
            .collect()
    }

    /// Corridors leaving `origin_city` with spare capacity, least utilized
    /// first (ties broken by id).
    pub fn corridor_candidates(&self, origin_city: &str) -> Vec<CorridorCandidate> {
        let mut candidates: Vec<CorridorCandidate> = self
            .corridors
            .iter()
            .filter(|(_, slot)| slot.origin_city == origin_city && slot.occupants < slot.capacity)
            .map(|(corridor_id, slot)| CorridorCandidate {
                corridor_id: corridor_id.clone(),
                utilization: slot.utilization(),
            })
            .collect();
        // BTreeMap iteration already orders by id, so a stable sort keeps ties in id order.
        candidates.sort_by(|a, b| a.utilization.total_cmp(&b.utilization));
        candidates
    }

    /// Write reservations and occupancy back onto the new snapshot.
    pub fn commit(self, gates: &mut [Gate], corridors: &mut [Corridor]) {
        for gate in gates.iter_mut() {
            if let Some(slot) = self.gates.get(&gate.gate_id) {
                gate.reserved_by = slot.holder.clone();
            }
        }
        for corridor in corridors.iter_mut() {
            if let Some(slot) = self.corridors.get(&corridor.corridor_id) {
                corridor.occupants = slot.occupants;
            }
        }
    }
}
