pub mod allocator;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod events;
pub mod kinematics;
pub mod models;
pub mod resolution;
pub mod rules;
pub mod simulation;
pub mod spatial;
pub mod weather;

pub use allocator::{CorridorCandidate, ResourceAllocator};
pub use config::{ConfigError, ScenarioConfig, ARRIVAL_RING_LEVEL};
pub use conflict::{Conflict, ConflictSeverity, SeparationAssessment, SeparationMonitor, TrackPosition};
pub use engine::{
    PhaseCounts, SimulationState, TickEngine, TickError, TickInput, TickOutcome, TrafficStats,
};
pub use events::{
    EventKind, EventLog, EventSeverity, FeeTransaction, FeeType, IncidentRecord, SimEvent,
};
pub use models::{Aircraft, Corridor, CorridorVariant, FlightPhase, Gate, GateStatus};
pub use resolution::{
    ManeuverAction, ManeuverKind, ManeuverResolver, Resolution, ResolutionError,
    ResolutionStatus, ResolutionStrategy,
};
pub use rules::{ManeuverLimits, SeparationStandards, SeverityBreakpoints};
pub use simulation::{GeodeticPosition, Simulation, TickReport};
pub use weather::{ThrottleDecision, WeatherBands, WeatherSignal, WeatherThrottle};
