pub mod api;
pub mod coordinates;
pub mod planning;
pub mod route;
pub mod selection;
pub mod trace;

pub use api::{DestinationRequest, PlanResponse, ResetResponse, SelectionResponse, SessionView};
pub use coordinates::Coordinates;
pub use planning::{Activity, Pace, PlanningRequest, TargetWindow, TripType};
pub use route::{MatchFailure, MatchKind, PlannedRoute, RouteCandidate};
pub use selection::{
    AttemptCounting, AttemptState, RejectionReason, ResetMode, SelectionRejection,
};
pub use trace::{PhaseOutcome, PhaseTrace, SearchPhase, SearchTrace};
