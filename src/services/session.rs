use crate::config::SelectionConfig;
use crate::error::{AppError, Result};
use crate::models::{
    AttemptState, Coordinates, PlannedRoute, PlanningRequest, RejectionReason, ResetMode,
    SelectionRejection,
};
use crate::services::attempt_limiter::AttemptLimiter;
use crate::services::route_matcher::{DestinationVerdict, RouteMatcher};
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Result of a manual destination proposal
#[derive(Debug, Clone)]
pub enum SelectionOutcome {
    Accepted(Box<PlannedRoute>),
    Rejected(SelectionRejection),
}

/// One planning flow: the request, its default route, whatever route is
/// currently active, and the attempt limiter for manual overrides.
#[derive(Debug)]
pub struct PlanningSession {
    id: Uuid,
    request: PlanningRequest,
    default_route: PlannedRoute,
    active_route: PlannedRoute,
    limiter: AttemptLimiter,
    reset_mode: ResetMode,
}

impl PlanningSession {
    pub fn new(request: PlanningRequest, default_route: PlannedRoute, selection: &SelectionConfig) -> Self {
        PlanningSession {
            id: Uuid::new_v4(),
            request,
            active_route: default_route.clone(),
            default_route,
            limiter: AttemptLimiter::from_config(selection),
            reset_mode: selection.reset_mode,
        }
    }

    /// Plan the default route and open a session around it
    pub async fn start(
        matcher: &RouteMatcher,
        request: PlanningRequest,
        selection: &SelectionConfig,
    ) -> Result<Self> {
        let route = matcher.plan_route(&request).await?;
        Ok(Self::new(request, route, selection))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn request(&self) -> &PlanningRequest {
        &self.request
    }

    pub fn default_route(&self) -> &PlannedRoute {
        &self.default_route
    }

    pub fn active_route(&self) -> &PlannedRoute {
        &self.active_route
    }

    pub fn selection(&self) -> AttemptState {
        self.limiter.snapshot()
    }

    /// Try a destination picked by the user.
    ///
    /// An accepted destination becomes the active route and consumes an
    /// attempt. Rejections leave the active route untouched.
    pub async fn propose_manual_destination(
        &mut self,
        matcher: &RouteMatcher,
        destination: Coordinates,
    ) -> Result<SelectionOutcome> {
        if self.limiter.is_locked() {
            tracing::debug!(session_id = %self.id, "Manual selection rejected: locked");
            return Ok(SelectionOutcome::Rejected(SelectionRejection::locked()));
        }

        let window = matcher.target_window(&self.request)?;
        let target_radius_m = window.search_radius_m(self.request.trip_type);
        let straight_line_m = self.request.origin.distance_m(&destination);
        let distance_reason = if straight_line_m < target_radius_m {
            RejectionReason::TooClose
        } else {
            RejectionReason::TooFar
        };

        let (reason, routed_distance_m) =
            match matcher.evaluate_destination(&self.request, destination).await {
                Ok(DestinationVerdict::Valid(route)) => {
                    let state = self.limiter.record_valid();
                    tracing::info!(
                        session_id = %self.id,
                        total_m = %format!("{:.0}", route.total_distance_m),
                        state = ?state,
                        "Manual destination accepted ({:.0}m)",
                        route.total_distance_m
                    );
                    self.active_route = (*route).clone();
                    return Ok(SelectionOutcome::Accepted(route));
                }
                Ok(DestinationVerdict::OutOfWindow {
                    routed_distance_m, ..
                }) => (distance_reason, Some(routed_distance_m)),
                Err(AppError::RoutingOracle(e)) => {
                    tracing::warn!(session_id = %self.id, error = %e, "Manual destination unroutable: {}", e);
                    (RejectionReason::Unroutable, None)
                }
                Err(e) => return Err(e),
            };

        let state = self.limiter.record_invalid();
        tracing::debug!(
            session_id = %self.id,
            reason = %reason,
            straight_line_m = %format!("{:.0}", straight_line_m),
            state = ?state,
            "Manual destination rejected: {}",
            reason
        );

        Ok(SelectionOutcome::Rejected(SelectionRejection {
            reason,
            straight_line_m: Some(straight_line_m),
            target_radius_m: Some(target_radius_m),
            routed_distance_m,
        }))
    }

    /// Restore the default route and reset the limiter per the configured mode
    pub fn reset_selection(&mut self) -> &PlannedRoute {
        self.limiter.reset(self.reset_mode);
        self.active_route = self.default_route.clone();
        &self.active_route
    }
}

pub type SharedSession = Arc<Mutex<PlanningSession>>;

/// Planning sessions keyed by id, evicted after a period of inactivity
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<Uuid, SharedSession>,
}

impl SessionStore {
    pub fn new(ttl_seconds: u64, max_entries: u64) -> Self {
        SessionStore {
            sessions: Cache::builder()
                .max_capacity(max_entries)
                .time_to_idle(Duration::from_secs(ttl_seconds))
                .build(),
        }
    }

    pub async fn insert(&self, session: PlanningSession) -> SharedSession {
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.insert(id, shared.clone()).await;
        tracing::debug!(session_id = %id, "Session created");
        shared
    }

    pub async fn get(&self, id: &Uuid) -> Result<SharedSession> {
        self.sessions
            .get(id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Planning session {} not found", id)))
    }

    /// Approximate number of live sessions
    pub fn len(&self) -> u64 {
        self.sessions.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
