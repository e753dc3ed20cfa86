//! REST API handlers for Shift Scheduling.
//!
//! Thin HTTP adapter over the engine: every handler parses its input, calls
//! one engine operation and maps the result. Editing sessions each own a
//! [`ScheduleView`] so staged edits never leak between operators.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::demo_data;
use crate::domain::{CourseId, DateKey, DateRange, Roster, ShiftAssignment};
use crate::dto::{
    CandidatesQuery, CandidatesResponse, CellUpdateDto, CloseQuery, CommitMode, CommitRequest,
    CommitResponse, DateRangeDto, DiscardResponse, ErrorResponse, GridDto, HealthResponse,
    InfoResponse, RangeQuery, SessionDto, SwitchRangeRequest,
};
use crate::error::{CommitReport, ScheduleError};
use crate::scheduler;
use crate::store::{AssignmentStore, InMemoryAssignmentStore};
use crate::view::ScheduleView;

/// Application state shared across handlers.
pub struct AppState {
    config: AppConfig,
    roster: Roster,
    store: Arc<dyn AssignmentStore>,
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
}

/// One operator's editing session. The view is `None` once closed or expired.
struct Session {
    view: Mutex<Option<ScheduleView>>,
    last_used: Mutex<Instant>,
}

impl Session {
    fn new(view: ScheduleView) -> Self {
        Self {
            view: Mutex::new(Some(view)),
            last_used: Mutex::new(Instant::now()),
        }
    }

    /// Locks the view, failing if the session was closed while waiting.
    fn lock(&self, id: Uuid) -> Result<MappedMutexGuard<'_, ScheduleView>, ApiError> {
        MutexGuard::try_map(self.view.lock(), Option::as_mut)
            .map_err(|_| ApiError::SessionNotFound(id))
    }
}

impl AppState {
    /// State backed by the configured demo roster and an in-memory store.
    pub fn new(config: AppConfig) -> Self {
        let roster = demo_data::generate(config.demo_data);
        Self::with_roster(config, roster, Arc::new(InMemoryAssignmentStore::new()))
    }

    pub fn with_roster(config: AppConfig, roster: Roster, store: Arc<dyn AssignmentStore>) -> Self {
        Self {
            config,
            roster,
            store,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn session(&self, id: Uuid) -> Result<Arc<Session>, ApiError> {
        let session = self
            .sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(ApiError::SessionNotFound(id))?;
        *session.last_used.lock() = Instant::now();
        Ok(session)
    }

    /// Drops sessions idle for at least `config.session_idle`.
    ///
    /// Lock order is map, then session; no handler takes the map while
    /// holding a session.
    fn expire_idle_sessions(&self) {
        let idle = self.config.session_idle;
        self.sessions.write().retain(|id, session| {
            if session.last_used.lock().elapsed() < idle {
                return true;
            }
            if let Some(view) = session.view.lock().take() {
                let pending = view.staging().pending_count();
                if pending > 0 {
                    warn!(session = %id, pending, "Expired idle session with staged edits");
                } else {
                    info!(session = %id, "Expired idle session");
                }
            }
            false
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Handler error mapped onto an HTTP status and a JSON body.
#[derive(Debug)]
pub enum ApiError {
    Schedule(ScheduleError),
    SessionNotFound(Uuid),
}

impl From<ScheduleError> for ApiError {
    fn from(e: ScheduleError) -> Self {
        ApiError::Schedule(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "sessionNotFound"),
            ApiError::Schedule(e) if e.is_input_error() => (StatusCode::BAD_REQUEST, "invalidInput"),
            ApiError::Schedule(ScheduleError::UnknownCourse(_)) => (StatusCode::NOT_FOUND, "unknownCourse"),
            ApiError::Schedule(ScheduleError::UnknownDriver(_)) => (StatusCode::NOT_FOUND, "unknownDriver"),
            ApiError::Schedule(ScheduleError::DriverNotSelectable { .. }) => {
                (StatusCode::CONFLICT, "driverNotSelectable")
            }
            ApiError::Schedule(ScheduleError::UnsavedEdits { .. }) => (StatusCode::CONFLICT, "unsavedEdits"),
            ApiError::Schedule(ScheduleError::Persistence(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "persistence")
            }
            ApiError::Schedule(_) => (StatusCode::BAD_REQUEST, "invalidInput"),
        };
        let message = match &self {
            ApiError::Schedule(e) => e.to_string(),
            ApiError::SessionNotFound(id) => format!("No editing session {}", id),
        };
        (status, Json(ErrorResponse { kind, message })).into_response()
    }
}

// ============================================================================
// Router and Handlers
// ============================================================================

/// Creates the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health & Info
        .route("/health", get(health))
        .route("/info", get(info))
        // Inputs
        .route("/demo-data", get(list_demo_data))
        .route("/roster", get(get_roster))
        // Committed assignments
        .route("/assignments", get(get_assignments).put(put_assignment))
        .route("/assignments/generate", post(generate_draft))
        // Editing sessions
        .route("/sessions", post(open_session))
        .route("/sessions/{id}", get(get_session).delete(close_session))
        .route("/sessions/{id}/candidates", get(get_candidates))
        .route("/sessions/{id}/cells", put(stage_cell))
        .route("/sessions/{id}/commit", post(commit_session))
        .route("/sessions/{id}/discard", post(discard_session))
        .route("/sessions/{id}/range", put(switch_range))
        .with_state(state)
}

/// GET /health - Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// GET /info - Application info endpoint.
async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Shift Scheduling",
        version: env!("CARGO_PKG_VERSION"),
        demo_data: state.config.demo_data.as_str(),
    })
}

/// GET /demo-data - List available demo data sets.
async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(demo_data::list_demo_data())
}

/// GET /roster - Courses, drivers and day-off requests in use.
async fn get_roster(State(state): State<Arc<AppState>>) -> Json<Roster> {
    Json(state.roster.clone())
}

/// GET /assignments?start=&end= - Committed grid for a range.
async fn get_assignments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<GridDto>, ApiError> {
    let range = query.to_range(state.config.max_range_days)?;
    let cells = scheduler::load_assignments(state.store.as_ref(), &state.roster, range)?;
    Ok(Json(GridDto::from_cells(range, cells)))
}

/// POST /assignments/generate - Regenerate a range, overwriting it.
async fn generate_draft(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DateRangeDto>,
) -> Result<Json<GridDto>, ApiError> {
    let range = body.to_range(state.config.max_range_days)?;
    let grid = scheduler::generate_draft(state.store.as_ref(), &state.roster, range)?;
    Ok(Json(GridDto::from_draft(grid)))
}

/// PUT /assignments - Write a single cell.
async fn put_assignment(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CellUpdateDto>,
) -> Result<Json<ShiftAssignment>, ApiError> {
    let assignment = body.to_assignment()?;
    scheduler::set_assignment(state.store.as_ref(), &state.roster, assignment.clone())?;
    Ok(Json(assignment))
}

/// POST /sessions - Open an editing session over a range.
async fn open_session(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DateRangeDto>,
) -> Result<(StatusCode, Json<SessionDto>), ApiError> {
    let range = body.to_range(state.config.max_range_days)?;
    let view = ScheduleView::load(&state.roster, state.store.as_ref(), range)?;
    let id = Uuid::new_v4();
    let dto = SessionDto::from_view(id, &view);

    state.expire_idle_sessions();
    state
        .sessions
        .write()
        .insert(id, Arc::new(Session::new(view)));
    info!(session = %id, %range, "Opened editing session");

    Ok((StatusCode::CREATED, Json(dto)))
}

/// GET /sessions/{id} - Current values and staging state.
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionDto>, ApiError> {
    let session = state.session(id)?;
    let view = session.lock(id)?;
    Ok(Json(SessionDto::from_view(id, &view)))
}

/// GET /sessions/{id}/candidates?date=&courseId= - Selectable drivers for a cell.
async fn get_candidates(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<CandidatesQuery>,
) -> Result<Json<CandidatesResponse>, ApiError> {
    let date: DateKey = query.date.parse()?;
    let course = CourseId::new(query.course_id);
    let session = state.session(id)?;
    let view = session.lock(id)?;

    let drivers = view.candidates(date, &course)?;
    Ok(Json(CandidatesResponse {
        current: view.staging().current_value(date, &course).cloned(),
        date,
        course_id: course,
        drivers,
    }))
}

/// PUT /sessions/{id}/cells - Stage an edit.
async fn stage_cell(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<CellUpdateDto>,
) -> Result<Json<SessionDto>, ApiError> {
    let edit = body.to_assignment()?;
    let session = state.session(id)?;
    let mut view = session.lock(id)?;

    view.select_driver(edit.date, &edit.course_id, edit.driver_id)?;
    Ok(Json(SessionDto::from_view(id, &view)))
}

/// POST /sessions/{id}/commit?mode=batch|perCell - Persist staged edits.
async fn commit_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(request): Query<CommitRequest>,
) -> Result<Json<CommitResponse>, ApiError> {
    let session = state.session(id)?;
    let mut view = session.lock(id)?;

    let report = match request.mode {
        CommitMode::Batch => {
            let cells: Vec<_> = view.staging().pending_edits().map(|e| e.key()).collect();
            view.commit(state.store.as_ref())?;
            CommitReport {
                committed: cells,
                failed: Vec::new(),
            }
        }
        CommitMode::PerCell => view.commit_each(state.store.as_ref()),
    };

    info!(
        session = %id,
        committed = report.committed.len(),
        failed = report.failed.len(),
        "Commit finished"
    );
    Ok(Json(CommitResponse::from_report(report, view.staging().state())))
}

/// POST /sessions/{id}/discard - Drop staged edits.
async fn discard_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DiscardResponse>, ApiError> {
    let session = state.session(id)?;
    let mut view = session.lock(id)?;

    let discarded = view.discard();
    Ok(Json(DiscardResponse {
        discarded,
        state: view.staging().state(),
    }))
}

/// PUT /sessions/{id}/range - Move the session to another range.
///
/// Refused with 409 while edits are staged unless `discardPending` is set.
async fn switch_range(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<SwitchRangeRequest>,
) -> Result<Json<SessionDto>, ApiError> {
    let range = DateRange::parse(&body.start_date, &body.end_date)?;
    range.ensure_max_days(state.config.max_range_days)?;
    let session = state.session(id)?;
    let mut view = session.lock(id)?;

    view.switch_range(range, &state.roster, state.store.as_ref(), body.discard_pending)?;
    Ok(Json(SessionDto::from_view(id, &view)))
}

/// DELETE /sessions/{id}?force=true - Close a session.
///
/// Refused with 409 while edits are staged unless `force` is set.
async fn close_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<CloseQuery>,
) -> Result<StatusCode, ApiError> {
    let mut sessions = state.sessions.write();
    let session = sessions
        .get(&id)
        .cloned()
        .ok_or(ApiError::SessionNotFound(id))?;

    // Check and close under one view lock so no edit is staged in between
    let mut view = session.view.lock();
    if let Some(open) = view.as_ref() {
        open.ensure_can_leave(query.force)?;
    }
    *view = None;
    sessions.remove(&id);
    info!(session = %id, "Closed editing session");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Course, DateKey, Driver};

    fn state() -> Arc<AppState> {
        let roster = Roster::new(
            vec![Course::new("c1", "North Loop", 10)],
            vec![Driver::new("d1", "Amy").with_courses(["c1"])],
            vec![],
        );
        Arc::new(AppState::with_roster(
            AppConfig::default(),
            roster,
            Arc::new(InMemoryAssignmentStore::new()),
        ))
    }

    fn open(state: &AppState) -> Uuid {
        let day = DateKey::from_ymd(2025, 6, 2).unwrap();
        let view = ScheduleView::load(&state.roster, state.store.as_ref(), DateRange::single(day)).unwrap();
        let id = Uuid::new_v4();
        state.sessions.write().insert(id, Arc::new(Session::new(view)));
        id
    }

    #[tokio::test]
    async fn test_closed_session_rejects_late_handles() {
        let state = state();
        let id = open(&state);
        let held = state.session(id).unwrap();

        let status = close_session(State(state.clone()), Path(id), Query(CloseQuery::default()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        // A request that looked the session up before the close cannot stage into it
        assert!(matches!(held.lock(id), Err(ApiError::SessionNotFound(_))));
        assert!(state.session(id).is_err());
    }

    #[tokio::test]
    async fn test_close_with_staged_edit_keeps_session() {
        let state = state();
        let id = open(&state);
        let day = DateKey::from_ymd(2025, 6, 2).unwrap();
        state
            .session(id)
            .unwrap()
            .lock(id)
            .unwrap()
            .select_driver(day, &CourseId::new("c1"), None)
            .unwrap();

        let result = close_session(State(state.clone()), Path(id), Query(CloseQuery::default())).await;
        assert!(matches!(
            result,
            Err(ApiError::Schedule(ScheduleError::UnsavedEdits { pending: 1 }))
        ));

        let session = state.session(id).unwrap();
        assert_eq!(session.lock(id).unwrap().staging().pending_count(), 1);
    }
}
