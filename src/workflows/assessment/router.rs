use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{Actor, IntakeSubmission, Pattern, Region, ReviewerId, ShareToken};
use super::lifecycle::{LifecycleError, LifecycleEvent};
use super::narrative::ResultEdits;
use super::repository::{AssessmentRecord, AssessmentRepository, NoticePublisher, RepositoryError};
use super::scoring::{PointAdjustment, PointAssignment};
use super::service::{AssessmentService, AssessmentServiceError};
use super::views::{AssessmentView, DisplayPolicy, MatrixView, ResultView};

/// Shared router state: the service facade plus the presentation policy
/// applied when rendering narrative views.
pub struct AssessmentRouterState<R, N> {
    service: Arc<AssessmentService<R, N>>,
    display: DisplayPolicy,
}

impl<R, N> Clone for AssessmentRouterState<R, N> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            display: self.display,
        }
    }
}

/// Router builder exposing the assessment operation groups over HTTP. All
/// request-scoped routes address the aggregate by its public share token.
pub fn assessment_router<R, N>(
    service: Arc<AssessmentService<R, N>>,
    display: DisplayPolicy,
) -> Router
where
    R: AssessmentRepository + 'static,
    N: NoticePublisher + 'static,
{
    let state = AssessmentRouterState { service, display };

    Router::new()
        .route("/api/v1/assessments", post(intake_handler::<R, N>))
        .route("/api/v1/assessments/:token", get(view_handler::<R, N>))
        .route(
            "/api/v1/assessments/:token/events",
            post(event_handler::<R, N>),
        )
        .route(
            "/api/v1/assessments/:token/matrix",
            post(open_matrix_handler::<R, N>),
        )
        .route(
            "/api/v1/assessments/:token/matrix/points",
            put(set_point_handler::<R, N>),
        )
        .route(
            "/api/v1/assessments/:token/matrix/recompute",
            post(recompute_handler::<R, N>),
        )
        .route(
            "/api/v1/assessments/:token/narrative",
            post(compose_handler::<R, N>),
        )
        .route(
            "/api/v1/assessments/:token/result",
            patch(edit_result_handler::<R, N>),
        )
        .route(
            "/api/v1/assessments/:token/result/visibility",
            patch(visibility_handler::<R, N>),
        )
        .with_state(state)
}

/// Lifecycle event envelope: the event plus the authenticated party
/// attempting it.
#[derive(Debug, Deserialize)]
pub struct EventEnvelope {
    pub event: LifecycleEvent,
    pub actor: Actor,
}

#[derive(Debug, Deserialize)]
pub struct OpenMatrixRequest {
    pub reviewer: String,
    #[serde(default)]
    pub initial: Vec<PointAssignment>,
}

#[derive(Debug, Deserialize)]
pub struct SetPointRequest {
    pub reviewer: String,
    pub pattern: Pattern,
    pub region: Region,
    pub value: u8,
}

#[derive(Debug, Deserialize)]
pub struct ComposeRequest {
    pub reviewer: String,
}

#[derive(Debug, Deserialize)]
pub struct EditResultRequest {
    pub reviewer: String,
    #[serde(flatten)]
    pub edits: ResultEdits,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    pub visible: bool,
    pub actor: Actor,
}

#[derive(Debug, Serialize)]
struct MatrixOpenedView {
    matrix: MatrixView,
    adjustments: Vec<PointAdjustment>,
}

pub(crate) async fn intake_handler<R, N>(
    State(state): State<AssessmentRouterState<R, N>>,
    Json(submission): Json<IntakeSubmission>,
) -> Response
where
    R: AssessmentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match state.service.submit_intake(submission) {
        Ok(record) => {
            let view = AssessmentView::from_record(&record, state.display);
            (StatusCode::ACCEPTED, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn view_handler<R, N>(
    State(state): State<AssessmentRouterState<R, N>>,
    Path(token): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
    N: NoticePublisher + 'static,
{
    match state.service.find_by_token(&ShareToken(token)) {
        Ok(record) => {
            let view = AssessmentView::from_record(&record, state.display);
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn event_handler<R, N>(
    State(state): State<AssessmentRouterState<R, N>>,
    Path(token): Path<String>,
    Json(envelope): Json<EventEnvelope>,
) -> Response
where
    R: AssessmentRepository + 'static,
    N: NoticePublisher + 'static,
{
    let record = match resolve(&state, token) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };

    match state
        .service
        .transition_status(record.request.id, envelope.event, &envelope.actor)
    {
        Ok(updated) => {
            let view = AssessmentView::from_record(&updated, state.display);
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn open_matrix_handler<R, N>(
    State(state): State<AssessmentRouterState<R, N>>,
    Path(token): Path<String>,
    Json(request): Json<OpenMatrixRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
    N: NoticePublisher + 'static,
{
    let record = match resolve(&state, token) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };
    let already_open = record.matrix.is_some();

    match state.service.open_scoring(
        record.request.id,
        ReviewerId(request.reviewer),
        &request.initial,
    ) {
        Ok((matrix, adjustments)) => {
            let status = if already_open {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            let view = MatrixOpenedView {
                matrix: MatrixView::from_record(&matrix),
                adjustments,
            };
            (status, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn set_point_handler<R, N>(
    State(state): State<AssessmentRouterState<R, N>>,
    Path(token): Path<String>,
    Json(request): Json<SetPointRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
    N: NoticePublisher + 'static,
{
    let record = match resolve(&state, token) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };

    match state.service.set_matrix_point(
        record.request.id,
        ReviewerId(request.reviewer),
        request.pattern,
        request.region,
        request.value,
    ) {
        Ok(adjustment) => (StatusCode::OK, Json(adjustment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn recompute_handler<R, N>(
    State(state): State<AssessmentRouterState<R, N>>,
    Path(token): Path<String>,
) -> Response
where
    R: AssessmentRepository + 'static,
    N: NoticePublisher + 'static,
{
    let record = match resolve(&state, token) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };

    match state.service.recompute_matrix(record.request.id) {
        Ok(derived) => {
            let view = super::views::DerivedView::from_derived(&derived);
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn compose_handler<R, N>(
    State(state): State<AssessmentRouterState<R, N>>,
    Path(token): Path<String>,
    Json(request): Json<ComposeRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
    N: NoticePublisher + 'static,
{
    let record = match resolve(&state, token) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };

    match state
        .service
        .compose_narrative(record.request.id, ReviewerId(request.reviewer))
    {
        Ok(result) => {
            let view = ResultView::from_result(&result, state.display);
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn edit_result_handler<R, N>(
    State(state): State<AssessmentRouterState<R, N>>,
    Path(token): Path<String>,
    Json(request): Json<EditResultRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
    N: NoticePublisher + 'static,
{
    let record = match resolve(&state, token) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };

    match state.service.edit_result(
        record.request.id,
        ReviewerId(request.reviewer),
        request.edits,
    ) {
        Ok(result) => {
            let view = ResultView::from_result(&result, state.display);
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn visibility_handler<R, N>(
    State(state): State<AssessmentRouterState<R, N>>,
    Path(token): Path<String>,
    Json(request): Json<VisibilityRequest>,
) -> Response
where
    R: AssessmentRepository + 'static,
    N: NoticePublisher + 'static,
{
    let record = match resolve(&state, token) {
        Ok(record) => record,
        Err(error) => return error_response(error),
    };

    match state
        .service
        .set_result_visibility(record.request.id, request.visible, &request.actor)
    {
        Ok(updated) => {
            let view = AssessmentView::from_record(&updated, state.display);
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn resolve<R, N>(
    state: &AssessmentRouterState<R, N>,
    token: String,
) -> Result<AssessmentRecord, AssessmentServiceError>
where
    R: AssessmentRepository + 'static,
    N: NoticePublisher + 'static,
{
    state.service.find_by_token(&ShareToken(token))
}

/// Deterministic error-to-status mapping for the whole taxonomy. Intake
/// and range validation are the caller's data being wrong (422); illegal
/// transitions are state conflicts (409); missing data dependencies and
/// review gating are failed preconditions (412).
fn error_response(error: AssessmentServiceError) -> Response {
    let status = match &error {
        AssessmentServiceError::Intake(_) | AssessmentServiceError::Scoring(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AssessmentServiceError::Lifecycle(LifecycleError::InvalidTransition { .. }) => {
            StatusCode::CONFLICT
        }
        AssessmentServiceError::Lifecycle(LifecycleError::PreconditionFailed { .. })
        | AssessmentServiceError::Narrative(_)
        | AssessmentServiceError::ReviewNotActive { .. }
        | AssessmentServiceError::ScoringNotOpened
        | AssessmentServiceError::ResultNotComposed => StatusCode::PRECONDITION_FAILED,
        AssessmentServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AssessmentServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AssessmentServiceError::Repository(RepositoryError::Unavailable(_))
        | AssessmentServiceError::Notice(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
