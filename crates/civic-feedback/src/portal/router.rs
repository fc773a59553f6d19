use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{IntakeAction, IntakeForm, Submission, SubmissionId, TriageDecision};
use super::intake::ValidationError;
use super::service::{FeedbackService, FeedbackServiceError, TrackingOutcome, TransitionError};
use super::session::{
    AdminContext, AuthorizationDenied, IdentityDirectory, SessionContext, SessionToken,
};
use super::status::{StatusBadge, SubmissionStatus};
use super::store::{ListQuery, SubmissionStore};
use super::views::{SubmissionCard, TrackingView, TriageBoard, TriageOutcomeView};

pub(crate) const SUBMITTED_NOTICE: &str = "Your feedback has been submitted successfully!";
pub(crate) const NOT_FOUND_NOTICE: &str =
    "Submission not found. Please check the ID and try again.";

/// Router builder exposing intake, tracking, and triage endpoints.
pub fn portal_router<S, D>(service: Arc<FeedbackService<S, D>>) -> Router
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    Router::new()
        .route("/api/v1/submissions", post(submit_handler::<S, D>))
        .route("/api/v1/submissions/drafts", post(draft_handler::<S, D>))
        .route(
            "/api/v1/submissions/:submission_id",
            get(track_handler::<S, D>),
        )
        .route(
            "/api/v1/submissions/:submission_id/submit",
            post(promote_handler::<S, D>),
        )
        .route(
            "/api/v1/admin/submissions",
            get(admin_list_handler::<S, D>),
        )
        .route("/api/v1/admin/dashboard", get(dashboard_handler::<S, D>))
        .route(
            "/api/v1/admin/submissions/:submission_id/status",
            post(update_status_handler::<S, D>),
        )
        .route("/api/v1/session/sign-out", post(sign_out_handler::<S, D>))
        .with_state(service)
}

/// Acknowledgement returned after intake or draft promotion.
#[derive(Debug, Serialize)]
pub(crate) struct SubmissionReceipt {
    pub(crate) id: SubmissionId,
    pub(crate) status: SubmissionStatus,
    pub(crate) badge: StatusBadge,
    pub(crate) notice: &'static str,
}

impl SubmissionReceipt {
    fn new(submission: &Submission, notice: &'static str) -> Self {
        Self {
            id: submission.id.clone(),
            status: submission.status,
            badge: submission.status.badge(),
            notice,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TrackingPayload {
    pub(crate) found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) submission: Option<TrackingView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) notice: Option<&'static str>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) offset: Option<usize>,
    #[serde(default)]
    pub(crate) limit: Option<usize>,
}

impl ListParams {
    fn into_query(self) -> Result<ListQuery, ValidationError> {
        let status = self
            .status
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| raw.parse::<SubmissionStatus>())
            .transpose()?;

        Ok(ListQuery {
            status,
            offset: self.offset.unwrap_or(0),
            limit: self.limit,
        })
    }
}

/// Body parse failures become validation errors so they share the JSON error shape.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, FeedbackServiceError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ValidationError::MalformedBody(rejection.body_text()).into())
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(SessionToken::from_bearer)
}

async fn session_for<S, D>(
    service: &FeedbackService<S, D>,
    headers: &HeaderMap,
) -> Result<SessionContext, FeedbackServiceError>
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    service.resolve_session(bearer_token(headers)).await
}

async fn admin_session<S, D>(
    service: &FeedbackService<S, D>,
    headers: &HeaderMap,
) -> Result<AdminContext, FeedbackServiceError>
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    let session = session_for(service, headers).await?;
    service.authorize_admin(&session).await
}

async fn list_as_admin<S, D>(
    service: &FeedbackService<S, D>,
    headers: &HeaderMap,
    params: ListParams,
) -> Result<Vec<SubmissionCard>, FeedbackServiceError>
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    let admin = admin_session(service, headers).await?;
    let query = params.into_query()?;
    service.list_submissions(&admin, query).await
}

async fn board_as_admin<S, D>(
    service: &FeedbackService<S, D>,
    headers: &HeaderMap,
) -> Result<TriageBoard, FeedbackServiceError>
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    let admin = admin_session(service, headers).await?;
    service.triage_board(&admin).await
}

async fn triage_as_admin<S, D>(
    service: &FeedbackService<S, D>,
    headers: &HeaderMap,
    submission_id: &str,
    decision: Result<Json<TriageDecision>, JsonRejection>,
) -> Result<TriageOutcomeView, FeedbackServiceError>
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    let admin = admin_session(service, headers).await?;
    let decision = json_body(decision)?;
    service.update_status(&admin, submission_id, decision).await
}

async fn intake<S, D>(
    service: &FeedbackService<S, D>,
    headers: &HeaderMap,
    form: IntakeForm,
    action: IntakeAction,
) -> Response
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    let result = match session_for(service, headers).await {
        Ok(session) => service.submit(&session, form, action).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(submission) => {
            let notice = match action {
                IntakeAction::Submit => SUBMITTED_NOTICE,
                IntakeAction::SaveDraft => "Your draft has been saved.",
            };
            let receipt = SubmissionReceipt::new(&submission, notice);
            (StatusCode::CREATED, Json(receipt)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn submit_handler<S, D>(
    State(service): State<Arc<FeedbackService<S, D>>>,
    headers: HeaderMap,
    form: Result<Json<IntakeForm>, JsonRejection>,
) -> Response
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    match json_body(form) {
        Ok(form) => intake(&service, &headers, form, IntakeAction::Submit).await,
        Err(err) => error_response(err),
    }
}

pub(crate) async fn draft_handler<S, D>(
    State(service): State<Arc<FeedbackService<S, D>>>,
    headers: HeaderMap,
    form: Result<Json<IntakeForm>, JsonRejection>,
) -> Response
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    match json_body(form) {
        Ok(form) => intake(&service, &headers, form, IntakeAction::SaveDraft).await,
        Err(err) => error_response(err),
    }
}

pub(crate) async fn promote_handler<S, D>(
    State(service): State<Arc<FeedbackService<S, D>>>,
    headers: HeaderMap,
    Path(submission_id): Path<String>,
) -> Response
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    let result = match session_for(&service, &headers).await {
        Ok(session) => service.promote_draft(&session, &submission_id).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(submission) => {
            let receipt = SubmissionReceipt::new(&submission, SUBMITTED_NOTICE);
            (StatusCode::OK, Json(receipt)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn track_handler<S, D>(
    State(service): State<Arc<FeedbackService<S, D>>>,
    Path(submission_id): Path<String>,
) -> Response
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    match service.track(&submission_id).await {
        Ok(TrackingOutcome::Found(view)) => {
            let payload = TrackingPayload {
                found: true,
                submission: Some(view),
                notice: None,
            };
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(TrackingOutcome::NotFound) => {
            let payload = TrackingPayload {
                found: false,
                submission: None,
                notice: Some(NOT_FOUND_NOTICE),
            };
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn admin_list_handler<S, D>(
    State(service): State<Arc<FeedbackService<S, D>>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    match list_as_admin(&service, &headers, params).await {
        Ok(cards) => (StatusCode::OK, Json(json!({ "submissions": cards }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn dashboard_handler<S, D>(
    State(service): State<Arc<FeedbackService<S, D>>>,
    headers: HeaderMap,
) -> Response
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    match board_as_admin(&service, &headers).await {
        Ok(board) => (StatusCode::OK, Json(board)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_status_handler<S, D>(
    State(service): State<Arc<FeedbackService<S, D>>>,
    headers: HeaderMap,
    Path(submission_id): Path<String>,
    decision: Result<Json<TriageDecision>, JsonRejection>,
) -> Response
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    match triage_as_admin(&service, &headers, &submission_id, decision).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn sign_out_handler<S, D>(
    State(service): State<Arc<FeedbackService<S, D>>>,
    headers: HeaderMap,
) -> Response
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    let result = match session_for(&service, &headers).await {
        Ok(session) => service.sign_out(&session).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) fn error_response(err: FeedbackServiceError) -> Response {
    match err {
        FeedbackServiceError::Validation(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        FeedbackServiceError::Denied(denied) => {
            let status = match denied {
                AuthorizationDenied::NoSession => StatusCode::UNAUTHORIZED,
                AuthorizationDenied::NotAdministrator => StatusCode::FORBIDDEN,
            };
            let payload = json!({
                "error": denied.to_string(),
                "notice": denied.notice(),
                "redirect_to": denied.redirect_to(),
            });
            (
                status,
                [(header::LOCATION, denied.redirect_to())],
                Json(payload),
            )
                .into_response()
        }
        FeedbackServiceError::Transition(TransitionError::NotOwner) => {
            let payload = json!({ "error": TransitionError::NotOwner.to_string() });
            (StatusCode::FORBIDDEN, Json(payload)).into_response()
        }
        FeedbackServiceError::Transition(error) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        error @ FeedbackServiceError::UnknownSubmission(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        other => {
            let payload = json!({
                "error": other.to_string(),
                "retryable": other.is_retryable(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response()
        }
    }
}
