use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    IntakeAction, IntakeForm, NewAdminResponse, Submission, SubmissionId, TriageDecision,
};
use super::intake::{IntakeGuard, IntakeLimits, ValidationError};
use super::session::{
    AdminContext, AuthorizationDenied, DirectoryError, IdentityDirectory, SessionContext,
    SessionToken,
};
use super::status::{Actor, SubmissionStatus};
use super::store::{ListQuery, StoreError, SubmissionStore, TriageWrite, TriageWriteError};
use super::views::{ResponseView, SubmissionCard, TrackingView, TriageBoard, TriageOutcomeView};

/// Portal facade composing the intake guard, the store, and the identity directory.
pub struct FeedbackService<S, D> {
    guard: IntakeGuard,
    store: Arc<S>,
    directory: Arc<D>,
}

/// Result of a tracking lookup. A miss is a normal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackingOutcome {
    Found(TrackingView),
    NotFound,
}

impl<S, D> FeedbackService<S, D>
where
    S: SubmissionStore + 'static,
    D: IdentityDirectory + 'static,
{
    pub fn new(store: Arc<S>, directory: Arc<D>) -> Self {
        Self::with_guard(IntakeGuard::default(), store, directory)
    }

    /// Service whose intake guard enforces `limits` instead of the defaults.
    pub fn with_intake_limits(store: Arc<S>, directory: Arc<D>, limits: IntakeLimits) -> Self {
        Self::with_guard(IntakeGuard::with_limits(limits), store, directory)
    }

    fn with_guard(guard: IntakeGuard, store: Arc<S>, directory: Arc<D>) -> Self {
        Self {
            guard,
            store,
            directory,
        }
    }

    /// Build the explicit session context for one request. Unknown or expired
    /// tokens yield a context without identity.
    pub async fn resolve_session(
        &self,
        token: Option<SessionToken>,
    ) -> Result<SessionContext, FeedbackServiceError> {
        let Some(token) = token else {
            return Ok(SessionContext::anonymous());
        };

        let identity = self.directory.current_session(&token).await?;
        Ok(SessionContext {
            token: Some(token),
            identity,
        })
    }

    pub async fn sign_out(&self, session: &SessionContext) -> Result<(), FeedbackServiceError> {
        let token = match (&session.token, &session.identity) {
            (Some(token), Some(_)) => token,
            _ => return Err(AuthorizationDenied::NoSession.into()),
        };
        self.directory.sign_out(token).await?;
        Ok(())
    }

    /// Validate and persist a new submission as `pending` or `draft`.
    pub async fn submit(
        &self,
        session: &SessionContext,
        form: IntakeForm,
        action: IntakeAction,
    ) -> Result<Submission, FeedbackServiceError> {
        let user_id = session.user_id().cloned();
        let submission = self.guard.validate(form, action, user_id)?;

        let stored = self
            .store
            .insert_submission(submission)
            .await
            .inspect_err(|err| warn!(error = %err, "submission insert failed"))?;

        match stored.visible_user_id() {
            Some(user_id) => info!(
                submission_id = %stored.id.as_str(),
                status = %stored.status,
                user_id = %user_id.as_str(),
                "submission received"
            ),
            None => info!(
                submission_id = %stored.id.as_str(),
                status = %stored.status,
                anonymous = stored.is_anonymous,
                "submission received"
            ),
        }

        Ok(stored)
    }

    /// Move the caller's own draft to `pending`.
    pub async fn promote_draft(
        &self,
        session: &SessionContext,
        raw_id: &str,
    ) -> Result<Submission, FeedbackServiceError> {
        let id = parse_id(raw_id)?;
        let user_id = session.user_id().ok_or(AuthorizationDenied::NoSession)?;

        let mut submission = self
            .store
            .get_submission_by_id(&id)
            .await?
            .ok_or_else(|| FeedbackServiceError::UnknownSubmission(id.clone()))?
            .submission;

        if !submission.is_owned_by(user_id) {
            return Err(TransitionError::NotOwner.into());
        }

        let next = SubmissionStatus::Pending;
        if !submission.status.can_transition_to(next, Actor::Citizen) {
            return Err(TransitionError::Illegal {
                from: submission.status,
                to: next,
            }
            .into());
        }

        self.store.update_submission_status(&id, next).await?;
        info!(submission_id = %id.as_str(), "draft submitted for review");

        submission.status = next;
        Ok(submission)
    }

    /// Public lookup by exact identifier. No authorization: the id is the capability.
    pub async fn track(&self, raw_id: &str) -> Result<TrackingOutcome, FeedbackServiceError> {
        let id = parse_id(raw_id)?;

        let record = self
            .store
            .get_submission_by_id(&id)
            .await
            .inspect_err(|err| warn!(error = %err, "tracking lookup failed"))?;

        Ok(match record {
            Some(record) => TrackingOutcome::Found(TrackingView::from_record(&record)),
            None => TrackingOutcome::NotFound,
        })
    }

    /// Gate every dashboard request. The role is looked up each time.
    pub async fn authorize_admin(
        &self,
        session: &SessionContext,
    ) -> Result<AdminContext, FeedbackServiceError> {
        let Some(identity) = session.identity.clone() else {
            return Err(AuthorizationDenied::NoSession.into());
        };

        if !self.directory.is_administrator(&identity).await? {
            warn!(user_id = %identity.user_id.as_str(), "admin dashboard access denied");
            return Err(AuthorizationDenied::NotAdministrator.into());
        }

        Ok(AdminContext { admin: identity })
    }

    pub async fn list_submissions(
        &self,
        _admin: &AdminContext,
        query: ListQuery,
    ) -> Result<Vec<SubmissionCard>, FeedbackServiceError> {
        let submissions = self.store.list_submissions(query).await?;
        Ok(submissions.iter().map(SubmissionCard::from).collect())
    }

    pub async fn triage_board(
        &self,
        _admin: &AdminContext,
    ) -> Result<TriageBoard, FeedbackServiceError> {
        let submissions = self.store.list_submissions(ListQuery::default()).await?;
        Ok(TriageBoard::partition(&submissions))
    }

    /// Apply an operator decision: change the status and optionally attach a response.
    ///
    /// Keeping the current status is accepted as a respond-only update except
    /// for drafts, which administrators do not act on. A decision that keeps
    /// the status and carries no response is rejected as a no-op. No version check is made,
    /// so concurrent decisions resolve as last write wins.
    pub async fn update_status(
        &self,
        admin: &AdminContext,
        raw_id: &str,
        decision: TriageDecision,
    ) -> Result<TriageOutcomeView, FeedbackServiceError> {
        let id = parse_id(raw_id)?;
        let next: SubmissionStatus = decision.status.parse().map_err(ValidationError::from)?;

        let mut submission = self
            .store
            .get_submission_by_id(&id)
            .await?
            .ok_or_else(|| FeedbackServiceError::UnknownSubmission(id.clone()))?
            .submission;

        let current = submission.status;
        if current == next && current != SubmissionStatus::Draft && decision.response().is_none() {
            return Err(ValidationError::NothingToUpdate.into());
        }
        let allowed = if current == next {
            current != SubmissionStatus::Draft
        } else {
            current.can_transition_to(next, Actor::Administrator)
        };
        if !allowed {
            return Err(TransitionError::Illegal {
                from: current,
                to: next,
            }
            .into());
        }

        let write = TriageWrite {
            submission_id: id.clone(),
            status: next,
            response: decision.response().map(|text| NewAdminResponse {
                submission_id: id.clone(),
                response_text: text.to_string(),
                admin_id: admin.admin.user_id.clone(),
            }),
        };

        let receipt = self.store.apply_triage(write).await.inspect_err(|err| {
            warn!(submission_id = %id.as_str(), error = %err, "triage write failed")
        })?;

        info!(
            submission_id = %id.as_str(),
            from = %current,
            to = %receipt.status,
            admin_id = %admin.admin.user_id.as_str(),
            responded = receipt.response.is_some(),
            "submission triaged"
        );

        submission.status = receipt.status;
        Ok(TriageOutcomeView {
            submission: SubmissionCard::from(&submission),
            response: receipt.response.as_ref().map(ResponseView::from),
        })
    }
}

fn parse_id(raw: &str) -> Result<SubmissionId, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingSubmissionId)
    } else {
        Ok(SubmissionId(trimmed.to_string()))
    }
}

/// Lifecycle rule violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot move a submission from {from} to {to}")]
    Illegal {
        from: SubmissionStatus,
        to: SubmissionStatus,
    },
    #[error("only the submitting citizen may submit this draft")]
    NotOwner,
}

/// Error raised by the portal service.
#[derive(Debug, thiserror::Error)]
pub enum FeedbackServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Denied(#[from] AuthorizationDenied),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("submission {} not found", .0.as_str())]
    UnknownSubmission(SubmissionId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Triage(#[from] TriageWriteError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

impl FeedbackServiceError {
    /// Failures of a collaborator that the citizen or operator may simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FeedbackServiceError::Store(_)
                | FeedbackServiceError::Triage(_)
                | FeedbackServiceError::Directory(_)
        )
    }
}
