//! Citizen feedback lifecycle: intake, public tracking, and administrator triage.
//!
//! Durable state and identity live behind the [`SubmissionStore`] and
//! [`IdentityDirectory`] traits; [`FeedbackService`] is the only entry point the
//! HTTP layer talks to.

pub mod domain;
pub mod intake;
pub mod router;
pub mod service;
pub mod session;
pub mod status;
pub mod store;
pub mod views;

#[cfg(test)]
mod tests;

pub use domain::{
    AdminResponse, IntakeAction, IntakeForm, NewAdminResponse, NewSubmission, Submission,
    SubmissionId, SubmissionRecord, TriageDecision, UserId,
};
pub use intake::{IntakeGuard, IntakeLimits, ValidationError};
pub use router::portal_router;
pub use service::{FeedbackService, FeedbackServiceError, TrackingOutcome, TransitionError};
pub use session::{
    AdminContext, AuthEvent, AuthorizationDenied, DirectoryError, Identity, IdentityDirectory,
    SessionContext, SessionToken,
};
pub use status::{Actor, StatusBadge, SubmissionCategory, SubmissionStatus};
pub use store::{
    ListQuery, StoreError, SubmissionStore, TriageReceipt, TriageWrite, TriageWriteError,
};
pub use views::{
    ResponseView, StatusGroup, SubmissionCard, TrackingView, TriageBoard, TriageOutcomeView,
    TriageStats,
};
