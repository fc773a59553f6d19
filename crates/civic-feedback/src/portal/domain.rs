use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{SubmissionCategory, SubmissionStatus};

/// Opaque store-assigned submission identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl SubmissionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Reference to an identity owned by the external identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Persisted citizen feedback row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub title: String,
    pub description: String,
    pub category: SubmissionCategory,
    pub status: SubmissionStatus,
    pub is_anonymous: bool,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Submission {
    /// Submitter identity, suppressed for anonymous rows.
    pub fn visible_user_id(&self) -> Option<&UserId> {
        if self.is_anonymous {
            None
        } else {
            self.user_id.as_ref()
        }
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        self.user_id.as_ref() == Some(user)
    }
}

/// Administrator note attached to a single submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminResponse {
    pub submission_id: SubmissionId,
    pub response_text: String,
    pub admin_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A submission joined with its response history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub submission: Submission,
    pub responses: Vec<AdminResponse>,
}

/// Validated insert payload; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubmission {
    pub title: String,
    pub description: String,
    pub category: SubmissionCategory,
    pub status: SubmissionStatus,
    pub is_anonymous: bool,
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdminResponse {
    pub submission_id: SubmissionId,
    pub response_text: String,
    pub admin_id: UserId,
}

/// Raw citizen-entered fields as they arrive from the form. Absent keys
/// deserialize empty so the intake guard reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Which button the citizen pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeAction {
    Submit,
    SaveDraft,
}

impl IntakeAction {
    pub const fn initial_status(self) -> SubmissionStatus {
        match self {
            IntakeAction::Submit => SubmissionStatus::Pending,
            IntakeAction::SaveDraft => SubmissionStatus::Draft,
        }
    }
}

/// Operator decision from the triage dialog. `status` is parsed server side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageDecision {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub response_text: Option<String>,
}

impl TriageDecision {
    /// Response text worth persisting, if any.
    pub fn response(&self) -> Option<&str> {
        self.response_text
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}
