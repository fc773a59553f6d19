//! Read-side projections. None of them carry the submitter identity of an
//! anonymous submission, and the public tracking view carries no identities at all.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{AdminResponse, Submission, SubmissionId, SubmissionRecord, UserId};
use super::status::{StatusBadge, SubmissionCategory, SubmissionStatus};

/// Dashboard card for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionCard {
    pub id: SubmissionId,
    pub title: String,
    pub description: String,
    pub category: SubmissionCategory,
    pub category_label: &'static str,
    pub status: SubmissionStatus,
    pub badge: StatusBadge,
    pub is_anonymous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl From<&Submission> for SubmissionCard {
    fn from(submission: &Submission) -> Self {
        Self {
            id: submission.id.clone(),
            title: submission.title.clone(),
            description: submission.description.clone(),
            category: submission.category,
            category_label: submission.category.label(),
            status: submission.status,
            badge: submission.status.badge(),
            is_anonymous: submission.is_anonymous,
            user_id: submission.visible_user_id().cloned(),
            created_at: submission.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseView {
    pub response_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<&AdminResponse> for ResponseView {
    fn from(response: &AdminResponse) -> Self {
        Self {
            response_text: response.response_text.clone(),
            created_at: response.created_at,
        }
    }
}

/// Public tracking page payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackingView {
    pub id: SubmissionId,
    pub title: String,
    pub description: String,
    pub category: SubmissionCategory,
    pub category_label: &'static str,
    pub status: SubmissionStatus,
    pub badge: StatusBadge,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub responses: Vec<ResponseView>,
}

impl TrackingView {
    pub fn from_record(record: &SubmissionRecord) -> Self {
        let submission = &record.submission;
        let mut responses: Vec<&AdminResponse> = record.responses.iter().collect();
        responses.sort_by_key(|response| response.created_at);

        Self {
            id: submission.id.clone(),
            title: submission.title.clone(),
            description: submission.description.clone(),
            category: submission.category,
            category_label: submission.category.label(),
            status: submission.status,
            badge: submission.status.badge(),
            is_anonymous: submission.is_anonymous,
            created_at: submission.created_at,
            responses: responses.into_iter().map(ResponseView::from).collect(),
        }
    }
}

/// Headline counters on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TriageStats {
    pub total: usize,
    pub draft: usize,
    pub pending: usize,
    pub under_review: usize,
    pub addressed: usize,
    pub rejected: usize,
}

impl TriageStats {
    pub fn tally<'a, I>(submissions: I) -> Self
    where
        I: IntoIterator<Item = &'a Submission>,
    {
        let mut stats = Self::default();
        for submission in submissions {
            stats.total += 1;
            match submission.status {
                SubmissionStatus::Draft => stats.draft += 1,
                SubmissionStatus::Pending => stats.pending += 1,
                SubmissionStatus::UnderReview => stats.under_review += 1,
                SubmissionStatus::Addressed => stats.addressed += 1,
                SubmissionStatus::Rejected => stats.rejected += 1,
            }
        }
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusGroup {
    pub status: SubmissionStatus,
    pub badge: StatusBadge,
    pub submissions: Vec<SubmissionCard>,
}

/// Submissions partitioned by lifecycle state, each group newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageBoard {
    pub stats: TriageStats,
    pub groups: Vec<StatusGroup>,
}

impl TriageBoard {
    /// Expects `submissions` already ordered newest first.
    pub fn partition(submissions: &[Submission]) -> Self {
        let groups = SubmissionStatus::ALL
            .into_iter()
            .map(|status| StatusGroup {
                status,
                badge: status.badge(),
                submissions: submissions
                    .iter()
                    .filter(|submission| submission.status == status)
                    .map(SubmissionCard::from)
                    .collect(),
            })
            .collect();

        Self {
            stats: TriageStats::tally(submissions),
            groups,
        }
    }

    pub fn group(&self, status: SubmissionStatus) -> Option<&StatusGroup> {
        self.groups.iter().find(|group| group.status == status)
    }
}

/// Outcome of an administrator decision, returned to refresh the dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriageOutcomeView {
    pub submission: SubmissionCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseView>,
}
