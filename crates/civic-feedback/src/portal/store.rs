use super::domain::{
    AdminResponse, NewAdminResponse, NewSubmission, Submission, SubmissionId, SubmissionRecord,
};
use super::status::SubmissionStatus;

/// Persistence collaborator holding submissions and their responses.
///
/// Listing is ordered newest first by `created_at`; the responses of a
/// [`SubmissionRecord`] are ordered oldest first.
#[async_trait::async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn insert_submission(&self, submission: NewSubmission) -> Result<Submission, StoreError>;

    async fn get_submission_by_id(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionRecord>, StoreError>;

    async fn list_submissions(&self, query: ListQuery) -> Result<Vec<Submission>, StoreError>;

    async fn update_submission_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
    ) -> Result<(), StoreError>;

    async fn insert_admin_response(
        &self,
        response: NewAdminResponse,
    ) -> Result<AdminResponse, StoreError>;

    /// Status change plus optional response.
    ///
    /// The default runs the two writes back to back: a failed status update
    /// aborts before the response insert, and a failed response insert leaves
    /// the new status in place. Stores with transactions should override this.
    async fn apply_triage(&self, write: TriageWrite) -> Result<TriageReceipt, TriageWriteError> {
        self.update_submission_status(&write.submission_id, write.status)
            .await
            .map_err(TriageWriteError::StatusUpdate)?;

        let response = match write.response {
            Some(response) => Some(
                self.insert_admin_response(response)
                    .await
                    .map_err(TriageWriteError::ResponseInsert)?,
            ),
            None => None,
        };

        Ok(TriageReceipt {
            status: write.status,
            response,
        })
    }
}

/// Filter and window applied to the triage listing. The default fetches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub status: Option<SubmissionStatus>,
    pub offset: usize,
    pub limit: Option<usize>,
}

impl ListQuery {
    /// Apply the filter and window to rows already sorted newest first.
    pub fn window<'a, I>(&self, sorted: I) -> Vec<Submission>
    where
        I: IntoIterator<Item = &'a Submission>,
    {
        let filtered = sorted
            .into_iter()
            .filter(|submission| self.status.map_or(true, |status| submission.status == status))
            .skip(self.offset)
            .cloned();

        match self.limit {
            Some(limit) => filtered.take(limit).collect(),
            None => filtered.collect(),
        }
    }
}

/// Both halves of an administrator decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageWrite {
    pub submission_id: SubmissionId,
    pub status: SubmissionStatus,
    pub response: Option<NewAdminResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageReceipt {
    pub status: SubmissionStatus,
    pub response: Option<AdminResponse>,
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Which half of a triage write failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriageWriteError {
    #[error("status update failed: {0}")]
    StatusUpdate(StoreError),
    #[error("status updated but response was not saved: {0}")]
    ResponseInsert(StoreError),
}
