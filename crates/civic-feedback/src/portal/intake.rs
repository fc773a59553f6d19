use super::domain::{IntakeAction, IntakeForm, NewSubmission, UserId};
use super::status::{SubmissionCategory, SubmissionStatus, UnknownCategory, UnknownStatus};

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 2000;

/// Input problems caught before the store is contacted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("title is required")]
    MissingTitle,
    #[error("title must be at most {max} characters (found {found})")]
    TitleTooLong { max: usize, found: usize },
    #[error("description is required")]
    MissingDescription,
    #[error("description must be at most {max} characters (found {found})")]
    DescriptionTooLong { max: usize, found: usize },
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
    #[error(transparent)]
    UnknownStatus(#[from] UnknownStatus),
    #[error("submission id is required")]
    MissingSubmissionId,
    #[error("decision changes nothing: same status and no response")]
    NothingToUpdate,
    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Length limits for citizen-entered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeLimits {
    pub title_max_chars: usize,
    pub description_max_chars: usize,
}

impl Default for IntakeLimits {
    fn default() -> Self {
        Self {
            title_max_chars: TITLE_MAX_CHARS,
            description_max_chars: DESCRIPTION_MAX_CHARS,
        }
    }
}

/// Turns raw form input into an insertable submission.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    limits: IntakeLimits,
}

impl IntakeGuard {
    pub fn with_limits(limits: IntakeLimits) -> Self {
        Self { limits }
    }

    pub fn validate(
        &self,
        form: IntakeForm,
        action: IntakeAction,
        user_id: Option<UserId>,
    ) -> Result<NewSubmission, ValidationError> {
        let title = form.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        let found = title.chars().count();
        if found > self.limits.title_max_chars {
            return Err(ValidationError::TitleTooLong {
                max: self.limits.title_max_chars,
                found,
            });
        }

        let description = form.description.trim();
        if description.is_empty() {
            return Err(ValidationError::MissingDescription);
        }
        let found = description.chars().count();
        if found > self.limits.description_max_chars {
            return Err(ValidationError::DescriptionTooLong {
                max: self.limits.description_max_chars,
                found,
            });
        }

        let category: SubmissionCategory = form.category.parse()?;
        let status: SubmissionStatus = action.initial_status();

        Ok(NewSubmission {
            title: title.to_string(),
            description: description.to_string(),
            category,
            status,
            is_anonymous: form.is_anonymous,
            user_id,
        })
    }
}
