use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a submission. The snake_case names are the store's wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Draft,
    Pending,
    UnderReview,
    Addressed,
    Rejected,
}

/// Who is asking to move a submission between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Citizen,
    Administrator,
}

impl SubmissionStatus {
    /// Every state in lifecycle order.
    pub const ALL: [SubmissionStatus; 5] = [
        SubmissionStatus::Draft,
        SubmissionStatus::Pending,
        SubmissionStatus::UnderReview,
        SubmissionStatus::Addressed,
        SubmissionStatus::Rejected,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Draft => "draft",
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::UnderReview => "under_review",
            SubmissionStatus::Addressed => "addressed",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub const fn badge(self) -> StatusBadge {
        match self {
            SubmissionStatus::Draft => StatusBadge {
                label: "Draft",
                emphasis: "outline",
                icon: "file-pen",
            },
            SubmissionStatus::Pending => StatusBadge {
                label: "Pending",
                emphasis: "secondary",
                icon: "clock",
            },
            SubmissionStatus::UnderReview => StatusBadge {
                label: "Under Review",
                emphasis: "default",
                icon: "alert-circle",
            },
            SubmissionStatus::Addressed => StatusBadge {
                label: "Addressed",
                emphasis: "success",
                icon: "check-circle",
            },
            SubmissionStatus::Rejected => StatusBadge {
                label: "Rejected",
                emphasis: "destructive",
                icon: "x-circle",
            },
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            SubmissionStatus::Addressed | SubmissionStatus::Rejected
        )
    }

    /// Lifecycle graph. Staying in place is not a transition; callers decide
    /// separately whether a respond-only update is acceptable.
    pub fn can_transition_to(self, next: SubmissionStatus, actor: Actor) -> bool {
        use SubmissionStatus::*;

        match actor {
            Actor::Citizen => matches!((self, next), (Draft, Pending)),
            Actor::Administrator => matches!(
                (self, next),
                (Pending, UnderReview)
                    | (Pending, Addressed)
                    | (Pending, Rejected)
                    | (UnderReview, Addressed)
                    | (UnderReview, Rejected)
            ),
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SubmissionStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value.trim())
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown submission status '{0}'")]
pub struct UnknownStatus(pub String);

/// Display triple rendered next to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub label: &'static str,
    pub emphasis: &'static str,
    pub icon: &'static str,
}

/// Fixed set of feedback topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionCategory {
    Infrastructure,
    Health,
    Education,
    Security,
    Environment,
    EconomicDevelopment,
    Other,
}

impl SubmissionCategory {
    pub const ALL: [SubmissionCategory; 7] = [
        SubmissionCategory::Infrastructure,
        SubmissionCategory::Health,
        SubmissionCategory::Education,
        SubmissionCategory::Security,
        SubmissionCategory::Environment,
        SubmissionCategory::EconomicDevelopment,
        SubmissionCategory::Other,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SubmissionCategory::Infrastructure => "infrastructure",
            SubmissionCategory::Health => "health",
            SubmissionCategory::Education => "education",
            SubmissionCategory::Security => "security",
            SubmissionCategory::Environment => "environment",
            SubmissionCategory::EconomicDevelopment => "economic_development",
            SubmissionCategory::Other => "other",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            SubmissionCategory::Infrastructure => "Infrastructure",
            SubmissionCategory::Health => "Health",
            SubmissionCategory::Education => "Education",
            SubmissionCategory::Security => "Security",
            SubmissionCategory::Environment => "Environment",
            SubmissionCategory::EconomicDevelopment => "Economic Development",
            SubmissionCategory::Other => "Other",
        }
    }
}

impl fmt::Display for SubmissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionCategory {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        SubmissionCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == value.trim())
            .ok_or_else(|| UnknownCategory(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown submission category '{0}'")]
pub struct UnknownCategory(pub String);
