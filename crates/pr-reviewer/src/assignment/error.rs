use super::domain::{PullRequestId, UserId};
use super::lifecycle::LifecycleError;
use super::repository::RepositoryError;
use super::selector::SelectionError;

/// Outcome taxonomy of the assignment core.
///
/// Everything except `Storage` is an expected, caller-recoverable outcome.
/// `Storage` wraps infrastructure failures and renders without the
/// underlying detail; the source stays reachable through `Error::source`.
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("pull request {0} already exists")]
    PrExists(PullRequestId),
    #[error("cannot reassign on merged pull request")]
    PrMerged,
    #[error("reviewer {0} is not assigned to this pull request")]
    NotAssigned(UserId),
    #[error("no active replacement candidate in team")]
    NoCandidate,
    #[error("user already in requested state")]
    AlreadyInState,
    #[error("team {0} already exists")]
    TeamNameTaken(String),
    #[error("user {0} already belongs to a team")]
    MemberTaken(UserId),
    #[error("{0}")]
    Invalid(String),
    #[error("storage failure")]
    Storage(#[source] RepositoryError),
}

impl ReviewError {
    /// Stable wire code for the error envelope.
    pub const fn code(&self) -> &'static str {
        match self {
            ReviewError::NotFound(_) => "NOT_FOUND",
            ReviewError::PrExists(_) => "PR_EXISTS",
            ReviewError::PrMerged => "PR_MERGED",
            ReviewError::NotAssigned(_) => "NOT_ASSIGNED",
            ReviewError::NoCandidate => "NO_CANDIDATE",
            ReviewError::AlreadyInState => "ALREADY_IN_STATE",
            ReviewError::TeamNameTaken(_) => "TEAM_EXISTS",
            ReviewError::MemberTaken(_) => "MEMBER_TAKEN",
            ReviewError::Invalid(_) => "VALIDATION_ERROR",
            ReviewError::Storage(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<RepositoryError> for ReviewError {
    fn from(value: RepositoryError) -> Self {
        Self::Storage(value)
    }
}

impl From<SelectionError> for ReviewError {
    fn from(value: SelectionError) -> Self {
        match value {
            SelectionError::NoCandidate => Self::NoCandidate,
        }
    }
}

impl From<LifecycleError> for ReviewError {
    fn from(value: LifecycleError) -> Self {
        match value {
            LifecycleError::Merged => Self::PrMerged,
            LifecycleError::NotAssigned(user) => Self::NotAssigned(user),
            other @ (LifecycleError::AuthorAsReviewer(_)
            | LifecycleError::DuplicateReviewer(_)
            | LifecycleError::TooManyReviewers(_)) => Self::Invalid(other.to_string()),
        }
    }
}
