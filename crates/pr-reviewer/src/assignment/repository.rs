use chrono::{DateTime, Utc};

use super::domain::{
    Member, NewTeam, PullRequest, PullRequestId, PullRequestShort, ReviewerStat, Team, TeamId,
    User, UserId,
};

/// Optimistic reviewer substitution.
///
/// Stores commit it only when the pull request still has `expected_revision`,
/// `removed` is still assigned, and `replacement` is still an active member of
/// `team_id` who is neither the author nor already a reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerSwap {
    pub pull_request_id: PullRequestId,
    pub team_id: TeamId,
    pub removed: UserId,
    pub replacement: UserId,
    pub expected_revision: u64,
}

/// Storage abstraction consumed by the assignment engine and team service.
///
/// Every method is one atomic unit: multi-row writes (a team with its members,
/// a pull request with its reviewer set) either land completely or not at all.
pub trait ReviewStore: Send + Sync {
    /// Insert a team and all of its members. `Conflict` when the name is taken,
    /// `MemberTaken` when a member already belongs to a team.
    fn insert_team(&self, team: NewTeam) -> Result<Team, RepositoryError>;
    fn team_by_name(&self, name: &str) -> Result<Option<Team>, RepositoryError>;

    fn user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    /// Flip a member's activity flag. `Unchanged` when it already holds
    /// `is_active`.
    fn set_user_active(&self, id: &UserId, is_active: bool) -> Result<User, RepositoryError>;
    /// Active members of `team` whose id is not in `exclude`, in roster order.
    fn active_members(
        &self,
        team: TeamId,
        exclude: &[UserId],
    ) -> Result<Vec<Member>, RepositoryError>;

    fn pull_request_exists(&self, id: &PullRequestId) -> Result<bool, RepositoryError>;
    fn pull_request(&self, id: &PullRequestId) -> Result<Option<PullRequest>, RepositoryError>;
    /// Insert a pull request together with its reviewer set. `Conflict` on a
    /// duplicate id.
    fn insert_pull_request(&self, pull_request: PullRequest)
        -> Result<PullRequest, RepositoryError>;
    /// Merge if still open; an already merged record is returned untouched.
    fn mark_merged(
        &self,
        id: &PullRequestId,
        merged_at: DateTime<Utc>,
    ) -> Result<PullRequest, RepositoryError>;
    fn replace_reviewer(&self, swap: &ReviewerSwap) -> Result<PullRequest, RepositoryError>;

    fn pull_requests_by_reviewer(
        &self,
        reviewer: &UserId,
    ) -> Result<Vec<PullRequestShort>, RepositoryError>;
    /// Assignment counts per reviewer, highest first, ties by user id.
    fn reviewer_stats(&self) -> Result<Vec<ReviewerStat>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("user {0} already belongs to a team")]
    MemberTaken(UserId),
    #[error("record not found")]
    NotFound,
    #[error("record changed since it was read")]
    Stale,
    #[error("replacement candidate is no longer eligible")]
    Ineligible,
    #[error("record already holds the requested value")]
    Unchanged,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
