//! Reviewer assignment for pull requests within team-based organizations.
//!
//! [`TeamDirectory`] resolves users to teams, [`selector`] decides who reviews,
//! the lifecycle rules on [`PullRequest`] gate which mutations are legal, and
//! [`AssignmentEngine`] composes them behind the create, merge, reassign, and
//! review lookup operations. Storage sits behind [`ReviewStore`].

pub mod clock;
pub mod directory;
pub mod domain;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod router;
pub mod selector;
pub mod teams;

#[cfg(test)]
mod tests;

pub use clock::{Clock, FixedClock, SystemClock};
pub use directory::TeamDirectory;
pub use domain::{
    Member, NewMember, NewPullRequest, NewTeam, PullRequest, PullRequestId, PullRequestShort,
    PullRequestStatus, ReviewerStat, Team, TeamId, User, UserId, MAX_REVIEWERS,
};
pub use engine::{AssignmentEngine, AssignmentSettings, Reassignment};
pub use error::ReviewError;
pub use lifecycle::{LifecycleError, MergeOutcome};
pub use memory::InMemoryReviewStore;
pub use repository::{RepositoryError, ReviewStore, ReviewerSwap};
pub use router::{assignment_router, AssignmentApi};
pub use selector::{ReplacementRequest, SelectionError};
pub use teams::TeamService;
