use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use super::clock::Clock;
use super::directory::TeamDirectory;
use super::domain::{
    NewPullRequest, PullRequest, PullRequestId, PullRequestShort, ReviewerStat, UserId,
};
use super::error::ReviewError;
use super::repository::{RepositoryError, ReviewStore, ReviewerSwap};
use super::selector::{self, ReplacementRequest};

/// Tunables for the assignment engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentSettings {
    /// How many times a reassignment is retried from a fresh read when the
    /// store rejects the swap as stale or the candidate as ineligible.
    pub reassign_attempts: u32,
}

impl Default for AssignmentSettings {
    fn default() -> Self {
        Self {
            reassign_attempts: 3,
        }
    }
}

/// Successful reviewer substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reassignment {
    #[serde(rename = "pr")]
    pub pull_request: PullRequest,
    pub replaced_by: UserId,
}

/// Orchestrates the team directory, reviewer selector, and lifecycle rules.
pub struct AssignmentEngine<S, C> {
    store: Arc<S>,
    directory: TeamDirectory<S>,
    clock: Arc<C>,
    settings: AssignmentSettings,
}

impl<S, C> AssignmentEngine<S, C>
where
    S: ReviewStore + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<C>, settings: AssignmentSettings) -> Self {
        let directory = TeamDirectory::new(Arc::clone(&store));
        Self {
            store,
            directory,
            clock,
            settings,
        }
    }

    /// Open a pull request and assign up to two reviewers from the author's team.
    pub fn create(&self, request: NewPullRequest) -> Result<PullRequest, ReviewError> {
        validate_create(&request)?;

        if self.store.pull_request_exists(&request.pull_request_id)? {
            return Err(ReviewError::PrExists(request.pull_request_id));
        }

        let author = self.directory.resolve(&request.author_id)?;
        let reviewers = self
            .directory
            .active_teammates(author.team_id, &author.user_id)?;

        let pull_request_id = request.pull_request_id.clone();
        let pull_request = PullRequest::open(request, reviewers, self.clock.now())?;
        let created = match self.store.insert_pull_request(pull_request) {
            Ok(created) => created,
            // A concurrent create with the same id committed first.
            Err(RepositoryError::Conflict) => return Err(ReviewError::PrExists(pull_request_id)),
            Err(other) => return Err(other.into()),
        };

        info!(
            pull_request = %created.id,
            author = %created.author_id,
            reviewers = created.reviewers.len(),
            "pull request opened"
        );
        Ok(created)
    }

    /// Merge a pull request. Merging twice returns the first result unchanged.
    pub fn merge(&self, id: &PullRequestId) -> Result<PullRequest, ReviewError> {
        let current = self.load(id)?;
        if current.is_merged() {
            return Ok(current);
        }

        let merged = self.store.mark_merged(id, self.clock.now())?;
        info!(pull_request = %merged.id, status = merged.status.label(), "pull request merged");
        Ok(merged)
    }

    /// Swap `old_reviewer` for a random eligible teammate.
    pub fn reassign(
        &self,
        id: &PullRequestId,
        old_reviewer: &UserId,
    ) -> Result<Reassignment, ReviewError> {
        self.reassign_with(id, old_reviewer, &mut rand::thread_rng())
    }

    /// [`Self::reassign`] with an explicit random source.
    pub fn reassign_with<R>(
        &self,
        id: &PullRequestId,
        old_reviewer: &UserId,
        rng: &mut R,
    ) -> Result<Reassignment, ReviewError>
    where
        R: Rng + ?Sized,
    {
        // At least one read happens so lookup and lifecycle errors surface.
        let attempts = self.settings.reassign_attempts.max(1);
        for attempt in 1..=attempts {
            let current = self.load(id)?;
            current.ensure_reassignable(old_reviewer)?;

            let removed = self.directory.resolve(old_reviewer)?;
            let mut exclude = Vec::with_capacity(current.reviewers.len() + 2);
            exclude.push(current.author_id.clone());
            exclude.push(old_reviewer.clone());
            exclude.extend(current.reviewers.iter().cloned());

            let roster = self.directory.candidates(removed.team_id, &exclude)?;
            let request = ReplacementRequest {
                author: &current.author_id,
                removed: old_reviewer,
                assigned: &current.reviewers,
            };
            let replacement = selector::find_replacement(&roster, &request, rng)?;

            let swap = ReviewerSwap {
                pull_request_id: current.id.clone(),
                team_id: removed.team_id,
                removed: old_reviewer.clone(),
                replacement: replacement.clone(),
                expected_revision: current.revision,
            };

            match self.store.replace_reviewer(&swap) {
                Ok(updated) => {
                    info!(
                        pull_request = %updated.id,
                        removed = %old_reviewer,
                        replaced_by = %replacement,
                        "reviewer reassigned"
                    );
                    return Ok(Reassignment {
                        pull_request: updated,
                        replaced_by: replacement,
                    });
                }
                Err(RepositoryError::Stale | RepositoryError::Ineligible) => {
                    warn!(
                        pull_request = %id,
                        attempt,
                        "reviewer swap rejected by store, retrying from a fresh read"
                    );
                }
                Err(RepositoryError::NotFound) => {
                    return Err(ReviewError::NotFound("pull request"))
                }
                Err(other) => return Err(other.into()),
            }
        }

        Err(ReviewError::NoCandidate)
    }

    /// Pull requests currently assigned to `user_id` for review.
    pub fn reviews_for(&self, user_id: &UserId) -> Result<Vec<PullRequestShort>, ReviewError> {
        self.directory.resolve(user_id)?;
        let reviews = self.store.pull_requests_by_reviewer(user_id)?;
        if reviews.is_empty() {
            return Err(ReviewError::NotFound("pull requests for reviewer"));
        }
        Ok(reviews)
    }

    /// Assignment count per reviewer, busiest first.
    pub fn reviewer_stats(&self) -> Result<Vec<ReviewerStat>, ReviewError> {
        Ok(self.store.reviewer_stats()?)
    }

    fn load(&self, id: &PullRequestId) -> Result<PullRequest, ReviewError> {
        self.store
            .pull_request(id)?
            .ok_or(ReviewError::NotFound("pull request"))
    }
}

fn validate_create(request: &NewPullRequest) -> Result<(), ReviewError> {
    if request.pull_request_id.as_str().trim().is_empty()
        || request.pull_request_name.trim().is_empty()
        || request.author_id.as_str().trim().is_empty()
    {
        return Err(ReviewError::Invalid(
            "pull_request_id, pull_request_name, author_id required".to_string(),
        ));
    }
    Ok(())
}
