//! OPEN → MERGED state machine and the reviewer-set rules attached to it.
//!
//! Stores apply these transitions inside their own critical section, so the
//! checks here are the single source of truth for which mutations are legal.

use chrono::{DateTime, Utc};

use super::domain::{
    timestamp, NewPullRequest, PullRequest, PullRequestStatus, UserId, MAX_REVIEWERS,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("pull request is already merged")]
    Merged,
    #[error("user {0} is not assigned to this pull request")]
    NotAssigned(UserId),
    #[error("author {0} cannot review their own pull request")]
    AuthorAsReviewer(UserId),
    #[error("user {0} is already a reviewer")]
    DuplicateReviewer(UserId),
    #[error("at most two reviewers may be assigned, got {0}")]
    TooManyReviewers(usize),
}

/// Result of a merge request; a repeated merge is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged,
    AlreadyMerged,
}

impl PullRequest {
    /// Build an OPEN pull request, checking the reviewer-set invariants.
    pub fn open(
        request: NewPullRequest,
        reviewers: Vec<UserId>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LifecycleError> {
        if reviewers.len() > MAX_REVIEWERS {
            return Err(LifecycleError::TooManyReviewers(reviewers.len()));
        }
        for (index, reviewer) in reviewers.iter().enumerate() {
            if *reviewer == request.author_id {
                return Err(LifecycleError::AuthorAsReviewer(reviewer.clone()));
            }
            if reviewers[..index].contains(reviewer) {
                return Err(LifecycleError::DuplicateReviewer(reviewer.clone()));
            }
        }

        Ok(Self {
            id: request.pull_request_id,
            name: request.pull_request_name,
            author_id: request.author_id,
            status: PullRequestStatus::Open,
            reviewers,
            created_at: timestamp::truncate(created_at),
            merged_at: None,
            revision: 0,
        })
    }

    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    /// Transition to MERGED. The merge timestamp is only ever written once.
    pub fn merge(&mut self, at: DateTime<Utc>) -> MergeOutcome {
        match self.status {
            PullRequestStatus::Merged => MergeOutcome::AlreadyMerged,
            PullRequestStatus::Open => {
                self.status = PullRequestStatus::Merged;
                self.merged_at = Some(timestamp::truncate(at));
                self.revision += 1;
                MergeOutcome::Merged
            }
        }
    }

    /// Check that `reviewer` may be swapped out right now.
    pub fn ensure_reassignable(&self, reviewer: &UserId) -> Result<(), LifecycleError> {
        if self.is_merged() {
            return Err(LifecycleError::Merged);
        }
        if !self.is_reviewed_by(reviewer) {
            return Err(LifecycleError::NotAssigned(reviewer.clone()));
        }
        Ok(())
    }

    /// Replace a single reviewer in place; the rest of the set is untouched.
    pub fn reassign(&mut self, old: &UserId, new: UserId) -> Result<(), LifecycleError> {
        self.ensure_reassignable(old)?;
        if new == self.author_id {
            return Err(LifecycleError::AuthorAsReviewer(new));
        }
        if self.is_reviewed_by(&new) {
            return Err(LifecycleError::DuplicateReviewer(new));
        }

        if let Some(slot) = self.reviewers.iter_mut().find(|reviewer| *reviewer == old) {
            *slot = new;
        }
        self.revision += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::domain::PullRequestId;
    use chrono::{Duration, TimeZone};

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 3, 9, 0, 0).unwrap()
    }

    fn request() -> NewPullRequest {
        NewPullRequest {
            pull_request_id: PullRequestId::from("pr-1"),
            pull_request_name: "Fix flaky test".to_string(),
            author_id: UserId::from("alice"),
        }
    }

    fn open_with(reviewers: &[&str]) -> PullRequest {
        let reviewers = reviewers.iter().copied().map(UserId::from).collect();
        PullRequest::open(request(), reviewers, created()).expect("valid reviewer set")
    }

    #[test]
    fn open_rejects_author_and_duplicates_and_oversized_sets() {
        let author = PullRequest::open(request(), vec![UserId::from("alice")], created());
        assert_eq!(
            author,
            Err(LifecycleError::AuthorAsReviewer(UserId::from("alice")))
        );

        let duplicate = PullRequest::open(
            request(),
            vec![UserId::from("bob"), UserId::from("bob")],
            created(),
        );
        assert_eq!(
            duplicate,
            Err(LifecycleError::DuplicateReviewer(UserId::from("bob")))
        );

        let oversized = PullRequest::open(
            request(),
            vec![UserId::from("bob"), UserId::from("carol"), UserId::from("dave")],
            created(),
        );
        assert_eq!(oversized, Err(LifecycleError::TooManyReviewers(3)));
    }

    #[test]
    fn open_accepts_an_empty_reviewer_set() {
        let pr = open_with(&[]);
        assert_eq!(pr.status, PullRequestStatus::Open);
        assert!(pr.reviewers.is_empty());
        assert!(pr.merged_at.is_none());
    }

    #[test]
    fn merge_is_idempotent_and_keeps_first_timestamp() {
        let mut pr = open_with(&["bob"]);
        let first = created() + Duration::hours(2);

        assert_eq!(pr.merge(first), MergeOutcome::Merged);
        let after_first = pr.clone();

        assert_eq!(
            pr.merge(first + Duration::hours(5)),
            MergeOutcome::AlreadyMerged
        );
        assert_eq!(pr, after_first);
        assert_eq!(pr.merged_at, Some(first));
    }

    #[test]
    fn reassign_replaces_only_the_named_slot() {
        let mut pr = open_with(&["bob", "carol"]);
        pr.reassign(&UserId::from("bob"), UserId::from("dave"))
            .expect("reassign succeeds");

        assert_eq!(pr.reviewers, vec![UserId::from("dave"), UserId::from("carol")]);
        assert_eq!(pr.revision, 1);
    }

    #[test]
    fn reassign_on_merged_pull_request_is_rejected_without_changes() {
        let mut pr = open_with(&["bob"]);
        pr.merge(created());
        let before = pr.clone();

        assert_eq!(
            pr.reassign(&UserId::from("bob"), UserId::from("dave")),
            Err(LifecycleError::Merged)
        );
        assert_eq!(pr, before);
    }

    #[test]
    fn reassign_of_unassigned_user_is_rejected_without_changes() {
        let mut pr = open_with(&["bob"]);
        let before = pr.clone();

        assert_eq!(
            pr.reassign(&UserId::from("erin"), UserId::from("dave")),
            Err(LifecycleError::NotAssigned(UserId::from("erin")))
        );
        assert_eq!(pr, before);
    }

    #[test]
    fn reassign_refuses_author_or_current_reviewer_as_replacement() {
        let mut pr = open_with(&["bob", "carol"]);
        assert_eq!(
            pr.reassign(&UserId::from("bob"), UserId::from("alice")),
            Err(LifecycleError::AuthorAsReviewer(UserId::from("alice")))
        );
        assert_eq!(
            pr.reassign(&UserId::from("bob"), UserId::from("carol")),
            Err(LifecycleError::DuplicateReviewer(UserId::from("carol")))
        );
        assert_eq!(pr.reviewers, vec![UserId::from("bob"), UserId::from("carol")]);
    }
}
