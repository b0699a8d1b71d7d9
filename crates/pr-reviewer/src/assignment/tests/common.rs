use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::assignment::clock::FixedClock;
use crate::assignment::domain::{
    Member, NewMember, NewPullRequest, NewTeam, PullRequest, PullRequestId, PullRequestShort,
    ReviewerStat, Team, TeamId, User, UserId,
};
use crate::assignment::engine::{AssignmentEngine, AssignmentSettings};
use crate::assignment::memory::InMemoryReviewStore;
use crate::assignment::repository::{RepositoryError, ReviewStore, ReviewerSwap};
use crate::assignment::router::AssignmentApi;
use crate::assignment::teams::TeamService;

pub(super) fn opened_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 11, 3, 9, 15, 0).unwrap()
}

pub(super) fn merged_at() -> DateTime<Utc> {
    opened_at() + Duration::hours(6)
}

pub(super) fn member(id: &str, is_active: bool) -> NewMember {
    NewMember {
        user_id: UserId::from(id),
        username: format!("{id}-name"),
        is_active,
    }
}

/// alice and bob active, carol inactive.
pub(super) fn backend_team() -> NewTeam {
    NewTeam {
        team_name: "backend".to_string(),
        members: vec![
            member("alice", true),
            member("bob", true),
            member("carol", false),
        ],
    }
}

/// Five active members, enough to exercise replacements.
pub(super) fn platform_team() -> NewTeam {
    NewTeam {
        team_name: "platform".to_string(),
        members: vec![
            member("pat", true),
            member("quinn", true),
            member("riley", true),
            member("sam", true),
            member("tess", true),
        ],
    }
}

pub(super) fn new_pull_request(id: &str, author: &str) -> NewPullRequest {
    NewPullRequest {
        pull_request_id: PullRequestId::from(id),
        pull_request_name: format!("{id} change"),
        author_id: UserId::from(author),
    }
}

pub(super) fn seeded_store(teams: Vec<NewTeam>) -> Arc<InMemoryReviewStore> {
    let store = Arc::new(InMemoryReviewStore::new());
    for team in teams {
        store.insert_team(team).expect("seed team");
    }
    store
}

pub(super) fn engine_at<S>(
    store: Arc<S>,
    now: DateTime<Utc>,
) -> AssignmentEngine<S, FixedClock>
where
    S: ReviewStore + 'static,
{
    AssignmentEngine::new(
        store,
        Arc::new(FixedClock(now)),
        AssignmentSettings::default(),
    )
}

pub(super) fn build_engine(
    teams: Vec<NewTeam>,
) -> (
    AssignmentEngine<InMemoryReviewStore, FixedClock>,
    Arc<InMemoryReviewStore>,
) {
    let store = seeded_store(teams);
    (engine_at(Arc::clone(&store), opened_at()), store)
}

pub(super) fn build_teams(store: &Arc<InMemoryReviewStore>) -> TeamService<InMemoryReviewStore> {
    TeamService::new(Arc::clone(store))
}

pub(super) fn build_api<S>(store: Arc<S>) -> AssignmentApi<S, FixedClock>
where
    S: ReviewStore + 'static,
{
    AssignmentApi::new(
        store,
        Arc::new(FixedClock(opened_at())),
        AssignmentSettings::default(),
    )
}

pub(super) fn ids(values: &[&str]) -> Vec<UserId> {
    values.iter().copied().map(UserId::from).collect()
}

pub(super) fn assert_invariants(pr: &PullRequest) {
    assert!(pr.reviewers.len() <= 2, "too many reviewers: {pr:?}");
    assert!(
        !pr.reviewers.contains(&pr.author_id),
        "author reviews own pull request: {pr:?}"
    );
    for (index, reviewer) in pr.reviewers.iter().enumerate() {
        assert!(
            !pr.reviewers[index + 1..].contains(reviewer),
            "duplicate reviewer: {pr:?}"
        );
    }
}

/// Every reviewer belongs to the author's team.
pub(super) fn assert_reviewers_share_author_team<S>(store: &S, pr: &PullRequest)
where
    S: ReviewStore,
{
    let team_of = |id: &UserId| {
        store
            .user(id)
            .expect("store readable")
            .unwrap_or_else(|| panic!("unknown user {id}"))
            .team_id
    };
    let author_team = team_of(&pr.author_id);
    for reviewer in &pr.reviewers {
        assert_eq!(
            team_of(reviewer),
            author_team,
            "reviewer {reviewer} is outside the author's team: {pr:?}"
        );
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Delegates to an in-memory store but can be told to reject swaps as stale or
/// to fail pull request inserts with a conflict.
#[derive(Default)]
pub(super) struct ContendedStore {
    pub(super) inner: InMemoryReviewStore,
    pub(super) stale_swaps: AtomicU32,
    pub(super) conflict_on_insert: bool,
}

impl ContendedStore {
    pub(super) fn with_stale_swaps(count: u32) -> Self {
        Self {
            stale_swaps: AtomicU32::new(count),
            ..Self::default()
        }
    }
}

impl ReviewStore for ContendedStore {
    fn insert_team(&self, team: NewTeam) -> Result<Team, RepositoryError> {
        self.inner.insert_team(team)
    }

    fn team_by_name(&self, name: &str) -> Result<Option<Team>, RepositoryError> {
        self.inner.team_by_name(name)
    }

    fn user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.user(id)
    }

    fn set_user_active(&self, id: &UserId, is_active: bool) -> Result<User, RepositoryError> {
        self.inner.set_user_active(id, is_active)
    }

    fn active_members(
        &self,
        team: TeamId,
        exclude: &[UserId],
    ) -> Result<Vec<Member>, RepositoryError> {
        self.inner.active_members(team, exclude)
    }

    fn pull_request_exists(&self, id: &PullRequestId) -> Result<bool, RepositoryError> {
        self.inner.pull_request_exists(id)
    }

    fn pull_request(&self, id: &PullRequestId) -> Result<Option<PullRequest>, RepositoryError> {
        self.inner.pull_request(id)
    }

    fn insert_pull_request(
        &self,
        pull_request: PullRequest,
    ) -> Result<PullRequest, RepositoryError> {
        if self.conflict_on_insert {
            return Err(RepositoryError::Conflict);
        }
        self.inner.insert_pull_request(pull_request)
    }

    fn mark_merged(
        &self,
        id: &PullRequestId,
        merged_at: DateTime<Utc>,
    ) -> Result<PullRequest, RepositoryError> {
        self.inner.mark_merged(id, merged_at)
    }

    fn replace_reviewer(&self, swap: &ReviewerSwap) -> Result<PullRequest, RepositoryError> {
        let remaining = self.stale_swaps.load(Ordering::SeqCst);
        if remaining > 0 {
            self.stale_swaps.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Stale);
        }
        self.inner.replace_reviewer(swap)
    }

    fn pull_requests_by_reviewer(
        &self,
        reviewer: &UserId,
    ) -> Result<Vec<PullRequestShort>, RepositoryError> {
        self.inner.pull_requests_by_reviewer(reviewer)
    }

    fn reviewer_stats(&self) -> Result<Vec<ReviewerStat>, RepositoryError> {
        self.inner.reviewer_stats()
    }
}

pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable(
        "postgres://reviewer@db-3:5432 connection refused".to_string(),
    ))
}

impl ReviewStore for UnavailableStore {
    fn insert_team(&self, _team: NewTeam) -> Result<Team, RepositoryError> {
        offline()
    }

    fn team_by_name(&self, _name: &str) -> Result<Option<Team>, RepositoryError> {
        offline()
    }

    fn user(&self, _id: &UserId) -> Result<Option<User>, RepositoryError> {
        offline()
    }

    fn set_user_active(&self, _id: &UserId, _is_active: bool) -> Result<User, RepositoryError> {
        offline()
    }

    fn active_members(
        &self,
        _team: TeamId,
        _exclude: &[UserId],
    ) -> Result<Vec<Member>, RepositoryError> {
        offline()
    }

    fn pull_request_exists(&self, _id: &PullRequestId) -> Result<bool, RepositoryError> {
        offline()
    }

    fn pull_request(&self, _id: &PullRequestId) -> Result<Option<PullRequest>, RepositoryError> {
        offline()
    }

    fn insert_pull_request(
        &self,
        _pull_request: PullRequest,
    ) -> Result<PullRequest, RepositoryError> {
        offline()
    }

    fn mark_merged(
        &self,
        _id: &PullRequestId,
        _merged_at: DateTime<Utc>,
    ) -> Result<PullRequest, RepositoryError> {
        offline()
    }

    fn replace_reviewer(&self, _swap: &ReviewerSwap) -> Result<PullRequest, RepositoryError> {
        offline()
    }

    fn pull_requests_by_reviewer(
        &self,
        _reviewer: &UserId,
    ) -> Result<Vec<PullRequestShort>, RepositoryError> {
        offline()
    }

    fn reviewer_stats(&self) -> Result<Vec<ReviewerStat>, RepositoryError> {
        offline()
    }
}
