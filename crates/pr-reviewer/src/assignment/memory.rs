//! In-memory implementation of [`ReviewStore`].
//!
//! All tables sit behind one `RwLock`, so every trait call is a single
//! critical section. State is lost on restart.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::domain::{
    Member, NewTeam, PullRequest, PullRequestId, PullRequestShort, ReviewerStat, Team, TeamId,
    User, UserId,
};
use super::lifecycle::MergeOutcome;
use super::repository::{RepositoryError, ReviewStore, ReviewerSwap};

#[derive(Debug)]
struct TeamRow {
    name: String,
    members: Vec<UserId>,
}

#[derive(Debug)]
struct UserRow {
    username: String,
    is_active: bool,
    team_id: TeamId,
}

#[derive(Debug, Default)]
struct Tables {
    next_team_id: u64,
    teams: BTreeMap<TeamId, TeamRow>,
    team_names: HashMap<String, TeamId>,
    users: HashMap<UserId, UserRow>,
    pull_requests: BTreeMap<PullRequestId, PullRequest>,
}

impl Tables {
    fn member(&self, id: &UserId) -> Option<Member> {
        self.users.get(id).map(|row| Member {
            user_id: id.clone(),
            username: row.username.clone(),
            is_active: row.is_active,
        })
    }

    fn team(&self, id: TeamId) -> Option<Team> {
        self.teams.get(&id).map(|row| Team {
            id,
            team_name: row.name.clone(),
            members: row
                .members
                .iter()
                .filter_map(|user_id| self.member(user_id))
                .collect(),
        })
    }

    fn user(&self, id: &UserId) -> Option<User> {
        let row = self.users.get(id)?;
        let team = self.teams.get(&row.team_id)?;
        Some(User {
            user_id: id.clone(),
            username: row.username.clone(),
            team_id: row.team_id,
            team_name: team.name.clone(),
            is_active: row.is_active,
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReviewStore {
    tables: RwLock<Tables>,
}

impl InMemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, RepositoryError> {
        self.tables
            .read()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, RepositoryError> {
        self.tables
            .write()
            .map_err(|_| RepositoryError::Unavailable("store lock poisoned".to_string()))
    }
}

impl ReviewStore for InMemoryReviewStore {
    fn insert_team(&self, team: NewTeam) -> Result<Team, RepositoryError> {
        let mut tables = self.write()?;
        if tables.team_names.contains_key(&team.team_name) {
            return Err(RepositoryError::Conflict);
        }

        {
            let mut seen = HashSet::new();
            for member in &team.members {
                if tables.users.contains_key(&member.user_id) || !seen.insert(&member.user_id) {
                    return Err(RepositoryError::MemberTaken(member.user_id.clone()));
                }
            }
        }

        tables.next_team_id += 1;
        let id = TeamId(tables.next_team_id);
        let members = team.members.iter().map(|m| m.user_id.clone()).collect();
        for member in team.members {
            tables.users.insert(
                member.user_id,
                UserRow {
                    username: member.username,
                    is_active: member.is_active,
                    team_id: id,
                },
            );
        }
        tables.team_names.insert(team.team_name.clone(), id);
        tables.teams.insert(
            id,
            TeamRow {
                name: team.team_name,
                members,
            },
        );

        tables.team(id).ok_or(RepositoryError::NotFound)
    }

    fn team_by_name(&self, name: &str) -> Result<Option<Team>, RepositoryError> {
        let tables = self.read()?;
        Ok(tables
            .team_names
            .get(name)
            .and_then(|id| tables.team(*id)))
    }

    fn user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.read()?.user(id))
    }

    fn set_user_active(&self, id: &UserId, is_active: bool) -> Result<User, RepositoryError> {
        let mut tables = self.write()?;
        let row = tables.users.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if row.is_active == is_active {
            return Err(RepositoryError::Unchanged);
        }
        row.is_active = is_active;
        tables.user(id).ok_or(RepositoryError::NotFound)
    }

    fn active_members(
        &self,
        team: TeamId,
        exclude: &[UserId],
    ) -> Result<Vec<Member>, RepositoryError> {
        let tables = self.read()?;
        let Some(row) = tables.teams.get(&team) else {
            return Ok(Vec::new());
        };
        Ok(row
            .members
            .iter()
            .filter(|user_id| !exclude.contains(user_id))
            .filter_map(|user_id| tables.member(user_id))
            .filter(|member| member.is_active)
            .collect())
    }

    fn pull_request_exists(&self, id: &PullRequestId) -> Result<bool, RepositoryError> {
        Ok(self.read()?.pull_requests.contains_key(id))
    }

    fn pull_request(&self, id: &PullRequestId) -> Result<Option<PullRequest>, RepositoryError> {
        Ok(self.read()?.pull_requests.get(id).cloned())
    }

    fn insert_pull_request(
        &self,
        pull_request: PullRequest,
    ) -> Result<PullRequest, RepositoryError> {
        let mut tables = self.write()?;
        if tables.pull_requests.contains_key(&pull_request.id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .pull_requests
            .insert(pull_request.id.clone(), pull_request.clone());
        Ok(pull_request)
    }

    fn mark_merged(
        &self,
        id: &PullRequestId,
        merged_at: DateTime<Utc>,
    ) -> Result<PullRequest, RepositoryError> {
        let mut tables = self.write()?;
        let record = tables
            .pull_requests
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        if record.merge(merged_at) == MergeOutcome::AlreadyMerged {
            debug!(pull_request = %id, "merge raced with an earlier merge");
        }
        Ok(record.clone())
    }

    fn replace_reviewer(&self, swap: &ReviewerSwap) -> Result<PullRequest, RepositoryError> {
        let mut tables = self.write()?;

        let candidate_ok = tables
            .users
            .get(&swap.replacement)
            .is_some_and(|row| row.is_active && row.team_id == swap.team_id);

        let record = tables
            .pull_requests
            .get_mut(&swap.pull_request_id)
            .ok_or(RepositoryError::NotFound)?;
        if record.revision != swap.expected_revision {
            return Err(RepositoryError::Stale);
        }
        if !candidate_ok {
            return Err(RepositoryError::Ineligible);
        }

        let mut updated = record.clone();
        updated
            .reassign(&swap.removed, swap.replacement.clone())
            .map_err(|_| RepositoryError::Ineligible)?;
        *record = updated.clone();
        Ok(updated)
    }

    fn pull_requests_by_reviewer(
        &self,
        reviewer: &UserId,
    ) -> Result<Vec<PullRequestShort>, RepositoryError> {
        let tables = self.read()?;
        Ok(tables
            .pull_requests
            .values()
            .filter(|pr| pr.is_reviewed_by(reviewer))
            .map(PullRequest::short)
            .collect())
    }

    fn reviewer_stats(&self) -> Result<Vec<ReviewerStat>, RepositoryError> {
        let tables = self.read()?;
        let mut counts: BTreeMap<&UserId, u64> = BTreeMap::new();
        for reviewer in tables.pull_requests.values().flat_map(|pr| &pr.reviewers) {
            *counts.entry(reviewer).or_default() += 1;
        }

        let mut stats: Vec<ReviewerStat> = counts
            .into_iter()
            .map(|(user_id, count)| ReviewerStat {
                user_id: user_id.clone(),
                count,
            })
            .collect();
        stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.user_id.cmp(&b.user_id)));
        Ok(stats)
    }
}
