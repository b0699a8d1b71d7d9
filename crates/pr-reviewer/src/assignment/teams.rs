use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use super::domain::{NewTeam, Team, User, UserId};
use super::error::ReviewError;
use super::repository::{RepositoryError, ReviewStore};

/// Team administration and member activity toggles.
pub struct TeamService<S> {
    store: Arc<S>,
}

impl<S> TeamService<S>
where
    S: ReviewStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create a team and all of its members in one atomic write.
    pub fn create_team(&self, team: NewTeam) -> Result<Team, ReviewError> {
        validate_team(&team)?;
        let team_name = team.team_name.clone();

        let created = match self.store.insert_team(team) {
            Ok(created) => created,
            Err(RepositoryError::Conflict) => return Err(ReviewError::TeamNameTaken(team_name)),
            Err(RepositoryError::MemberTaken(user)) => return Err(ReviewError::MemberTaken(user)),
            Err(other) => return Err(other.into()),
        };

        info!(
            team = %created.team_name,
            members = created.members.len(),
            "team created"
        );
        Ok(created)
    }

    pub fn team(&self, team_name: &str) -> Result<Team, ReviewError> {
        self.store
            .team_by_name(team_name)?
            .ok_or(ReviewError::NotFound("team"))
    }

    /// Flip a member's activity flag. Setting the current value is rejected;
    /// the comparison happens inside the store write.
    pub fn set_is_active(&self, user_id: &UserId, is_active: bool) -> Result<User, ReviewError> {
        let updated = match self.store.set_user_active(user_id, is_active) {
            Ok(updated) => updated,
            Err(RepositoryError::NotFound) => return Err(ReviewError::NotFound("user")),
            Err(RepositoryError::Unchanged) => return Err(ReviewError::AlreadyInState),
            Err(other) => return Err(other.into()),
        };
        info!(user = %updated.user_id, is_active, "member activity changed");
        Ok(updated)
    }
}

fn validate_team(team: &NewTeam) -> Result<(), ReviewError> {
    if team.team_name.trim().is_empty() {
        return Err(ReviewError::Invalid("team_name is required".to_string()));
    }

    let mut seen = HashSet::new();
    for member in &team.members {
        if member.user_id.as_str().trim().is_empty() {
            return Err(ReviewError::Invalid("member user_id is required".to_string()));
        }
        if !seen.insert(&member.user_id) {
            return Err(ReviewError::Invalid(format!(
                "member {} listed more than once",
                member.user_id
            )));
        }
    }
    Ok(())
}
