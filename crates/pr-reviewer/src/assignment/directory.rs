use std::sync::Arc;

use super::domain::{Member, TeamId, User, UserId};
use super::error::ReviewError;
use super::repository::ReviewStore;
use super::selector;

/// Read-side view over teams and their members.
pub struct TeamDirectory<S> {
    store: Arc<S>,
}

impl<S> Clone for TeamDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> TeamDirectory<S>
where
    S: ReviewStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolve a user to their owning team and activity flag.
    pub fn resolve(&self, user_id: &UserId) -> Result<User, ReviewError> {
        self.store
            .user(user_id)?
            .ok_or(ReviewError::NotFound("user"))
    }

    /// Up to two distinct active members of `team`, never including `exclude`.
    pub fn active_teammates(
        &self,
        team: TeamId,
        exclude: &UserId,
    ) -> Result<Vec<UserId>, ReviewError> {
        let roster = self
            .store
            .active_members(team, std::slice::from_ref(exclude))?;
        Ok(selector::initial_assignment(&roster, exclude))
    }

    /// Active members of `team` outside `exclude`, read as one snapshot.
    pub fn candidates(&self, team: TeamId, exclude: &[UserId]) -> Result<Vec<Member>, ReviewError> {
        Ok(self.store.active_members(team, exclude)?)
    }
}
