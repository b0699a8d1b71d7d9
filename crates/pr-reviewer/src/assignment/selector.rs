//! Reviewer selection rules.
//!
//! Both operations are pure: callers hand in a roster snapshot and, for
//! replacements, the random source. The eligible list is always filtered in
//! full before a single uniform index is drawn, so no exclusion is ever left to
//! the storage layer.

use rand::Rng;

use super::domain::{Member, UserId, MAX_REVIEWERS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("no active replacement candidate in team")]
    NoCandidate,
}

/// Exclusions that apply when substituting a single reviewer.
#[derive(Debug, Clone, Copy)]
pub struct ReplacementRequest<'a> {
    pub author: &'a UserId,
    pub removed: &'a UserId,
    pub assigned: &'a [UserId],
}

impl ReplacementRequest<'_> {
    fn excludes(&self, candidate: &UserId) -> bool {
        candidate == self.author || candidate == self.removed || self.assigned.contains(candidate)
    }
}

/// Pick up to two active teammates of `author`, keeping roster order.
///
/// Fewer than two eligible members is not an error; the result may be empty.
pub fn initial_assignment(roster: &[Member], author: &UserId) -> Vec<UserId> {
    let mut picked: Vec<UserId> = Vec::with_capacity(MAX_REVIEWERS);
    for member in roster {
        if picked.len() == MAX_REVIEWERS {
            break;
        }
        if member.is_active && member.user_id != *author && !picked.contains(&member.user_id) {
            picked.push(member.user_id.clone());
        }
    }
    picked
}

/// Every roster member still eligible to stand in for the removed reviewer.
pub fn eligible_replacements(roster: &[Member], request: &ReplacementRequest<'_>) -> Vec<UserId> {
    let mut eligible: Vec<UserId> = Vec::new();
    for member in roster {
        if member.is_active && !request.excludes(&member.user_id) && !eligible.contains(&member.user_id)
        {
            eligible.push(member.user_id.clone());
        }
    }
    eligible
}

/// Draw one replacement uniformly at random from the eligible members.
pub fn find_replacement<R>(
    roster: &[Member],
    request: &ReplacementRequest<'_>,
    rng: &mut R,
) -> Result<UserId, SelectionError>
where
    R: Rng + ?Sized,
{
    let mut eligible = eligible_replacements(roster, request);
    if eligible.is_empty() {
        return Err(SelectionError::NoCandidate);
    }
    let index = rng.gen_range(0..eligible.len());
    Ok(eligible.swap_remove(index))
}
