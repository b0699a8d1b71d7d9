use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on the reviewer set of a single pull request.
pub const MAX_REVIEWERS: usize = 2;

/// Identifier wrapper for users (team members and reviewers).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Caller-supplied, globally unique pull request identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PullRequestId(pub String);

impl PullRequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PullRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PullRequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Store-assigned team identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u64);

/// Team member as listed on a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: UserId,
    pub username: String,
    pub is_active: bool,
}

/// Team with its roster in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    #[serde(skip)]
    pub id: TeamId,
    pub team_name: String,
    pub members: Vec<Member>,
}

/// A user resolved together with the team that owns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    #[serde(skip)]
    pub team_id: TeamId,
    pub team_name: String,
    pub is_active: bool,
}

/// Team creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewTeam {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<NewMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewMember {
    pub user_id: UserId,
    pub username: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

const fn active_by_default() -> bool {
    true
}

/// Pull request creation payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewPullRequest {
    pub pull_request_id: PullRequestId,
    pub pull_request_name: String,
    pub author_id: UserId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestStatus {
    Open,
    Merged,
}

impl PullRequestStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PullRequestStatus::Open => "OPEN",
            PullRequestStatus::Merged => "MERGED",
        }
    }
}

/// Full pull request record.
///
/// `revision` increases on every committed mutation and backs the optimistic
/// check stores apply when swapping reviewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    #[serde(rename = "pull_request_id")]
    pub id: PullRequestId,
    #[serde(rename = "pull_request_name")]
    pub name: String,
    pub author_id: UserId,
    pub status: PullRequestStatus,
    #[serde(rename = "assigned_reviewers")]
    pub reviewers: Vec<UserId>,
    #[serde(rename = "createdAt", serialize_with = "timestamp::serialize")]
    pub created_at: DateTime<Utc>,
    #[serde(
        rename = "mergedAt",
        skip_serializing_if = "Option::is_none",
        serialize_with = "timestamp::serialize_option"
    )]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub revision: u64,
}

impl PullRequest {
    pub fn short(&self) -> PullRequestShort {
        PullRequestShort {
            id: self.id.clone(),
            name: self.name.clone(),
            author_id: self.author_id.clone(),
            status: self.status,
        }
    }

    pub fn is_reviewed_by(&self, user_id: &UserId) -> bool {
        self.reviewers.contains(user_id)
    }
}

/// Abbreviated pull request view returned by reviewer lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestShort {
    #[serde(rename = "pull_request_id")]
    pub id: PullRequestId,
    #[serde(rename = "pull_request_name")]
    pub name: String,
    pub author_id: UserId,
    pub status: PullRequestStatus,
}

/// Number of pull requests a reviewer is currently assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewerStat {
    pub user_id: UserId,
    pub count: u64,
}

/// Wire format for timestamps: RFC 3339, UTC, whole seconds, `Z` designator.
pub mod timestamp {
    use chrono::{DateTime, SubsecRound, Utc};
    use serde::Serializer;

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn format(value: &DateTime<Utc>) -> String {
        value.format(FORMAT).to_string()
    }

    /// Drop sub-second precision so stored and rendered values agree.
    pub fn truncate(value: DateTime<Utc>) -> DateTime<Utc> {
        value.trunc_subsecs(0)
    }

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(value))
    }

    pub fn serialize_option<S>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&format(value)),
            None => serializer.serialize_none(),
        }
    }
}
