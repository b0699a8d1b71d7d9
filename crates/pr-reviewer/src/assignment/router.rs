use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::clock::Clock;
use super::domain::{NewPullRequest, NewTeam, PullRequestId, UserId};
use super::engine::{AssignmentEngine, AssignmentSettings};
use super::error::ReviewError;
use super::repository::ReviewStore;
use super::teams::TeamService;

/// Handler state: the assignment engine plus team administration.
pub struct AssignmentApi<S, C> {
    pub engine: Arc<AssignmentEngine<S, C>>,
    pub teams: Arc<TeamService<S>>,
}

impl<S, C> Clone for AssignmentApi<S, C> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            teams: Arc::clone(&self.teams),
        }
    }
}

impl<S, C> AssignmentApi<S, C>
where
    S: ReviewStore + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<C>, settings: AssignmentSettings) -> Self {
        Self {
            engine: Arc::new(AssignmentEngine::new(Arc::clone(&store), clock, settings)),
            teams: Arc::new(TeamService::new(store)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamQuery {
    pub(crate) team_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserQuery {
    pub(crate) user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetIsActiveRequest {
    pub(crate) user_id: UserId,
    pub(crate) is_active: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MergeRequest {
    pub(crate) pull_request_id: PullRequestId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReassignRequest {
    pub(crate) pull_request_id: PullRequestId,
    #[serde(alias = "old_reviewer_id")]
    pub(crate) old_user_id: UserId,
}

/// Router builder exposing team, user, pull request, and stats endpoints.
pub fn assignment_router<S, C>(api: AssignmentApi<S, C>) -> Router
where
    S: ReviewStore + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/team/add", post(create_team_handler::<S, C>))
        .route("/team/get", get(get_team_handler::<S, C>))
        .route("/users/setIsActive", post(set_is_active_handler::<S, C>))
        .route("/users/getReview", get(get_review_handler::<S, C>))
        .route("/pullRequest/create", post(create_pull_request_handler::<S, C>))
        .route("/pullRequest/merge", post(merge_handler::<S, C>))
        .route("/pullRequest/reassign", post(reassign_handler::<S, C>))
        .route("/stats/reviewers", get(reviewer_stats_handler::<S, C>))
        .with_state(api)
}

pub(crate) async fn create_team_handler<S, C>(
    State(api): State<AssignmentApi<S, C>>,
    payload: Result<Json<NewTeam>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
    C: Clock + 'static,
{
    let Json(team) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    match api.teams.create_team(team) {
        Ok(team) => (StatusCode::CREATED, Json(json!({ "team": team }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_team_handler<S, C>(
    State(api): State<AssignmentApi<S, C>>,
    Query(query): Query<TeamQuery>,
) -> Response
where
    S: ReviewStore + 'static,
    C: Clock + 'static,
{
    let Some(team_name) = query.team_name.filter(|name| !name.trim().is_empty()) else {
        return error_response(ReviewError::Invalid("team_name is required".to_string()));
    };

    match api.teams.team(&team_name) {
        Ok(team) => (StatusCode::OK, Json(json!({ "team": team }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn set_is_active_handler<S, C>(
    State(api): State<AssignmentApi<S, C>>,
    payload: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
    C: Clock + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    if request.user_id.as_str().trim().is_empty() {
        return error_response(ReviewError::Invalid("user_id is required".to_string()));
    }

    match api.teams.set_is_active(&request.user_id, request.is_active) {
        Ok(user) => (StatusCode::OK, Json(json!({ "user": user }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_review_handler<S, C>(
    State(api): State<AssignmentApi<S, C>>,
    Query(query): Query<UserQuery>,
) -> Response
where
    S: ReviewStore + 'static,
    C: Clock + 'static,
{
    let Some(user_id) = query.user_id.filter(|id| !id.trim().is_empty()) else {
        return error_response(ReviewError::Invalid("user_id is required".to_string()));
    };
    let user_id = UserId(user_id);

    match api.engine.reviews_for(&user_id) {
        Ok(pull_requests) => (
            StatusCode::OK,
            Json(json!({ "user_id": user_id, "pull_requests": pull_requests })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_pull_request_handler<S, C>(
    State(api): State<AssignmentApi<S, C>>,
    payload: Result<Json<NewPullRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
    C: Clock + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };

    match api.engine.create(request) {
        Ok(pull_request) => {
            (StatusCode::CREATED, Json(json!({ "pr": pull_request }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn merge_handler<S, C>(
    State(api): State<AssignmentApi<S, C>>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
    C: Clock + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    if request.pull_request_id.as_str().trim().is_empty() {
        return error_response(ReviewError::Invalid(
            "pull_request_id is required".to_string(),
        ));
    }

    match api.engine.merge(&request.pull_request_id) {
        Ok(pull_request) => (StatusCode::OK, Json(json!({ "pr": pull_request }))).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reassign_handler<S, C>(
    State(api): State<AssignmentApi<S, C>>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Response
where
    S: ReviewStore + 'static,
    C: Clock + 'static,
{
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    if request.pull_request_id.as_str().trim().is_empty()
        || request.old_user_id.as_str().trim().is_empty()
    {
        return error_response(ReviewError::Invalid(
            "pull_request_id and old_user_id required".to_string(),
        ));
    }

    match api
        .engine
        .reassign(&request.pull_request_id, &request.old_user_id)
    {
        Ok(reassignment) => (StatusCode::OK, Json(reassignment)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reviewer_stats_handler<S, C>(
    State(api): State<AssignmentApi<S, C>>,
) -> Response
where
    S: ReviewStore + 'static,
    C: Clock + 'static,
{
    match api.engine.reviewer_stats() {
        Ok(reviewers) => (StatusCode::OK, Json(json!({ "reviewers": reviewers }))).into_response(),
        Err(err) => error_response(err),
    }
}

/// Render a core error as the `{"error": {"code", "message"}}` envelope.
pub fn error_response(err: ReviewError) -> Response {
    let status = match &err {
        ReviewError::NotFound(_) => StatusCode::NOT_FOUND,
        ReviewError::PrExists(_)
        | ReviewError::PrMerged
        | ReviewError::NotAssigned(_)
        | ReviewError::NoCandidate
        | ReviewError::AlreadyInState
        | ReviewError::MemberTaken(_) => StatusCode::CONFLICT,
        ReviewError::TeamNameTaken(_) | ReviewError::Invalid(_) => StatusCode::BAD_REQUEST,
        ReviewError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = match &err {
        ReviewError::Storage(source) => {
            error!(error = %source, "storage failure hidden behind internal error");
            "internal server error".to_string()
        }
        other => other.to_string(),
    };

    let payload = json!({ "error": { "code": err.code(), "message": message } });
    (status, Json(payload)).into_response()
}

fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({
        "error": { "code": "INVALID_JSON", "message": rejection.body_text() }
    });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}
