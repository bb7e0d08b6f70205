//! Team routes.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::projects::ListResponse;
use crate::{AppState, ApiError, ApiResult, middleware::AuthUser};
use contentforge_core::auth::TeamRole;
use contentforge_db::entities::{team, team_member};
use contentforge_db::{TeamRepository, UserRepository};

/// Creates the team router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/teams", post(create_team).get(list_teams))
        .route("/teams/{id}/members", post(add_member).get(list_members))
}

/// Body of `POST /teams`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamBody {
    /// Team name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// Body of `POST /teams/{id}/members`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberBody {
    /// User to add.
    pub user_id: Uuid,
    /// `admin` or `member`.
    #[serde(default)]
    pub role: Option<String>,
}

/// A team together with the caller's role in it.
#[derive(Debug, Serialize)]
pub struct TeamView {
    /// Team row.
    #[serde(flatten)]
    pub team: team::Model,
    /// Caller's role.
    pub role: String,
}

/// Role for a new member. Ownership is never granted this way.
fn member_role(raw: Option<&str>) -> ApiResult<TeamRole> {
    let role = match raw {
        Some(raw) => TeamRole::from_str(raw).map_err(ApiError::validation)?,
        None => TeamRole::Member,
    };
    if role == TeamRole::Owner {
        return Err(ApiError::validation("A team has exactly one owner"));
    }
    Ok(role)
}

async fn membership(
    state: &AppState,
    team_id: Uuid,
    user_id: Uuid,
) -> ApiResult<team_member::Model> {
    TeamRepository::new(state.conn())
        .find_membership(team_id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Team"))
}

/// POST /teams - The caller becomes the owner.
async fn create_team(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateTeamBody>,
) -> ApiResult<(StatusCode, Json<TeamView>)> {
    body.validate()?;

    let team = TeamRepository::new(state.conn())
        .create_with_owner(body.name.trim(), auth.user_id())
        .await?;

    info!(team_id = %team.id, owner_id = %auth.user_id(), "Team created");
    Ok((
        StatusCode::CREATED,
        Json(TeamView {
            team,
            role: TeamRole::Owner.as_str().to_string(),
        }),
    ))
}

/// GET /teams - Teams the caller belongs to.
async fn list_teams(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ListResponse<TeamView>>> {
    let data = TeamRepository::new(state.conn())
        .list_for_user(auth.user_id())
        .await?
        .into_iter()
        .map(|(team, member)| TeamView {
            team,
            role: member.role,
        })
        .collect();
    Ok(Json(ListResponse { data }))
}

/// POST /teams/{id}/members - Owners and admins only.
async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(team_id): Path<Uuid>,
    Json(body): Json<AddMemberBody>,
) -> ApiResult<(StatusCode, Json<team_member::Model>)> {
    let role = member_role(body.role.as_deref())?;

    let caller = membership(&state, team_id, auth.user_id()).await?;
    let caller_role = TeamRole::from_str(&caller.role).unwrap_or_default();
    if !caller_role.can_manage_members() {
        return Err(ApiError::forbidden("Only team owners and admins can add members"));
    }

    UserRepository::new(state.conn())
        .find_by_id(body.user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    let member = TeamRepository::new(state.conn())
        .add_member(team_id, body.user_id, role)
        .await?;

    info!(
        %team_id,
        user_id = %body.user_id,
        role = role.as_str(),
        added_by = %auth.user_id(),
        "Team member added"
    );
    Ok((StatusCode::CREATED, Json(member)))
}

/// GET /teams/{id}/members - Visible to members.
async fn list_members(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Json<ListResponse<team_member::Model>>> {
    membership(&state, team_id, auth.user_id()).await?;

    let data = TeamRepository::new(state.conn())
        .list_members(team_id)
        .await?;
    Ok(Json(ListResponse { data }))
}
