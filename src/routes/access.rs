use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::{capabilities_for, ActorId, CapabilitySet, Role, TeamId};
use crate::errors::{AppError, AppResult};
use crate::guard::http::resolve_request;
use crate::guard::ContentGate;
use crate::jwt::AuthActor;
use crate::routes::pages::PageView;

#[derive(Debug, Serialize, ToSchema)]
pub struct AccessResponse {
    #[schema(value_type = String)]
    pub actor_id: ActorId,
    #[schema(value_type = Option<String>)]
    pub team_id: Option<TeamId>,
    pub role: Role,
    /// Which link of the fallback chain produced the role.
    #[schema(example = "team_assignment")]
    pub source: &'static str,
    #[schema(value_type = Vec<crate::authz::Capability>)]
    pub capabilities: CapabilitySet,
}

#[utoipa::path(
    get,
    path = "/teams/{team_id}/access",
    tag = "Access",
    params(("team_id" = String, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Effective role and capabilities in the team", body = AccessResponse),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn team_access(
    State(state): State<AppState>,
    auth: AuthActor,
    Path(team_id): Path<String>,
) -> AppResult<Json<AccessResponse>> {
    let team_id = TeamId::parse(Some(&team_id));
    let (_, current) = resolve_request(&state, Some(auth.actor_id), team_id).await;
    let current = current.ok_or_else(|| AppError::unauthorized("actor could not be confirmed"))?;

    Ok(Json(AccessResponse {
        capabilities: capabilities_for(current.role()),
        role: current.role(),
        source: current.resolved.source,
        actor_id: current.actor_id,
        team_id: current.team_id,
    }))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NavEntry {
    pub id: &'static str,
    pub label: &'static str,
    pub href: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NavigationResponse {
    pub role: Role,
    pub entries: Vec<NavEntry>,
}

/// Navigation for the team. Entries the actor cannot open are left out.
#[utoipa::path(
    get,
    path = "/teams/{team_id}/navigation",
    tag = "Access",
    params(("team_id" = String, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Visible navigation entries", body = NavigationResponse),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(("bearerAuth" = []))
)]
pub async fn navigation(
    State(state): State<AppState>,
    auth: AuthActor,
    Path(raw_team_id): Path<String>,
) -> AppResult<Json<NavigationResponse>> {
    let team_id = TeamId::parse(Some(&raw_team_id));
    let (access, _) = resolve_request(&state, Some(auth.actor_id), team_id).await;
    let base = format!("/teams/{raw_team_id}");

    let mut entries = vec![NavEntry {
        id: "overview",
        label: "Overview",
        href: base.clone(),
    }];

    entries.extend(PageView::ALL.into_iter().filter_map(|view| {
        ContentGate::from_requirement(view.requirement()).render(&access.role, || NavEntry {
            id: view.path().trim_start_matches('/'),
            label: view.label(),
            href: format!("{base}{}", view.path()),
        })
    }));

    Ok(Json(NavigationResponse {
        role: access.role.role().unwrap_or_default(),
        entries,
    }))
}
