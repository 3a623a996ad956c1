use axum::{Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::authz::{Capability, Requirement, Role, TeamId};
use crate::guard::http::CurrentAccess;

/// Team pages that sit behind a route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PageView {
    Financials,
    Physical,
    Documents,
    Analytics,
    Team,
    Settings,
}

impl PageView {
    pub fn path(self) -> &'static str {
        match self {
            PageView::Financials => "/financials",
            PageView::Physical => "/physical",
            PageView::Documents => "/documents",
            PageView::Analytics => "/analytics",
            PageView::Team => "/team",
            PageView::Settings => "/settings",
        }
    }

    /// Shared by the page's route guard and its navigation entry.
    pub fn requirement(self) -> Requirement {
        match self {
            PageView::Financials => Requirement::new().capability(Capability::Financial),
            PageView::Physical => Requirement::new().capability(Capability::Physical),
            PageView::Documents => Requirement::new().capability(Capability::Documents),
            PageView::Analytics => Requirement::new().capability(Capability::Analytics),
            PageView::Team => Requirement::new().capability(Capability::Team),
            PageView::Settings => Requirement::new()
                .roles([Role::Owner, Role::Admin])
                .capability(Capability::Settings),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PageView::Financials => "Financials",
            PageView::Physical => "Property",
            PageView::Documents => "Documents",
            PageView::Analytics => "Analytics",
            PageView::Team => "Team",
            PageView::Settings => "Settings",
        }
    }

    pub const ALL: [PageView; 6] = [
        PageView::Financials,
        PageView::Physical,
        PageView::Documents,
        PageView::Analytics,
        PageView::Team,
        PageView::Settings,
    ];
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PageResponse {
    #[schema(value_type = Option<String>)]
    pub team_id: Option<TeamId>,
    pub view: PageView,
    pub role: Role,
}

#[utoipa::path(
    get,
    path = "/teams/{team_id}/{view}",
    tag = "Pages",
    params(
        ("team_id" = String, Path, description = "Team ID"),
        ("view" = String, Path, description = "Guarded page: financials, physical, documents, analytics, team or settings"),
    ),
    responses(
        (status = 200, description = "Page is visible to the actor", body = PageResponse),
        (status = 303, description = "Redirect to the sign-in route or a fallback route"),
        (status = 403, description = "Access denied", body = crate::guard::http::DeniedResponse),
    ),
    security(("bearerAuth" = []))
)]
pub async fn page(Extension(view): Extension<PageView>, Extension(access): Extension<CurrentAccess>) -> Json<PageResponse> {
    Json(PageResponse {
        role: access.role(),
        team_id: access.team_id,
        view,
    })
}
