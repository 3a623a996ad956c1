//! axum adapters for the enforcement layer.

use std::sync::Arc;

use axum::extract::{RawPathParams, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Json, RequestExt};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;
use crate::authz::{AccessState, ActorId, AuthStatus, Denial, ResolvedRole, Resolution, Role, TeamId};
use crate::stores::IdentityStore;

use super::route::{GuardOutcome, RouteGuard};

/// Renders a replacement page for a denied request.
pub type FallbackView = Arc<dyn Fn(&Denial) -> Response + Send + Sync>;

pub type PageGuard = RouteGuard<FallbackView>;

/// Resolved access for the request, available to handlers behind a guard.
#[derive(Debug, Clone)]
pub struct CurrentAccess {
    pub actor_id: ActorId,
    pub team_id: Option<TeamId>,
    pub resolved: ResolvedRole,
}

impl CurrentAccess {
    pub fn role(&self) -> Role {
        self.resolved.role
    }
}

/// Authenticates first, then resolves the role for `team_id`.
pub async fn resolve_request(
    state: &AppState,
    actor_id: Option<ActorId>,
    team_id: Option<TeamId>,
) -> (AccessState, Option<CurrentAccess>) {
    let identity = state.identity(actor_id);

    let actor_id = match identity.current_actor().await {
        Ok(Some(actor_id)) => actor_id,
        Ok(None) => return (AccessState::unauthenticated(), None),
        Err(err) => {
            tracing::warn!(error = %err, "identity lookup failed");
            let failed = AccessState {
                auth: AuthStatus::Pending,
                role: Resolution::Failed,
            };
            return (failed, None);
        }
    };

    let resolved = state
        .resolver(identity)
        .resolve_detailed(&actor_id, team_id.as_ref())
        .await;

    let access = AccessState::resolved(actor_id.clone(), resolved.role);
    let current = CurrentAccess {
        actor_id,
        team_id,
        resolved,
    };
    (access, Some(current))
}

#[derive(Clone)]
pub struct GuardedRoute {
    state: AppState,
    guard: Arc<PageGuard>,
}

impl GuardedRoute {
    pub fn new(state: AppState, guard: PageGuard) -> Self {
        Self {
            state,
            guard: Arc::new(guard),
        }
    }
}

/// Route-layer middleware enforcing a [`PageGuard`].
///
/// The team comes from the `team_id` path parameter; routes without one are
/// evaluated without team context.
pub async fn route_guard(State(route): State<GuardedRoute>, mut req: Request, next: Next) -> Response {
    let actor_id = route.state.jwt.actor_from_headers(req.headers());
    let team_id = team_from_path(&mut req).await;

    let (access, current) = resolve_request(&route.state, actor_id, team_id).await;

    match respond(route.guard.outcome(&access)) {
        Some(response) => response,
        None => {
            if let Some(current) = current {
                req.extensions_mut().insert(current);
            }
            next.run(req).await
        }
    }
}

async fn team_from_path(req: &mut Request) -> Option<TeamId> {
    let params = req.extract_parts::<RawPathParams>().await.ok()?;
    let raw = params
        .iter()
        .find(|(key, _)| *key == "team_id")
        .map(|(_, value)| value.to_string());
    TeamId::parse(raw.as_deref())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeniedResponse {
    pub error: &'static str,
    pub message: String,
    pub role: Role,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoadingResponse {
    pub status: &'static str,
}

/// `None` means the guarded content should render.
fn respond(outcome: GuardOutcome<'_, FallbackView>) -> Option<Response> {
    let response = match outcome {
        GuardOutcome::Render(_) => return None,
        GuardOutcome::Placeholder => (StatusCode::ACCEPTED, Json(LoadingResponse { status: "loading" })).into_response(),
        GuardOutcome::RedirectToSignIn(route) | GuardOutcome::Redirect(route) => Redirect::to(route).into_response(),
        GuardOutcome::FallbackView(view, denial) => view.as_ref()(&denial),
        GuardOutcome::AccessDenied(denial) => denied_response(&denial),
    };
    Some(response)
}

pub fn denied_response(denial: &Denial) -> Response {
    let body = DeniedResponse {
        error: "forbidden",
        message: denial.message(),
        role: denial.role,
    };
    (StatusCode::FORBIDDEN, Json(body)).into_response()
}
