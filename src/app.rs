use std::sync::Arc;

use axum::http::Method;
use axum::middleware;
use axum::routing::get;
use axum::{Extension, Router};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{ActorId, RoleResolver};
use crate::config::AccessConfig;
use crate::errors::AppError;
use crate::guard::http::{route_guard, GuardedRoute, PageGuard};
use crate::jwt::JwtConfig;
use crate::routes::pages::PageView;
use crate::routes::{access, health, pages};
use crate::stores::{SqliteIdentityStore, SqliteTeamRoleStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub config: Arc<AccessConfig>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, config: AccessConfig) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }

    /// Identity store for one request, scoped to the verified actor.
    pub fn identity(&self, actor_id: Option<ActorId>) -> Arc<SqliteIdentityStore> {
        Arc::new(SqliteIdentityStore::new(self.pool.clone()).with_current_actor(actor_id))
    }

    pub fn resolver(&self, identity: Arc<SqliteIdentityStore>) -> RoleResolver {
        let team_roles = Arc::new(SqliteTeamRoleStore::new(self.pool.clone()));
        RoleResolver::standard(team_roles, identity).with_lookup_timeout(self.config.lookup_timeout)
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let access_config = AccessConfig::from_env()?;
    Ok(build_router(AppState::new(pool, jwt_config, access_config)))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let team_routes = PageView::ALL.into_iter().fold(
        Router::new()
            .route("/access", get(access::team_access))
            .route("/navigation", get(access::navigation)),
        |router, view| router.merge(guarded_page(&state, view)),
    );

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/teams/:team_id", team_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn guarded_page(state: &AppState, view: PageView) -> Router<AppState> {
    let guard = PageGuard::from_requirement(view.requirement()).sign_in_route(state.config.sign_in_route.clone());
    let guarded = GuardedRoute::new(state.clone(), guard);
    Router::new()
        .route(view.path(), get(pages::page).layer(Extension(view)))
        .route_layer(middleware::from_fn_with_state(guarded, route_guard))
}
