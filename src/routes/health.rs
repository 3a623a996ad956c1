use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub db_ok: bool,
    pub db_error: Option<String>,
    /// Upper bound for each role lookup, in milliseconds.
    pub role_lookup_timeout_ms: u64,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses((status = 200, description = "Health check", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_error = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&state.pool)
        .await
        .err()
        .map(|err| err.to_string());

    if let Some(err) = &db_error {
        tracing::warn!(error = %err, "health check: database unreachable");
    }

    Json(HealthResponse {
        status: "ok",
        db_ok: db_error.is_none(),
        db_error,
        role_lookup_timeout_ms: state.config.lookup_timeout.as_millis() as u64,
    })
}
