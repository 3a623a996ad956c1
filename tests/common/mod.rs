#![allow(dead_code)]

use std::path::Path;

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;

use team_access::authz::ActorId;
use team_access::config::AccessConfig;
use team_access::jwt::JwtConfig;
use team_access::{build_router, AppState};

pub const SECRET: &str = "test-secret";

/// A migrated SQLite database in a temp dir. Keep the guard alive for the test.
pub async fn test_pool(name: &str) -> Result<(TempDir, SqlitePool)> {
    let dir = tempfile::tempdir()?;
    let opts = SqliteConnectOptions::new()
        .filename(dir.path().join(name))
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")).await?;
    migrator.run(&pool).await?;

    Ok((dir, pool))
}

pub fn app(pool: SqlitePool) -> Router {
    build_router(AppState::new(pool, JwtConfig::new(SECRET), AccessConfig::default()))
}

pub fn token(actor_id: &str) -> Result<String> {
    Ok(JwtConfig::new(SECRET).encode(&ActorId::new(actor_id))?)
}

pub fn get(uri: &str, actor_id: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(actor_id) = actor_id {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(actor_id)?));
    }
    Ok(builder.body(Body::empty())?)
}

pub async fn json_body(resp: Response) -> Result<Value> {
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
