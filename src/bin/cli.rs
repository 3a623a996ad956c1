use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use team_access::authz::{capabilities_for, ActorId, Role, RoleResolver, TeamId};
use team_access::jwt::JwtConfig;
use team_access::stores::{SqliteIdentityStore, SqliteTeamRoleStore};

#[derive(Parser, Debug)]
#[command(author, version, about = "team-access administration tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty migration with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Roll back the last applied migration
    MigrateRollback,
    /// Assign a role to an actor within a team, replacing any previous one
    Assign { actor_id: String, team_id: String, role: Role },
    /// Remove an actor's explicit role in a team
    Revoke { actor_id: String, team_id: String },
    /// Set or clear the legacy, team-independent role on an actor profile
    SetLegacyRole {
        actor_id: String,
        /// Omit to clear the field
        role: Option<String>,
    },
    /// Print the effective role and capabilities of an actor
    Resolve { actor_id: String, team: Option<String> },
    /// Sign a bearer token for local development
    IssueDevToken { actor_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The binary CWD may differ from the crate root, so fall back to the crate-local `.env`.
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MakeMigration { name } => {
            let path = make_migration_file(&name)?;
            println!("Created migration: {}", path.display());
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::MigrateRollback => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator
                .undo(&pool, 1)
                .await
                .context("no migrations were rolled back")?;
            println!("Rolled back last migration");
        }
        Commands::Assign { actor_id, team_id, role } => {
            let pool = get_pool().await?;
            let team_id = parse_team(&team_id)?;
            SqliteTeamRoleStore::new(pool)
                .assign(&ActorId::new(actor_id.as_str()), &team_id, role)
                .await?;
            println!("Assigned {} to {} in {}", role, actor_id, team_id);
        }
        Commands::Revoke { actor_id, team_id } => {
            let pool = get_pool().await?;
            let team_id = parse_team(&team_id)?;
            let removed = SqliteTeamRoleStore::new(pool)
                .remove(&ActorId::new(actor_id.as_str()), &team_id)
                .await?;
            if removed {
                println!("Revoked role of {} in {}", actor_id, team_id);
            } else {
                println!("{} had no explicit role in {}", actor_id, team_id);
            }
        }
        Commands::SetLegacyRole { actor_id, role } => {
            let pool = get_pool().await?;
            SqliteIdentityStore::new(pool)
                .set_legacy_role(&ActorId::new(actor_id.as_str()), role.as_deref())
                .await?;
            println!("Legacy role of {} set to {}", actor_id, role.as_deref().unwrap_or("<none>"));
        }
        Commands::Resolve { actor_id, team } => {
            let pool = get_pool().await?;
            let actor_id = ActorId::new(actor_id);
            let team_id = TeamId::parse(team.as_deref());

            let identity = Arc::new(SqliteIdentityStore::new(pool.clone()).with_current_actor(Some(actor_id.clone())));
            let resolver = RoleResolver::standard(Arc::new(SqliteTeamRoleStore::new(pool)), identity);
            let resolved = resolver.resolve_detailed(&actor_id, team_id.as_ref()).await;

            println!("{:<14} {}", "role", resolved.role);
            println!("{:<14} {}", "source", resolved.source);
            println!("{:<14} {:?}", "capabilities", capabilities_for(resolved.role));
        }
        Commands::IssueDevToken { actor_id } => {
            let jwt = JwtConfig::from_env()?;
            println!("{}", jwt.encode(&ActorId::new(actor_id))?);
        }
    }

    Ok(())
}

fn parse_team(raw: &str) -> anyhow::Result<TeamId> {
    TeamId::parse(Some(raw)).context("team id must not be blank")
}

fn make_migration_file(name: &str) -> anyhow::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y_%m_%d_%H%M%S");
    let sanitized = sanitize_name(name);
    let filename = format!("{}_{}.sql", timestamp, sanitized);
    let path = Path::new("migrations").join(filename);

    if path.exists() {
        anyhow::bail!("migration already exists: {}", path.display());
    }

    fs::write(&path, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", path.display()))?;

    Ok(path)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // Nothing is applied until the migrations table exists
    let db_applied = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
        .fetch_optional(pool)
        .await?;
    let applied_versions: HashSet<i64> = if db_applied.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let version = migration.version;
        let applied = applied_versions.contains(&version);
        let status = if applied { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if !desc.is_empty() {
            desc
        } else {
            "unknown"
        };
        println!("{:<8} {:<20} {}", status, version, name);
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // Prefer ./migrations, then the crate-local folder.
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
