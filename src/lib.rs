pub mod app;
pub mod authz;
pub mod config;
pub mod db;
pub mod docs;
pub mod errors;
pub mod guard;
pub mod jwt;
pub mod routes;
pub mod stores;
pub mod utils;

// Re-export commonly used items for tests
pub use app::{build_router, create_app, AppState};
pub use authz::{resolve_effective_role, Capability, Role, RoleResolver};
pub use guard::{ContentGate, RouteGuard};
