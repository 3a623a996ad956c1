//! Enforcement layer
//!
//! Two consumers of the same access decision with different terminal behavior:
//! - [`RouteGuard`] gates whole pages and explains or redirects on denial
//! - [`ContentGate`] gates fragments and omits them without a trace

mod content;
pub mod http;
mod route;

pub use content::ContentGate;
pub use route::{GuardOutcome, GuardState, RouteGuard, DEFAULT_SIGN_IN_ROUTE};
