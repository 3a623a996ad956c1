use std::time::Duration;

use crate::authz::DEFAULT_LOOKUP_TIMEOUT;
use crate::errors::AppError;
use crate::guard::DEFAULT_SIGN_IN_ROUTE;

/// Enforcement settings read from the environment.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Where unauthenticated visitors of a guarded page are sent.
    pub sign_in_route: String,
    /// Upper bound for a single role-source lookup.
    pub lookup_timeout: Duration,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            sign_in_route: DEFAULT_SIGN_IN_ROUTE.to_string(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }
}

impl AccessConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AccessConfig::from_env`] with variables read through `var`.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let sign_in_route = var("SIGN_IN_ROUTE").unwrap_or(defaults.sign_in_route);
        if !sign_in_route.starts_with('/') {
            return Err(AppError::configuration("SIGN_IN_ROUTE must be an absolute path"));
        }

        let lookup_timeout = match var("ROLE_LOOKUP_TIMEOUT_MS") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| AppError::configuration("ROLE_LOOKUP_TIMEOUT_MS must be a valid integer"))?,
            None => defaults.lookup_timeout,
        };

        Ok(Self {
            sign_in_route,
            lookup_timeout,
        })
    }
}
