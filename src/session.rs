//! Explicit session context handed to every backend call

use crate::config::ConsoleConfig;

/// Environment variable overriding the session user
pub const USER_ENV: &str = "PLANNING_CONSOLE_USER";

/// User the console acts as when nothing else is configured
const DEFAULT_USER: &str = "admin";

/// Who is making requests
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub user: String,
}

impl Session {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into().trim().to_string(),
        }
    }

    /// Build the session from config, letting the environment override it
    pub fn from_config(config: &ConsoleConfig) -> Self {
        let user = std::env::var(USER_ENV)
            .ok()
            .or_else(|| config.user.clone())
            .unwrap_or_else(|| DEFAULT_USER.to_string());
        Self::new(user)
    }

    /// Whether requests can be attributed to someone
    pub fn is_signed_in(&self) -> bool {
        !self.user.is_empty()
    }
}
