// Bearer credential passed explicitly into channel and device requests

use crate::config::SessionConfig;

/// Environment variable that overrides `session.token`.
pub const TOKEN_ENV: &str = "LIVETRAFFIC_TOKEN";

#[derive(Clone)]
pub struct SessionContext {
    token: String,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl SessionContext {
    pub fn new(token: impl Into<String>) -> anyhow::Result<Self> {
        let token = token.into();
        anyhow::ensure!(!token.trim().is_empty(), "bearer token must be non-empty");
        Ok(Self { token })
    }

    /// Token from `LIVETRAFFIC_TOKEN`, falling back to `session.token`.
    pub fn from_config(config: &SessionConfig) -> anyhow::Result<Self> {
        let env_token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self::resolve(env_token, config.token.clone())
    }

    fn resolve(env_token: Option<String>, config_token: Option<String>) -> anyhow::Result<Self> {
        match env_token.or(config_token) {
            Some(token) => Self::new(token),
            None => anyhow::bail!("no bearer token: set session.token or {}", TOKEN_ENV),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}
