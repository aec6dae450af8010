use crate::{env_bool, env_list, env_parse};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
    /// Seconds browsers may cache a preflight response.
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allow_credentials: true,
            max_age: 18000,
        }
    }
}

impl CorsConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            allowed_origins: env_list("CORS_ALLOWED_ORIGINS", &defaults.allowed_origins.join(",")),
            allow_credentials: env_bool("CORS_ALLOW_CREDENTIALS", defaults.allow_credentials),
            max_age: env_parse("CORS_MAX_AGE", defaults.max_age),
        }
    }

    /// `*` in the origin list allows any origin.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}
