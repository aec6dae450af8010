//! # Trellis Config
//!
//! Configuration types for Trellis applications.
//!
//! Every structure is loaded from environment variables and falls back to
//! development defaults when a variable is unset or cannot be parsed:
//!
//! - [`app`]: listener, content negotiation, ACL and view settings
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`jwt`]: bearer token configuration
//!
//! # Example
//!
//! ```ignore
//! use trellis_config::AppConfig;
//!
//! dotenvy::dotenv().ok();
//! let config = AppConfig::from_env();
//! println!("listening on {}", config.port);
//! ```

pub mod app;
pub mod cors;
pub mod jwt;

// Re-export commonly used types at crate root
pub use app::AppConfig;
pub use cors::CorsConfig;
pub use jwt::JwtConfig;

use std::env;

pub(crate) fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub(crate) fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => parse_bool(&v).unwrap_or_else(|| {
            tracing::warn!(key, value = %v, default, "Ignoring unrecognised boolean");
            default
        }),
        Err(_) => default,
    }
}

pub(crate) fn env_list(key: &str, default: &str) -> Vec<String> {
    split_list(&env_or(key, default))
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" 1 "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(
            split_list("text/html, application/json,,"),
            vec!["text/html".to_string(), "application/json".to_string()]
        );
        assert!(split_list("").is_empty());
    }
}
