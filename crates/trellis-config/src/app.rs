//! Application-level settings.
//!
//! | variable | default |
//! |---|---|
//! | `PORT` | `8080` |
//! | `PROTOCOL`, `DOMAIN` | `http`, `localhost` |
//! | `BASE_URL` | `<PROTOCOL>://<DOMAIN>:<PORT>` |
//! | `DEFAULT_CONTENT_TYPE` | `application/json` |
//! | `CONTENT_TYPES` | `text/html,application/json` |
//! | `ACL_FILE` | `acl.json` |
//! | `ACL_DISABLED` | `false` |
//! | `THEME` | `site` |
//! | `TEMPLATE_FOLDER` | `./themes` |
//! | `TEMPLATE_DISABLE` | `false` |
//! | `DEFAULT_LAYOUT` | `layouts/default` |
//! | `GO_ENV` / `APP_ENV` | `development` |

use std::path::PathBuf;

use crate::{CorsConfig, JwtConfig, env_bool, env_list, env_or, env_parse};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub base_url: String,
    /// Used when negotiation finds no match.
    pub default_content_type: String,
    /// Offered media types, in preference order.
    pub content_types: Vec<String>,
    pub acl_file: PathBuf,
    pub acl_disabled: bool,
    pub theme: String,
    pub template_folder: PathBuf,
    pub template_disabled: bool,
    pub layout: String,
    pub env: String,
    pub cors: CorsConfig,
    pub jwt: JwtConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            base_url: "http://localhost:8080".to_string(),
            default_content_type: "application/json".to_string(),
            content_types: vec!["text/html".to_string(), "application/json".to_string()],
            acl_file: PathBuf::from("acl.json"),
            acl_disabled: false,
            theme: "site".to_string(),
            template_folder: PathBuf::from("./themes"),
            template_disabled: false,
            layout: "layouts/default".to_string(),
            env: "development".to_string(),
            cors: CorsConfig::default(),
            jwt: JwtConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env_parse("PORT", defaults.port);
        let protocol = env_or("PROTOCOL", "http");
        let domain = env_or("DOMAIN", "localhost");
        let base_url = env_or("BASE_URL", &format!("{}://{}:{}", protocol, domain, port));

        let env = std::env::var("APP_ENV")
            .or_else(|_| std::env::var("GO_ENV"))
            .unwrap_or(defaults.env);

        Self {
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_content_type: env_or("DEFAULT_CONTENT_TYPE", &defaults.default_content_type),
            content_types: env_list("CONTENT_TYPES", &defaults.content_types.join(",")),
            acl_file: PathBuf::from(env_or("ACL_FILE", "acl.json")),
            acl_disabled: env_bool("ACL_DISABLED", defaults.acl_disabled),
            theme: env_or("THEME", &defaults.theme),
            template_folder: PathBuf::from(env_or("TEMPLATE_FOLDER", "./themes")),
            template_disabled: env_bool("TEMPLATE_DISABLE", defaults.template_disabled),
            layout: env_or("DEFAULT_LAYOUT", &defaults.layout),
            env,
            cors: CorsConfig::from_env(),
            jwt: JwtConfig::from_env(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }

    /// Config for tests and embedding: no templates, ACL read from `acl_file`.
    pub fn for_testing() -> Self {
        Self {
            template_disabled: true,
            env: "test".to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_content_type, "application/json");
        assert_eq!(config.content_types, vec!["text/html", "application/json"]);
        assert_eq!(config.layout, "layouts/default");
        assert!(!config.acl_disabled);
        assert!(!config.is_production());
    }

    #[test]
    fn test_for_testing_disables_templates() {
        let config = AppConfig::for_testing();
        assert!(config.template_disabled);
        assert_eq!(config.env, "test");
    }
}
