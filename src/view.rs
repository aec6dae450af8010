//! Template rendering for HTML responses.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use handlebars::{DirectorySourceOptions, Handlebars};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use trellis_core::{ConfigError, Identity};

use std::collections::BTreeMap;

use crate::context::{Metadata, RequestContext, ResponseMessage};

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("template {name} not found in theme {theme}")]
    TemplateNotFound { theme: String, name: String },

    #[error("failed to render template {name}: {reason}")]
    Render { name: String, reason: String },
}

/// Renders named templates against JSON data.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, theme: &str, name: &str, data: &Value) -> Result<String, ViewError>;

    fn has_template(&self, theme: &str, name: &str) -> bool;
}

/// Block used to render `messages` into `responseMessages`.
pub const MESSAGES_TEMPLATE: &str = "blocks/response/messages";

/// Renders `template`, then wraps it in `layout` (as `content`) when the
/// layout exists.
///
/// When `data` carries `messages`, both templates also see them pre-rendered
/// as `responseMessages`.
pub fn render_page(
    renderer: &dyn TemplateRenderer,
    theme: &str,
    template: &str,
    layout: Option<&str>,
    data: &Value,
) -> Result<String, ViewError> {
    let mut page = match data {
        Value::Object(map) => map.clone(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other.clone());
            map
        }
    };
    let messages = match page.get("messages") {
        Some(Value::Object(messages)) => Some(render_messages(renderer, theme, messages)),
        _ => None,
    };
    if let Some(html) = messages {
        page.insert("responseMessages".to_string(), Value::String(html));
    }

    let content = if page.contains_key("responseMessages") {
        renderer.render(theme, template, &Value::Object(page.clone()))?
    } else {
        renderer.render(theme, template, data)?
    };

    let Some(layout) = layout.filter(|l| renderer.has_template(theme, l)) else {
        return Ok(content);
    };

    page.insert("content".to_string(), Value::String(content));
    renderer.render(theme, layout, &Value::Object(page))
}

/// Theme block when present, otherwise one `<div>type: message</div>` each.
/// A failing block is logged and renders nothing.
fn render_messages(renderer: &dyn TemplateRenderer, theme: &str, messages: &Map<String, Value>) -> String {
    if renderer.has_template(theme, MESSAGES_TEMPLATE) {
        let data = serde_json::json!({ "messages": messages });
        return renderer
            .render(theme, MESSAGES_TEMPLATE, &data)
            .unwrap_or_else(|err| {
                warn!(template = MESSAGES_TEMPLATE, error = %err, "Failed to render response messages");
                String::new()
            });
    }

    messages
        .values()
        .map(|m| {
            let field = |name: &str| m.get(name).and_then(Value::as_str).unwrap_or_default();
            format!(
                "<div>{}: {}</div>",
                handlebars::html_escape(field("type")),
                handlebars::html_escape(field("message"))
            )
        })
        .collect()
}

/// Variables exposed to every template.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateContext<'a> {
    pub data: &'a Value,
    pub status: u16,
    pub metadata: &'a Metadata,
    pub messages: &'a BTreeMap<String, ResponseMessage>,
    pub identity: Option<&'a Identity>,
    pub roles: &'a [String],
    pub is_authenticated: bool,
    pub base_url: &'a str,
    pub theme: &'a str,
    pub path: &'a str,
}

impl<'a> TemplateContext<'a> {
    pub fn new(ctx: &'a RequestContext, data: &'a Value, status: u16) -> Self {
        Self {
            data,
            status,
            metadata: ctx.metadata(),
            messages: ctx.response_messages(),
            identity: ctx.identity(),
            roles: ctx.roles(),
            is_authenticated: ctx.is_authenticated(),
            base_url: ctx.base_url(),
            theme: ctx.theme(),
            path: ctx.path(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Handlebars templates grouped by theme.
///
/// Each subdirectory of the template folder is a theme; templates are named
/// by their path relative to it without the `.hbs` extension, so
/// `themes/site/url/query.hbs` is `url/query` in theme `site`.
pub struct HandlebarsRenderer {
    themes: HashMap<String, Handlebars<'static>>,
    default_theme: String,
}

impl HandlebarsRenderer {
    /// No templates at all. Every render fails with `TemplateNotFound`.
    pub fn empty(default_theme: impl Into<String>) -> Self {
        Self {
            themes: HashMap::new(),
            default_theme: default_theme.into(),
        }
    }

    /// Loads every theme directory under `folder`. A missing folder yields an
    /// empty renderer.
    pub fn from_directory(
        folder: impl AsRef<Path>,
        default_theme: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let folder = folder.as_ref();
        let mut renderer = Self::empty(default_theme);

        let entries = match std::fs::read_dir(folder) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(folder = %folder.display(), error = %err, "Template folder not readable, HTML views disabled");
                return Ok(renderer);
            }
        };

        for entry in entries {
            let entry = entry.map_err(|e| templates_error(folder, e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let theme = entry.file_name().to_string_lossy().into_owned();
            let mut registry = new_registry();
            registry
                .register_templates_directory(&path, DirectorySourceOptions::default())
                .map_err(|e| templates_error(&path, e))?;

            debug!(theme = %theme, templates = registry.get_templates().len(), "Loaded theme");
            renderer.themes.insert(theme, registry);
        }

        Ok(renderer)
    }

    /// Registers in-memory templates for `theme`.
    pub fn from_templates<I, N, S>(theme: &str, templates: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<str>,
    {
        let mut registry = new_registry();
        for (name, source) in templates {
            registry
                .register_template_string(name.as_ref(), source.as_ref())
                .map_err(|e| templates_error(Path::new(name.as_ref()), e))?;
        }

        let mut renderer = Self::empty(theme);
        renderer.themes.insert(theme.to_string(), registry);
        Ok(renderer)
    }

    pub fn themes(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    fn registry(&self, theme: &str) -> Option<&Handlebars<'static>> {
        self.themes
            .get(theme)
            .or_else(|| self.themes.get(&self.default_theme))
    }
}

fn new_registry() -> Handlebars<'static> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(false);
    registry
}

fn templates_error(path: &Path, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Templates {
        path: PathBuf::from(path),
        reason: err.to_string(),
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, theme: &str, name: &str, data: &Value) -> Result<String, ViewError> {
        let registry = self
            .registry(theme)
            .filter(|r| r.has_template(name))
            .ok_or_else(|| ViewError::TemplateNotFound {
                theme: theme.to_string(),
                name: name.to_string(),
            })?;

        registry.render(name, data).map_err(|e| ViewError::Render {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    fn has_template(&self, theme: &str, name: &str) -> bool {
        self.registry(theme).is_some_and(|r| r.has_template(name))
    }
}
