use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::{Router, http::request::Parts};
use parking_lot::Mutex;
use tracing::{debug, info};
use trellis_acl::{AccessController, AccessControllerOptions};
use trellis_config::AppConfig;
use trellis_core::{AppError, Anonymous, ConfigError, IdentityResolver, RoleResolver};

use super::hooks::{CloseHook, MiddlewareFn, Phase, PhaseHook, RequestHook};
use super::plugin::{CorePlugin, Plugin};
use super::{App, AppInner};
use crate::context::RequestContext;
use crate::dispatch::{HtmlFormatter, JsonFormatter, ResponseDispatcher, ResponseFormatter};
use crate::resource::Resource;
use crate::route::Route;
use crate::view::{HandlebarsRenderer, TemplateRenderer};

/// Collects plugins, hooks, routes and collaborators, then assembles an [`App`].
///
/// Bootstrap order:
///
/// 1. role registry loaded
/// 2. plugin `init`, in registration order
/// 3. [`Phase::Configuration`]
/// 4. default `application/json` and `text/html` formatters, unless set
/// 5. [`Phase::BindMiddlewares`]
/// 6. [`Phase::BindRoutes`]
/// 7. resources expanded into routes
/// 8. route table validated
/// 9. templates loaded
/// 10. [`Phase::Bootstrap`]
pub struct AppBuilder {
    config: AppConfig,
    acl: Arc<AccessController>,
    plugins: Vec<Arc<dyn Plugin>>,
    phase_hooks: HashMap<Phase, Vec<PhaseHook>>,
    request_hooks: Vec<RequestHook>,
    close_hooks: Vec<CloseHook>,
    routes: Vec<Route>,
    resources: Vec<Resource>,
    formatters: HashMap<String, Arc<dyn ResponseFormatter>>,
    views: Option<Arc<dyn TemplateRenderer>>,
    identity_resolver: Arc<dyn IdentityResolver>,
    role_resolver: Arc<dyn RoleResolver>,
    middlewares: Vec<MiddlewareFn>,
}

impl AppBuilder {
    pub fn new(config: AppConfig) -> Self {
        let acl = Arc::new(AccessController::new(AccessControllerOptions {
            disabled: config.acl_disabled,
            source: config.acl_file.clone(),
        }));

        Self {
            config,
            acl,
            plugins: vec![Arc::new(CorePlugin)],
            phase_hooks: HashMap::new(),
            request_hooks: Vec::new(),
            close_hooks: Vec::new(),
            routes: Vec::new(),
            resources: Vec::new(),
            formatters: HashMap::new(),
            views: None,
            identity_resolver: Arc::new(Anonymous),
            role_resolver: Arc::new(Anonymous),
            middlewares: Vec::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn acl(&self) -> &Arc<AccessController> {
        &self.acl
    }

    /// Adds a plugin, replacing any plugin with the same name in place.
    pub fn add_plugin(&mut self, plugin: impl Plugin + 'static) -> &mut Self {
        let plugin: Arc<dyn Plugin> = Arc::new(plugin);
        match self.plugins.iter_mut().find(|p| p.name() == plugin.name()) {
            Some(existing) => *existing = plugin,
            None => self.plugins.push(plugin),
        }
        self
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    /// Registers a hook for a bootstrap phase.
    pub fn on<F>(&mut self, phase: Phase, hook: F) -> &mut Self
    where
        F: FnMut(&mut AppBuilder) -> anyhow::Result<()> + Send + 'static,
    {
        self.phase_hooks.entry(phase).or_default().push(Box::new(hook));
        self
    }

    /// Registers a hook that can adjust every request context before routing.
    pub fn on_request<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut RequestContext, &Parts) -> Result<(), AppError> + Send + Sync + 'static,
    {
        self.request_hooks.push(Arc::new(hook));
        self
    }

    /// Registers a shutdown hook, run by [`App::close`].
    pub fn on_close<F>(&mut self, hook: F) -> &mut Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.close_hooks.push(Box::new(hook));
        self
    }

    /// Inserts a route, replacing any route with the same name.
    pub fn set_route(&mut self, route: Route) -> &mut Self {
        match self.routes.iter_mut().find(|r| r.name == route.name) {
            Some(existing) => *existing = route,
            None => self.routes.push(route),
        }
        self
    }

    pub fn set_resource(&mut self, resource: Resource) -> &mut Self {
        match self.resources.iter_mut().find(|r| r.name == resource.name) {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
        self
    }

    pub fn set_response_formatter(
        &mut self,
        content_type: &str,
        formatter: impl ResponseFormatter + 'static,
    ) -> &mut Self {
        self.formatters
            .insert(content_type.to_ascii_lowercase(), Arc::new(formatter));
        self
    }

    pub fn remove_response_formatter(&mut self, content_type: &str) -> &mut Self {
        self.formatters.remove(&content_type.to_ascii_lowercase());
        self
    }

    pub fn set_template_renderer(&mut self, views: impl TemplateRenderer + 'static) -> &mut Self {
        self.views = Some(Arc::new(views));
        self
    }

    pub fn set_identity_resolver(&mut self, resolver: Arc<dyn IdentityResolver>) -> &mut Self {
        self.identity_resolver = resolver;
        self
    }

    pub fn set_role_resolver(&mut self, resolver: Arc<dyn RoleResolver>) -> &mut Self {
        self.role_resolver = resolver;
        self
    }

    pub fn add_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(Router) -> Router + Send + Sync + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    fn run_phase(&mut self, phase: Phase) -> Result<(), ConfigError> {
        let mut hooks = self.phase_hooks.remove(&phase).unwrap_or_default();
        debug!(phase = %phase, hooks = hooks.len(), "Running phase");

        for hook in hooks.iter_mut() {
            hook(self).map_err(|source| ConfigError::Hook {
                phase: phase.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    fn init_plugins(&mut self) -> Result<(), ConfigError> {
        // Index loop: a plugin may register further plugins during init.
        let mut index = 0;
        while index < self.plugins.len() {
            let plugin = Arc::clone(&self.plugins[index]);
            debug!(plugin = plugin.name(), "Initialising plugin");
            plugin.init(self).map_err(|source| ConfigError::Plugin {
                plugin: plugin.name().to_string(),
                source,
            })?;
            index += 1;
        }
        Ok(())
    }

    fn validate_routes(&self) -> Result<(), ConfigError> {
        let mut seen: HashMap<(&str, &str), &str> = HashMap::new();
        for route in &self.routes {
            if route.path.is_empty() || !route.path.starts_with('/') {
                return Err(ConfigError::InvalidRoutePath {
                    name: route.name.clone(),
                    path: route.path.clone(),
                });
            }

            if let Some(existing) =
                seen.insert((route.method.as_str(), route.path.as_str()), route.name.as_str())
            {
                return Err(ConfigError::DuplicateRoute {
                    name: route.name.clone(),
                    existing: existing.to_string(),
                    method: route.method.to_string(),
                    path: route.path.clone(),
                });
            }
        }
        Ok(())
    }

    fn load_templates(&self) -> Result<Arc<dyn TemplateRenderer>, ConfigError> {
        if let Some(views) = &self.views {
            return Ok(Arc::clone(views));
        }

        let renderer = if self.config.template_disabled {
            HandlebarsRenderer::empty(&self.config.theme)
        } else {
            HandlebarsRenderer::from_directory(&self.config.template_folder, &self.config.theme)?
        };
        Ok(Arc::new(renderer))
    }

    /// Runs the bootstrap sequence and freezes the result.
    pub fn bootstrap(mut self) -> Result<App, ConfigError> {
        self.acl.load_roles()?;
        self.init_plugins()?;
        self.run_phase(Phase::Configuration)?;

        let layout = self.config.layout.clone();
        self.formatters
            .entry("application/json".to_string())
            .or_insert_with(|| Arc::new(JsonFormatter));
        self.formatters
            .entry("text/html".to_string())
            .or_insert_with(|| Arc::new(HtmlFormatter::new(layout)));

        self.run_phase(Phase::BindMiddlewares)?;
        self.run_phase(Phase::BindRoutes)?;

        for resource in std::mem::take(&mut self.resources) {
            for route in resource.routes() {
                self.set_route(route);
            }
        }

        self.validate_routes()?;
        let views = self.load_templates()?;
        self.views = Some(Arc::clone(&views));

        self.run_phase(Phase::Bootstrap)?;
        // Routes added by bootstrap hooks are checked too.
        self.validate_routes()?;

        let routes: BTreeMap<String, Arc<Route>> = self
            .routes
            .into_iter()
            .map(|r| (r.name.clone(), Arc::new(r)))
            .collect();
        let plugins: HashSet<String> = self.plugins.iter().map(|p| p.name().to_string()).collect();

        info!(
            routes = routes.len(),
            plugins = ?plugins,
            acl_disabled = self.acl.is_disabled(),
            "Application bootstrapped"
        );

        let dispatcher = ResponseDispatcher::new(self.formatters, views, self.config.layout.clone());

        Ok(App {
            inner: Arc::new(AppInner {
                config: self.config,
                acl: self.acl,
                dispatcher,
                identity_resolver: self.identity_resolver,
                role_resolver: self.role_resolver,
                request_hooks: self.request_hooks,
                routes,
                plugins,
                middlewares: self.middlewares,
                close_hooks: Mutex::new(self.close_hooks),
            }),
        })
    }
}
