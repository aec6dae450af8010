//! Application assembly and the per-route request adapter.
//!
//! - [`builder`]: [`AppBuilder`] and the bootstrap sequence
//! - [`hooks`]: [`Phase`] and hook signatures
//! - [`plugin`]: the [`Plugin`] contract and the [`CorePlugin`]

pub mod builder;
pub mod hooks;
pub mod plugin;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::{
    Router,
    body::to_bytes,
    extract::{FromRequestParts, Query, RawPathParams, Request},
    http::{header::ACCEPT, request::Parts},
    middleware::from_fn_with_state,
    response::Response,
    routing::{MethodRouter, get},
};
use parking_lot::Mutex;
use tracing::{debug, warn};
use trellis_acl::AccessController;
use trellis_config::AppConfig;
use trellis_core::{AppError, IdentityResolver, RoleResolver};

use crate::context::{ContextSeed, RequestContext};
use crate::dispatch::ResponseDispatcher;
use crate::middleware::request_context;
use crate::negotiation::negotiate;
use crate::route::{Route, RouteInput};

pub use builder::AppBuilder;
pub use hooks::{CloseHook, MiddlewareFn, Phase, PhaseHook, RequestHook};
pub use plugin::{CORE_PLUGIN, CorePlugin, Plugin};

/// Largest request body handed to a route handler.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub(crate) struct AppInner {
    pub(crate) config: AppConfig,
    pub(crate) acl: Arc<AccessController>,
    pub(crate) dispatcher: ResponseDispatcher,
    pub(crate) identity_resolver: Arc<dyn IdentityResolver>,
    pub(crate) role_resolver: Arc<dyn RoleResolver>,
    pub(crate) request_hooks: Vec<RequestHook>,
    pub(crate) routes: BTreeMap<String, Arc<Route>>,
    pub(crate) plugins: HashSet<String>,
    pub(crate) middlewares: Vec<MiddlewareFn>,
    pub(crate) close_hooks: Mutex<Vec<CloseHook>>,
}

/// A bootstrapped application. Cheap to clone; the route table and
/// formatter registry are read-only from here on.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

impl App {
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Shared handle to the role registry, for administrative updates at runtime.
    pub fn acl(&self) -> &Arc<AccessController> {
        &self.inner.acl
    }

    pub fn dispatcher(&self) -> &ResponseDispatcher {
        &self.inner.dispatcher
    }

    pub fn route(&self, name: &str) -> Option<&Route> {
        self.inner.routes.get(name).map(Arc::as_ref)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.inner.routes.values().map(Arc::as_ref)
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.inner.plugins.contains(name)
    }

    /// Builds the context for a request: negotiation, identity, roles, query.
    pub fn build_context(&self, parts: &Parts) -> RequestContext {
        let config = &self.inner.config;

        let accept = parts.headers.get(ACCEPT).and_then(|v| v.to_str().ok());
        let content_type = negotiate(accept, &config.content_types, &config.default_content_type);

        let identity = self.inner.identity_resolver.resolve_identity(parts);
        let roles = self
            .inner
            .role_resolver
            .resolve_roles(parts, identity.as_ref());

        let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();

        RequestContext::new(
            ContextSeed {
                content_type,
                identity,
                roles,
                query,
                theme: config.theme.clone(),
                base_url: config.base_url.clone(),
                method: parts.method.clone(),
                path: parts.uri.path().to_string(),
            },
            Arc::clone(&self.inner.acl),
        )
    }

    /// Runs request hooks in registration order. The first error wins.
    pub(crate) fn run_request_hooks(
        &self,
        ctx: &mut RequestContext,
        parts: &Parts,
    ) -> Result<(), AppError> {
        for hook in &self.inner.request_hooks {
            hook(ctx, parts)?;
        }
        Ok(())
    }

    fn take_context(&self, parts: &mut Parts) -> RequestContext {
        parts
            .extensions
            .remove::<RequestContext>()
            .unwrap_or_else(|| self.build_context(parts))
    }

    /// Adapter between axum and a [`Route`]: content-type restriction,
    /// permission check, input decoding, handler call, dispatch.
    pub async fn handle(&self, route: &Route, req: Request) -> Response {
        let dispatcher = &self.inner.dispatcher;
        let (mut parts, body) = req.into_parts();
        let mut ctx = self.take_context(&mut parts);
        ctx.set_route_name(&route.name);

        if let Some(only) = &route.accept_only {
            if !only.eq_ignore_ascii_case(ctx.content_type()) {
                return dispatcher.dispatch_error(AppError::not_acceptable(), &mut ctx);
            }
        }

        if !route.is_public() && !ctx.can(&route.permission) {
            debug!(
                route = %route.name,
                permission = %route.permission,
                roles = ?ctx.roles(),
                "Permission denied"
            );
            return dispatcher.dispatch_error(AppError::forbidden(), &mut ctx);
        }

        let params = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(raw) => raw
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            Err(rejection) => {
                let err = AppError::bad_request("Invalid path parameters")
                    .with_internal(anyhow::anyhow!("{}", rejection));
                return dispatcher.dispatch_error(err, &mut ctx);
            }
        };

        let body = match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = AppError::bad_request("Request body too large or unreadable")
                    .with_internal(e);
                return dispatcher.dispatch_error(err, &mut ctx);
            }
        };

        let input = RouteInput {
            method: parts.method,
            path: parts.uri.path().to_string(),
            params,
            query: ctx.query().clone(),
            headers: parts.headers,
            body,
        };

        let outcome = route.handler.call(&mut ctx, input).await;
        dispatcher.dispatch(&mut ctx, route, outcome)
    }

    /// Dispatches a 404 for requests no route matched.
    pub async fn not_found(&self, req: Request) -> Response {
        self.reject(req, AppError::not_found())
    }

    /// Dispatches a 405 for a known path requested with an unbound method.
    pub async fn method_not_allowed(&self, req: Request) -> Response {
        self.reject(req, AppError::method_not_allowed())
    }

    fn reject(&self, req: Request, err: AppError) -> Response {
        let (mut parts, _body) = req.into_parts();
        let mut ctx = self.take_context(&mut parts);
        self.inner.dispatcher.dispatch_error(err, &mut ctx)
    }

    /// Assembles the axum router from the route table.
    ///
    /// Routes sharing a path are merged into one method router. `GET /health`
    /// is added unless a route already claims it. Unmatched paths and unbound
    /// methods go through the error handler. Middleware transforms run
    /// in registration order, then the request-context layer wraps everything.
    pub fn router(&self) -> Router {
        let mut by_path: BTreeMap<&str, MethodRouter> = BTreeMap::new();

        for route in self.inner.routes.values() {
            let app = self.clone();
            let bound = Arc::clone(route);
            let handler = move |req: Request| {
                let app = app.clone();
                let route = Arc::clone(&bound);
                async move { app.handle(&route, req).await }
            };

            let method_router = by_path.remove(route.path.as_str()).unwrap_or_default();
            by_path.insert(route.path.as_str(), method_router.on(route.method.filter(), handler));
        }

        let has_health = by_path.contains_key("/health");
        let mut router = Router::new();
        for (path, method_router) in by_path {
            router = router.route(path, method_router);
        }

        if !has_health {
            router = router.route("/health", get(|| async { "ok" }));
        }

        let app = self.clone();
        router = router.fallback(move |req: Request| {
            let app = app.clone();
            async move { app.not_found(req).await }
        });

        let app = self.clone();
        router = router.method_not_allowed_fallback(move |req: Request| {
            let app = app.clone();
            async move { app.method_not_allowed(req).await }
        });

        for middleware in &self.inner.middlewares {
            router = middleware(router);
        }

        router.layer(from_fn_with_state(self.clone(), request_context))
    }

    /// Runs shutdown hooks once, in registration order.
    pub fn close(&self) -> anyhow::Result<()> {
        let hooks = std::mem::take(&mut *self.inner.close_hooks.lock());
        for hook in hooks {
            if let Err(e) = hook() {
                warn!(error = %e, "Close hook failed");
                return Err(e);
            }
        }
        Ok(())
    }
}
