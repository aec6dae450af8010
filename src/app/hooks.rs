use std::fmt;
use std::sync::Arc;

use axum::{Router, http::request::Parts};
use trellis_core::AppError;

use super::builder::AppBuilder;
use crate::context::RequestContext;

/// Application phases: `configuration`, `bindMiddlewares`, `bindRoutes`,
/// `bootstrap`, then `close`.
///
/// The first four are the variants below, fired once each in that order by
/// [`AppBuilder::bootstrap`]. Their hooks run synchronously in registration
/// order and the first failing hook aborts bootstrap.
///
/// `close` is the last phase. It has no variant: its hooks are registered
/// with [`AppBuilder::on_close`] and run by [`App::close`](super::App::close)
/// at shutdown, in registration order, stopping at the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Plugins are initialised; adjust configuration, formatters, resolvers.
    Configuration,
    /// Add router middleware.
    BindMiddlewares,
    /// Register routes and resources.
    BindRoutes,
    /// Routes are validated and templates loaded.
    Bootstrap,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::BindMiddlewares => "bindMiddlewares",
            Self::BindRoutes => "bindRoutes",
            Self::Bootstrap => "bootstrap",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type PhaseHook = Box<dyn FnMut(&mut AppBuilder) -> anyhow::Result<()> + Send>;

/// Runs after the request context is built and before the route handler.
/// An error is dispatched as the response.
pub type RequestHook =
    Arc<dyn Fn(&mut RequestContext, &Parts) -> Result<(), AppError> + Send + Sync>;

pub type CloseHook = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// Transforms the assembled router, usually by adding a layer.
pub type MiddlewareFn = Arc<dyn Fn(Router) -> Router + Send + Sync>;
