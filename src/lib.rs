//! # Trellis
//!
//! Request-handling core for modular HTTP applications built on Axum.
//!
//! Every request goes through the same pipeline:
//!
//! 1. a [`RequestContext`](context::RequestContext) is built: the `Accept`
//!    header is negotiated against the configured media types, identity and
//!    roles come from pluggable resolvers, and request hooks may adjust it
//! 2. the matched [`Route`](route::Route) checks its content-type restriction
//!    and required permission against the [`AccessController`](trellis_acl::AccessController)
//! 3. the handler runs and returns a [`Reply`](route::Reply) or an
//!    [`AppError`](trellis_core::AppError)
//! 4. the [`ResponseDispatcher`](dispatch::ResponseDispatcher) renders the
//!    reply with the formatter for the negotiated type, or renders the
//!    classified error as JSON or an HTML status page
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── app/           # AppBuilder, bootstrap phases, plugins, route adapter
//! ├── dispatch/      # formatters and the error handler
//! ├── middleware/    # request-context layer
//! ├── context.rs     # per-request state
//! ├── negotiation.rs # Accept header negotiation
//! ├── resource.rs    # CRUD resources
//! ├── route.rs       # routes, handlers, replies
//! ├── view.rs        # template rendering
//! ├── logging.rs     # tracing setup and request logging
//! └── metrics.rs     # Prometheus metrics
//! crates/
//! ├── trellis-core/   # errors, identity, pagination
//! ├── trellis-acl/    # roles and the access controller
//! ├── trellis-config/ # environment configuration
//! └── trellis-auth/   # JWT bearer tokens
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use trellis::{AppBuilder, Phase, Reply, Route, RouteMethod};
//! use trellis_config::AppConfig;
//!
//! let mut builder = AppBuilder::new(AppConfig::from_env());
//! builder.on(Phase::BindRoutes, |app| {
//!     app.set_route(
//!         Route::new("find_url", RouteMethod::Get, "/urls", list_urls)
//!             .permission("find_url")
//!             .template("url/query"),
//!     );
//!     Ok(())
//! });
//! let app = builder.bootstrap()?;
//! axum::serve(listener, app.router()).await?;
//! ```

pub mod app;
pub mod context;
pub mod dispatch;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod negotiation;
pub mod resource;
pub mod route;
pub mod view;

pub use app::{App, AppBuilder, CorePlugin, Phase, Plugin};
pub use context::{Metadata, RequestContext, ResponseMessage};
pub use dispatch::{ResponseDispatcher, ResponseFormatter};
pub use negotiation::{MediaFamily, negotiate};
pub use resource::{Controller, Resource};
pub use route::{Handler, HandlerFuture, Reply, Route, RouteInput, RouteMethod};
pub use view::{HandlebarsRenderer, TemplateRenderer};

// Re-export workspace crates for convenience
pub use trellis_acl;
pub use trellis_auth;
pub use trellis_config;
pub use trellis_core;
