//! Routing of handler outcomes to formatters or the error handler.
//!
//! - [`formatter`]: the [`ResponseFormatter`] contract and the JSON/HTML defaults
//! - [`error_handler`]: status mapping, logging and rendering of [`AppError`]s

pub mod error_handler;
pub mod formatter;

use std::collections::HashMap;
use std::sync::Arc;

use axum::response::Response;
use trellis_core::{AppError, ConfigError};

use crate::context::RequestContext;
use crate::route::{Reply, Route};
use crate::view::TemplateRenderer;

pub use error_handler::handle_error;
pub use formatter::{HtmlFormatter, JsonFormatter, ResponseFormatter, TEMPLATE_NOT_SET};

/// Formatter registry keyed by lowercase media type. Read-only after bootstrap.
pub struct ResponseDispatcher {
    formatters: HashMap<String, Arc<dyn ResponseFormatter>>,
    views: Arc<dyn TemplateRenderer>,
    layout: String,
}

impl ResponseDispatcher {
    pub fn new(
        formatters: HashMap<String, Arc<dyn ResponseFormatter>>,
        views: Arc<dyn TemplateRenderer>,
        layout: impl Into<String>,
    ) -> Self {
        let formatters = formatters
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        Self {
            formatters,
            views,
            layout: layout.into(),
        }
    }

    pub fn formatter(&self, content_type: &str) -> Option<&Arc<dyn ResponseFormatter>> {
        self.formatters.get(&content_type.to_ascii_lowercase())
    }

    pub fn views(&self) -> &dyn TemplateRenderer {
        self.views.as_ref()
    }

    /// Renders a handler outcome.
    ///
    /// A success with no formatter for the negotiated type is a
    /// configuration error and becomes a 500.
    pub fn dispatch(
        &self,
        ctx: &mut RequestContext,
        route: &Route,
        outcome: Result<Reply, AppError>,
    ) -> Response {
        let reply = match outcome {
            Ok(reply) => reply,
            Err(err) => return self.dispatch_error(err, ctx),
        };

        let Some(formatter) = self.formatter(ctx.content_type()) else {
            let err = ConfigError::MissingFormatter(ctx.content_type().to_string());
            return self.dispatch_error(AppError::internal(err), ctx);
        };

        match formatter.format(ctx, route, reply, self.views.as_ref()) {
            Ok(response) => response,
            Err(err) => self.dispatch_error(err, ctx),
        }
    }

    pub fn dispatch_error(&self, err: AppError, ctx: &mut RequestContext) -> Response {
        handle_error(err, ctx, self.views.as_ref(), &self.layout)
    }
}
