use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use trellis_core::AppError;

use crate::context::RequestContext;
use crate::route::{Reply, Route};
use crate::view::{TemplateContext, TemplateRenderer, render_page};

/// Template used when neither the request nor the route names one.
pub const TEMPLATE_NOT_SET: &str = "template-not-set";

/// Renders a successful reply for one media type.
///
/// `views` is the application's template renderer.
pub trait ResponseFormatter: Send + Sync {
    fn format(
        &self,
        ctx: &RequestContext,
        route: &Route,
        reply: Reply,
        views: &dyn TemplateRenderer,
    ) -> Result<Response, AppError>;
}

impl<F> ResponseFormatter for F
where
    F: Fn(&RequestContext, &Route, Reply) -> Result<Response, AppError> + Send + Sync,
{
    fn format(
        &self,
        ctx: &RequestContext,
        route: &Route,
        reply: Reply,
        _views: &dyn TemplateRenderer,
    ) -> Result<Response, AppError> {
        self(ctx, route, reply)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl ResponseFormatter for JsonFormatter {
    fn format(
        &self,
        _ctx: &RequestContext,
        _route: &Route,
        reply: Reply,
        _views: &dyn TemplateRenderer,
    ) -> Result<Response, AppError> {
        if reply.status == StatusCode::NO_CONTENT {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
        Ok((reply.status, Json(reply.data)).into_response())
    }
}

/// Renders the request or route template inside the route or default layout.
#[derive(Debug, Clone)]
pub struct HtmlFormatter {
    layout: String,
}

impl HtmlFormatter {
    pub fn new(layout: impl Into<String>) -> Self {
        Self {
            layout: layout.into(),
        }
    }
}

impl ResponseFormatter for HtmlFormatter {
    fn format(
        &self,
        ctx: &RequestContext,
        route: &Route,
        reply: Reply,
        views: &dyn TemplateRenderer,
    ) -> Result<Response, AppError> {
        let template = ctx
            .template()
            .or_else(|| Some(route.template.as_str()).filter(|t| !t.is_empty()))
            .unwrap_or(TEMPLATE_NOT_SET);
        let layout = route.layout.as_deref().unwrap_or(&self.layout);

        let data = TemplateContext::new(ctx, &reply.data, reply.status.as_u16()).to_value();
        let body = render_page(views, ctx.theme(), template, Some(layout), &data)
            .map_err(AppError::internal)?;

        Ok((reply.status, Html(body)).into_response())
    }
}
