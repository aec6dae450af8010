//! Classified error rendering.

use axum::{
    Json,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{Html, IntoResponse, Response},
};
use tracing::{debug, error, info, warn};
use trellis_core::AppError;

use crate::context::RequestContext;
use crate::metrics::track_error_response;
use crate::negotiation::MediaFamily;
use crate::view::{TemplateContext, TemplateRenderer, render_page};

/// Page title and template for an error status in HTML responses.
fn html_page(status: StatusCode) -> (&'static str, &'static str) {
    match status.as_u16() {
        400 => ("Bad request", "400"),
        401 => ("Unauthorized", "401"),
        403 => ("Forbidden", "403"),
        404 => ("Not found", "404"),
        _ => ("Internal server error", "500"),
    }
}

fn log_error(err: &AppError, ctx: &RequestContext) {
    let status = err.status().as_u16();
    let identity = ctx.identity().map(|i| i.id.as_str());

    match status {
        500..=599 if err.is_unclassified() => {
            error!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                status,
                error = %err,
                "Unhandled error while serving request"
            );
        }
        500..=599 => {
            warn!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                status,
                error = %err,
                "Server error"
            );
        }
        401 | 403 => {
            info!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                status,
                identity = ?identity,
                roles = ?ctx.roles(),
                "Access denied"
            );
        }
        400 | 404 => {
            debug!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                status,
                error = %err,
                "Client error"
            );
        }
        _ => {
            warn!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                status,
                identity = ?identity,
                roles = ?ctx.roles(),
                error = %err,
                "Error with unmapped status code"
            );
        }
    }
}

/// Logs `err`, then renders it for the negotiated media type.
///
/// HTML renders the status template (`400`, `401`, `403`, `404`, else `500`)
/// with a page title in the metadata. Everything else gets the JSON body.
/// Internal causes never reach the body.
pub fn handle_error(
    err: AppError,
    ctx: &mut RequestContext,
    views: &dyn TemplateRenderer,
    layout: &str,
) -> Response {
    let status = err.status();
    log_error(&err, ctx);
    track_error_response(status.as_u16());

    let body = err.public_body();

    match MediaFamily::of(ctx.content_type()) {
        MediaFamily::Html => {
            let (title, template) = html_page(status);
            ctx.metadata_mut().set("title", title);

            let data = TemplateContext::new(ctx, &body, status.as_u16()).to_value();
            match render_page(views, ctx.theme(), template, Some(layout), &data) {
                Ok(html) => (status, Html(html)).into_response(),
                Err(render_err) => {
                    error!(
                        request_id = %ctx.request_id(),
                        path = %ctx.path(),
                        template,
                        error = %render_err,
                        "Failed to render error template"
                    );
                    (
                        status,
                        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
                        status.canonical_reason().unwrap_or("Error"),
                    )
                        .into_response()
                }
            }
        }
        MediaFamily::Json | MediaFamily::Other => (status, Json(body)).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_page_mapping() {
        assert_eq!(html_page(StatusCode::FORBIDDEN), ("Forbidden", "403"));
        assert_eq!(html_page(StatusCode::NOT_FOUND), ("Not found", "404"));
        assert_eq!(html_page(StatusCode::BAD_REQUEST), ("Bad request", "400"));
        assert_eq!(html_page(StatusCode::CONFLICT).1, "500");
        assert_eq!(html_page(StatusCode::BAD_GATEWAY).1, "500");
    }
}
