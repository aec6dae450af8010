use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::App;

/// Builds the [`RequestContext`](crate::context::RequestContext) for every
/// request, runs the application's request hooks, and stores the context in
/// the request extensions for the route adapter.
///
/// A failing hook short-circuits with the dispatched error.
pub async fn request_context(State(app): State<App>, req: Request, next: Next) -> Response {
    let (parts, body) = req.into_parts();
    let mut ctx = app.build_context(&parts);

    if let Err(err) = app.run_request_hooks(&mut ctx, &parts) {
        return app.dispatcher().dispatch_error(err, &mut ctx);
    }

    let mut req = Request::from_parts(parts, body);
    req.extensions_mut().insert(ctx);
    next.run(req).await
}
