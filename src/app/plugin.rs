use std::time::Duration;

use axum::{
    http::{HeaderValue, Method, header},
    middleware,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::debug;
use trellis_config::CorsConfig;

use super::builder::AppBuilder;
use super::hooks::Phase;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;

/// An application extension. `init` runs once during bootstrap, in
/// registration order, and usually registers phase hooks.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn init(&self, app: &mut AppBuilder) -> anyhow::Result<()>;
}

pub const CORE_PLUGIN: &str = "core";

/// Always registered first. Binds request logging, metrics, CORS and HTTP
/// tracing during [`Phase::BindMiddlewares`].
#[derive(Debug, Clone, Default)]
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn name(&self) -> &str {
        CORE_PLUGIN
    }

    fn init(&self, app: &mut AppBuilder) -> anyhow::Result<()> {
        debug!(plugin = CORE_PLUGIN, "Running plugin init");

        app.on(Phase::BindMiddlewares, |app| {
            let cors = cors_layer(&app.config().cors);

            app.add_middleware(|router| router.layer(middleware::from_fn(metrics_middleware)));
            app.add_middleware(|router| router.layer(middleware::from_fn(logging_middleware)));
            app.add_middleware(|router| router.layer(TraceLayer::new_for_http()));
            app.add_middleware(move |router| router.layer(cors.clone()));
            Ok(())
        });

        Ok(())
    }
}

pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = if config.allows_any_origin() {
        AllowOrigin::mirror_request()
    } else {
        let allowed_origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(allowed_origins)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(config.allow_credentials)
        .max_age(Duration::from_secs(config.max_age))
}
