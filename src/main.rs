use std::sync::Arc;

use dotenvy::dotenv;
use tokio::net::TcpListener;
use tracing::info;

use trellis::{
    AppBuilder,
    logging::init_tracing,
    metrics::{init_metrics, metrics_app},
};
use trellis_auth::BearerTokenResolver;
use trellis_config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing()?;

    let config = AppConfig::from_env();
    let port = config.port;
    let resolver = Arc::new(BearerTokenResolver::new(config.jwt.clone()));

    let mut builder = AppBuilder::new(config);
    builder
        .set_identity_resolver(resolver.clone())
        .set_role_resolver(resolver);
    let app = builder.bootstrap()?;

    let mut router = app.router();
    if let Some(handle) = init_metrics() {
        router = router.merge(metrics_app(handle));
    }

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, base_url = %app.config().base_url, "Server running");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    app.close()?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
