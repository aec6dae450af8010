//! Prometheus metrics for requests, ACL decisions and error responses.
//!
//! Everything here is a no-op when `OBSERVABILITY_ENABLED` is `false` or `0`.

use std::sync::OnceLock;
use std::time::{Duration, Instant};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use tracing::warn;

const REQUESTS_TOTAL: &str = "http_requests_total";
const REQUESTS_ACTIVE: &str = "http_requests_active";
const REQUEST_DURATION: &str = "http_request_duration_seconds";
const ACL_CHECKS_TOTAL: &str = "acl_checks_total";
const ERROR_RESPONSES_TOTAL: &str = "error_responses_total";

const DURATION_BUCKETS: [f64; 15] = [
    0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];
const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

static ENABLED: OnceLock<bool> = OnceLock::new();

/// Read once per process. Unset means on.
pub fn is_observability_enabled() -> bool {
    *ENABLED.get_or_init(|| switch_is_on(std::env::var("OBSERVABILITY_ENABLED").ok().as_deref()))
}

fn switch_is_on(value: Option<&str>) -> bool {
    match value {
        Some(v) => !(v == "0" || v.eq_ignore_ascii_case("false")),
        None => true,
    }
}

/// Installs the Prometheus recorder and spawns its upkeep task.
///
/// `None` when metrics are switched off or another recorder already owns the
/// process.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let installed = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_DURATION.to_string()), &DURATION_BUCKETS)
        .and_then(PrometheusBuilder::install_recorder);

    match installed {
        Ok(handle) => {
            spawn_upkeep(handle.clone());
            Some(handle)
        }
        Err(err) => {
            warn!(error = %err, "Prometheus recorder not installed, metrics off");
            None
        }
    }
}

fn spawn_upkeep(handle: PrometheusHandle) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(UPKEEP_INTERVAL);
        loop {
            ticker.tick().await;
            handle.run_upkeep();
        }
    });
}

/// Keeps `http_requests_active` raised while alive.
struct InFlight;

impl InFlight {
    fn start() -> Self {
        gauge!(REQUESTS_ACTIVE).increment(1.0);
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        gauge!(REQUESTS_ACTIVE).decrement(1.0);
    }
}

/// Counts and times every request, labelled by route pattern when the router
/// matched one.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let method = req.method().to_string();
    let path = match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_string(),
        None => req.uri().path().to_string(),
    };

    let started = Instant::now();
    let response = {
        let _in_flight = InFlight::start();
        next.run(req).await
    };
    let status = response.status().as_u16().to_string();

    histogram!(REQUEST_DURATION, "method" => method.clone(), "path" => path.clone())
        .record(started.elapsed().as_secs_f64());
    counter!(REQUESTS_TOTAL, "method" => method, "path" => path, "status" => status).increment(1);

    response
}

/// Serves the recorder's text exposition at `GET /metrics`.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

pub fn track_acl_check(permission: &str, allowed: bool) {
    if is_observability_enabled() {
        let outcome = if allowed { "allowed" } else { "denied" };
        counter!(ACL_CHECKS_TOTAL, "permission" => permission.to_string(), "outcome" => outcome)
            .increment(1);
    }
}

pub fn track_error_response(status: u16) {
    if is_observability_enabled() {
        counter!(ERROR_RESPONSES_TOTAL, "status" => status.to_string()).increment(1);
    }
}
