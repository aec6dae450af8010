//! Request logging and the process-wide tracing subscriber.

use std::fs;
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::context::RequestContext;

const LOG_DIR: &str = "storage/logs";

/// Fields shared by the start and finish lines of one request.
struct RequestLine {
    request_id: String,
    method: String,
    path: String,
}

impl RequestLine {
    fn from_request(req: &Request) -> Self {
        let request_id = req
            .extensions()
            .get::<RequestContext>()
            .map(RequestContext::request_id)
            .unwrap_or_else(Uuid::new_v4)
            .to_string();
        let path = match req.extensions().get::<MatchedPath>() {
            Some(matched) => matched.as_str().to_string(),
            None => req.uri().path().to_string(),
        };

        Self {
            request_id,
            method: req.method().to_string(),
            path,
        }
    }

    fn started(&self) {
        info!(request_id = %self.request_id, method = %self.method, path = %self.path, "Request started");
    }

    /// 5xx logs at error, 4xx at warn, everything else at info.
    fn finished(&self, status: StatusCode, elapsed: Duration) {
        let (id, method, path) = (&self.request_id, &self.method, &self.path);
        let status = status.as_u16();
        let latency_ms = elapsed.as_millis() as u64;

        if status >= 500 {
            error!(request_id = %id, method = %method, path = %path, status, latency_ms, "Request failed");
        } else if status >= 400 {
            warn!(request_id = %id, method = %method, path = %path, status, latency_ms, "Request rejected");
        } else {
            info!(request_id = %id, method = %method, path = %path, status, latency_ms, "Request finished");
        }
    }
}

/// Logs a start and a finish line per request, tagged with the context's
/// request id when the pipeline has built one.
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let line = RequestLine::from_request(&req);
    line.started();

    let started = Instant::now();
    let response = next.run(req).await;
    line.finished(response.status(), started.elapsed());

    response
}

fn console_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}=info,trellis_acl=info,tower_http=warn,hyper=info",
            env!("CARGO_CRATE_NAME")
        ))
    })
}

/// Installs the global subscriber.
///
/// The console follows `RUST_LOG`. Under `storage/logs`, `trellis.log` keeps
/// errors only and `trellis.json` keeps info and up as JSON; both roll daily.
pub fn init_tracing() -> anyhow::Result<()> {
    fs::create_dir_all(LOG_DIR)?;

    let console = fmt::layer()
        .compact()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(console_filter());

    let errors = fmt::layer()
        .with_writer(RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "trellis.log"))
        .with_ansi(false)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(EnvFilter::new("error"));

    let json = fmt::layer()
        .json()
        .with_writer(RollingFileAppender::new(Rotation::DAILY, LOG_DIR, "trellis.json"))
        .with_current_span(true)
        .with_span_list(true)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(console)
        .with(errors)
        .with(json)
        .try_init()?;

    info!(dir = LOG_DIR, "Logging ready");
    Ok(())
}
