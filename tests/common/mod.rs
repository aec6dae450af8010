#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, request::Parts},
};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower::ServiceExt;
use validator::Validate;

use trellis::{
    App, AppBuilder, Controller, HandlebarsRenderer, HandlerFuture, Phase, Reply, RequestContext,
    Resource, Route, RouteInput, RouteMethod,
};
use trellis_config::AppConfig;
use trellis_core::{AppError, Identity, IdentityResolver, RecordNotFound, RoleResolver};

pub const JSON: &str = "application/json";
pub const HTML: &str = "text/html";

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::for_testing();
    config.acl_file = fixture("acl.json");
    config
}

pub fn test_templates() -> HandlebarsRenderer {
    HandlebarsRenderer::from_templates(
        "site",
        [
            (
                "layouts/default",
                "<html><title>{{metadata.title}}</title><body>{{{content}}}</body></html>",
            ),
            ("layouts/bare", "<div>{{{content}}}</div>"),
            ("400", "<ul>{{#each data.errors}}<li>{{field}}</li>{{/each}}</ul>"),
            ("401", "<h1>Sign in first</h1>"),
            ("403", "<h1>Not for you</h1>"),
            ("404", "<h1>Nothing at {{path}}</h1>"),
            ("500", "<h1>Something broke ({{status}})</h1>"),
            ("url/query", "{{#each data.data}}<li>{{slug}}</li>{{/each}}"),
            ("url/findOne", "<a href=\"{{data.target}}\">{{data.slug}}</a>"),
            ("url/create", "<form>new url</form>"),
            ("url/update", "<form>{{data.slug}}</form>"),
            ("url/card", "<p>{{data.slug}}</p>"),
            ("notice", "{{{responseMessages}}}<p>{{data.slug}}</p>"),
        ],
    )
    .unwrap()
}

/// Resolves identity from `x-user` and roles from a comma separated `x-roles`.
pub struct HeaderResolver;

impl IdentityResolver for HeaderResolver {
    fn resolve_identity(&self, parts: &Parts) -> Option<Identity> {
        let user = parts.headers.get("x-user")?.to_str().ok()?;
        Some(Identity::new(user))
    }
}

impl RoleResolver for HeaderResolver {
    fn resolve_roles(&self, parts: &Parts, _identity: Option<&Identity>) -> Vec<String> {
        parts
            .headers
            .get("x-roles")
            .and_then(|v| v.to_str().ok())
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShortUrl {
    pub id: u64,
    pub slug: String,
    pub target: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewUrl {
    #[validate(length(min = 3, max = 32, message = "slug must be 3 to 32 characters"))]
    pub slug: String,
    #[validate(url(message = "target must be a URL"))]
    pub target: String,
}

/// In-memory URL store behind the `url` resource.
pub struct UrlController {
    urls: Mutex<BTreeMap<u64, ShortUrl>>,
    next_id: AtomicU64,
}

impl UrlController {
    pub fn seeded() -> Self {
        let urls: BTreeMap<u64, ShortUrl> = [
            (1, "docs", "https://example.com/docs"),
            (2, "blog", "https://example.com/blog"),
            (3, "jobs", "https://example.com/jobs"),
        ]
        .into_iter()
        .map(|(id, slug, target)| {
            (
                id,
                ShortUrl {
                    id,
                    slug: slug.to_string(),
                    target: target.to_string(),
                },
            )
        })
        .collect();

        Self {
            urls: Mutex::new(urls),
            next_id: AtomicU64::new(4),
        }
    }

    fn id(input: &RouteInput) -> Result<u64, AppError> {
        input
            .param("id")
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| AppError::bad_request("Invalid id"))
    }

    fn lookup(&self, input: &RouteInput) -> Result<ShortUrl, AppError> {
        let id = Self::id(input)?;
        self.urls
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| RecordNotFound::new("url").into())
    }
}

impl Controller for UrlController {
    fn find<'a>(&'a self, ctx: &'a mut RequestContext, _input: RouteInput) -> HandlerFuture<'a> {
        Box::pin(async move {
            let urls = self.urls.lock();
            let page: Vec<&ShortUrl> = urls
                .values()
                .skip(ctx.offset() as usize)
                .take(ctx.limit() as usize)
                .collect();
            Reply::ok(json!({
                "data": page,
                "meta": ctx.pager().meta(urls.len() as i64),
            }))
        })
    }

    fn find_one<'a>(&'a self, _ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a> {
        Box::pin(async move { Reply::ok(self.lookup(&input)?) })
    }

    fn count<'a>(&'a self, _ctx: &'a mut RequestContext, _input: RouteInput) -> HandlerFuture<'a> {
        Box::pin(async move { Reply::ok(json!({ "count": self.urls.lock().len() })) })
    }

    fn create<'a>(&'a self, _ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a> {
        Box::pin(async move {
            let new: NewUrl = input.validated_json()?;
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            let url = ShortUrl {
                id,
                slug: new.slug,
                target: new.target,
            };
            self.urls.lock().insert(id, url.clone());
            Reply::created(url)
        })
    }

    fn update<'a>(&'a self, _ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a> {
        Box::pin(async move {
            let mut url = self.lookup(&input)?;
            let changes: NewUrl = input.validated_json()?;
            url.slug = changes.slug;
            url.target = changes.target;
            self.urls.lock().insert(url.id, url.clone());
            Reply::ok(url)
        })
    }

    fn delete<'a>(&'a self, _ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a> {
        Box::pin(async move {
            let id = Self::id(&input)?;
            match self.urls.lock().remove(&id) {
                Some(_) => Ok(Reply::no_content()),
                None => Err(RecordNotFound::new("url").into()),
            }
        })
    }
}

pub fn noop<'a>(_ctx: &'a mut RequestContext, _input: RouteInput) -> HandlerFuture<'a> {
    Box::pin(async { Ok(Reply::no_content()) })
}

fn broken<'a>(_ctx: &'a mut RequestContext, _input: RouteInput) -> HandlerFuture<'a> {
    Box::pin(async {
        Err(AppError::internal(anyhow::anyhow!(
            "connection refused: database password hunter2"
        )))
    })
}

fn teapot<'a>(_ctx: &'a mut RequestContext, _input: RouteInput) -> HandlerFuture<'a> {
    Box::pin(async { Err(AppError::new(StatusCode::IM_A_TEAPOT, "short and stout")) })
}

fn status<'a>(_ctx: &'a mut RequestContext, _input: RouteInput) -> HandlerFuture<'a> {
    Box::pin(async { Reply::ok(json!({ "status": "up" })) })
}

fn whoami<'a>(ctx: &'a mut RequestContext, _input: RouteInput) -> HandlerFuture<'a> {
    Box::pin(async move {
        Reply::ok(json!({
            "user": ctx.identity().map(|i| i.id.clone()),
            "roles": ctx.roles(),
            "authenticated": ctx.is_authenticated(),
            "contentType": ctx.content_type(),
            "route": ctx.route_name(),
            "metadata": ctx.metadata().all(),
        }))
    })
}

fn card<'a>(ctx: &'a mut RequestContext, _input: RouteInput) -> HandlerFuture<'a> {
    Box::pin(async move {
        ctx.set_template("url/card");
        Reply::ok(json!({ "slug": "docs" }))
    })
}

fn notice<'a>(ctx: &'a mut RequestContext, _input: RouteInput) -> HandlerFuture<'a> {
    Box::pin(async move {
        ctx.set_response_message("", "success", "Link saved");
        Reply::ok(json!({ "slug": "docs" }))
    })
}

/// Registers the `url` resource and the extra routes the suites exercise.
pub fn bind_routes(app: &mut AppBuilder) {
    app.set_resource(Resource::new("url", "/urls", Arc::new(UrlController::seeded())));
    app.set_route(Route::new("boom", RouteMethod::Get, "/boom", broken));
    app.set_route(Route::new("teapot", RouteMethod::Get, "/teapot", teapot));
    app.set_route(
        Route::new("api_status", RouteMethod::Get, "/api/status", status).accept_only(JSON),
    );
    app.set_route(Route::new("whoami", RouteMethod::Get, "/whoami", whoami));
    app.set_route(Route::new("notice", RouteMethod::Get, "/notice", notice).template("notice"));
    app.set_route(
        Route::new("card", RouteMethod::Get, "/card", card)
            .template("url/findOne")
            .layout("layouts/bare"),
    );
}

/// Builder with the test ACL, templates, header resolver and routes.
pub fn test_builder() -> AppBuilder {
    let mut builder = AppBuilder::new(test_config());
    let resolver = Arc::new(HeaderResolver);
    builder
        .set_template_renderer(test_templates())
        .set_identity_resolver(resolver.clone())
        .set_role_resolver(resolver)
        .on(Phase::BindRoutes, |app| {
            bind_routes(app);
            Ok(())
        });
    builder
}

pub fn test_app() -> App {
    test_builder().bootstrap().unwrap()
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

pub struct TestRequest {
    method: &'static str,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

impl TestRequest {
    pub fn new(method: &'static str, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new("GET", uri)
    }

    pub fn accept(self, value: &str) -> Self {
        self.header("accept", value)
    }

    pub fn roles(self, roles: &str) -> Self {
        self.header("x-roles", roles)
    }

    pub fn user(self, user: &str) -> Self {
        self.header("x-user", user)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub async fn send(self, router: Router) -> TestResponse {
        let mut request = Request::builder().method(self.method).uri(self.uri);
        for (name, value) in &self.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let request = match self.body {
            Some(body) => request
                .header("content-type", JSON)
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            content_type,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}
