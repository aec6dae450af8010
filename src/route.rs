//! Route table entries and the handler contract.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode},
    routing::MethodFilter,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use trellis_core::{AppError, ConfigError};
use validator::Validate;

use crate::context::RequestContext;

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Reply, AppError>> + Send + 'a>>;

/// A route handler. Receives the request context and the decoded request.
///
/// Any `for<'a> Fn(&'a mut RequestContext, RouteInput) -> HandlerFuture<'a>`
/// closure or function implements this.
pub trait Handler: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut RequestContext, RouteInput) -> HandlerFuture<'a> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a> {
        self(ctx, input)
    }
}

/// The successful outcome of a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub data: Value,
}

impl Reply {
    pub fn new(status: StatusCode, data: impl Serialize) -> Result<Self, AppError> {
        Ok(Self {
            status,
            data: serde_json::to_value(data)?,
        })
    }

    pub fn ok(data: impl Serialize) -> Result<Self, AppError> {
        Self::new(StatusCode::OK, data)
    }

    pub fn created(data: impl Serialize) -> Result<Self, AppError> {
        Self::new(StatusCode::CREATED, data)
    }

    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            data: Value::Null,
        }
    }
}

/// The request as seen by a handler.
#[derive(Debug, Clone)]
pub struct RouteInput {
    pub method: Method,
    pub path: String,
    pub params: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RouteInput {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Deserializes the JSON body. Malformed bodies are 400 Bad Request.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        if self.body.is_empty() {
            return Err(AppError::bad_request("Request body is required"));
        }

        serde_json::from_slice(&self.body).map_err(|e| {
            let message = if e.is_data() {
                e.to_string()
            } else {
                "Invalid request body".to_string()
            };
            AppError::bad_request(message).with_internal(e)
        })
    }

    /// Like [`json`](Self::json), then runs field validation.
    pub fn validated_json<T: DeserializeOwned + Validate>(&self) -> Result<T, AppError> {
        let value: T = self.json()?;
        value
            .validate()
            .map_err(|errors| AppError::from_validation_errors(&errors))?;
        Ok(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl RouteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    pub fn filter(&self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
            Self::Put => MethodFilter::PUT,
            Self::Delete => MethodFilter::DELETE,
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            _ => Err(ConfigError::InvalidMethod(s.to_string())),
        }
    }
}

/// A route table entry. Immutable once the app is bootstrapped.
#[derive(Clone)]
pub struct Route {
    pub name: String,
    pub method: RouteMethod,
    pub path: String,
    pub handler: Arc<dyn Handler>,
    /// Empty means public.
    pub permission: String,
    pub template: String,
    pub layout: Option<String>,
    /// When set, requests negotiating any other type get 406.
    pub accept_only: Option<String>,
}

impl Route {
    /// `path` may use `:name` or `{name}` parameters.
    pub fn new(
        name: impl Into<String>,
        method: RouteMethod,
        path: impl AsRef<str>,
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            path: normalize_path(path.as_ref()),
            handler: Arc::new(handler),
            permission: String::new(),
            template: String::new(),
            layout: None,
            accept_only: None,
        }
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = permission.into();
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = Some(layout.into());
        self
    }

    pub fn accept_only(mut self, content_type: impl Into<String>) -> Self {
        self.accept_only = Some(content_type.into());
        self
    }

    pub fn is_public(&self) -> bool {
        self.permission.is_empty()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("permission", &self.permission)
            .field("template", &self.template)
            .field("layout", &self.layout)
            .field("accept_only", &self.accept_only)
            .finish_non_exhaustive()
    }
}

/// Rewrites `:id` segments to axum's `{id}` syntax.
pub(crate) fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(name) if !name.is_empty() => format!("{{{}}}", name),
            _ => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
