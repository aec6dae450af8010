//! Error taxonomy for the request pipeline and for bootstrap.
//!
//! Every failure on the request path is an [`AppError`]. The dispatcher maps
//! each variant to an HTTP status and a public body:
//!
//! | variant | status | JSON body |
//! |---------|--------|-----------|
//! | `Http` | its own code | `{"code", "message"}` |
//! | `Validation` | 400 | `{"errors": [{"field", "tag", "value", "message"}]}` |
//! | `NotFound` | 404 | `{"code": 404, "message": "Not Found"}` |
//! | `Internal` | 500 | `{"code": 500, "message": "Internal Server Error"}` |
//!
//! Internal causes are kept for server-side logging and never serialized.
//!
//! Failures while assembling the application are [`ConfigError`]s; they
//! abort bootstrap.

use std::fmt;
use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use validator::ValidationErrors;

/// One failed constraint on an input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub tag: String,
    pub value: String,
    pub message: String,
}

/// Public body for validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub errors: Vec<FieldError>,
}

/// Public body for every other error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: Value,
}

/// Raised by persistence collaborators when a lookup matches nothing.
///
/// Any error chain containing this type is classified as a 404.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{entity} not found")]
pub struct RecordNotFound {
    pub entity: String,
}

impl RecordNotFound {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
        }
    }
}

/// A classified request failure.
#[derive(Debug)]
pub enum AppError {
    /// Explicit status-carrying error. `message` is a string or an object.
    Http {
        status: StatusCode,
        message: Value,
        internal: Option<anyhow::Error>,
    },
    Validation(Vec<FieldError>),
    NotFound(Option<anyhow::Error>),
    /// Anything unclassified. Rendered as a generic 500.
    Internal(anyhow::Error),
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<Value>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            internal: None,
        }
    }

    /// Attaches an internal cause to an explicit error. Other variants are
    /// returned unchanged.
    pub fn with_internal<E>(self, err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        match self {
            Self::Http {
                status, message, ..
            } => Self::Http {
                status,
                message,
                internal: Some(err.into()),
            },
            other => other,
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden")
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    }

    pub fn not_acceptable() -> Self {
        Self::new(StatusCode::NOT_ACCEPTABLE, "Not Acceptable")
    }

    pub fn bad_request(message: impl Into<Value>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::NotFound(None)
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        Self::Internal(err.into())
    }

    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }

    /// Flattens `validator` output into field entries, sorted by field name.
    pub fn from_validation_errors(errors: &ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                let field = field.to_string();
                errors.iter().map(move |error| FieldError {
                    field: field.clone(),
                    tag: error.code.to_string(),
                    value: error
                        .params
                        .get("value")
                        .map(|v| match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .unwrap_or_default(),
                    message: error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();

        fields.sort_by(|a, b| a.field.cmp(&b.field));
        Self::Validation(fields)
    }

    /// Classifies an arbitrary error chain.
    ///
    /// `RecordNotFound` becomes a 404, `validator::ValidationErrors` becomes a
    /// validation failure, everything else is internal.
    pub fn classify(err: anyhow::Error) -> Self {
        if err.downcast_ref::<RecordNotFound>().is_some() {
            return Self::NotFound(Some(err));
        }

        match err.downcast::<ValidationErrors>() {
            Ok(errors) => Self::from_validation_errors(&errors),
            Err(err) => Self::Internal(err),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Http { status, .. } => *status,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn internal_cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Http { internal, .. } => internal.as_ref(),
            Self::NotFound(cause) => cause.as_ref(),
            Self::Internal(cause) => Some(cause),
            Self::Validation(_) => None,
        }
    }

    pub fn is_unclassified(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    /// The body a caller is allowed to see.
    pub fn public_body(&self) -> Value {
        match self {
            Self::Http {
                status, message, ..
            } => json!(ErrorBody {
                code: status.as_u16(),
                message: message.clone(),
            }),
            Self::Validation(errors) => json!(ValidationResponse {
                errors: errors.clone(),
            }),
            Self::NotFound(_) => json!(ErrorBody {
                code: StatusCode::NOT_FOUND.as_u16(),
                message: Value::from("Not Found"),
            }),
            Self::Internal(_) => json!(ErrorBody {
                code: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                message: Value::from("Internal Server Error"),
            }),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http {
                status,
                message,
                internal: None,
            } => write!(f, "code={}, message={}", status.as_u16(), message),
            Self::Http {
                status,
                message,
                internal: Some(internal),
            } => write!(
                f,
                "code={}, message={}, internal={:#}",
                status.as_u16(),
                message,
                internal
            ),
            Self::Validation(errors) => write!(f, "validation failed on {} field(s)", errors.len()),
            Self::NotFound(None) => write!(f, "not found"),
            Self::NotFound(Some(cause)) => write!(f, "not found: {:#}", cause),
            Self::Internal(cause) => write!(f, "internal error: {:#}", cause),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.public_body())).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        AppError::classify(err.into())
    }
}

/// Bootstrap-time failures. None of these are recovered.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("role name must not be empty")]
    EmptyRoleName,

    #[error("failed to read role registry {path}: {source}")]
    RegistryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed role registry {origin}: {source}")]
    RegistryParse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid route method {0}")]
    InvalidMethod(String),

    #[error("route {name} has an invalid path {path:?}")]
    InvalidRoutePath { name: String, path: String },

    #[error("route {name} duplicates {method} {path} already bound by {existing}")]
    DuplicateRoute {
        name: String,
        existing: String,
        method: String,
        path: String,
    },

    #[error("no response formatter registered for {0}")]
    MissingFormatter(String),

    #[error("failed to load templates from {path}: {reason}")]
    Templates { path: PathBuf, reason: String },

    #[error("plugin {plugin} failed to initialise: {source}")]
    Plugin {
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{phase} hook failed: {source}")]
    Hook {
        phase: String,
        #[source]
        source: anyhow::Error,
    },
}
