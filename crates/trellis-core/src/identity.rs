//! Request identity and the collaborators that resolve it.

use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

/// The authenticated principal behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Roles carried by the credential itself, such as token claims.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            email: None,
            roles: Vec::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Looks up who is making the request, if anyone.
pub trait IdentityResolver: Send + Sync {
    fn resolve_identity(&self, parts: &Parts) -> Option<Identity>;
}

/// Computes the role names for a request.
pub trait RoleResolver: Send + Sync {
    fn resolve_roles(&self, parts: &Parts, identity: Option<&Identity>) -> Vec<String>;
}

/// Resolver that never authenticates anybody and grants no roles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityResolver for Anonymous {
    fn resolve_identity(&self, _parts: &Parts) -> Option<Identity> {
        None
    }
}

impl RoleResolver for Anonymous {
    fn resolve_roles(&self, _parts: &Parts, _identity: Option<&Identity>) -> Vec<String> {
        Vec::new()
    }
}
