//! Per-request state shared by the pipeline, handlers and formatters.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::http::Method;
use serde::Serialize;
use trellis_acl::AccessController;
use trellis_core::{Identity, Pager};
use uuid::Uuid;

use crate::metrics::track_acl_check;

/// Free-form string values for views (page title, description, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata(HashMap<String, String>);

impl Metadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn all(&self) -> &HashMap<String, String> {
        &self.0
    }
}

/// A flash-style notice shown on the rendered page, e.g. `success` or `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl ResponseMessage {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

/// State built once per request before any handler runs.
///
/// Owned by a single request. Clones are taken only to hand the context from
/// the pipeline middleware to the route adapter.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    content_type: String,
    identity: Option<Identity>,
    roles: Vec<String>,
    metadata: Metadata,
    messages: BTreeMap<String, ResponseMessage>,
    pager: Pager,
    query: HashMap<String, String>,
    template: Option<String>,
    theme: String,
    base_url: String,
    method: Method,
    path: String,
    route_name: Option<String>,
    acl: Arc<AccessController>,
}

/// Inputs for [`RequestContext::new`].
#[derive(Debug, Clone)]
pub struct ContextSeed {
    pub content_type: String,
    pub identity: Option<Identity>,
    pub roles: Vec<String>,
    pub query: HashMap<String, String>,
    pub theme: String,
    pub base_url: String,
    pub method: Method,
    pub path: String,
}

impl RequestContext {
    pub fn new(seed: ContextSeed, acl: Arc<AccessController>) -> Self {
        let pager = Pager::from_query(&seed.query);
        Self {
            request_id: Uuid::new_v4(),
            content_type: seed.content_type,
            identity: seed.identity,
            roles: seed.roles,
            metadata: Metadata::default(),
            messages: BTreeMap::new(),
            pager,
            query: seed.query,
            template: None,
            theme: seed.theme,
            base_url: seed.base_url,
            method: seed.method,
            path: seed.path,
            route_name: None,
            acl,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// The negotiated response media type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn set_identity(&mut self, identity: Option<Identity>) {
        self.identity = identity;
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn set_roles(&mut self, roles: Vec<String>) {
        self.roles = roles;
    }

    pub fn add_role(&mut self, role: impl Into<String>) {
        let role = role.into();
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    /// Stores a message under `key`, replacing any previous one. An empty key
    /// gets a fresh generated one. Returns the key used.
    pub fn set_response_message(
        &mut self,
        key: &str,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> String {
        let key = if key.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            key.to_string()
        };
        self.messages
            .insert(key.clone(), ResponseMessage::new(kind, message));
        key
    }

    pub fn remove_response_message(&mut self, key: &str) -> Option<ResponseMessage> {
        self.messages.remove(key)
    }

    pub fn response_messages(&self) -> &BTreeMap<String, ResponseMessage> {
        &self.messages
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn set_pager(&mut self, pager: Pager) {
        self.pager = pager;
    }

    pub fn limit(&self) -> i64 {
        self.pager.limit()
    }

    pub fn offset(&self) -> i64 {
        self.pager.offset()
    }

    pub fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    /// Overrides the route template for this request only.
    pub fn set_template(&mut self, template: impl Into<String>) {
        self.template = Some(template.into());
    }

    pub fn template(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: impl Into<String>) {
        self.theme = theme.into();
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn route_name(&self) -> Option<&str> {
        self.route_name.as_deref()
    }

    pub(crate) fn set_route_name(&mut self, name: &str) {
        self.route_name = Some(name.to_string());
    }

    pub fn acl(&self) -> &AccessController {
        &self.acl
    }

    /// Checks `permission` against this request's roles.
    pub fn can(&self, permission: &str) -> bool {
        let allowed = self.acl.can(permission, &self.roles);
        track_acl_check(permission, allowed);
        allowed
    }
}
