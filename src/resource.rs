//! CRUD resources that expand into a fixed set of routes.
//!
//! A resource named `url` at `/urls` binds:
//!
//! | route name | method | path | permission | template |
//! |---|---|---|---|---|
//! | `find_url` | GET | `/urls` | `find_url` | `url/query` |
//! | `findOne_url` | GET | `/urls/{id}` | `findOne_url` | `url/findOne` |
//! | `create_url` | POST | `/urls` | `create_url` | `url/create` |
//! | `create_page_url` | GET | `/urls/new` | `create_url` | `url/create` |
//! | `update_url` | POST | `/urls/{id}` | `update_url` | `url/update` |
//! | `update_put_url` | PUT | `/urls/{id}` | `update_url` | `url/update` |
//! | `update_page_url` | GET | `/urls/{id}/edit` | `update_url` | `url/update` |
//! | `delete_url` | DELETE | `/urls/{id}` | `delete_url` | `url/delete` |
//! | `count_url` | GET | `/urls-count` | `find_url` | none |

use std::sync::Arc;

use serde_json::json;

use crate::context::RequestContext;
use crate::route::{Handler, HandlerFuture, Reply, Route, RouteInput, RouteMethod};

/// Handlers behind a [`Resource`].
pub trait Controller: Send + Sync {
    fn find<'a>(&'a self, ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a>;
    fn find_one<'a>(&'a self, ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a>;
    fn count<'a>(&'a self, ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a>;
    fn create<'a>(&'a self, ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a>;
    fn update<'a>(&'a self, ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a>;
    fn delete<'a>(&'a self, ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a>;

    /// Data for the empty creation form.
    fn create_page<'a>(
        &'a self,
        _ctx: &'a mut RequestContext,
        _input: RouteInput,
    ) -> HandlerFuture<'a> {
        Box::pin(async { Reply::ok(json!({})) })
    }

    /// Data for the edit form. Loads the record through `find_one`.
    fn update_page<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        input: RouteInput,
    ) -> HandlerFuture<'a> {
        self.find_one(ctx, input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Find,
    FindOne,
    Count,
    Create,
    CreatePage,
    Update,
    UpdatePage,
    Delete,
}

/// Routes one [`Action`] to its controller method.
#[derive(Clone)]
pub struct ControllerAction {
    controller: Arc<dyn Controller>,
    action: Action,
}

impl ControllerAction {
    pub fn new(controller: Arc<dyn Controller>, action: Action) -> Self {
        Self { controller, action }
    }
}

impl Handler for ControllerAction {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, input: RouteInput) -> HandlerFuture<'a> {
        let controller = self.controller.as_ref();
        match self.action {
            Action::Find => controller.find(ctx, input),
            Action::FindOne => controller.find_one(ctx, input),
            Action::Count => controller.count(ctx, input),
            Action::Create => controller.create(ctx, input),
            Action::CreatePage => controller.create_page(ctx, input),
            Action::Update => controller.update(ctx, input),
            Action::UpdatePage => controller.update_page(ctx, input),
            Action::Delete => controller.delete(ctx, input),
        }
    }
}

#[derive(Clone)]
pub struct Resource {
    pub name: String,
    pub prefix: String,
    pub path: String,
    pub controller: Arc<dyn Controller>,
}

impl Resource {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        controller: Arc<dyn Controller>,
    ) -> Self {
        Self {
            name: name.into(),
            prefix: String::new(),
            path: path.into(),
            controller,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn route(&self, route_name: &str, method: RouteMethod, suffix: &str, action: Action) -> Route {
        let path = format!("{}{}{}", self.prefix, self.path, suffix);
        Route::new(
            format!("{}_{}", route_name, self.name),
            method,
            path,
            ControllerAction::new(Arc::clone(&self.controller), action),
        )
    }

    /// Expands into the route table entries listed in the module docs.
    pub fn routes(&self) -> Vec<Route> {
        let name = &self.name;
        let perm = |action: &str| format!("{}_{}", action, name);
        let tpl = |view: &str| format!("{}/{}", name, view);

        vec![
            self.route("find", RouteMethod::Get, "", Action::Find)
                .permission(perm("find"))
                .template(tpl("query")),
            self.route("findOne", RouteMethod::Get, "/{id}", Action::FindOne)
                .permission(perm("findOne"))
                .template(tpl("findOne")),
            self.route("create", RouteMethod::Post, "", Action::Create)
                .permission(perm("create"))
                .template(tpl("create")),
            self.route("create_page", RouteMethod::Get, "/new", Action::CreatePage)
                .permission(perm("create"))
                .template(tpl("create")),
            self.route("update", RouteMethod::Post, "/{id}", Action::Update)
                .permission(perm("update"))
                .template(tpl("update")),
            self.route("update_put", RouteMethod::Put, "/{id}", Action::Update)
                .permission(perm("update"))
                .template(tpl("update")),
            self.route("update_page", RouteMethod::Get, "/{id}/edit", Action::UpdatePage)
                .permission(perm("update"))
                .template(tpl("update")),
            self.route("delete", RouteMethod::Delete, "/{id}", Action::Delete)
                .permission(perm("delete"))
                .template(tpl("delete")),
            self.route("count", RouteMethod::Get, "-count", Action::Count)
                .permission(perm("find")),
        ]
    }
}
