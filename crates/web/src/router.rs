//! Route table: controllers, routes and the matchit-backed lookup.
//!
//! One radix tree per HTTP method, built once during the configuration phase
//! and immutable afterwards. Registering the same `(method, path)` twice is a
//! startup error surfaced by [`RouterBuilder::build`]; duplicates are never
//! discovered at request time.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use tracing::info;

use crate::context::PathParams;
use crate::error::ConfigError;
use crate::handler::{BoxHandler, Handler};
use crate::middleware::Middleware;

/// A single `(method, path)` mapping to a handler and its ordered middleware
/// list. Paths use `{name}` segments for parameters.
pub struct Route {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
    pub(crate) handler: BoxHandler,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A group of related routes under a shared base path.
///
/// Controllers are built during the configuration phase and consumed by
/// [`RouterBuilder::mount`]; after that nothing can add or remove a route.
/// Handlers receive their domain collaborators as captured `Arc`s, never via
/// a container.
pub struct Controller {
    base_path: String,
    routes: Vec<Route>,
}

impl Controller {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self { base_path: base_path.into(), routes: Vec::new() }
    }

    /// Registers a route relative to the base path. Returns `self` so
    /// registrations chain naturally.
    pub fn route(
        mut self,
        method: Method,
        path: &str,
        middleware: Vec<Arc<dyn Middleware>>,
        handler: impl Handler + 'static,
    ) -> Self {
        let path = join_paths(&self.base_path, path);
        self.routes.push(Route { method, path, middleware, handler: Arc::new(handler) });
        self
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        if base.is_empty() { "/".to_owned() } else { base.to_owned() }
    } else {
        format!("{base}/{path}")
    }
}

/// The immutable route table. Lookup is exact per `(method, path)`: repeated
/// resolution of the same pair always lands on the same route.
pub struct Router {
    tables: HashMap<Method, matchit::Router<usize>>,
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.routes.iter().map(|r| (r.method(), r.path())).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder { controllers: Vec::new(), global: Vec::new() }
    }

    pub(crate) fn lookup(&self, method: &Method, path: &str) -> Option<(&Route, PathParams)> {
        let table = self.tables.get(method)?;
        let matched = table.at(path).ok()?;
        let route = &self.routes[*matched.value];
        Some((route, matched.params.into()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Accumulates controllers and global middleware, then freezes them into a
/// [`Router`].
pub struct RouterBuilder {
    controllers: Vec<Controller>,
    global: Vec<Arc<dyn Middleware>>,
}

impl RouterBuilder {
    pub fn mount(mut self, controller: Controller) -> Self {
        self.controllers.push(controller);
        self
    }

    /// Prepends `middleware` to every route's chain, in the order given.
    /// Typical use is an application-wide `ParseToken`.
    pub fn with_global_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.global.push(middleware);
        self
    }

    pub fn build(self) -> Result<Router, ConfigError> {
        let mut tables: HashMap<Method, matchit::Router<usize>> = HashMap::new();
        let mut routes = Vec::new();

        for controller in self.controllers {
            for mut route in controller.routes {
                if !self.global.is_empty() {
                    let mut chain = self.global.clone();
                    chain.extend(route.middleware);
                    route.middleware = chain;
                }

                let index = routes.len();
                let table = tables.entry(route.method.clone()).or_default();
                table.insert(route.path.as_str(), index).map_err(|e| match e {
                    matchit::InsertError::Conflict { .. } => ConfigError::DuplicateRoute {
                        method: route.method.clone(),
                        path: route.path.clone(),
                    },
                    other => ConfigError::InvalidPattern {
                        path: route.path.clone(),
                        reason: other.to_string(),
                    },
                })?;

                info!(method = %route.method, path = %route.path, "register route");
                routes.push(route);
            }
        }

        Ok(Router { tables, routes })
    }
}
