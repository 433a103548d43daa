//! Route registration and request dispatch.
//!
//! # Responsibilities
//! - Register handlers, endpoints and middlewares against route patterns
//! - Resolve a (path, method) pair to a terminal node and its parameters
//! - Dispatch requests to the resolved handler or to the 404 / 405 fallbacks
//! - Expose the router as a `tower::Service`
//!
//! # Design Decisions
//! - Registration takes `&mut self`; once the router is shared for serving
//!   it is read-only apart from the cache and the params pool
//! - Successful lookups are cached by literal path (see [`CachePolicy`])
//! - The params pool exists only once a dynamic pattern has been registered
//! - Parameters reach handlers as a [`RouteParams`] request extension and go
//!   back to the pool when the last clone is dropped

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request};
use axum::response::Response;
use futures_util::future::BoxFuture;

use crate::config::schema::RouterConfig;
use crate::http::context::RequestContext;
use crate::http::endpoint::{
    adapt, chain, handler_fn, Codecs, EndpointError, ErrorEncoder, Handler, Middleware, Reply,
    ResultEncoder,
};
use crate::http::response::{default_method_not_allowed, default_not_found};
use crate::observability::metrics;
use crate::routing::cache::{CachePolicy, RouteCache};
use crate::routing::node::{count_dynamic, NodeId, Tree};
use crate::routing::params::{Params, ParamsPool, RouteParams};

/// Pattern of the route that served a request, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(Arc<str>);

impl MatchedRoute {
    pub fn new(pattern: impl Into<Arc<str>>) -> Self {
        Self(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Outcome of [`Router::resolve`].
#[derive(Debug)]
pub enum Resolution {
    /// A handler is registered for the path and method. `params` is `None`
    /// when nothing was captured (or the lookup was a literal cache hit).
    Found {
        node: NodeId,
        params: Option<Params>,
    },
    /// The path walk completed but the node it ended on does not accept the
    /// method. The node may have no handlers at all.
    MethodNotAllowed { node: NodeId },
    NotFound,
}

impl Resolution {
    /// True when the path matched, whatever the method.
    pub fn is_found(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    pub fn method_allowed(&self) -> bool {
        matches!(self, Self::Found { .. })
    }

    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::Found { node, .. } | Self::MethodNotAllowed { node } => Some(*node),
            Self::NotFound => None,
        }
    }

    pub fn params(&self) -> Option<&Params> {
        match self {
            Self::Found { params, .. } => params.as_ref(),
            _ => None,
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            Self::Found { .. } => "found",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::NotFound => "not_found",
        }
    }
}

/// Trie-based HTTP router.
pub struct Router {
    tree: Tree,
    cache: RouteCache,
    params_pool: Option<Arc<ParamsPool>>,
    max_params: usize,
    config: RouterConfig,
    middlewares: Vec<Middleware>,
    not_found: Handler,
    method_not_allowed: Handler,
    codecs: Arc<ArcSwap<Codecs>>,
}

impl Router {
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            tree: Tree::new(),
            cache: RouteCache::new(config.cache_policy, config.cache_max_entries),
            params_pool: None,
            max_params: 0,
            config,
            middlewares: Vec::new(),
            not_found: default_not_found(),
            method_not_allowed: default_method_not_allowed(),
            codecs: Arc::new(ArcSwap::from_pointee(Codecs::default())),
        }
    }

    /// Register a primitive handler wrapped in `middlewares`.
    ///
    /// Registering the same method and pattern again replaces the handler.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Handler,
        middlewares: &[Middleware],
    ) {
        self.track_dynamic(pattern);
        let node = self
            .tree
            .insert(method.clone(), pattern, chain(handler, middlewares));

        metrics::record_tree_size(self.tree.len());
        tracing::debug!(
            method = %method,
            pattern = %pattern,
            node = node.index(),
            max_params = self.max_params,
            "Route registered"
        );
    }

    /// Register a primitive handler without middlewares.
    pub fn handle(&mut self, method: Method, pattern: &str, handler: Handler) {
        self.register(method, pattern, handler, &[]);
    }

    pub fn handle_fn<F, Fut>(&mut self, method: Method, pattern: &str, f: F)
    where
        F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.handle(method, pattern, handler_fn(f));
    }

    /// Register an application handler through the result/error encoders.
    ///
    /// Router-wide middlewares wrap the endpoint first, then `middlewares`
    /// in the order given.
    pub fn endpoint<F, Fut>(
        &mut self,
        method: Method,
        pattern: &str,
        app: F,
        middlewares: &[Middleware],
    ) where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, EndpointError>> + Send + 'static,
    {
        let handler = adapt(app, Arc::clone(&self.codecs), self.config.max_body_size);
        let stack: Vec<Middleware> = self
            .middlewares
            .iter()
            .chain(middlewares)
            .cloned()
            .collect();
        self.register(method, pattern, handler, &stack);
    }

    /// Add a middleware applied to every endpoint registered afterwards.
    pub fn use_middleware(&mut self, middleware: Middleware) {
        self.middlewares.push(middleware);
    }

    pub fn set_not_found(&mut self, handler: Handler) {
        self.not_found = handler;
    }

    pub fn set_method_not_allowed(&mut self, handler: Handler) {
        self.method_not_allowed = handler;
    }

    /// Replace the success encoder, including for endpoints already registered.
    pub fn set_result_encoder(&self, encoder: ResultEncoder) {
        self.codecs.rcu(|current| Codecs {
            result: Arc::clone(&encoder),
            error: Arc::clone(&current.error),
        });
    }

    /// Replace the error encoder, including for endpoints already registered.
    pub fn set_error_encoder(&self, encoder: ErrorEncoder) {
        self.codecs.rcu(|current| Codecs {
            result: Arc::clone(&current.result),
            error: Arc::clone(&encoder),
        });
    }

    fn track_dynamic(&mut self, pattern: &str) {
        self.max_params = self.max_params.max(count_dynamic(pattern));
        if self.max_params == 0 {
            return;
        }

        match &self.params_pool {
            Some(pool) => pool.reserve(self.max_params),
            None => {
                self.params_pool = Some(Arc::new(ParamsPool::new(
                    self.max_params,
                    self.config.params_pool_max_idle,
                )));
            }
        }
    }

    /// Resolve `path` and `method` against the registered routes.
    pub fn resolve(&self, path: &str, method: &Method) -> Resolution {
        if let Some(entry) = self.cache.get(path) {
            if !self.tree.node(entry.node).allows(method) {
                return Resolution::MethodNotAllowed { node: entry.node };
            }
            let params = entry.params.as_deref().and_then(|pairs| self.replay(pairs));
            return Resolution::Found {
                node: entry.node,
                params,
            };
        }

        let Some(walk) = self.tree.walk(path, self.params_pool.as_ref()) else {
            return Resolution::NotFound;
        };

        if !self.tree.node(walk.node).allows(method) {
            return Resolution::MethodNotAllowed { node: walk.node };
        }

        self.cache.insert(path, walk.node, walk.params.as_ref());
        Resolution::Found {
            node: walk.node,
            params: walk.params,
        }
    }

    fn replay(&self, pairs: &[(Arc<str>, String)]) -> Option<Params> {
        let pool = self.params_pool.as_ref()?;
        let mut params = pool.acquire();
        for (key, value) in pairs {
            params.push(Arc::clone(key), value.as_str());
        }
        Some(params)
    }

    /// Serve one request.
    pub async fn dispatch(&self, mut req: Request<Body>) -> Response {
        let start = Instant::now();
        let method = req.method().clone();
        let resolution = self.resolve(req.uri().path(), &method);
        let outcome = resolution.outcome();

        let response = match resolution {
            Resolution::Found { node, params } => {
                let node = self.tree.node(node);
                if let Some(pattern) = node.pattern(&method) {
                    req.extensions_mut()
                        .insert(MatchedRoute(Arc::clone(pattern)));
                }
                if let Some(params) = params {
                    req.extensions_mut().insert(RouteParams::new(params));
                }
                let handler = node
                    .handler(&method)
                    .unwrap_or(&self.method_not_allowed)
                    .clone();
                handler(req).await
            }
            Resolution::MethodNotAllowed { node } => {
                tracing::debug!(
                    method = %method,
                    path = %req.uri().path(),
                    "Method not allowed"
                );
                let allow = self
                    .tree
                    .node(node)
                    .methods()
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                let mut response = (self.method_not_allowed)(req).await;
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(header::ALLOW, value);
                }
                response
            }
            Resolution::NotFound => {
                tracing::debug!(
                    method = %method,
                    path = %req.uri().path(),
                    "No route matched"
                );
                (self.not_found)(req).await
            }
        };

        metrics::record_request(outcome, start);
        response
    }

    /// Largest number of dynamic segments in any registered pattern.
    pub fn max_params(&self) -> usize {
        self.max_params
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.cache.policy()
    }

    pub fn params_pool(&self) -> Option<&Arc<ParamsPool>> {
        self.params_pool.as_ref()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Freeze the router into a cloneable `tower::Service`.
    pub fn into_service(self) -> RouterService {
        RouterService(Arc::new(self))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// A shared, frozen [`Router`] usable as a `tower::Service`.
#[derive(Clone)]
pub struct RouterService(Arc<Router>);

impl RouterService {
    pub fn router(&self) -> &Router {
        &self.0
    }
}

impl tower::Service<Request<Body>> for RouterService {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let router = Arc::clone(&self.0);
        Box::pin(async move { Ok(router.dispatch(req).await) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::endpoint::middleware_fn;
    use axum::body::to_bytes;
    use axum::http::StatusCode;

    fn text(body: &'static str) -> Handler {
        handler_fn(move |_req| async move { Response::new(Body::from(body)) })
    }

    fn pairs(resolution: &Resolution) -> Option<Vec<(String, String)>> {
        resolution.params().map(|params| {
            params
                .iter()
                .map(|p| (p.key().to_string(), p.value().to_string()))
                .collect()
        })
    }

    fn pair(key: &str, value: &str) -> Option<Vec<(String, String)>> {
        Some(vec![(key.to_string(), value.to_string())])
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(path: &str) -> Request<Body> {
        Request::get(path).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_static_route() {
        let mut router = Router::new();
        router.handle(Method::GET, "/home", text("home"));

        let res = router.resolve("/home", &Method::GET);
        assert!(res.is_found());
        assert!(res.method_allowed());
        assert!(res.params().is_none());
        assert_eq!(router.max_params(), 0);
        assert!(router.params_pool().is_none());
    }

    #[test]
    fn test_parametric_route() {
        let mut router = Router::new();
        router.handle(Method::POST, "/user/:id", text("user"));

        let res = router.resolve("/user/123", &Method::POST);
        assert!(res.method_allowed());
        assert_eq!(pairs(&res), pair("id", "123"));
    }

    #[test]
    fn test_wildcard_captures_whole_path() {
        let mut router = Router::new();
        router.handle(Method::GET, "/files/*", text("files"));

        let res = router.resolve("/files/images/img1", &Method::GET);
        assert!(res.method_allowed());
        assert_eq!(pairs(&res), pair("*", "files/images/img1"));
    }

    #[test]
    fn test_method_mismatch() {
        let mut router = Router::new();
        router.handle(Method::DELETE, "/user/:id", text("delete"));

        let res = router.resolve("/user/456", &Method::GET);
        assert!(res.is_found());
        assert!(!res.method_allowed());
        assert!(matches!(res, Resolution::MethodNotAllowed { .. }));
    }

    #[test]
    fn test_no_match() {
        let mut router = Router::new();
        router.handle(Method::GET, "/home", text("home"));
        router.handle(Method::POST, "/user/:id", text("user"));

        let res = router.resolve("/not-found/456", &Method::POST);
        assert!(!res.is_found());
        assert!(!res.method_allowed());
        assert_eq!(router.cache_len(), 0);
    }

    #[test]
    fn test_intermediate_node_is_method_not_allowed() {
        let mut router = Router::new();
        router.handle(Method::GET, "/api/users", text("users"));

        let res = router.resolve("/api", &Method::GET);
        assert!(res.is_found());
        assert!(!res.method_allowed());
        assert!(matches!(res, Resolution::MethodNotAllowed { .. }));
        assert_eq!(router.cache_len(), 0);
    }

    #[test]
    fn test_wildcard_stopping_on_handlerless_node() {
        let mut router = Router::new();
        router.handle(Method::GET, "/a/*/b", text("ab"));

        let res = router.resolve("/a/x/b", &Method::GET);
        assert!(res.is_found());
        assert!(!res.method_allowed());
        assert!(res.params().is_none());
    }

    #[tokio::test]
    async fn test_intermediate_node_dispatches_to_405() {
        let mut router = Router::new();
        router.handle(Method::GET, "/api/users", text("users"));

        let res = router.dispatch(get("/api")).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[header::ALLOW], "");
        assert_eq!(body_string(res).await, r#"{"error":"method not allowed"}"#);
    }

    #[tokio::test]
    async fn test_matched_route_follows_method() {
        async fn route_of(req: Request<Body>) -> Response {
            let route = req
                .extensions()
                .get::<MatchedRoute>()
                .map(|r| r.as_str().to_string())
                .unwrap_or_default();
            Response::new(Body::from(route))
        }

        let mut router = Router::new();
        router.handle_fn(Method::GET, "/user/:id", route_of);
        router.handle_fn(Method::DELETE, "/user/:uid", route_of);

        let res = router.dispatch(get("/user/1")).await;
        assert_eq!(body_string(res).await, "/user/:id");
        let req = Request::delete("/user/1").body(Body::empty()).unwrap();
        assert_eq!(body_string(router.dispatch(req).await).await, "/user/:uid");
    }

    #[tokio::test]
    async fn test_duplicate_registration_last_wins() {
        let mut router = Router::new();
        router.handle(Method::GET, "/home", text("first"));
        router.handle(Method::GET, "/home", text("second"));

        let res = router.dispatch(get("/home")).await;
        assert_eq!(body_string(res).await, "second");
    }

    #[test]
    fn test_conflicting_param_name_keeps_first() {
        let mut router = Router::with_config(RouterConfig {
            cache_policy: CachePolicy::Off,
            ..RouterConfig::default()
        });
        router.handle(Method::GET, "/user/:id", text("a"));
        router.handle(Method::GET, "/user/:uid", text("b"));

        let res = router.resolve("/user/7", &Method::GET);
        assert_eq!(pairs(&res), pair("id", "7"));
    }

    #[test]
    fn test_literal_cache_drops_params_on_hit() {
        let mut router = Router::new();
        router.handle(Method::GET, "/user/:id", text("user"));

        let first = router.resolve("/user/123", &Method::GET);
        assert_eq!(pairs(&first), pair("id", "123"));
        drop(first);

        let second = router.resolve("/user/123", &Method::GET);
        assert!(second.method_allowed());
        assert!(second.params().is_none());
        assert_eq!(router.cache().hits(), 1);

        // a different literal path walks the tree again
        let other = router.resolve("/user/124", &Method::GET);
        assert_eq!(pairs(&other), pair("id", "124"));
    }

    #[test]
    fn test_replay_cache_keeps_params_on_hit() {
        let mut router = Router::with_config(RouterConfig {
            cache_policy: CachePolicy::Replay,
            ..RouterConfig::default()
        });
        router.handle(Method::GET, "/user/:id", text("user"));

        drop(router.resolve("/user/123", &Method::GET));
        let second = router.resolve("/user/123", &Method::GET);
        assert_eq!(pairs(&second), pair("id", "123"));
        assert_eq!(router.cache().hits(), 1);
    }

    #[test]
    fn test_cache_off_never_stores() {
        let mut router = Router::with_config(RouterConfig {
            cache_policy: CachePolicy::Off,
            ..RouterConfig::default()
        });
        router.handle(Method::GET, "/user/:id", text("user"));

        for _ in 0..3 {
            let res = router.resolve("/user/9", &Method::GET);
            assert_eq!(pairs(&res), pair("id", "9"));
        }
        assert_eq!(router.cache_len(), 0);
    }

    #[test]
    fn test_cached_path_rechecks_method() {
        let mut router = Router::new();
        router.handle(Method::GET, "/home", text("home"));

        assert!(router.resolve("/home", &Method::GET).method_allowed());
        let res = router.resolve("/home", &Method::POST);
        assert!(matches!(res, Resolution::MethodNotAllowed { .. }));
        assert_eq!(router.cache().hits(), 1);
    }

    #[test]
    fn test_pool_hygiene() {
        let mut router = Router::with_config(RouterConfig {
            cache_policy: CachePolicy::Off,
            ..RouterConfig::default()
        });
        router.handle(Method::GET, "/a/:x/b/:y/c/:z", text("deep"));
        router.handle(Method::GET, "/one/:only", text("one"));
        assert_eq!(router.max_params(), 3);

        let deep = router.resolve("/a/1/b/2/c/3", &Method::GET);
        assert_eq!(deep.params().map(Params::len), Some(3));
        drop(deep);

        let pool = router.params_pool().unwrap();
        assert_eq!(pool.idle(), 1);
        let fresh = pool.acquire();
        assert!(fresh.is_empty());
        assert!(fresh.capacity() >= 3);
        drop(fresh);

        let one = router.resolve("/one/1", &Method::GET);
        assert_eq!(pairs(&one), pair("only", "1"));
    }

    #[test]
    fn test_max_params_grows_pool() {
        let mut router = Router::new();
        router.handle(Method::GET, "/a/:x", text("a"));
        assert_eq!(router.params_pool().unwrap().capacity(), 1);

        router.handle(Method::GET, "/b/:x/:y/*", text("b"));
        assert_eq!(router.max_params(), 3);
        assert_eq!(router.params_pool().unwrap().capacity(), 3);
    }

    #[tokio::test]
    async fn test_dispatch_injects_params_and_route() {
        let mut router = Router::new();
        router.handle_fn(Method::GET, "/user/:id", |req: Request<Body>| async move {
            let id = req
                .extensions()
                .get::<RouteParams>()
                .map(|p| p.by_name("id").to_string())
                .unwrap_or_default();
            let route = req
                .extensions()
                .get::<MatchedRoute>()
                .map(|r| r.as_str().to_string())
                .unwrap_or_default();
            Response::new(Body::from(format!("{route} {id}")))
        });

        let res = router.dispatch(get("/user/42")).await;
        assert_eq!(body_string(res).await, "/user/:id 42");

        // second hit on the same literal path carries no params
        let res = router.dispatch(get("/user/42")).await;
        assert_eq!(body_string(res).await, "/user/:id ");
        assert_eq!(router.params_pool().unwrap().idle(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_fallbacks() {
        let mut router = Router::new();
        router.handle(Method::GET, "/items", text("list"));
        router.handle(Method::POST, "/items", text("create"));

        let res = router.dispatch(get("/nothing")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_string(res).await, r#"{"error":"endpoint not found"}"#);

        let req = Request::delete("/items").body(Body::empty()).unwrap();
        let res = router.dispatch(req).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[header::ALLOW], "GET, POST");
        assert_eq!(body_string(res).await, r#"{"error":"method not allowed"}"#);
    }

    #[tokio::test]
    async fn test_custom_fallbacks() {
        let mut router = Router::new();
        router.handle(Method::GET, "/x", text("x"));
        router.set_not_found(text("nope"));
        router.set_method_not_allowed(text("wrong method"));

        assert_eq!(body_string(router.dispatch(get("/y")).await).await, "nope");
        let req = Request::put("/x").body(Body::empty()).unwrap();
        assert_eq!(body_string(router.dispatch(req).await).await, "wrong method");
    }

    #[tokio::test]
    async fn test_endpoint_with_global_and_local_middlewares() {
        fn header_tag(value: &'static str) -> Middleware {
            middleware_fn(move |next: Handler| -> Handler {
                Arc::new(move |req: Request<Body>| -> BoxFuture<'static, Response> {
                    let next = Arc::clone(&next);
                    Box::pin(async move {
                        let mut res = next(req).await;
                        res.headers_mut()
                            .append("x-tag", HeaderValue::from_static(value));
                        res
                    })
                })
            })
        }

        let mut router = Router::new();
        router.use_middleware(header_tag("global"));
        router.endpoint(
            Method::GET,
            "/users/:id",
            |ctx: RequestContext| async move {
                Reply::json(&serde_json::json!({ "id": ctx.param("id") }))
            },
            &[header_tag("local")],
        );

        let res = router.dispatch(get("/users/5")).await;
        assert_eq!(res.status(), StatusCode::OK);
        // innermost middleware appends first
        let tags: Vec<_> = res
            .headers()
            .get_all("x-tag")
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(tags, vec!["local", "global"]);
        assert_eq!(body_string(res).await, r#"{"id":"5"}"#);
    }

    #[tokio::test]
    async fn test_error_encoder_replaced_after_registration() {
        let mut router = Router::new();
        router.endpoint(
            Method::GET,
            "/fail",
            |_ctx: RequestContext| async { Err::<Reply, _>(EndpointError::forbidden("no")) },
            &[],
        );
        router.set_error_encoder(Arc::new(|err: EndpointError| {
            let mut res = Response::new(Body::from(format!("custom: {err}")));
            *res.status_mut() = err.status_code().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            res
        }));

        let res = router.dispatch(get("/fail")).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_string(res).await, "custom: no");
    }

    #[tokio::test]
    async fn test_result_encoder_replaced_after_registration() {
        let mut router = Router::new();
        router.endpoint(
            Method::GET,
            "/users/:id",
            |ctx: RequestContext| async move {
                Reply::json(&serde_json::json!({ "id": ctx.param("id") }))
            },
            &[],
        );
        router.set_result_encoder(Arc::new(|reply: Reply| {
            let body = reply.body().map(|v| v.to_string()).unwrap_or_default();
            let mut res = Response::new(Body::from(format!("custom: {body}")));
            *res.status_mut() = StatusCode::ACCEPTED;
            res
        }));

        let res = router.dispatch(get("/users/8")).await;
        assert_eq!(res.status(), StatusCode::ACCEPTED);
        assert_eq!(body_string(res).await, r#"custom: {"id":"8"}"#);
    }

    #[tokio::test]
    async fn test_router_service() {
        use tower::ServiceExt;

        let mut router = Router::new();
        router.handle(Method::GET, "/ping", text("pong"));
        let svc = router.into_service();

        let res = svc.clone().oneshot(get("/ping")).await.unwrap();
        assert_eq!(body_string(res).await, "pong");
        assert_eq!(svc.router().cache_len(), 1);
    }
}
