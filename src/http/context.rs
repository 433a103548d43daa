//! Request context handed to application handlers.
//!
//! # Responsibilities
//! - Expose route parameters, query values and headers of one request
//! - Read the request body under a size limit
//! - Build contexts in unit tests without going through a router
//!
//! # Design Decisions
//! - Missing parameters and query values read as the empty string
//! - The body can be consumed once; later reads see an empty body

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{Extensions, HeaderMap, Method, Request, Uri};
use serde::de::DeserializeOwned;

use crate::http::endpoint::EndpointError;
use crate::routing::params::{Params, RouteParams};
use crate::routing::router::MatchedRoute;

/// Default upper bound for request bodies read through a context.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// One in-flight request as seen by an endpoint.
#[derive(Debug)]
pub struct RequestContext {
    request: Request<Body>,
    body_limit: usize,
}

impl RequestContext {
    pub fn new(request: Request<Body>) -> Self {
        Self {
            request,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Header value as a string; `None` when absent or not visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    /// First query value for `key`, or the empty string.
    pub fn query(&self, key: &str) -> String {
        self.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
            .unwrap_or_default()
    }

    /// Every query value for `key`, in order.
    pub fn queries(&self, key: &str) -> Vec<String> {
        self.query_pairs()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v)
            .collect()
    }

    fn query_pairs(&self) -> impl Iterator<Item = (String, String)> + '_ {
        let query = self.request.uri().query().unwrap_or_default();
        url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
    }

    /// Route parameter `key`, or the empty string.
    pub fn param(&self, key: &str) -> &str {
        self.params().map(|p| p.by_name(key)).unwrap_or_default()
    }

    /// Every captured parameter, when the route captured any.
    pub fn params(&self) -> Option<&Params> {
        self.request
            .extensions()
            .get::<RouteParams>()
            .map(|params| &**params)
    }

    /// Pattern of the route that matched this request.
    pub fn matched_route(&self) -> Option<&str> {
        self.request
            .extensions()
            .get::<MatchedRoute>()
            .map(MatchedRoute::as_str)
    }

    pub fn extensions(&self) -> &Extensions {
        self.request.extensions()
    }

    pub fn request(&self) -> &Request<Body> {
        &self.request
    }

    /// Read the whole body, failing with 400 past the limit.
    pub async fn bytes(&mut self) -> Result<Bytes, EndpointError> {
        let body = std::mem::take(self.request.body_mut());
        axum::body::to_bytes(body, self.body_limit)
            .await
            .map_err(|err| EndpointError::bad_request(format!("invalid request body: {err}")))
    }

    /// Read the body as JSON.
    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T, EndpointError> {
        let bytes = self.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| EndpointError::bad_request(format!("invalid JSON body: {err}")))
    }

    pub fn into_request(self) -> Request<Body> {
        self.request
    }
}

/// Builds a [`RequestContext`] by hand, for testing application handlers.
///
/// ```
/// use axum::http::Method;
/// use trie_router::http::context::TestContext;
///
/// let ctx = TestContext::new(Method::GET, "/users/7")
///     .param("id", "7")
///     .query("verbose", "true")
///     .build()
///     .unwrap();
/// assert_eq!(ctx.param("id"), "7");
/// assert_eq!(ctx.query("verbose"), "true");
/// ```
#[derive(Debug, Default)]
pub struct TestContext {
    method: Method,
    target: String,
    params: Vec<(String, String)>,
    queries: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    route: Option<String>,
    body: Vec<u8>,
}

impl TestContext {
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.queries.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Pattern reported by [`RequestContext::matched_route`].
    pub fn route(mut self, pattern: impl Into<String>) -> Self {
        self.route = Some(pattern.into());
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Result<RequestContext, axum::http::Error> {
        let mut target = self.target;
        if !self.queries.is_empty() {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&self.queries)
                .finish();
            target.push(if target.contains('?') { '&' } else { '?' });
            target.push_str(&encoded);
        }

        let mut builder = Request::builder().method(self.method).uri(target);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let mut request = builder.body(Body::from(self.body))?;

        if !self.params.is_empty() {
            let mut params = Params::with_capacity(self.params.len());
            for (key, value) in self.params {
                params.push(Arc::from(key), value);
            }
            request.extensions_mut().insert(RouteParams::new(params));
        }
        if let Some(route) = self.route {
            request.extensions_mut().insert(MatchedRoute::new(route));
        }

        Ok(RequestContext::new(request))
    }
}
