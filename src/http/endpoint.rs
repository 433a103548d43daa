//! Handler types and the endpoint adapter.
//!
//! # Responsibilities
//! - Define the primitive handler and middleware types stored by the router
//! - Compose middleware chains
//! - Adapt application handlers (`RequestContext` → `Result<Reply, EndpointError>`)
//!   into primitive handlers through pluggable result/error encoders
//!
//! # Design Decisions
//! - Middlewares are applied outermost-first, in the order given
//! - Success and error values carry an optional status code; encoders fall
//!   back to 200 / 204 / 500
//! - Encoders are read at request time so a replaced encoder applies to
//!   endpoints registered earlier

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::http::context::RequestContext;
use crate::http::response::{error_body, json_response, no_content};
use crate::routing::router::MatchedRoute;

/// Request header carrying the route pattern that matched.
pub const X_ACTUAL_PATH: &str = "x-actual-path";

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Primitive handler stored on terminal nodes.
pub type Handler = Arc<dyn Fn(Request<Body>) -> BoxFuture<'static, Response> + Send + Sync>;

/// Wraps a handler into another handler.
pub type Middleware = Arc<dyn Fn(Handler) -> Handler + Send + Sync>;

/// Writes a success value as a response.
pub type ResultEncoder = Arc<dyn Fn(Reply) -> Response + Send + Sync>;

/// Writes an error as a response.
pub type ErrorEncoder = Arc<dyn Fn(EndpointError) -> Response + Send + Sync>;

/// Build a [`Handler`] from an async function.
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Request<Body>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req: Request<Body>| -> BoxFuture<'static, Response> { Box::pin(f(req)) })
}

/// Build a [`Middleware`] from a function.
pub fn middleware_fn<F>(f: F) -> Middleware
where
    F: Fn(Handler) -> Handler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap `handler` in `middlewares`; the first middleware is the outermost.
pub fn chain(handler: Handler, middlewares: &[Middleware]) -> Handler {
    middlewares
        .iter()
        .rev()
        .fold(handler, |inner, middleware| middleware(inner))
}

/// Success value returned by an application handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    value: Option<Value>,
    status: Option<StatusCode>,
}

impl Reply {
    /// Serialize `value` into a reply.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, EndpointError> {
        Ok(Self::value(serde_json::to_value(value)?))
    }

    pub fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            status: None,
        }
    }

    /// A reply without a body.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn body(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

/// Error returned by an application handler.
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error(transparent)]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Internal(#[from] BoxError),
}

impl EndpointError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(err: impl Into<BoxError>) -> Self {
        Self::Internal(err.into())
    }

    /// Status code carried by the error, if any.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Default success encoder.
///
/// Uses the reply's status or 200. Answers 204 without a body when the
/// status is 204 or there is no value.
pub fn default_result_encoder(reply: Reply) -> Response {
    let status = reply.status.unwrap_or(StatusCode::OK);
    match reply.value {
        None | Some(Value::Null) => no_content(),
        Some(_) if status == StatusCode::NO_CONTENT => no_content(),
        Some(value) => json_response(status, &value),
    }
}

/// Default error encoder: `{"error": "<message>"}` with the error's status or 500.
pub fn default_error_encoder(err: EndpointError) -> Response {
    let status = err
        .status_code()
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(status, &error_body(&err.to_string()))
}

/// The pair of encoders used by adapted endpoints.
#[derive(Clone)]
pub struct Codecs {
    pub result: ResultEncoder,
    pub error: ErrorEncoder,
}

impl Default for Codecs {
    fn default() -> Self {
        Self {
            result: Arc::new(default_result_encoder),
            error: Arc::new(default_error_encoder),
        }
    }
}

/// Adapt an application handler into a primitive [`Handler`].
pub fn adapt<F, Fut>(app: F, codecs: Arc<ArcSwap<Codecs>>, body_limit: usize) -> Handler
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Reply, EndpointError>> + Send + 'static,
{
    let app = Arc::new(app);
    Arc::new(move |mut req: Request<Body>| -> BoxFuture<'static, Response> {
        let app = Arc::clone(&app);
        let codecs = Arc::clone(&codecs);
        Box::pin(async move {
            let matched = req
                .extensions()
                .get::<MatchedRoute>()
                .and_then(|route| HeaderValue::from_str(route.as_str()).ok());
            if let Some(value) = matched {
                req.headers_mut()
                    .insert(HeaderName::from_static(X_ACTUAL_PATH), value);
            }

            let ctx = RequestContext::new(req).with_body_limit(body_limit);
            let outcome = app(ctx).await;

            let codecs = codecs.load();
            match outcome {
                Ok(reply) => (codecs.result)(reply),
                Err(err) => {
                    tracing::debug!(error = %err, "Endpoint returned an error");
                    (codecs.error)(err)
                }
            }
        })
    })
}
