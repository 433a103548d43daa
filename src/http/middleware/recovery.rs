//! Panic recovery middleware.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::http::endpoint::{middleware_fn, Handler, Middleware};
use crate::http::response::error_response;

pub const PANIC_MESSAGE: &str = "Internal Server Error";

/// Turn a panicking handler into a logged 500 response.
///
/// Panics raised while building the handler future are caught as well as
/// panics raised while polling it.
pub fn recovery() -> Middleware {
    middleware_fn(|next: Handler| -> Handler {
        Arc::new(move |req: Request<Body>| -> BoxFuture<'static, Response> {
            let next = Arc::clone(&next);
            let method = req.method().clone();
            let path = req.uri().path().to_string();

            Box::pin(async move {
                match AssertUnwindSafe(async move { next(req).await })
                    .catch_unwind()
                    .await
                {
                    Ok(response) => response,
                    Err(payload) => {
                        tracing::error!(
                            method = %method,
                            path = %path,
                            panic = %panic_message(payload.as_ref()),
                            "Handler panicked"
                        );
                        error_response(StatusCode::INTERNAL_SERVER_ERROR, PANIC_MESSAGE)
                    }
                }
            })
        })
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
