//! Middlewares shipped with the router.
//!
//! `recovery` wraps router handlers; `request_id` provides tower layers for
//! the server stack.

pub mod recovery;
pub mod request_id;

pub use recovery::recovery;
pub use request_id::{request_id, RequestUuid, X_REQUEST_ID};
