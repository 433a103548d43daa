//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     (method, pattern, handler)
//!     → router.rs (wrap in middlewares, track max params)
//!     → node.rs (insert segments into the tree)
//!
//! Incoming Request (method, path)
//!     → cache.rs (literal path hit?)
//!     → node.rs (walk: literal → :param → *)
//!     → params.rs (captures in a pooled buffer)
//!     → Return: Found / MethodNotAllowed / NotFound
//! ```
//!
//! # Design Decisions
//! - Tree built at startup, immutable while serving
//! - No regex and no backtracking in the hot path
//! - One parametric branch per tree level; the first name registered wins

pub mod cache;
pub mod node;
pub mod params;
pub mod router;

pub use cache::{CachePolicy, RouteCache};
pub use node::{NodeId, NodeKind, Tree};
pub use params::{Param, Params, ParamsPool, RouteParams};
pub use router::{MatchedRoute, Resolution, Router, RouterService};
