//! Router-level middleware.
//!
//! - [`context`]: builds the per-request [`RequestContext`](crate::context::RequestContext)
//!
//! Request logging and metrics live in [`crate::logging`] and [`crate::metrics`].

pub mod context;

pub use context::request_context;
