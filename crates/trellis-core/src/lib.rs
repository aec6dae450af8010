//! # Trellis Core
//!
//! Foundational types shared by every Trellis crate:
//!
//! - [`error`]: the request error taxonomy ([`AppError`]) and bootstrap failures ([`ConfigError`])
//! - [`identity`]: authenticated identity and the resolver contracts used by the request pipeline
//! - [`pagination`]: the pager placeholder carried by every request context
//!
//! # Example
//!
//! ```ignore
//! use trellis_core::{AppError, RecordNotFound};
//!
//! fn lookup(id: &str) -> Result<String, AppError> {
//!     Err(RecordNotFound::new("url").into())
//! }
//!
//! assert_eq!(lookup("x").unwrap_err().status().as_u16(), 404);
//! ```

pub mod error;
pub mod identity;
pub mod pagination;

// Re-export commonly used types at crate root
pub use error::{AppError, ConfigError, ErrorBody, FieldError, RecordNotFound, ValidationResponse};
pub use identity::{Anonymous, Identity, IdentityResolver, RoleResolver};
pub use pagination::{PageMeta, Pager};
