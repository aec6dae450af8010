//! # Trellis ACL
//!
//! Role-based authorization for Trellis applications.
//!
//! - [`role`]: the [`Role`] type, a named set of permission tokens plus flags
//! - [`controller`]: the [`AccessController`] registry and its permission check
//!
//! # Example
//!
//! ```ignore
//! use trellis_acl::{AccessController, AccessControllerOptions};
//!
//! let acl = AccessController::new(AccessControllerOptions::default());
//! acl.load_roles()?;
//!
//! acl.set_role_permission("authenticated", "find_url", true);
//! assert!(acl.can("find_url", &["authenticated"]));
//! ```

pub mod controller;
pub mod role;

// Re-export commonly used types at crate root
pub use controller::{
    ADMINISTRATOR_ROLE, AUTHENTICATED_ROLE, AccessController, AccessControllerOptions,
    DEFAULT_ACL_FILE, UNAUTHENTICATED_ROLE,
};
pub use role::{Role, RoleOptions};
