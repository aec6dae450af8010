//! # Trellis Auth
//!
//! Bearer token authentication for Trellis applications.
//!
//! - [`claims`]: JWT claim structure for access tokens
//! - [`jwt`]: token creation and verification
//! - [`resolver`]: [`BearerTokenResolver`], an identity and role resolver
//!   backed by the `Authorization: Bearer` header
//!
//! # Example
//!
//! ```ignore
//! use trellis_auth::{create_access_token, verify_token};
//! use trellis_config::JwtConfig;
//!
//! let config = JwtConfig::from_env();
//! let token = create_access_token("42", "user@example.com", vec!["editor".into()], &config)?;
//! let claims = verify_token(&token, &config)?;
//! assert_eq!(claims.sub, "42");
//! ```

pub mod claims;
pub mod jwt;
pub mod resolver;

// Re-export commonly used types at crate root
pub use claims::Claims;
pub use jwt::{create_access_token, verify_token};
pub use resolver::BearerTokenResolver;
pub use trellis_acl::{AUTHENTICATED_ROLE, UNAUTHENTICATED_ROLE};
