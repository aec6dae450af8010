use axum::http::{header::AUTHORIZATION, request::Parts};
use tracing::debug;

use trellis_acl::{AUTHENTICATED_ROLE, UNAUTHENTICATED_ROLE};
use trellis_config::JwtConfig;
use trellis_core::{Identity, IdentityResolver, RoleResolver};

use crate::claims::Claims;
use crate::jwt::verify_token;

/// Resolves identity and roles from an `Authorization: Bearer <jwt>` header.
///
/// The token is verified once, in [`IdentityResolver::resolve_identity`];
/// its role claims travel on the returned [`Identity`] and
/// [`RoleResolver::resolve_roles`] reads them from there.
///
/// A missing or invalid token yields an anonymous request with the
/// `unAuthenticated` role. It never fails the request.
#[derive(Debug, Clone)]
pub struct BearerTokenResolver {
    config: JwtConfig,
}

impl BearerTokenResolver {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    fn claims(&self, parts: &Parts) -> Option<Claims> {
        let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))?
            .trim();

        match verify_token(token, &self.config) {
            Ok(claims) => Some(claims),
            Err(err) => {
                debug!(error = %err, "Rejected bearer token");
                None
            }
        }
    }
}

impl IdentityResolver for BearerTokenResolver {
    fn resolve_identity(&self, parts: &Parts) -> Option<Identity> {
        self.claims(parts).map(|claims| {
            Identity::new(claims.sub)
                .with_email(claims.email)
                .with_roles(claims.roles)
        })
    }
}

impl RoleResolver for BearerTokenResolver {
    fn resolve_roles(&self, _parts: &Parts, identity: Option<&Identity>) -> Vec<String> {
        match identity {
            Some(identity) => {
                let mut roles = identity.roles.clone();
                if !roles.iter().any(|r| r == AUTHENTICATED_ROLE) {
                    roles.push(AUTHENTICATED_ROLE.to_string());
                }
                roles
            }
            None => vec![UNAUTHENTICATED_ROLE.to_string()],
        }
    }
}
