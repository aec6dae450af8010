use serde::{Deserialize, Serialize};

/// JWT claims for access tokens.
///
/// Roles travel in the token so the request pipeline can authorize without a
/// lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    pub email: String,
    /// Role names granted to the user
    #[serde(default)]
    pub roles: Vec<String>,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}
