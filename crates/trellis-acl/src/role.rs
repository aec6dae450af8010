//! A named bundle of permission tokens.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use trellis_core::ConfigError;

/// Authorization unit stored in the role registry.
///
/// Permissions are opaque, case-sensitive tokens such as `find_url`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    /// Filled from the registry key when loaded from a document.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// System roles are not editable or deletable by end users.
    #[serde(default)]
    pub is_system_role: bool,
    /// Whether end users may self-assign this role.
    #[serde(default)]
    pub can_add_in_users: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RoleOptions {
    pub name: String,
    pub permissions: Vec<String>,
    pub is_system_role: bool,
    pub can_add_in_users: bool,
}

impl RoleOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Role {
    pub fn new(opts: RoleOptions) -> Result<Self, ConfigError> {
        if opts.name.trim().is_empty() {
            return Err(ConfigError::EmptyRoleName);
        }

        Ok(Self {
            name: opts.name,
            permissions: opts.permissions.into_iter().collect(),
            is_system_role: opts.is_system_role,
            can_add_in_users: opts.can_add_in_users,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn can(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    pub fn add_permission(&mut self, permission: impl Into<String>) {
        self.permissions.insert(permission.into());
    }

    pub fn remove_permission(&mut self, permission: &str) {
        self.permissions.remove(permission);
    }

    pub fn permissions(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }
}
