//! Role registry and permission evaluation.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info, warn};
use trellis_core::ConfigError;

use crate::role::Role;

/// Role name that passes every permission check. It never needs a registry entry.
pub const ADMINISTRATOR_ROLE: &str = "administrator";
pub const AUTHENTICATED_ROLE: &str = "authenticated";
pub const UNAUTHENTICATED_ROLE: &str = "unAuthenticated";

pub const DEFAULT_ACL_FILE: &str = "acl.json";

const DEFAULT_ROLES: &str = include_str!("../data/default_roles.json");

#[derive(Debug, Clone)]
pub struct AccessControllerOptions {
    pub disabled: bool,
    pub source: PathBuf,
}

impl Default for AccessControllerOptions {
    fn default() -> Self {
        Self {
            disabled: false,
            source: PathBuf::from(DEFAULT_ACL_FILE),
        }
    }
}

/// Owns the role registry and answers permission questions.
///
/// Reads and writes go through a read/write lock so administrative updates
/// can run while requests are being served. The disabled flag is atomic and
/// takes effect on the next [`can`](Self::can) call.
#[derive(Debug)]
pub struct AccessController {
    roles: RwLock<HashMap<String, Role>>,
    disabled: AtomicBool,
    source: PathBuf,
}

impl Default for AccessController {
    fn default() -> Self {
        Self::new(AccessControllerOptions::default())
    }
}

impl AccessController {
    /// Creates an empty controller. Call [`load_roles`](Self::load_roles) to populate it.
    pub fn new(opts: AccessControllerOptions) -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
            disabled: AtomicBool::new(opts.disabled),
            source: opts.source,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Loads the registry from the configured source, replacing current contents.
    ///
    /// A missing file falls back to the embedded default registry. A file that
    /// exists but cannot be read or parsed is a [`ConfigError`].
    pub fn load_roles(&self) -> Result<(), ConfigError> {
        match std::fs::read_to_string(&self.source) {
            Ok(content) => {
                let origin = self.source.display().to_string();
                self.load_roles_from_str(&content, &origin)?;
                info!(source = %origin, "Loaded role registry");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(
                    source = %self.source.display(),
                    "Role registry not found, using built-in defaults"
                );
                self.load_roles_from_str(DEFAULT_ROLES, "built-in defaults")
            }
            Err(source) => Err(ConfigError::RegistryRead {
                path: self.source.clone(),
                source,
            }),
        }
    }

    /// Parses a registry document of the form `{name: {permissions, isSystemRole, canAddInUsers}}`.
    pub fn load_roles_from_str(&self, document: &str, origin: &str) -> Result<(), ConfigError> {
        let parsed: HashMap<String, Role> =
            serde_json::from_str(document).map_err(|source| ConfigError::RegistryParse {
                origin: origin.to_string(),
                source,
            })?;

        let mut loaded = HashMap::with_capacity(parsed.len());
        for (name, mut role) in parsed {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyRoleName);
            }
            role.name = name.clone();
            loaded.insert(name, role);
        }

        *self.roles.write() = loaded;
        Ok(())
    }

    /// Snapshot of the registry.
    pub fn roles(&self) -> HashMap<String, Role> {
        self.roles.read().clone()
    }

    /// Whether any of `user_roles` grants `permission`.
    ///
    /// Disabled mode wins over everything, then the administrator sentinel,
    /// then the registry. Unknown role names are skipped.
    pub fn can<S: AsRef<str>>(&self, permission: &str, user_roles: &[S]) -> bool {
        if self.is_disabled() {
            let requested: Vec<&str> = user_roles.iter().map(AsRef::as_ref).collect();
            warn!(
                permission,
                roles = ?requested,
                "ACL is disabled: skipping permission check"
            );
            return true;
        }

        if user_roles.iter().any(|r| r.as_ref() == ADMINISTRATOR_ROLE) {
            return true;
        }

        let roles = self.roles.read();
        user_roles
            .iter()
            .filter_map(|name| roles.get(name.as_ref()))
            .any(|role| role.can(permission))
    }

    /// Inserts or replaces a role. The stored name always matches `name`.
    pub fn set_role(&self, name: &str, mut role: Role) {
        role.name = name.to_string();
        self.roles.write().insert(name.to_string(), role);
    }

    /// Returns a copy of the role. Mutating it does not touch the registry.
    pub fn get_role(&self, name: &str) -> Option<Role> {
        self.roles.read().get(name).cloned()
    }

    /// Grants or revokes a permission and stores the updated role back.
    ///
    /// Does nothing when the role is unknown.
    pub fn set_role_permission(&self, name: &str, permission: &str, grant: bool) {
        let mut roles = self.roles.write();
        let Some(mut role) = roles.get(name).cloned() else {
            debug!(role = name, permission, "Ignoring permission change for unknown role");
            return;
        };

        if grant {
            role.add_permission(permission);
        } else {
            role.remove_permission(permission);
        }

        roles.insert(name.to_string(), role);
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::SeqCst);
        if disabled {
            warn!("ACL disabled: every permission check will pass");
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }
}
