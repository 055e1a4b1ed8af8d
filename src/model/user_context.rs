use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// User context extracted from request headers, used for permission checks
/// and the `user` token type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub user_name: Option<String>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    /// Internal callers only; never read from or written to the wire.
    #[serde(skip)]
    is_system: bool,
}

impl UserContext {
    /// Create a new UserContext with just a user ID
    pub fn new(user_id: String) -> Self {
        Self {
            user_id,
            user_name: None,
            permissions: BTreeSet::new(),
            is_system: false,
        }
    }

    pub fn with_details(user_id: String, name: Option<String>, permissions: BTreeSet<String>) -> Self {
        Self {
            user_id,
            user_name: name,
            permissions,
            is_system: false,
        }
    }

    /// Create a system user context for internal operations
    pub fn system() -> Self {
        Self {
            user_id: "system".to_string(),
            user_name: Some("System".to_string()),
            permissions: BTreeSet::new(),
            is_system: true,
        }
    }

    /// Requests without user headers act as an anonymous user with no permissions.
    pub fn anonymous() -> Self {
        Self {
            user_id: "0".to_string(),
            user_name: Some("Anonymous".to_string()),
            permissions: BTreeSet::new(),
            is_system: false,
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_system || self.permissions.contains(permission)
    }

    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or(&self.user_id)
    }
}

impl Default for UserContext {
    fn default() -> Self {
        Self::anonymous()
    }
}
