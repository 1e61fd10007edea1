use std::sync::RwLock;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Viewer,
    Staff,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Self::Viewer),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            other => Err(AppError::Config(format!(
                "invalid role '{other}' (expected: viewer|staff|admin)"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Viewer => "viewer",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }
}

/// Role required by every mutation in the document repository.
pub const MUTATION_ROLE: Role = Role::Admin;

/// Answers "does the signed-in user hold `role`?" from locally cached session
/// state. The backend re-enforces the same rule on every request.
pub trait PermissionCheck: Send + Sync {
    fn has_permission(&self, role: Role) -> bool;
}

/// Cached role of the current session. Roles are ranked, so an admin also
/// satisfies staff and viewer checks.
#[derive(Debug)]
pub struct SessionPermissions {
    role: RwLock<Option<Role>>,
}

impl SessionPermissions {
    pub fn new(role: Option<Role>) -> Self {
        Self {
            role: RwLock::new(role),
        }
    }

    pub fn set_role(&self, role: Option<Role>) {
        let mut guard = self
            .role
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = role;
    }

    pub fn role(&self) -> Option<Role> {
        *self
            .role
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PermissionCheck for SessionPermissions {
    fn has_permission(&self, role: Role) -> bool {
        self.role().is_some_and(|current| current >= role)
    }
}

pub fn enforce(check: &dyn PermissionCheck, action: &str) -> Result<(), AppError> {
    if check.has_permission(MUTATION_ROLE) {
        return Ok(());
    }
    tracing::info!(action, "blocked by permission gate");
    Err(AppError::PermissionDenied(format!(
        "{action} requires the {} role",
        MUTATION_ROLE.as_str()
    )))
}
