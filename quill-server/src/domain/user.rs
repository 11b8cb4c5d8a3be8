use chrono::{DateTime, Utc};
use quill_contract::{Role, UserDto};

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub avatar: Option<String>,
    pub role: Role,
    pub provider: String,
    pub provider_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Verified profile from an external identity provider.
#[derive(Debug, Clone)]
pub struct ExternalProfile {
    pub provider: String,
    pub provider_id: String,
    pub name: String,
    pub avatar: Option<String>,
}

impl ExternalProfile {
    /// `provider:provider_id`, the form used by the `SUPER_ADMINS` setting.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.provider, self.provider_id)
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn require(&self, role: Role) -> Result<(), super::DomainError> {
        if self.role.satisfies(role) {
            Ok(())
        } else {
            tracing::warn!(
                "User {} with role {} attempted an action requiring {}",
                self.id,
                self.role,
                role
            );
            Err(super::DomainError::Forbidden)
        }
    }
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            avatar: user.avatar,
            role: user.role,
            provider: user.provider,
            created_at: user.created_at,
        }
    }
}
