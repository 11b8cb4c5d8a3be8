use super::page_bounds;
use crate::data::UserRepository;
use crate::domain::{Actor, DomainError};
use quill_contract::{Page, PageCursor, Role, UserDto};
use std::sync::Arc;

pub struct UserService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self { user_repo }
    }

    pub async fn list_users(
        &self,
        actor: &Actor,
        cursor: PageCursor,
    ) -> Result<Page<UserDto>, DomainError> {
        actor.require(Role::Admin)?;
        let (limit, offset) = page_bounds(cursor)?;
        let (users, total) = self.user_repo.list(limit, offset).await?;
        Ok(Page::new(users.into_iter().map(UserDto::from).collect(), total))
    }

    pub async fn set_role(
        &self,
        actor: &Actor,
        user_id: i64,
        role: Role,
    ) -> Result<UserDto, DomainError> {
        actor.require(Role::SuperAdmin)?;
        if actor.id == user_id {
            return Err(DomainError::InvalidParam(
                "cannot change your own role".to_string(),
            ));
        }

        let user = self.user_repo.set_role(user_id, role).await?;
        tracing::info!(
            "User {} set role of user {} to {}",
            actor.id,
            user_id,
            role
        );
        Ok(UserDto::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryStore;
    use crate::domain::user::ExternalProfile;

    async fn seeded() -> (UserService, i64) {
        let store = Arc::new(InMemoryStore::new());
        let user = store
            .upsert_external(&ExternalProfile {
                provider: "github".into(),
                provider_id: "2".into(),
                name: "Grace".into(),
                avatar: None,
            })
            .await
            .unwrap();
        (UserService::new(store), user.id)
    }

    #[tokio::test]
    async fn only_super_admin_changes_roles() {
        let (svc, user_id) = seeded().await;
        let admin = Actor {
            id: 100,
            role: Role::Admin,
        };
        let root = Actor {
            id: 101,
            role: Role::SuperAdmin,
        };

        let err = svc.set_role(&admin, user_id, Role::Admin).await.unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));

        let user = svc.set_role(&root, user_id, Role::Admin).await.unwrap();
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (svc, _) = seeded().await;
        let root = Actor {
            id: 101,
            role: Role::SuperAdmin,
        };
        let err = svc.set_role(&root, 9999, Role::Admin).await.unwrap_err();
        assert!(matches!(err, DomainError::UserNotFound));
    }
}
