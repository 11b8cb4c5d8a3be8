use crate::data::UserRepository;
use crate::domain::user::ExternalProfile;
use crate::domain::{Actor, DomainError};
use crate::infrastructure::jwt::JwtService;
use quill_contract::{AuthResponse, ExternalLoginRequest, Role, UserDto};
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

pub struct AuthService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    jwt_service: Arc<JwtService>,
    broker_secret: String,
    super_admins: HashSet<String>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        jwt_service: Arc<JwtService>,
        broker_secret: impl Into<String>,
        super_admins: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            user_repo,
            jwt_service,
            broker_secret: broker_secret.into(),
            super_admins: super_admins.into_iter().collect(),
        }
    }

    /// Signs in a user vouched for by the identity broker, which proves
    /// itself with `broker_secret`.
    ///
    /// The first login creates a guest account. Later logins refresh the
    /// display name and avatar but never the role, except that identities
    /// listed in `SUPER_ADMINS` are promoted.
    pub async fn external_login(
        &self,
        broker_secret: Option<&str>,
        req: ExternalLoginRequest,
    ) -> Result<AuthResponse, DomainError> {
        if !self.is_broker(broker_secret) {
            tracing::warn!(
                "External login for {}:{} rejected: {} broker secret",
                req.provider,
                req.provider_id,
                if broker_secret.is_some() { "wrong" } else { "missing" }
            );
            return Err(DomainError::Unauthorized(
                "Identity broker credentials required".to_string(),
            ));
        }
        req.validate()?;

        let profile = ExternalProfile {
            provider: req.provider.trim().to_lowercase(),
            provider_id: req.provider_id.trim().to_string(),
            name: req.name.trim().to_string(),
            avatar: req.avatar,
        };

        tracing::debug!("External login for {}", profile.identity());

        let mut user = self.user_repo.upsert_external(&profile).await?;

        if self.super_admins.contains(&profile.identity()) && user.role != Role::SuperAdmin {
            tracing::info!("Promoting {} to super-admin", profile.identity());
            user = self.user_repo.set_role(user.id, Role::SuperAdmin).await?;
        }

        let token = self
            .jwt_service
            .generate_token(user.id, &user.name, user.role)?;

        tracing::info!(
            "User logged in: id={}, provider={}, role={}",
            user.id,
            user.provider,
            user.role
        );

        Ok(AuthResponse {
            token,
            user: UserDto::from(user),
        })
    }

    fn is_broker(&self, presented: Option<&str>) -> bool {
        let Some(presented) = presented else {
            return false;
        };
        // compare every byte so timing does not leak the matching prefix
        presented.len() == self.broker_secret.len()
            && presented
                .bytes()
                .zip(self.broker_secret.bytes())
                .fold(0u8, |acc, (a, b)| acc | (a ^ b))
                == 0
    }

    /// Resolves a bearer token to the caller, using the stored role so role
    /// changes apply without a new login.
    pub async fn authenticate(&self, token: &str) -> Result<Actor, DomainError> {
        let claims = self.jwt_service.verify_token(token)?;
        match self.user_repo.find_by_id(claims.user_id).await {
            Ok(user) => Ok(Actor {
                id: user.id,
                role: user.role,
            }),
            Err(DomainError::UserNotFound) => {
                tracing::warn!("Token for unknown user_id {}", claims.user_id);
                Err(DomainError::Unauthorized("Unknown user".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn me(&self, actor: &Actor) -> Result<UserDto, DomainError> {
        let user = self.user_repo.find_by_id(actor.id).await?;
        Ok(UserDto::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemoryStore;

    const BROKER: &str = "broker-secret";

    fn service(super_admins: &[&str]) -> AuthService {
        AuthService::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(JwtService::new("unit-test-secret-unit-test-secret-0000")),
            BROKER,
            super_admins.iter().map(|s| s.to_string()),
        )
    }

    fn login(provider_id: &str, name: &str) -> ExternalLoginRequest {
        ExternalLoginRequest {
            provider: "GitHub".into(),
            provider_id: provider_id.into(),
            name: name.into(),
            avatar: None,
        }
    }

    #[tokio::test]
    async fn first_login_creates_guest_and_token_authenticates() {
        let svc = service(&[]);
        let auth = svc.external_login(Some(BROKER), login("10", "Ada")).await.unwrap();
        assert_eq!(auth.user.role, Role::Guest);
        assert_eq!(auth.user.provider, "github");

        let actor = svc.authenticate(&auth.token).await.unwrap();
        assert_eq!(actor.id, auth.user.id);
        assert_eq!(actor.role, Role::Guest);
    }

    #[tokio::test]
    async fn configured_identity_is_promoted() {
        let svc = service(&["github:1"]);
        let auth = svc.external_login(Some(BROKER), login("1", "Root")).await.unwrap();
        assert_eq!(auth.user.role, Role::SuperAdmin);
    }

    #[tokio::test]
    async fn relogin_resyncs_profile_under_same_id() {
        let svc = service(&[]);
        let first = svc.external_login(Some(BROKER), login("5", "Old")).await.unwrap();
        let second = svc.external_login(Some(BROKER), login("5", "New")).await.unwrap();
        assert_eq!(first.user.id, second.user.id);
        assert_eq!(second.user.name, "New");
    }

    #[tokio::test]
    async fn login_without_broker_secret_is_rejected_before_any_write() {
        let svc = service(&["github:1"]);

        for presented in [None, Some("guess"), Some("broker-secreT"), Some("")] {
            let err = svc.external_login(presented, login("1", "Root")).await.unwrap_err();
            assert_eq!(err.to_status_code(), 401);
        }
        let users = svc.user_repo.list(100, 0).await.unwrap();
        assert_eq!(users.1, 0);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let svc = service(&[]);
        let err = svc.authenticate("not-a-jwt").await.unwrap_err();
        assert_eq!(err.to_status_code(), 401);
    }
}
