use crate::domain::user::ExternalProfile;
use crate::domain::{DomainError, User};
use async_trait::async_trait;
use quill_contract::Role;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Creates the user on first sight of the identity, otherwise refreshes
    /// name and avatar. The role is left untouched on refresh.
    async fn upsert_external(&self, profile: &ExternalProfile) -> Result<User, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<User, DomainError>;
    async fn set_role(&self, id: i64, role: Role) -> Result<User, DomainError>;
    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64), DomainError>;
}

const USER_COLUMNS: &str = "id, name, avatar, role, provider, provider_id, created_at, updated_at";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, DomainError> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        avatar: row.try_get("avatar")?,
        role: role
            .parse()
            .map_err(|e: quill_contract::user::UnknownRole| {
                DomainError::DatabaseError(e.to_string())
            })?,
        provider: row.try_get("provider")?,
        provider_id: row.try_get("provider_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn upsert_external(&self, profile: &ExternalProfile) -> Result<User, DomainError> {
        let sql = format!(
            r#"
            INSERT INTO users (name, avatar, role, provider, provider_id, created_at, updated_at)
            VALUES ($1, $2, 'guest', $3, $4, NOW(), NOW())
            ON CONFLICT (provider, provider_id)
            DO UPDATE SET name = EXCLUDED.name, avatar = EXCLUDED.avatar, updated_at = NOW()
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&profile.name)
            .bind(&profile.avatar)
            .bind(&profile.provider)
            .bind(&profile.provider_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to upsert user: {}", e);
                DomainError::DatabaseError(e.to_string())
            })?;

        user_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => user_from_row(&row),
            None => Err(DomainError::UserNotFound),
        }
    }

    async fn set_role(&self, id: i64, role: Role) -> Result<User, DomainError> {
        let sql = format!(
            "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(role.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => user_from_row(&row),
            None => Err(DomainError::UserNotFound),
        }
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<(Vec<User>, i64), DomainError> {
        let count_row = sqlx::query("SELECT COUNT(*) AS count FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let total: i64 = count_row.try_get("count")?;

        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let users = rows
            .iter()
            .map(user_from_row)
            .collect::<Result<Vec<User>, DomainError>>()?;

        Ok((users, total))
    }
}
