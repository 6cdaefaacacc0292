use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::models::user::{Role, UserModel};

const USER_COLUMNS: &str =
    "id, email, name, password_hash, is_active, is_staff, is_superuser, created_at";

#[derive(Clone, Debug)]
pub struct UserRepository {
    pool: Pool<Sqlite>,
}

impl UserRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Returns `None` when the email is already taken.
    #[instrument(name = "Saving new user to database", skip(self, password_hash))]
    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<Option<UserModel>> {
        let (is_staff, is_superuser) = role.flags();
        let user = sqlx::query_as::<_, UserModel>(&format!(
            "INSERT INTO users (email, name, password_hash, is_active, is_staff, is_superuser, created_at)
             VALUES (?1, ?2, ?3, TRUE, ?4, ?5, ?6)
             ON CONFLICT (email) DO NOTHING
             RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(is_staff)
        .bind(is_superuser)
        .bind(chrono::Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            e
        })?;
        Ok(user)
    }

    #[instrument(name = "Fetching user by email from database", skip(self))]
    pub async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserModel>> {
        let user = sqlx::query_as::<_, UserModel>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch user: {:?}", e);
            e
        })?;
        Ok(user)
    }

    #[instrument(name = "Fetching user by id from database", skip(self))]
    pub async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<UserModel>> {
        let user = sqlx::query_as::<_, UserModel>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Overwrites whichever of `name` and `password_hash` are given.
    #[instrument(name = "Updating user profile", skip(self, password_hash))]
    pub async fn update_profile(
        &self,
        id: i64,
        name: Option<&str>,
        password_hash: Option<&str>,
    ) -> anyhow::Result<Option<UserModel>> {
        let user = sqlx::query_as::<_, UserModel>(&format!(
            "UPDATE users
             SET name = COALESCE(?1, name), password_hash = COALESCE(?2, password_hash)
             WHERE id = ?3
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(password_hash)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
