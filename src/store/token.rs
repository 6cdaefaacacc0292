use sqlx::{Pool, Sqlite};
use tracing::instrument;

use crate::models::user::UserModel;

/// Stores SHA-256 digests of issued tokens, never the tokens themselves.
#[derive(Clone, Debug)]
pub struct TokenRepository {
    pool: Pool<Sqlite>,
}

impl TokenRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    #[instrument(name = "Saving token digest", skip(self, digest))]
    pub async fn store(&self, digest: &str, user_id: i64) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO auth_tokens (digest, user_id, created_at) VALUES (?1, ?2, ?3)")
            .bind(digest)
            .bind(user_id)
            .bind(chrono::Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// The active user owning `digest`, if any.
    #[instrument(name = "Resolving token digest", skip_all)]
    pub async fn find_user(&self, digest: &str) -> anyhow::Result<Option<UserModel>> {
        let user = sqlx::query_as::<_, UserModel>(
            "SELECT u.id, u.email, u.name, u.password_hash, u.is_active, u.is_staff,
                    u.is_superuser, u.created_at
             FROM auth_tokens t
             INNER JOIN users u ON u.id = t.user_id
             WHERE t.digest = ?1 AND u.is_active",
        )
        .bind(digest)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
