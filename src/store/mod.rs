pub mod label;
pub mod recipe;
pub mod token;
pub mod user;

use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use crate::configuration::DatabaseSettings;

pub use label::LabelRepository;
pub use recipe::RecipeRepository;
pub use token::TokenRepository;
pub use user::UserRepository;

pub type DbPool = Pool<Sqlite>;

/// Opens the pool, retrying once a second while the database is unavailable.
#[tracing::instrument(name = "Waiting for database", skip(settings), fields(url = %settings.url))]
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<DbPool> {
    let options = settings.connect_options()?;

    // Every connection to `:memory:` opens a fresh database, so the pool must
    // keep exactly one alive for the life of the process.
    let pool_options = if settings.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(2))
    };

    let attempts = settings.connect_attempts.max(1);
    let mut attempt = 1;
    loop {
        match pool_options.clone().connect_with(options.clone()).await {
            Ok(pool) => {
                tracing::info!(attempt, "Database available");
                return Ok(pool);
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(attempt, error = %e, "Database not available, waiting for a second");
                tokio::time::sleep(Duration::from_secs(1)).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(attempt, error = %e, "Giving up on the database");
                return Err(e.into());
            }
        }
    }
}

pub async fn migrate(pool: &DbPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let pool = connect(&DatabaseSettings::in_memory()).await.unwrap();
    migrate(&pool).await.unwrap();
    pool
}
