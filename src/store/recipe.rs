use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection, Transaction};
use tracing::instrument;

use crate::models::label::LabelKind;
use crate::models::recipe::{NewRecipe, RecipeChanges, RecipeFilter, RecipeModel};

const RECIPE_COLUMNS: &str = "id, user_id, title, description, time_minutes, price_cents, link";

/// Every query here is scoped by `user_id`: a recipe owned by someone else
/// is indistinguishable from a missing one.
#[derive(Clone, Debug)]
pub struct RecipeRepository {
    pool: Pool<Sqlite>,
}

impl RecipeRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> anyhow::Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    pub async fn acquire(&self) -> anyhow::Result<sqlx::pool::PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    /// Owned recipes, newest first. Each non-empty id list in `filter`
    /// keeps recipes linked to at least one of its labels.
    #[instrument(name = "Listing recipes", skip(self))]
    pub async fn list(&self, user_id: i64, filter: &RecipeFilter) -> anyhow::Result<Vec<RecipeModel>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE user_id = "
        ));
        builder.push_bind(user_id);

        for (kind, ids) in [
            (LabelKind::Tag, &filter.tags),
            (LabelKind::Ingredient, &filter.ingredients),
        ] {
            if ids.is_empty() {
                continue;
            }
            builder.push(format!(
                " AND id IN (SELECT recipe_id FROM {} WHERE label_id IN (",
                kind.link_table()
            ));
            let mut separated = builder.separated(", ");
            for id in ids {
                separated.push_bind(*id);
            }
            separated.push_unseparated("))");
        }
        builder.push(" ORDER BY id DESC");

        let rows = builder
            .build_query_as::<RecipeModel>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    #[instrument(name = "Fetching recipe", skip(self, conn))]
    pub async fn find(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        id: i64,
    ) -> anyhow::Result<Option<RecipeModel>> {
        let row = sqlx::query_as::<_, RecipeModel>(&format!(
            "SELECT {RECIPE_COLUMNS} FROM recipes WHERE id = ?1 AND user_id = ?2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    #[instrument(name = "Saving new recipe", skip(self, conn, recipe), fields(title = %recipe.title))]
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        recipe: &NewRecipe,
    ) -> anyhow::Result<RecipeModel> {
        let row = sqlx::query_as::<_, RecipeModel>(&format!(
            "INSERT INTO recipes (user_id, title, description, time_minutes, price_cents, link)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&recipe.title)
        .bind(&recipe.description)
        .bind(recipe.time_minutes)
        .bind(recipe.price.cents())
        .bind(&recipe.link)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Applies the scalar fields of `changes`. The owner column is never
    /// written.
    #[instrument(name = "Updating recipe", skip(self, conn, changes))]
    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        id: i64,
        changes: &RecipeChanges,
    ) -> anyhow::Result<Option<RecipeModel>> {
        let row = sqlx::query_as::<_, RecipeModel>(&format!(
            "UPDATE recipes SET
                title = COALESCE(?1, title),
                description = COALESCE(?2, description),
                time_minutes = COALESCE(?3, time_minutes),
                price_cents = COALESCE(?4, price_cents),
                link = COALESCE(?5, link)
             WHERE id = ?6 AND user_id = ?7
             RETURNING {RECIPE_COLUMNS}"
        ))
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.time_minutes)
        .bind(changes.price.map(|p| p.cents()))
        .bind(changes.link.as_deref())
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    #[instrument(name = "Deleting recipe", skip(self))]
    pub async fn delete(&self, user_id: i64, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
