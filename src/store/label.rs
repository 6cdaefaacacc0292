use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection, Transaction};
use tracing::instrument;

use crate::models::label::{LabelKind, LabelModel, RecipeLabelRow};

/// Ids bound per batch statement, well under SQLite's variable limit.
const ID_BATCH: usize = 500;

/// Persistence for one kind of label. Table names come from [`LabelKind`],
/// never from input.
#[derive(Clone, Debug)]
pub struct LabelRepository {
    pool: Pool<Sqlite>,
    kind: LabelKind,
}

impl LabelRepository {
    pub fn new(pool: Pool<Sqlite>, kind: LabelKind) -> Self {
        Self { pool, kind }
    }

    pub fn kind(&self) -> LabelKind {
        self.kind
    }

    pub async fn begin(&self) -> anyhow::Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    pub async fn acquire(&self) -> anyhow::Result<sqlx::pool::PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }

    /// Owned labels by descending name. `assigned_only` drops labels that
    /// are not on any recipe.
    #[instrument(name = "Listing labels", skip(self), fields(kind = self.kind.as_str()))]
    pub async fn list(&self, user_id: i64, assigned_only: bool) -> anyhow::Result<Vec<LabelModel>> {
        let table = self.kind.table();
        let assigned = if assigned_only {
            format!(
                "AND EXISTS (SELECT 1 FROM {} rl WHERE rl.label_id = l.id)",
                self.kind.link_table()
            )
        } else {
            String::new()
        };

        let rows = sqlx::query_as::<_, LabelModel>(&format!(
            "SELECT l.id, l.user_id, l.name FROM {table} l
             WHERE l.user_id = ?1 {assigned}
             ORDER BY l.name DESC, l.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    #[instrument(name = "Fetching label", skip(self, conn), fields(kind = self.kind.as_str()))]
    pub async fn find(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        id: i64,
    ) -> anyhow::Result<Option<LabelModel>> {
        let row = sqlx::query_as::<_, LabelModel>(&format!(
            "SELECT id, user_id, name FROM {} WHERE id = ?1 AND user_id = ?2",
            self.kind.table()
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Renames an owned label. `None` when another label of the same owner
    /// already has `name`, or the label is gone.
    #[instrument(name = "Renaming label", skip(self, conn), fields(kind = self.kind.as_str()))]
    pub async fn rename(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        id: i64,
        name: &str,
    ) -> anyhow::Result<Option<LabelModel>> {
        let row = sqlx::query_as::<_, LabelModel>(&format!(
            "UPDATE OR IGNORE {} SET name = ?1 WHERE id = ?2 AND user_id = ?3
             RETURNING id, user_id, name",
            self.kind.table()
        ))
        .bind(name)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    #[instrument(name = "Deleting label", skip(self), fields(kind = self.kind.as_str()))]
    pub async fn delete(&self, user_id: i64, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = ?1 AND user_id = ?2",
            self.kind.table()
        ))
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Atomic get-or-create on `(user_id, name)`, run on the caller's
    /// connection so it joins any open transaction.
    pub async fn get_or_create(
        &self,
        conn: &mut SqliteConnection,
        user_id: i64,
        name: &str,
    ) -> anyhow::Result<LabelModel> {
        let table = self.kind.table();
        sqlx::query(&format!(
            "INSERT INTO {table} (user_id, name) VALUES (?1, ?2)
             ON CONFLICT (user_id, name) DO NOTHING"
        ))
        .bind(user_id)
        .bind(name)
        .execute(&mut *conn)
        .await?;

        let row = sqlx::query_as::<_, LabelModel>(&format!(
            "SELECT id, user_id, name FROM {table} WHERE user_id = ?1 AND name = ?2"
        ))
        .bind(user_id)
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Replaces the recipe's links of this kind with `label_ids`.
    pub async fn set_for_recipe(
        &self,
        conn: &mut SqliteConnection,
        recipe_id: i64,
        label_ids: &[i64],
    ) -> anyhow::Result<()> {
        let link_table = self.kind.link_table();
        sqlx::query(&format!("DELETE FROM {link_table} WHERE recipe_id = ?1"))
            .bind(recipe_id)
            .execute(&mut *conn)
            .await?;

        for batch in label_ids.chunks(ID_BATCH) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "INSERT OR IGNORE INTO {link_table} (recipe_id, label_id) "
            ));
            builder.push_values(batch, |mut row, label_id| {
                row.push_bind(recipe_id).push_bind(*label_id);
            });
            builder.build().execute(&mut *conn).await?;
        }
        Ok(())
    }

    /// Labels attached to any of `recipe_ids`, ordered by name within each
    /// recipe. Ids are bound in batches of [`ID_BATCH`].
    pub async fn for_recipes(
        &self,
        conn: &mut SqliteConnection,
        recipe_ids: &[i64],
    ) -> anyhow::Result<Vec<RecipeLabelRow>> {
        let mut rows = Vec::new();
        for batch in recipe_ids.chunks(ID_BATCH) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "SELECT rl.recipe_id, l.id, l.user_id, l.name
                 FROM {} rl
                 INNER JOIN {} l ON l.id = rl.label_id
                 WHERE rl.recipe_id IN (",
                self.kind.link_table(),
                self.kind.table()
            ));
            let mut ids = builder.separated(", ");
            for id in batch {
                ids.push_bind(*id);
            }
            ids.push_unseparated(") ORDER BY rl.recipe_id, l.name, l.id");

            rows.extend(
                builder
                    .build_query_as::<RecipeLabelRow>()
                    .fetch_all(&mut *conn)
                    .await?,
            );
        }
        Ok(rows)
    }
}
