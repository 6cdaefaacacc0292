use std::collections::HashMap;

use sqlx::SqliteConnection;
use tracing::instrument;

use crate::{
    errors::ApiError,
    models::label::LabelView,
    models::recipe::{
        NewRecipe, RecipeDetail, RecipeFilter, RecipeModel, RecipePayload, RecipeSummary,
    },
    store::{LabelRepository, RecipeRepository},
};

#[derive(Clone, Debug)]
pub struct RecipeService {
    recipes: RecipeRepository,
    tags: LabelRepository,
    ingredients: LabelRepository,
}

impl RecipeService {
    pub fn new(
        recipes: RecipeRepository,
        tags: LabelRepository,
        ingredients: LabelRepository,
    ) -> Self {
        Self {
            recipes,
            tags,
            ingredients,
        }
    }

    #[instrument(name = "Service: List recipes", skip(self))]
    pub async fn list(
        &self,
        user_id: i64,
        filter: &RecipeFilter,
    ) -> Result<Vec<RecipeSummary>, ApiError> {
        let recipes = self.recipes.list(user_id, filter).await?;
        let ids: Vec<i64> = recipes.iter().map(|r| r.id).collect();

        let mut conn = self.recipes.acquire().await?;
        let mut tags = group_by_recipe(self.tags.for_recipes(&mut conn, &ids).await?);
        let mut ingredients = group_by_recipe(self.ingredients.for_recipes(&mut conn, &ids).await?);

        Ok(recipes
            .iter()
            .map(|recipe| {
                RecipeSummary::new(
                    recipe,
                    tags.remove(&recipe.id).unwrap_or_default(),
                    ingredients.remove(&recipe.id).unwrap_or_default(),
                )
            })
            .collect())
    }

    #[instrument(name = "Service: Recipe detail", skip(self))]
    pub async fn detail(&self, user_id: i64, id: i64) -> Result<RecipeDetail, ApiError> {
        let mut conn = self.recipes.acquire().await?;
        let recipe = self
            .recipes
            .find(&mut conn, user_id, id)
            .await?
            .ok_or(ApiError::NotFound)?;
        self.render(&mut conn, &recipe).await
    }

    /// Creates the recipe and resolves its nested labels in one transaction,
    /// always under the caller's identity.
    #[instrument(name = "Service: Create recipe", skip(self, recipe), fields(title = %recipe.title))]
    pub async fn create(&self, user_id: i64, recipe: &NewRecipe) -> Result<RecipeDetail, ApiError> {
        let mut tx = self.recipes.begin().await?;

        let stored = self.recipes.insert(&mut tx, user_id, recipe).await?;
        self.attach(&mut tx, &self.tags, user_id, stored.id, &recipe.tags)
            .await?;
        self.attach(
            &mut tx,
            &self.ingredients,
            user_id,
            stored.id,
            &recipe.ingredients,
        )
        .await?;
        let detail = self.render(&mut tx, &stored).await?;

        tx.commit().await?;
        tracing::info!(recipe_id = stored.id, "Recipe created");
        Ok(detail)
    }

    /// Applies `payload` to an owned recipe. Ownership is settled on the
    /// update transaction before the payload is validated, so a foreign id
    /// is a 404 whatever the body. A provided label list replaces the current
    /// set; an absent one leaves it alone.
    #[instrument(name = "Service: Update recipe", skip(self, payload))]
    pub async fn update(
        &self,
        user_id: i64,
        id: i64,
        payload: RecipePayload,
        partial: bool,
    ) -> Result<RecipeDetail, ApiError> {
        let mut tx = self.recipes.begin().await?;

        self.recipes
            .find(&mut tx, user_id, id)
            .await?
            .ok_or(ApiError::NotFound)?;
        let changes = payload.validate_changes(partial)?;

        let stored = self
            .recipes
            .update(&mut tx, user_id, id, &changes)
            .await?
            .ok_or(ApiError::NotFound)?;
        if let Some(tags) = &changes.tags {
            self.attach(&mut tx, &self.tags, user_id, stored.id, tags)
                .await?;
        }
        if let Some(ingredients) = &changes.ingredients {
            self.attach(&mut tx, &self.ingredients, user_id, stored.id, ingredients)
                .await?;
        }
        let detail = self.render(&mut tx, &stored).await?;

        tx.commit().await?;
        Ok(detail)
    }

    #[instrument(name = "Service: Delete recipe", skip(self))]
    pub async fn delete(&self, user_id: i64, id: i64) -> Result<(), ApiError> {
        if self.recipes.delete(user_id, id).await? {
            Ok(())
        } else {
            Err(ApiError::NotFound)
        }
    }

    async fn attach(
        &self,
        conn: &mut SqliteConnection,
        labels: &LabelRepository,
        user_id: i64,
        recipe_id: i64,
        names: &[String],
    ) -> Result<(), ApiError> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            ids.push(labels.get_or_create(conn, user_id, name).await?.id);
        }
        labels.set_for_recipe(conn, recipe_id, &ids).await?;
        Ok(())
    }

    async fn render(
        &self,
        conn: &mut SqliteConnection,
        recipe: &RecipeModel,
    ) -> Result<RecipeDetail, ApiError> {
        let ids = [recipe.id];
        let tags = self.tags.for_recipes(conn, &ids).await?;
        let ingredients = self.ingredients.for_recipes(conn, &ids).await?;
        Ok(RecipeDetail::new(
            recipe,
            tags.into_iter().map(LabelView::from).collect(),
            ingredients.into_iter().map(LabelView::from).collect(),
        ))
    }
}

fn group_by_recipe(
    rows: Vec<crate::models::label::RecipeLabelRow>,
) -> HashMap<i64, Vec<LabelView>> {
    let mut grouped: HashMap<i64, Vec<LabelView>> = HashMap::new();
    for row in rows {
        grouped.entry(row.recipe_id).or_default().push(row.into());
    }
    grouped
}
