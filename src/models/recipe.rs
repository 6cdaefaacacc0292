use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use super::label::{LabelPayload, LabelView, validate_label_names};
use crate::validation::{self, MAX_TEXT_LENGTH, Price, RawDecimal, ValidationErrors};

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct RecipeModel {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub time_minutes: i64,
    pub price_cents: i64,
    pub link: String,
}

/// List representation. Never carries `description`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub time_minutes: i64,
    pub price: Price,
    pub link: String,
    pub tags: Vec<LabelView>,
    pub ingredients: Vec<LabelView>,
}

/// Detail representation: the summary plus `description`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeDetail {
    #[serde(flatten)]
    pub summary: RecipeSummary,
    pub description: String,
}

impl RecipeSummary {
    pub fn new(recipe: &RecipeModel, tags: Vec<LabelView>, ingredients: Vec<LabelView>) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title.clone(),
            time_minutes: recipe.time_minutes,
            price: Price::from_cents(recipe.price_cents),
            link: recipe.link.clone(),
            tags,
            ingredients,
        }
    }
}

impl RecipeDetail {
    pub fn new(recipe: &RecipeModel, tags: Vec<LabelView>, ingredients: Vec<LabelView>) -> Self {
        Self {
            summary: RecipeSummary::new(recipe, tags, ingredients),
            description: recipe.description.clone(),
        }
    }
}

/// Incoming recipe body. `id` and `user` are not fields here, so a client
/// sending them has no effect.
#[derive(Debug, Default, Deserialize)]
pub struct RecipePayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<RawDecimal>,
    pub link: Option<String>,
    pub tags: Option<Vec<LabelPayload>>,
    pub ingredients: Option<Vec<LabelPayload>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecipe {
    pub title: String,
    pub description: String,
    pub time_minutes: i64,
    pub price: Price,
    pub link: String,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
}

/// Fields to overwrite on an existing recipe; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub time_minutes: Option<i64>,
    pub price: Option<Price>,
    pub link: Option<String>,
    pub tags: Option<Vec<String>>,
    pub ingredients: Option<Vec<String>>,
}

impl RecipePayload {
    pub fn validate_new(self) -> Result<NewRecipe, ValidationErrors> {
        let (errors, changes) = self.check(true);
        match changes {
            RecipeChanges {
                title: Some(title),
                time_minutes: Some(time_minutes),
                price: Some(price),
                description,
                link,
                tags,
                ingredients,
            } if errors.is_empty() => Ok(NewRecipe {
                title,
                description: description.unwrap_or_default(),
                time_minutes,
                price,
                link: link.unwrap_or_default(),
                tags: tags.unwrap_or_default(),
                ingredients: ingredients.unwrap_or_default(),
            }),
            _ => Err(errors),
        }
    }

    /// `partial` relaxes the required fields, as for PATCH.
    pub fn validate_changes(self, partial: bool) -> Result<RecipeChanges, ValidationErrors> {
        let (errors, changes) = self.check(!partial);
        errors.finish(|| changes)
    }

    fn check(self, required: bool) -> (ValidationErrors, RecipeChanges) {
        let mut errors = ValidationErrors::new();

        let title = validation::text(&mut errors, "title", self.title, required);
        let time_minutes =
            validation::positive_integer(&mut errors, "time_minutes", self.time_minutes, required);
        let price = validation::price(&mut errors, "price", self.price, required);
        let description =
            validation::optional_text(&mut errors, "description", self.description, None);
        let link =
            validation::optional_text(&mut errors, "link", self.link, Some(MAX_TEXT_LENGTH));
        let tags = self
            .tags
            .map(|tags| validate_label_names(&mut errors, "tags", tags));
        let ingredients = self
            .ingredients
            .map(|ingredients| validate_label_names(&mut errors, "ingredients", ingredients));

        let changes = RecipeChanges {
            title,
            description,
            time_minutes,
            price,
            link,
            tags,
            ingredients,
        };
        (errors, changes)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    /// Comma separated tag ids.
    pub tags: Option<String>,
    /// Comma separated ingredient ids.
    pub ingredients: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
}

impl RecipeListQuery {
    pub fn validate(self) -> Result<RecipeFilter, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let tags = parse_ids(&mut errors, "tags", self.tags.as_deref());
        let ingredients = parse_ids(&mut errors, "ingredients", self.ingredients.as_deref());
        errors.finish(|| RecipeFilter { tags, ingredients })
    }
}

/// Upper bound on ids per filter; each one is a bound SQL variable.
pub const MAX_FILTER_IDS: usize = 100;

fn parse_ids(errors: &mut ValidationErrors, field: &str, raw: Option<&str>) -> Vec<i64> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let mut ids = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<i64>() {
            Ok(id) => ids.push(id),
            Err(_) => errors.add(field, format!("\"{part}\" is not a valid id.")),
        }
    }
    if ids.len() > MAX_FILTER_IDS {
        errors.add(
            field,
            format!("Ensure this filter has no more than {MAX_FILTER_IDS} ids."),
        );
    }
    ids
}
