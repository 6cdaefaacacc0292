use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::validation::{self, ValidationErrors};

/// Tags and ingredients share one shape: a per-user name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Tag,
    Ingredient,
}

impl LabelKind {
    pub fn table(self) -> &'static str {
        match self {
            LabelKind::Tag => "tags",
            LabelKind::Ingredient => "ingredients",
        }
    }

    /// Join table linking recipes to this kind of label.
    pub fn link_table(self) -> &'static str {
        match self {
            LabelKind::Tag => "recipe_tags",
            LabelKind::Ingredient => "recipe_ingredients",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LabelKind::Tag => "tag",
            LabelKind::Ingredient => "ingredient",
        }
    }
}

#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct LabelModel {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

/// A label together with the recipe it was loaded for.
#[derive(Debug, Clone, FromRow)]
pub struct RecipeLabelRow {
    pub recipe_id: i64,
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LabelView {
    pub id: i64,
    pub name: String,
}

impl From<&LabelModel> for LabelView {
    fn from(label: &LabelModel) -> Self {
        Self {
            id: label.id,
            name: label.name.clone(),
        }
    }
}

impl From<RecipeLabelRow> for LabelView {
    fn from(row: RecipeLabelRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

/// `{"name": ...}`, both for renames and for nested recipe payloads. Any
/// other key (an `id`, a `user`) is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelPayload {
    pub name: Option<String>,
}

impl LabelPayload {
    pub fn validate(self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = validation::text(&mut errors, "name", self.name, true);
        match name {
            Some(name) => Ok(name),
            None => Err(errors),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LabelListQuery {
    #[serde(default)]
    pub assigned_only: u8,
}

/// Validates a nested label list, reporting failures under `field` with the
/// entry's position. Duplicate names collapse to one.
pub fn validate_label_names(
    errors: &mut ValidationErrors,
    field: &str,
    payloads: Vec<LabelPayload>,
) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(payloads.len());
    for (index, payload) in payloads.into_iter().enumerate() {
        match payload.validate() {
            Ok(name) => {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            Err(entry) => {
                for message in entry.messages("name") {
                    errors.add(field, format!("Item {index}: name: {message}"));
                }
            }
        }
    }
    names
}
