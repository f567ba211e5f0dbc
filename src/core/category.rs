//! Pay category business logic.

use crate::{
    entities::{Category, category},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;

/// Input for [`create_category`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    /// Unique name
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: String,
}

/// Lists all categories alphabetically.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by id, failing with [`Error::NotFound`] if it does not exist.
pub async fn require_category<C: ConnectionTrait>(db: &C, id: i64) -> Result<category::Model> {
    Category::find_by_id(id)
        .one(db)
        .await?
        .ok_or(Error::NotFound {
            entity: "category",
            id,
        })
}

/// Creates a category; names are trimmed and must be unique.
pub async fn create_category(
    db: &DatabaseConnection,
    input: NewCategory,
) -> Result<category::Model> {
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Category name is required"));
    }

    let existing = Category::find()
        .filter(category::Column::Name.eq(name.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::validation(format!(
            "A category named {name:?} already exists"
        )));
    }

    category::ActiveModel {
        name: Set(name),
        description: Set(input.description),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
