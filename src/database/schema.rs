use serde::{Deserialize, Serialize};

pub type Uuid = i32;

/// The two kinds of user-scoped records a recipe links to by name.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Eq, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Tag,
    Ingredient,
}

impl Relation {
    pub fn table(&self) -> &'static str {
        match self {
            Relation::Tag => "tags",
            Relation::Ingredient => "ingredients",
        }
    }

    pub fn link_table(&self) -> &'static str {
        match self {
            Relation::Tag => "recipe_tags",
            Relation::Ingredient => "recipe_ingredients",
        }
    }

    pub fn link_column(&self) -> &'static str {
        match self {
            Relation::Tag => "tag_id",
            Relation::Ingredient => "ingredient_id",
        }
    }

    /// Collection segment under the API root.
    pub fn route(&self) -> &'static str {
        match self {
            Relation::Tag => "tags",
            Relation::Ingredient => "ingredients",
        }
    }

    /// Payload key used for the nested list on a recipe.
    pub fn field(&self) -> &'static str {
        match self {
            Relation::Tag => "tag",
            Relation::Ingredient => "ingredient",
        }
    }
}

/// Row shared by `tags` and `ingredients`.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelatedRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
}

pub type Tag = RelatedRecord;
pub type Ingredient = RelatedRecord;

#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: String,
    pub description: String,
}

/// Column values for a recipe that has not been inserted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub time_minutes: i32,
    pub price: f64,
    pub link: String,
    pub description: String,
}

/// Recipes match when they carry any of the listed tag ids and any of the
/// listed ingredient ids. Empty lists do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeFilter {
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<Uuid>,
}

impl RecipeFilter {
    pub fn ids(&self, relation: Relation) -> &[Uuid] {
        match relation {
            Relation::Tag => &self.tags,
            Relation::Ingredient => &self.ingredients,
        }
    }
}
