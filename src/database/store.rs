use async_trait::async_trait;

use super::schema::{NewRecipe, Recipe, RecipeFilter, RelatedRecord, Relation, Uuid};

/// Persistence seam shared by the Postgres store and the in-memory store.
///
/// Every query that takes a `user_id` is scoped to that user; records owned by
/// someone else behave as if they did not exist.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn create_recipe(
        &self,
        user_id: Uuid,
        recipe: &NewRecipe,
    ) -> Result<Recipe, potion::Error>;

    async fn get_recipe(&self, user_id: Uuid, id: Uuid) -> Result<Option<Recipe>, potion::Error>;

    /// Newest first.
    async fn list_recipes(
        &self,
        user_id: Uuid,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, potion::Error>;

    async fn save_recipe(&self, recipe: &Recipe) -> Result<(), potion::Error>;

    /// Removes the recipe and its links. Linked tags and ingredients stay.
    async fn delete_recipe(&self, user_id: Uuid, id: Uuid) -> Result<bool, potion::Error>;

    /// Looks up `(user_id, name)` and creates the record when absent. The flag
    /// is `true` when a new record was created.
    async fn get_or_create(
        &self,
        relation: Relation,
        user_id: Uuid,
        name: &str,
    ) -> Result<(RelatedRecord, bool), potion::Error>;

    /// Linking an already linked record is a no-op.
    async fn link(
        &self,
        relation: Relation,
        recipe_id: Uuid,
        related_id: Uuid,
    ) -> Result<(), potion::Error>;

    async fn clear_links(&self, relation: Relation, recipe_id: Uuid) -> Result<(), potion::Error>;

    async fn list_linked(
        &self,
        relation: Relation,
        recipe_id: Uuid,
    ) -> Result<Vec<RelatedRecord>, potion::Error>;

    /// Ordered by name, descending.
    async fn list_related(
        &self,
        relation: Relation,
        user_id: Uuid,
        assigned_only: bool,
    ) -> Result<Vec<RelatedRecord>, potion::Error>;

    async fn get_related(
        &self,
        relation: Relation,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<RelatedRecord>, potion::Error>;

    async fn rename_related(
        &self,
        relation: Relation,
        user_id: Uuid,
        id: Uuid,
        name: &str,
    ) -> Result<Option<RelatedRecord>, potion::Error>;

    async fn delete_related(
        &self,
        relation: Relation,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<bool, potion::Error>;
}
