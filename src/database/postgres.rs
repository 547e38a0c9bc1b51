use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{
    actions,
    schema::{NewRecipe, Recipe, RecipeFilter, RelatedRecord, Relation, Uuid},
    store::RecipeStore,
};

/*
Expected tables

recipes             (id SERIAL PK, user_id INT, title VARCHAR(255), time_minutes INT,
                     price DOUBLE PRECISION, link VARCHAR(255), description TEXT)
tags, ingredients   (id SERIAL PK, user_id INT, name VARCHAR(255), UNIQUE (user_id, name))
recipe_tags         (recipe_id INT, tag_id INT, PRIMARY KEY (recipe_id, tag_id))
recipe_ingredients  (recipe_id INT, ingredient_id INT, PRIMARY KEY (recipe_id, ingredient_id))
*/

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl RecipeStore for PgStore {
    async fn create_recipe(
        &self,
        user_id: Uuid,
        recipe: &NewRecipe,
    ) -> Result<Recipe, potion::Error> {
        actions::create_recipe(user_id, recipe, &self.pool).await
    }

    async fn get_recipe(&self, user_id: Uuid, id: Uuid) -> Result<Option<Recipe>, potion::Error> {
        actions::get_recipe(user_id, id, &self.pool).await
    }

    async fn list_recipes(
        &self,
        user_id: Uuid,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, potion::Error> {
        actions::list_recipes(user_id, filter, &self.pool).await
    }

    async fn save_recipe(&self, recipe: &Recipe) -> Result<(), potion::Error> {
        actions::update_recipe(recipe, &self.pool).await
    }

    async fn delete_recipe(&self, user_id: Uuid, id: Uuid) -> Result<bool, potion::Error> {
        actions::delete_recipe(user_id, id, &self.pool).await
    }

    async fn get_or_create(
        &self,
        relation: Relation,
        user_id: Uuid,
        name: &str,
    ) -> Result<(RelatedRecord, bool), potion::Error> {
        actions::get_or_create_related(relation, user_id, name, &self.pool).await
    }

    async fn link(
        &self,
        relation: Relation,
        recipe_id: Uuid,
        related_id: Uuid,
    ) -> Result<(), potion::Error> {
        actions::link_related(relation, recipe_id, related_id, &self.pool).await
    }

    async fn clear_links(&self, relation: Relation, recipe_id: Uuid) -> Result<(), potion::Error> {
        actions::clear_related_links(relation, recipe_id, &self.pool).await
    }

    async fn list_linked(
        &self,
        relation: Relation,
        recipe_id: Uuid,
    ) -> Result<Vec<RelatedRecord>, potion::Error> {
        actions::list_linked_related(relation, recipe_id, &self.pool).await
    }

    async fn list_related(
        &self,
        relation: Relation,
        user_id: Uuid,
        assigned_only: bool,
    ) -> Result<Vec<RelatedRecord>, potion::Error> {
        actions::list_related(relation, user_id, assigned_only, &self.pool).await
    }

    async fn get_related(
        &self,
        relation: Relation,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<RelatedRecord>, potion::Error> {
        actions::get_related(relation, user_id, id, &self.pool).await
    }

    async fn rename_related(
        &self,
        relation: Relation,
        user_id: Uuid,
        id: Uuid,
        name: &str,
    ) -> Result<Option<RelatedRecord>, potion::Error> {
        actions::rename_related(relation, user_id, id, name, &self.pool).await
    }

    async fn delete_related(
        &self,
        relation: Relation,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<bool, potion::Error> {
        actions::delete_related(relation, user_id, id, &self.pool).await
    }
}
