use crate::{
    jwt::SessionData,
    schema::{Recipe, Relation, Uuid},
    store::RecipeStore,
};

use super::related::{IngredientPayload, RelatedPayload, TagPayload};

/// Resolves tag and ingredient payloads to records owned by the acting user,
/// creating missing ones, and links them to a recipe.
pub struct RelationReconciler<'a> {
    store: &'a dyn RecipeStore,
    user_id: Uuid,
}

impl<'a> RelationReconciler<'a> {
    pub fn new(store: &'a dyn RecipeStore, session: &SessionData) -> Self {
        Self {
            store,
            user_id: session.user_id,
        }
    }

    pub async fn get_or_create_tags(
        &self,
        tags: &[TagPayload],
        recipe: &Recipe,
    ) -> Result<(), potion::Error> {
        self.reconcile(Relation::Tag, tags, recipe).await
    }

    pub async fn get_or_create_ingredients(
        &self,
        ingredients: &[IngredientPayload],
        recipe: &Recipe,
    ) -> Result<(), potion::Error> {
        self.reconcile(Relation::Ingredient, ingredients, recipe)
            .await
    }

    /// Drops every existing link of `relation` before linking `payloads`.
    /// Records that lose their last link are kept.
    pub async fn replace(
        &self,
        relation: Relation,
        payloads: &[RelatedPayload],
        recipe: &Recipe,
    ) -> Result<(), potion::Error> {
        self.store.clear_links(relation, recipe.id).await?;
        self.reconcile(relation, payloads, recipe).await
    }

    async fn reconcile(
        &self,
        relation: Relation,
        payloads: &[RelatedPayload],
        recipe: &Recipe,
    ) -> Result<(), potion::Error> {
        for payload in payloads {
            let (record, created) = self
                .store
                .get_or_create(relation, self.user_id, &payload.name)
                .await?;

            if created {
                log::info!(
                    "created {:?} {} '{}' for user {}",
                    relation,
                    record.id,
                    record.name,
                    self.user_id
                );
            } else {
                log::debug!("reusing {:?} {} '{}'", relation, record.id, record.name);
            }

            self.store.link(relation, recipe.id, record.id).await?;
        }

        Ok(())
    }
}
