use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    error::QueryError,
    schema::{NewRecipe, Recipe, RecipeFilter, RelatedRecord, Relation, Uuid},
    store::RecipeStore,
};

#[derive(Default)]
struct RelatedTable {
    rows: BTreeMap<Uuid, RelatedRecord>,
    /* (recipe_id, related_id) */
    links: BTreeSet<(Uuid, Uuid)>,
}

impl RelatedTable {
    fn find(&self, user_id: Uuid, name: &str) -> Option<&RelatedRecord> {
        self.rows
            .values()
            .find(|row| row.user_id == user_id && row.name == name)
    }

    fn is_linked(&self, related_id: Uuid) -> bool {
        self.links.iter().any(|(_, id)| *id == related_id)
    }
}

#[derive(Default)]
struct State {
    next_id: Uuid,
    recipes: BTreeMap<Uuid, Recipe>,
    related: HashMap<Relation, RelatedTable>,
}

impl State {
    fn next_id(&mut self) -> Uuid {
        self.next_id += 1;
        self.next_id
    }

    fn table(&mut self, relation: Relation) -> &mut RelatedTable {
        self.related.entry(relation).or_default()
    }
}

fn unique_violation(relation: Relation) -> potion::Error {
    QueryError::new(format!(
        "duplicate key value violates unique constraint \"{}_user_id_name_key\"",
        relation.table()
    ))
    .into()
}

/// Process-local store with the same scoping and uniqueness rules as the
/// Postgres tables.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record of `relation` owned by `user_id`, linked or not.
    pub async fn count_related(&self, relation: Relation, user_id: Uuid) -> usize {
        let mut state = self.state.lock().await;
        state
            .table(relation)
            .rows
            .values()
            .filter(|row| row.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn create_recipe(
        &self,
        user_id: Uuid,
        recipe: &NewRecipe,
    ) -> Result<Recipe, potion::Error> {
        let mut state = self.state.lock().await;
        let id = state.next_id();

        let row = Recipe {
            id,
            user_id,
            title: recipe.title.to_owned(),
            time_minutes: recipe.time_minutes,
            price: recipe.price,
            link: recipe.link.to_owned(),
            description: recipe.description.to_owned(),
        };
        state.recipes.insert(id, row.clone());

        Ok(row)
    }

    async fn get_recipe(&self, user_id: Uuid, id: Uuid) -> Result<Option<Recipe>, potion::Error> {
        let state = self.state.lock().await;

        Ok(state
            .recipes
            .get(&id)
            .filter(|recipe| recipe.user_id == user_id)
            .cloned())
    }

    async fn list_recipes(
        &self,
        user_id: Uuid,
        filter: &RecipeFilter,
    ) -> Result<Vec<Recipe>, potion::Error> {
        let mut state = self.state.lock().await;

        let mut allowed: Option<BTreeSet<Uuid>> = None;
        for relation in [Relation::Tag, Relation::Ingredient] {
            let ids = filter.ids(relation);
            if ids.is_empty() {
                continue;
            }

            let matching: BTreeSet<Uuid> = state
                .table(relation)
                .links
                .iter()
                .filter(|(_, related_id)| ids.contains(related_id))
                .map(|(recipe_id, _)| *recipe_id)
                .collect();

            allowed = Some(match allowed {
                Some(previous) => previous.intersection(&matching).copied().collect(),
                None => matching,
            });
        }

        Ok(state
            .recipes
            .values()
            .rev()
            .filter(|recipe| recipe.user_id == user_id)
            .filter(|recipe| {
                allowed
                    .as_ref()
                    .map(|allowed| allowed.contains(&recipe.id))
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn save_recipe(&self, recipe: &Recipe) -> Result<(), potion::Error> {
        let mut state = self.state.lock().await;

        if let Some(row) = state
            .recipes
            .get_mut(&recipe.id)
            .filter(|row| row.user_id == recipe.user_id)
        {
            *row = recipe.clone();
        }

        Ok(())
    }

    async fn delete_recipe(&self, user_id: Uuid, id: Uuid) -> Result<bool, potion::Error> {
        let mut state = self.state.lock().await;

        let owned = state
            .recipes
            .get(&id)
            .map(|recipe| recipe.user_id == user_id)
            .unwrap_or(false);
        if !owned {
            return Ok(false);
        }

        state.recipes.remove(&id);
        for table in state.related.values_mut() {
            table.links.retain(|(recipe_id, _)| *recipe_id != id);
        }

        Ok(true)
    }

    async fn get_or_create(
        &self,
        relation: Relation,
        user_id: Uuid,
        name: &str,
    ) -> Result<(RelatedRecord, bool), potion::Error> {
        let mut state = self.state.lock().await;

        if let Some(existing) = state.table(relation).find(user_id, name) {
            return Ok((existing.clone(), false));
        }

        let id = state.next_id();
        let row = RelatedRecord {
            id,
            user_id,
            name: name.to_owned(),
        };
        state.table(relation).rows.insert(id, row.clone());

        Ok((row, true))
    }

    async fn link(
        &self,
        relation: Relation,
        recipe_id: Uuid,
        related_id: Uuid,
    ) -> Result<(), potion::Error> {
        let mut state = self.state.lock().await;
        state.table(relation).links.insert((recipe_id, related_id));

        Ok(())
    }

    async fn clear_links(&self, relation: Relation, recipe_id: Uuid) -> Result<(), potion::Error> {
        let mut state = self.state.lock().await;
        state
            .table(relation)
            .links
            .retain(|(linked_recipe, _)| *linked_recipe != recipe_id);

        Ok(())
    }

    async fn list_linked(
        &self,
        relation: Relation,
        recipe_id: Uuid,
    ) -> Result<Vec<RelatedRecord>, potion::Error> {
        let mut state = self.state.lock().await;
        let table = state.table(relation);

        Ok(table
            .links
            .iter()
            .filter(|(linked_recipe, _)| *linked_recipe == recipe_id)
            .filter_map(|(_, related_id)| table.rows.get(related_id))
            .cloned()
            .collect())
    }

    async fn list_related(
        &self,
        relation: Relation,
        user_id: Uuid,
        assigned_only: bool,
    ) -> Result<Vec<RelatedRecord>, potion::Error> {
        let mut state = self.state.lock().await;
        let table = state.table(relation);

        let mut list: Vec<RelatedRecord> = table
            .rows
            .values()
            .filter(|row| row.user_id == user_id)
            .filter(|row| !assigned_only || table.is_linked(row.id))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.name.cmp(&a.name));

        Ok(list)
    }

    async fn get_related(
        &self,
        relation: Relation,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<RelatedRecord>, potion::Error> {
        let mut state = self.state.lock().await;

        Ok(state
            .table(relation)
            .rows
            .get(&id)
            .filter(|row| row.user_id == user_id)
            .cloned())
    }

    async fn rename_related(
        &self,
        relation: Relation,
        user_id: Uuid,
        id: Uuid,
        name: &str,
    ) -> Result<Option<RelatedRecord>, potion::Error> {
        let mut state = self.state.lock().await;
        let table = state.table(relation);

        let clash = table
            .find(user_id, name)
            .map(|existing| existing.id != id)
            .unwrap_or(false);

        match table.rows.get_mut(&id).filter(|row| row.user_id == user_id) {
            Some(_) if clash => Err(unique_violation(relation)),
            Some(row) => {
                row.name = name.to_owned();
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_related(
        &self,
        relation: Relation,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<bool, potion::Error> {
        let mut state = self.state.lock().await;
        let table = state.table(relation);

        let owned = table
            .rows
            .get(&id)
            .map(|row| row.user_id == user_id)
            .unwrap_or(false);
        if !owned {
            return Ok(false);
        }

        table.rows.remove(&id);
        table.links.retain(|(_, related_id)| *related_id != id);

        Ok(true)
    }
}
