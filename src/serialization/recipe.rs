use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        MAX_LINK_LENGTH, MAX_NAME_LENGTH, MAX_TITLE_LENGTH, PRICE_DECIMAL_PLACES,
        PRICE_MAX_DIGITS,
    },
    error::ValidationError,
    form::Form,
    jwt::SessionData,
    schema::{NewRecipe, Recipe, Relation, Uuid},
    store::RecipeStore,
};

use super::{
    reconciler::RelationReconciler,
    related::{
        IngredientData, IngredientPayload, RelatedData, RelatedPayload, TagData, TagPayload,
    },
};

/// Recipe fields accepted from a request, already coerced.
///
/// Scalar fields are `None` when the request left them out. A missing `tag`
/// or `ingredient` list reads as empty, so an update without one clears the
/// recipe's links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedRecipe {
    pub title: Option<String>,
    pub time_minutes: Option<i32>,
    pub price: Option<f64>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub tag: Vec<TagPayload>,
    pub ingredient: Vec<IngredientPayload>,
}

impl ValidatedRecipe {
    fn to_new_recipe(&self) -> Result<NewRecipe, ValidationError> {
        let mut errors = ValidationError::new();
        if self.title.is_none() {
            errors.add("title", "This field is required.");
        }
        if self.time_minutes.is_none() {
            errors.add("time_minutes", "This field is required.");
        }
        if self.price.is_none() {
            errors.add("price", "This field is required.");
        }
        errors.into_result()?;

        Ok(NewRecipe {
            title: self.title.to_owned().unwrap_or_default(),
            time_minutes: self.time_minutes.unwrap_or_default(),
            price: self.price.unwrap_or_default(),
            link: self.link.to_owned().unwrap_or_default(),
            description: self.description.to_owned().unwrap_or_default(),
        })
    }

    fn apply(&self, recipe: &mut Recipe) {
        if let Some(title) = &self.title {
            recipe.title = title.to_owned();
        }
        if let Some(time_minutes) = self.time_minutes {
            recipe.time_minutes = time_minutes;
        }
        if let Some(price) = self.price {
            recipe.price = price;
        }
        if let Some(link) = &self.link {
            recipe.link = link.to_owned();
        }
        if let Some(description) = &self.description {
            recipe.description = description.to_owned();
        }
    }
}

/// List view of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeData {
    pub id: Uuid,
    pub title: String,
    pub time_minutes: i32,
    pub price: String,
    pub link: String,
    pub tag: Vec<TagData>,
    pub ingredient: Vec<IngredientData>,
}

/// Detail view: the list view plus `description`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDetailData {
    #[serde(flatten)]
    pub recipe: RecipeData,
    pub description: String,
}

pub fn format_price(price: f64) -> String {
    format!("{:.*}", PRICE_DECIMAL_PLACES, price)
}

fn validate_related_list(
    form: &Form,
    relation: Relation,
    errors: &mut ValidationError,
) -> Vec<RelatedPayload> {
    let field = relation.field();

    let items = match form.get_list(field) {
        Some(Ok(items)) => items,
        Some(Err(e)) => {
            errors.add(field, e.info());
            return vec![];
        }
        None => return vec![],
    };

    let mut payloads = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match item.get_str("name", MAX_NAME_LENGTH, false) {
            Some(Ok(name)) => payloads.push(RelatedPayload { name }),
            Some(Err(e)) => errors.add(field, &format!("[{index}] name: {}", e.info())),
            None => errors.add(field, &format!("[{index}] name: This field is required.")),
        }
    }

    payloads
}

pub struct RecipeSerializer<'a> {
    store: &'a dyn RecipeStore,
    session: &'a SessionData,
}

impl<'a> RecipeSerializer<'a> {
    pub fn new(store: &'a dyn RecipeStore, session: &'a SessionData) -> Self {
        Self { store, session }
    }

    /// Coerces a request payload. With `partial` unset, `title`,
    /// `time_minutes` and `price` are required.
    pub fn validate(form: &Form, partial: bool) -> Result<ValidatedRecipe, ValidationError> {
        let mut errors = ValidationError::new();
        let mut validated = ValidatedRecipe::default();

        match form.get_str("title", MAX_TITLE_LENGTH, false) {
            Some(Ok(title)) => validated.title = Some(title),
            Some(Err(e)) => errors.add("title", e.info()),
            None if !partial => errors.add("title", "This field is required."),
            None => {}
        }

        match form.get_integer("time_minutes") {
            Some(Ok(time_minutes)) => validated.time_minutes = Some(time_minutes),
            Some(Err(e)) => errors.add("time_minutes", e.info()),
            None if !partial => errors.add("time_minutes", "This field is required."),
            None => {}
        }

        match form.get_decimal("price", PRICE_MAX_DIGITS, PRICE_DECIMAL_PLACES) {
            Some(Ok(price)) => validated.price = Some(price),
            Some(Err(e)) => errors.add("price", e.info()),
            None if !partial => errors.add("price", "This field is required."),
            None => {}
        }

        match form.get_str("link", MAX_LINK_LENGTH, true) {
            Some(Ok(link)) => validated.link = Some(link),
            Some(Err(e)) => errors.add("link", e.info()),
            None => {}
        }

        match form.get_str("description", usize::MAX, true) {
            Some(Ok(description)) => validated.description = Some(description),
            Some(Err(e)) => errors.add("description", e.info()),
            None => {}
        }

        validated.tag = validate_related_list(form, Relation::Tag, &mut errors);
        validated.ingredient = validate_related_list(form, Relation::Ingredient, &mut errors);

        errors.into_result()?;
        Ok(validated)
    }

    /// Inserts the recipe for the acting user, then links its tags and
    /// ingredients, creating any that do not exist yet.
    pub async fn create(&self, validated: ValidatedRecipe) -> Result<Recipe, potion::Error> {
        let new_recipe = validated.to_new_recipe()?;
        let recipe = self
            .store
            .create_recipe(self.session.user_id, &new_recipe)
            .await?;
        log::info!(
            "created recipe {} for user {}",
            recipe.id,
            self.session.user_id
        );

        let reconciler = RelationReconciler::new(self.store, self.session);
        reconciler
            .get_or_create_tags(&validated.tag, &recipe)
            .await?;
        reconciler
            .get_or_create_ingredients(&validated.ingredient, &recipe)
            .await?;

        Ok(recipe)
    }

    /// Replaces the tag and ingredient links wholesale, then writes the
    /// submitted scalar fields.
    pub async fn update(
        &self,
        mut instance: Recipe,
        validated: ValidatedRecipe,
    ) -> Result<Recipe, potion::Error> {
        let reconciler = RelationReconciler::new(self.store, self.session);
        reconciler
            .replace(Relation::Tag, &validated.tag, &instance)
            .await?;
        reconciler
            .replace(Relation::Ingredient, &validated.ingredient, &instance)
            .await?;

        validated.apply(&mut instance);
        self.store.save_recipe(&instance).await?;
        log::debug!("updated recipe {}", instance.id);

        Ok(instance)
    }

    async fn linked(
        &self,
        relation: Relation,
        recipe: &Recipe,
    ) -> Result<Vec<RelatedData>, potion::Error> {
        let records = self.store.list_linked(relation, recipe.id).await?;
        Ok(records.iter().map(RelatedData::from).collect())
    }

    pub async fn to_data(&self, recipe: &Recipe) -> Result<RecipeData, potion::Error> {
        Ok(RecipeData {
            id: recipe.id,
            title: recipe.title.to_owned(),
            time_minutes: recipe.time_minutes,
            price: format_price(recipe.price),
            link: recipe.link.to_owned(),
            tag: self.linked(Relation::Tag, recipe).await?,
            ingredient: self.linked(Relation::Ingredient, recipe).await?,
        })
    }

    pub async fn to_detail(&self, recipe: &Recipe) -> Result<RecipeDetailData, potion::Error> {
        Ok(RecipeDetailData {
            recipe: self.to_data(recipe).await?,
            description: recipe.description.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::memory::MemoryStore;

    use super::*;

    fn form(value: Value) -> Form {
        match value {
            Value::Object(map) => Form::from_data(map.into_iter().collect()),
            _ => panic!("test form must be an object"),
        }
    }

    fn ok<T>(result: Result<T, potion::Error>) -> T {
        match result {
            Ok(value) => value,
            Err(e) => panic!("serializer failed: {:?}", e.info),
        }
    }

    fn tag_names(data: &RecipeData) -> Vec<String> {
        let mut names: Vec<String> = data.tag.iter().map(|t| t.name.to_owned()).collect();
        names.sort();
        names
    }

    #[test]
    fn validate_coerces_framework_style() {
        let validated = RecipeSerializer::validate(
            &form(json!({
                "id": 42,
                "title": " Pancakes ",
                "time_minutes": "30",
                "price": "5.5",
                "tag": [{ "name": "breakfast" }],
            })),
            false,
        )
        .unwrap();

        assert_eq!(validated.title.as_deref(), Some("Pancakes"));
        assert_eq!(validated.time_minutes, Some(30));
        assert_eq!(validated.price, Some(5.5));
        assert_eq!(validated.link, None);
        assert_eq!(validated.tag, vec![RelatedPayload::new("breakfast")]);
        assert!(validated.ingredient.is_empty());
    }

    #[test]
    fn validate_collects_every_field_error() {
        let err = RecipeSerializer::validate(
            &form(json!({
                "time_minutes": "abc",
                "price": 123.456,
                "ingredient": [{ "name": "" }, {}],
            })),
            false,
        )
        .unwrap_err();

        assert_eq!(err.messages("title"), ["This field is required."]);
        assert_eq!(err.messages("time_minutes"), ["A valid integer is required."]);
        assert_eq!(err.messages("price").len(), 1);
        assert_eq!(err.messages("ingredient").len(), 2);
    }

    #[test]
    fn partial_validation_requires_nothing() {
        let validated = RecipeSerializer::validate(&form(json!({ "link": "" })), true).unwrap();
        assert_eq!(validated.link.as_deref(), Some(""));
        assert_eq!(validated.title, None);
    }

    #[test]
    fn price_renders_with_two_decimals() {
        assert_eq!(format_price(5.5), "5.50");
        assert_eq!(format_price(12.0), "12.00");
        assert_eq!(format_price(0.1 + 0.2), "0.30");
    }

    #[tokio::test]
    async fn create_links_nested_records() {
        let store = MemoryStore::new();
        let session = SessionData::new(1, "cook");
        let serializer = RecipeSerializer::new(&store, &session);

        let validated = RecipeSerializer::validate(
            &form(json!({
                "title": "Tacos",
                "time_minutes": 25,
                "price": 7.25,
                "tag": [{ "name": "mexican" }, { "name": "dinner" }],
                "ingredient": [{ "name": "tortilla" }],
            })),
            false,
        )
        .unwrap();
        let recipe = ok(serializer.create(validated).await);
        assert_eq!(recipe.user_id, 1);

        let data = ok(serializer.to_data(&recipe).await);
        assert_eq!(tag_names(&data), vec!["dinner", "mexican"]);
        assert_eq!(data.ingredient.len(), 1);
        assert_eq!(data.ingredient[0].name, "tortilla");
        assert_eq!(data.price, "7.25");
    }

    #[tokio::test]
    async fn create_without_required_fields_fails() {
        let store = MemoryStore::new();
        let session = SessionData::new(1, "cook");
        let serializer = RecipeSerializer::new(&store, &session);

        match serializer.create(ValidatedRecipe::default()).await {
            Err(e) => assert_eq!(e.code, 400),
            Ok(_) => panic!("create should require title, time and price"),
        }
    }

    #[tokio::test]
    async fn update_replaces_tags_and_orphans_the_dropped_one() {
        let store = MemoryStore::new();
        let session = SessionData::new(1, "cook");
        let serializer = RecipeSerializer::new(&store, &session);

        let created = RecipeSerializer::validate(
            &form(json!({
                "title": "Salad",
                "time_minutes": 10,
                "price": "3.00",
                "tag": [{ "name": "a" }, { "name": "b" }],
            })),
            false,
        )
        .unwrap();
        let recipe = ok(serializer.create(created).await);

        let changes = RecipeSerializer::validate(
            &form(json!({ "tag": [{ "name": "b" }, { "name": "c" }] })),
            true,
        )
        .unwrap();
        let recipe = ok(serializer.update(recipe, changes).await);

        let data = ok(serializer.to_data(&recipe).await);
        assert_eq!(tag_names(&data), vec!["b", "c"]);
        assert_eq!(data.title, "Salad");

        let all = ok(store.list_related(Relation::Tag, 1, false).await);
        assert_eq!(all.len(), 3);
        assert!(all.iter().any(|t| t.name == "a"));
    }

    #[tokio::test]
    async fn update_without_lists_clears_links() {
        let store = MemoryStore::new();
        let session = SessionData::new(1, "cook");
        let serializer = RecipeSerializer::new(&store, &session);

        let created = RecipeSerializer::validate(
            &form(json!({
                "title": "Stew",
                "time_minutes": 90,
                "price": 12,
                "tag": [{ "name": "winter" }],
                "ingredient": [{ "name": "beef" }],
            })),
            false,
        )
        .unwrap();
        let recipe = ok(serializer.create(created).await);

        let changes =
            RecipeSerializer::validate(&form(json!({ "title": "Beef stew" })), true).unwrap();
        let recipe = ok(serializer.update(recipe, changes).await);

        let detail = ok(serializer.to_detail(&recipe).await);
        assert_eq!(detail.recipe.title, "Beef stew");
        assert!(detail.recipe.tag.is_empty());
        assert!(detail.recipe.ingredient.is_empty());
        assert_eq!(store.count_related(Relation::Ingredient, 1).await, 1);
    }

    #[tokio::test]
    async fn only_detail_view_exposes_description() {
        let store = MemoryStore::new();
        let session = SessionData::new(1, "cook");
        let serializer = RecipeSerializer::new(&store, &session);

        let validated = RecipeSerializer::validate(
            &form(json!({
                "title": "Bread",
                "time_minutes": 180,
                "price": 2,
                "description": "Knead well.",
            })),
            false,
        )
        .unwrap();
        let recipe = ok(serializer.create(validated).await);

        let base = serde_json::to_value(ok(serializer.to_data(&recipe).await)).unwrap();
        assert!(base.get("description").is_none());
        assert_eq!(base["price"], json!("2.00"));

        let detail = serde_json::to_value(ok(serializer.to_detail(&recipe).await)).unwrap();
        assert_eq!(detail["description"], json!("Knead well."));
        assert_eq!(detail["title"], json!("Bread"));
        assert!(detail.get("id").is_some());
    }
}
