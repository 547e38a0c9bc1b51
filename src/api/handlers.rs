use std::collections::HashMap;

use crate::{
    error::{not_found, TypeError, ValidationError},
    form::{Form, FormData},
    jwt::SessionData,
    schema::{RecipeFilter, Relation, Uuid},
    serialization::{
        recipe::{RecipeData, RecipeDetailData, RecipeSerializer},
        related::{RelatedData, RelatedPayload},
    },
    store::RecipeStore,
};

pub type QueryParams = HashMap<String, String>;

/// Comma separated ids, e.g. `?tags=1,2`.
fn parse_ids(params: &QueryParams, key: &str) -> Result<Vec<Uuid>, ValidationError> {
    let value = match params.get(key) {
        Some(value) if !value.trim().is_empty() => value,
        _ => return Ok(vec![]),
    };

    value
        .split(',')
        .map(|id| id.trim().parse::<Uuid>())
        .collect::<Result<Vec<Uuid>, _>>()
        .map_err(|_| ValidationError::field(key, "Expected a comma separated list of ids."))
}

fn parse_flag(params: &QueryParams, key: &str) -> Result<bool, potion::Error> {
    match params.get(key) {
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map(|flag| flag != 0)
            .map_err(|_| TypeError::new(&format!("Invalid value for {key}")).into()),
        None => Ok(false),
    }
}

pub async fn list_recipes(
    store: &dyn RecipeStore,
    session: &SessionData,
    params: &QueryParams,
) -> Result<Vec<RecipeData>, potion::Error> {
    let filter = RecipeFilter {
        tags: parse_ids(params, "tags")?,
        ingredients: parse_ids(params, "ingredients")?,
    };

    let serializer = RecipeSerializer::new(store, session);
    let recipes = store.list_recipes(session.user_id, &filter).await?;

    let mut list = Vec::with_capacity(recipes.len());
    for recipe in &recipes {
        list.push(serializer.to_data(recipe).await?);
    }

    Ok(list)
}

pub async fn create_recipe(
    store: &dyn RecipeStore,
    session: &SessionData,
    data: FormData,
) -> Result<RecipeDetailData, potion::Error> {
    let validated = RecipeSerializer::validate(&Form::from_data(data), false)?;

    let serializer = RecipeSerializer::new(store, session);
    let recipe = serializer.create(validated).await?;

    serializer.to_detail(&recipe).await
}

pub async fn retrieve_recipe(
    store: &dyn RecipeStore,
    session: &SessionData,
    id: Uuid,
) -> Result<RecipeDetailData, potion::Error> {
    let recipe = store
        .get_recipe(session.user_id, id)
        .await?
        .ok_or_else(not_found)?;

    RecipeSerializer::new(store, session).to_detail(&recipe).await
}

pub async fn update_recipe(
    store: &dyn RecipeStore,
    session: &SessionData,
    id: Uuid,
    data: FormData,
    partial: bool,
) -> Result<RecipeDetailData, potion::Error> {
    let recipe = store
        .get_recipe(session.user_id, id)
        .await?
        .ok_or_else(not_found)?;
    let validated = RecipeSerializer::validate(&Form::from_data(data), partial)?;

    let serializer = RecipeSerializer::new(store, session);
    let recipe = serializer.update(recipe, validated).await?;

    serializer.to_detail(&recipe).await
}

pub async fn destroy_recipe(
    store: &dyn RecipeStore,
    session: &SessionData,
    id: Uuid,
) -> Result<(), potion::Error> {
    if !store.delete_recipe(session.user_id, id).await? {
        return Err(not_found());
    }

    log::info!("deleted recipe {} of user {}", id, session.user_id);
    Ok(())
}

pub async fn list_related(
    store: &dyn RecipeStore,
    session: &SessionData,
    relation: Relation,
    params: &QueryParams,
) -> Result<Vec<RelatedData>, potion::Error> {
    let assigned_only = parse_flag(params, "assigned_only")?;
    let records = store
        .list_related(relation, session.user_id, assigned_only)
        .await?;

    Ok(records.iter().map(RelatedData::from).collect())
}

pub async fn update_related(
    store: &dyn RecipeStore,
    session: &SessionData,
    relation: Relation,
    id: Uuid,
    data: FormData,
    partial: bool,
) -> Result<RelatedData, potion::Error> {
    let record = store
        .get_related(relation, session.user_id, id)
        .await?
        .ok_or_else(not_found)?;

    let record = match RelatedPayload::validate(&Form::from_data(data), partial)? {
        Some(payload) => store
            .rename_related(relation, session.user_id, id, &payload.name)
            .await?
            .ok_or_else(not_found)?,
        None => record,
    };

    Ok(RelatedData::from(&record))
}

pub async fn destroy_related(
    store: &dyn RecipeStore,
    session: &SessionData,
    relation: Relation,
    id: Uuid,
) -> Result<(), potion::Error> {
    if !store.delete_related(relation, session.user_id, id).await? {
        return Err(not_found());
    }

    log::info!("deleted {:?} {} of user {}", relation, id, session.user_id);
    Ok(())
}
