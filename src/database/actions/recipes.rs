use crate::{
    error::QueryError,
    schema::{NewRecipe, Recipe, RecipeFilter, Relation, Uuid},
};

use sqlx::{Pool, Postgres, QueryBuilder};

pub async fn create_recipe(
    user_id: Uuid,
    recipe: &NewRecipe,
    pool: &Pool<Postgres>,
) -> Result<Recipe, potion::Error> {
    let row: Recipe = sqlx::query_as(
        "
        INSERT INTO recipes (user_id, title, time_minutes, price, link, description)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
    ",
    )
    .bind(user_id)
    .bind(&recipe.title)
    .bind(recipe.time_minutes)
    .bind(recipe.price)
    .bind(&recipe.link)
    .bind(&recipe.description)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_recipe(
    user_id: Uuid,
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<Recipe>, potion::Error> {
    let row: Option<Recipe> =
        sqlx::query_as("SELECT * FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn list_recipes(
    user_id: Uuid,
    filter: &RecipeFilter,
    pool: &Pool<Postgres>,
) -> Result<Vec<Recipe>, potion::Error> {
    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("SELECT r.* FROM recipes r WHERE r.user_id = ");
    query_builder.push_bind(user_id);

    for relation in [Relation::Tag, Relation::Ingredient] {
        let ids = filter.ids(relation);
        if ids.is_empty() {
            continue;
        }

        query_builder.push(format!(
            " AND r.id IN (SELECT recipe_id FROM {} WHERE {} = ANY(",
            relation.link_table(),
            relation.link_column()
        ));
        query_builder.push_bind(ids.to_vec());
        query_builder.push("))");
    }

    query_builder.push(" ORDER BY r.id DESC");

    let rows: Vec<Recipe> = query_builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn update_recipe(recipe: &Recipe, pool: &Pool<Postgres>) -> Result<(), potion::Error> {
    sqlx::query(
        "
        UPDATE recipes
        SET title = $1, time_minutes = $2, price = $3, link = $4, description = $5
        WHERE id = $6 AND user_id = $7
    ",
    )
    .bind(&recipe.title)
    .bind(recipe.time_minutes)
    .bind(recipe.price)
    .bind(&recipe.link)
    .bind(&recipe.description)
    .bind(recipe.id)
    .bind(recipe.user_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(())
}

pub async fn delete_recipe(
    user_id: Uuid,
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, potion::Error> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    let owned: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tr)
            .await
            .map_err(QueryError::from)?;

    if owned.is_none() {
        return Ok(false);
    }

    for relation in [Relation::Tag, Relation::Ingredient] {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE recipe_id = $1",
            relation.link_table()
        ))
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(QueryError::from)?;
    }

    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&mut *tr)
        .await
        .map_err(QueryError::from)?;

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    Ok(true)
}
