use crate::{
    error::QueryError,
    schema::{RelatedRecord, Relation, Uuid},
};

use sqlx::{Pool, Postgres};

/// Single round trip in the common case. Relies on the `(user_id, name)`
/// unique constraint so concurrent requests settle on one row.
pub async fn get_or_create_related(
    relation: Relation,
    user_id: Uuid,
    name: &str,
    pool: &Pool<Postgres>,
) -> Result<(RelatedRecord, bool), potion::Error> {
    let created: Option<RelatedRecord> = sqlx::query_as(&format!(
        "
        INSERT INTO {} (user_id, name) VALUES ($1, $2)
        ON CONFLICT (user_id, name) DO NOTHING
        RETURNING id, user_id, name
    ",
        relation.table()
    ))
    .bind(user_id)
    .bind(name)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    if let Some(record) = created {
        return Ok((record, true));
    }

    let existing: RelatedRecord = sqlx::query_as(&format!(
        "SELECT id, user_id, name FROM {} WHERE user_id = $1 AND name = $2",
        relation.table()
    ))
    .bind(user_id)
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    Ok((existing, false))
}

pub async fn link_related(
    relation: Relation,
    recipe_id: Uuid,
    related_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    sqlx::query(&format!(
        "INSERT INTO {} (recipe_id, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        relation.link_table(),
        relation.link_column()
    ))
    .bind(recipe_id)
    .bind(related_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(())
}

pub async fn clear_related_links(
    relation: Relation,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), potion::Error> {
    sqlx::query(&format!(
        "DELETE FROM {} WHERE recipe_id = $1",
        relation.link_table()
    ))
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(())
}

pub async fn list_linked_related(
    relation: Relation,
    recipe_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<RelatedRecord>, potion::Error> {
    let list: Vec<RelatedRecord> = sqlx::query_as(&format!(
        "
        SELECT t.id, t.user_id, t.name
        FROM {} t
        INNER JOIN {} m ON m.{} = t.id
        WHERE m.recipe_id = $1
        ORDER BY t.id
    ",
        relation.table(),
        relation.link_table(),
        relation.link_column()
    ))
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn list_related(
    relation: Relation,
    user_id: Uuid,
    assigned_only: bool,
    pool: &Pool<Postgres>,
) -> Result<Vec<RelatedRecord>, potion::Error> {
    let query = if assigned_only {
        format!(
            "
            SELECT DISTINCT t.id, t.user_id, t.name
            FROM {} t
            INNER JOIN {} m ON m.{} = t.id
            WHERE t.user_id = $1
            ORDER BY t.name DESC
        ",
            relation.table(),
            relation.link_table(),
            relation.link_column()
        )
    } else {
        format!(
            "SELECT id, user_id, name FROM {} WHERE user_id = $1 ORDER BY name DESC",
            relation.table()
        )
    };

    let list: Vec<RelatedRecord> = sqlx::query_as(&query)
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn get_related(
    relation: Relation,
    user_id: Uuid,
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Option<RelatedRecord>, potion::Error> {
    let row: Option<RelatedRecord> = sqlx::query_as(&format!(
        "SELECT id, user_id, name FROM {} WHERE id = $1 AND user_id = $2",
        relation.table()
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn rename_related(
    relation: Relation,
    user_id: Uuid,
    id: Uuid,
    name: &str,
    pool: &Pool<Postgres>,
) -> Result<Option<RelatedRecord>, potion::Error> {
    let row: Option<RelatedRecord> = sqlx::query_as(&format!(
        "UPDATE {} SET name = $1 WHERE id = $2 AND user_id = $3 RETURNING id, user_id, name",
        relation.table()
    ))
    .bind(name)
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn delete_related(
    relation: Relation,
    user_id: Uuid,
    id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, potion::Error> {
    let mut tr = pool
        .begin()
        .await
        .map_err(|_| QueryError::new("Could not start transaction".to_owned()))?;

    sqlx::query(&format!(
        "DELETE FROM {} WHERE {} IN (SELECT id FROM {} WHERE id = $1 AND user_id = $2)",
        relation.link_table(),
        relation.link_column(),
        relation.table()
    ))
    .bind(id)
    .bind(user_id)
    .execute(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    let deleted = sqlx::query(&format!(
        "DELETE FROM {} WHERE id = $1 AND user_id = $2",
        relation.table()
    ))
    .bind(id)
    .bind(user_id)
    .execute(&mut *tr)
    .await
    .map_err(QueryError::from)?;

    if deleted.rows_affected() == 0 {
        return Ok(false);
    }

    tr.commit()
        .await
        .map_err(|_| QueryError::new("Could not commit transaction".to_owned()))?;

    Ok(true)
}
