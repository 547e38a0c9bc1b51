use std::{convert::Infallible, sync::Arc};

use warp::{filters::BoxedFilter, http::StatusCode, reply::Response, Filter, Rejection, Reply};

use crate::{
    constants::{API_APP, API_PREFIX},
    form::FormData,
    jwt::SessionData,
    middleware::with_session,
    schema::{Relation, Uuid},
    store::RecipeStore,
};

use super::{
    handlers::{self, QueryParams},
    reply::{empty_reply, handle_rejection, json_reply},
};

const MAX_BODY_BYTES: u64 = 64 * 1024;

type SharedStore = Arc<dyn RecipeStore>;

fn with_store(
    store: SharedStore,
) -> impl Filter<Extract = (SharedStore,), Error = Infallible> + Clone {
    warp::any().map(move || store.clone())
}

fn json_body() -> impl Filter<Extract = (FormData,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// PUT is a full update, PATCH a partial one.
fn update_method() -> impl Filter<Extract = (bool,), Error = Rejection> + Clone {
    warp::put()
        .map(|| false)
        .or(warp::patch().map(|| true))
        .unify()
}

fn collection(segment: &'static str) -> impl Filter<Extract = (), Error = Rejection> + Clone {
    warp::path(API_PREFIX)
        .and(warp::path(API_APP))
        .and(warp::path(segment))
        .and(warp::path::end())
}

fn item(segment: &'static str) -> impl Filter<Extract = (Uuid,), Error = Rejection> + Clone {
    warp::path(API_PREFIX)
        .and(warp::path(API_APP))
        .and(warp::path(segment))
        .and(warp::path::param::<Uuid>())
        .and(warp::path::end())
}

fn recipe_routes(store: SharedStore, secret: Arc<String>) -> BoxedFilter<(Response,)> {
    let list = collection("recipes")
        .and(warp::get())
        .and(with_session(secret.clone()))
        .and(warp::query::<QueryParams>())
        .and(with_store(store.clone()))
        .then(
            |session: SessionData, params: QueryParams, store: SharedStore| async move {
                json_reply(
                    handlers::list_recipes(store.as_ref(), &session, &params).await,
                    StatusCode::OK,
                )
            },
        );

    let create = collection("recipes")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_store(store.clone()))
        .then(
            |session: SessionData, data: FormData, store: SharedStore| async move {
                json_reply(
                    handlers::create_recipe(store.as_ref(), &session, data).await,
                    StatusCode::CREATED,
                )
            },
        );

    let retrieve = item("recipes")
        .and(warp::get())
        .and(with_session(secret.clone()))
        .and(with_store(store.clone()))
        .then(|id: Uuid, session: SessionData, store: SharedStore| async move {
            json_reply(
                handlers::retrieve_recipe(store.as_ref(), &session, id).await,
                StatusCode::OK,
            )
        });

    let update = item("recipes")
        .and(update_method())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_store(store.clone()))
        .then(
            |id: Uuid,
             partial: bool,
             session: SessionData,
             data: FormData,
             store: SharedStore| async move {
                json_reply(
                    handlers::update_recipe(store.as_ref(), &session, id, data, partial).await,
                    StatusCode::OK,
                )
            },
        );

    let destroy = item("recipes")
        .and(warp::delete())
        .and(with_session(secret))
        .and(with_store(store))
        .then(|id: Uuid, session: SessionData, store: SharedStore| async move {
            empty_reply(handlers::destroy_recipe(store.as_ref(), &session, id).await)
        });

    list.or(create)
        .unify()
        .or(retrieve)
        .unify()
        .or(update)
        .unify()
        .or(destroy)
        .unify()
        .boxed()
}

fn related_routes(
    relation: Relation,
    store: SharedStore,
    secret: Arc<String>,
) -> BoxedFilter<(Response,)> {
    let list = collection(relation.route())
        .and(warp::get())
        .and(with_session(secret.clone()))
        .and(warp::query::<QueryParams>())
        .and(with_store(store.clone()))
        .then(
            move |session: SessionData, params: QueryParams, store: SharedStore| async move {
                json_reply(
                    handlers::list_related(store.as_ref(), &session, relation, &params).await,
                    StatusCode::OK,
                )
            },
        );

    let update = item(relation.route())
        .and(update_method())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_store(store.clone()))
        .then(
            move |id: Uuid,
                  partial: bool,
                  session: SessionData,
                  data: FormData,
                  store: SharedStore| async move {
                json_reply(
                    handlers::update_related(store.as_ref(), &session, relation, id, data, partial)
                        .await,
                    StatusCode::OK,
                )
            },
        );

    let destroy = item(relation.route())
        .and(warp::delete())
        .and(with_session(secret))
        .and(with_store(store))
        .then(move |id: Uuid, session: SessionData, store: SharedStore| async move {
            empty_reply(handlers::destroy_related(store.as_ref(), &session, relation, id).await)
        });

    list.or(update).unify().or(destroy).unify().boxed()
}

/// Every recipe, tag and ingredient route, with rejections rendered as JSON.
pub fn routes(
    store: SharedStore,
    secret: Arc<String>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    recipe_routes(store.clone(), secret.clone())
        .or(related_routes(Relation::Tag, store.clone(), secret.clone()))
        .unify()
        .or(related_routes(Relation::Ingredient, store, secret))
        .unify()
        .recover(handle_rejection)
}
