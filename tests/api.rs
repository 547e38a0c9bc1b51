use std::sync::Arc;

use recipe_sdk::{
    jwt::{generate_jwt_session, SessionData},
    memory::MemoryStore,
    routes::routes,
    schema::Relation,
};
use serde_json::{json, Value};
use warp::http::StatusCode;

const SECRET: &str = "integration-secret";

fn cookie(user_id: i32) -> String {
    let session = SessionData::new(user_id, &format!("user{user_id}"));
    let token = generate_jwt_session(&session, SECRET)
        .ok()
        .expect("token should be signed");
    format!("session={token}")
}

fn body(response: &warp::http::Response<warp::hyper::body::Bytes>) -> Value {
    serde_json::from_slice(response.body()).expect("response should be json")
}

fn tag_names(recipe: &Value) -> Vec<String> {
    let mut names: Vec<String> = recipe["tag"]
        .as_array()
        .expect("tag list")
        .iter()
        .map(|t| t["name"].as_str().unwrap_or_default().to_string())
        .collect();
    names.sort();
    names
}

macro_rules! request {
    ($api:expr, $method:expr, $path:expr, $user:expr) => {
        warp::test::request()
            .method($method)
            .path($path)
            .header("cookie", cookie($user))
            .reply(&$api)
            .await
    };
    ($api:expr, $method:expr, $path:expr, $user:expr, $json:expr) => {
        warp::test::request()
            .method($method)
            .path($path)
            .header("cookie", cookie($user))
            .json(&$json)
            .reply(&$api)
            .await
    };
}

#[tokio::test]
async fn requests_without_session_are_unauthorized() {
    let api = routes(Arc::new(MemoryStore::new()), Arc::new(SECRET.to_string()));

    let res = warp::test::request()
        .method("GET")
        .path("/api/recipe/recipes")
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = warp::test::request()
        .method("GET")
        .path("/api/recipe/recipes")
        .header("cookie", "session=garbage")
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_returns_detail_with_nested_records() {
    let api = routes(Arc::new(MemoryStore::new()), Arc::new(SECRET.to_string()));

    let res = request!(
        api,
        "POST",
        "/api/recipe/recipes",
        1,
        json!({
            "title": "Thai curry",
            "time_minutes": "45",
            "price": 8.5,
            "link": "https://example.com/curry",
            "description": "Medium spicy.",
            "tag": [{ "name": "thai" }, { "name": "dinner" }],
            "ingredient": [{ "name": "coconut milk" }],
        })
    );
    assert_eq!(res.status(), StatusCode::CREATED);

    let recipe = body(&res);
    assert!(recipe["id"].is_number());
    assert_eq!(recipe["time_minutes"], json!(45));
    assert_eq!(recipe["price"], json!("8.50"));
    assert_eq!(recipe["description"], json!("Medium spicy."));
    assert_eq!(tag_names(&recipe), vec!["dinner", "thai"]);
    assert_eq!(recipe["ingredient"][0]["name"], json!("coconut milk"));
    assert!(recipe["ingredient"][0]["id"].is_number());
}

#[tokio::test]
async fn list_view_omits_description_and_is_scoped() {
    let api = routes(Arc::new(MemoryStore::new()), Arc::new(SECRET.to_string()));

    for (user, title) in [(1, "Mine"), (2, "Theirs")] {
        let res = request!(
            api,
            "POST",
            "/api/recipe/recipes",
            user,
            json!({ "title": title, "time_minutes": 5, "price": "1.00", "description": "x" })
        );
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = request!(api, "GET", "/api/recipe/recipes", 1);
    assert_eq!(res.status(), StatusCode::OK);

    let list = body(&res);
    let list = list.as_array().expect("list");
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["title"], json!("Mine"));
    assert!(list[0].get("description").is_none());
}

#[tokio::test]
async fn foreign_recipes_are_not_found() {
    let api = routes(Arc::new(MemoryStore::new()), Arc::new(SECRET.to_string()));

    let res = request!(
        api,
        "POST",
        "/api/recipe/recipes",
        1,
        json!({ "title": "Private", "time_minutes": 5, "price": 1 })
    );
    let id = body(&res)["id"].as_i64().expect("id");
    let path = format!("/api/recipe/recipes/{id}");

    let res = request!(api, "GET", &path, 2);
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = request!(api, "PATCH", &path, 2, json!({ "title": "Stolen" }));
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = request!(api, "DELETE", &path, 2);
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = request!(api, "GET", &path, 1);
    assert_eq!(body(&res)["title"], json!("Private"));
}

#[tokio::test]
async fn patch_replaces_the_tag_set() {
    let store = Arc::new(MemoryStore::new());
    let api = routes(store.clone(), Arc::new(SECRET.to_string()));

    let res = request!(
        api,
        "POST",
        "/api/recipe/recipes",
        1,
        json!({
            "title": "Salad",
            "time_minutes": 10,
            "price": "4.20",
            "tag": [{ "name": "a" }, { "name": "b" }],
        })
    );
    let id = body(&res)["id"].as_i64().expect("id");

    let res = request!(
        api,
        "PATCH",
        &format!("/api/recipe/recipes/{id}"),
        1,
        json!({ "tag": [{ "name": "b" }, { "name": "c" }] })
    );
    assert_eq!(res.status(), StatusCode::OK);

    let recipe = body(&res);
    assert_eq!(tag_names(&recipe), vec!["b", "c"]);
    assert_eq!(recipe["title"], json!("Salad"));
    assert_eq!(store.count_related(Relation::Tag, 1).await, 3);
}

#[tokio::test]
async fn put_requires_the_full_payload() {
    let api = routes(Arc::new(MemoryStore::new()), Arc::new(SECRET.to_string()));

    let res = request!(
        api,
        "POST",
        "/api/recipe/recipes",
        1,
        json!({ "title": "Toast", "time_minutes": 3, "price": 1 })
    );
    let id = body(&res)["id"].as_i64().expect("id");
    let path = format!("/api/recipe/recipes/{id}");

    let res = request!(api, "PUT", &path, 1, json!({ "title": "Better toast" }));
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let errors = body(&res);
    assert_eq!(errors["time_minutes"], json!(["This field is required."]));
    assert_eq!(errors["price"], json!(["This field is required."]));

    let res = request!(
        api,
        "PUT",
        &path,
        1,
        json!({ "title": "Better toast", "time_minutes": 4, "price": "1.50", "link": "" })
    );
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(&res)["price"], json!("1.50"));
}

#[tokio::test]
async fn invalid_payloads_are_bad_requests() {
    let api = routes(Arc::new(MemoryStore::new()), Arc::new(SECRET.to_string()));

    let res = request!(
        api,
        "POST",
        "/api/recipe/recipes",
        1,
        json!({ "title": "Soup", "time_minutes": "abc", "price": 123.456 })
    );
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let errors = body(&res);
    assert_eq!(errors["time_minutes"], json!(["A valid integer is required."]));
    assert!(errors["price"].is_array());

    let res = warp::test::request()
        .method("POST")
        .path("/api/recipe/recipes")
        .header("cookie", cookie(1))
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recipes_filter_by_tag_and_ingredient_ids() {
    let api = routes(Arc::new(MemoryStore::new()), Arc::new(SECRET.to_string()));

    let res = request!(
        api,
        "POST",
        "/api/recipe/recipes",
        1,
        json!({
            "title": "Pesto",
            "time_minutes": 15,
            "price": 3,
            "tag": [{ "name": "italian" }],
            "ingredient": [{ "name": "basil" }],
        })
    );
    let pesto = body(&res);
    request!(
        api,
        "POST",
        "/api/recipe/recipes",
        1,
        json!({ "title": "Plain", "time_minutes": 1, "price": 1 })
    );

    let tag_id = pesto["tag"][0]["id"].as_i64().expect("tag id");
    let res = request!(api, "GET", &format!("/api/recipe/recipes?tags={tag_id},999"), 1);
    let list = body(&res);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["title"], json!("Pesto"));

    let ingredient_id = pesto["ingredient"][0]["id"].as_i64().expect("ingredient id");
    let res = request!(
        api,
        "GET",
        &format!("/api/recipe/recipes?ingredients={ingredient_id}"),
        1
    );
    assert_eq!(body(&res).as_array().map(Vec::len), Some(1));

    let res = request!(api, "GET", "/api/recipe/recipes?tags=1,nope", 1);
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tags_are_listed_renamed_and_deleted() {
    let api = routes(Arc::new(MemoryStore::new()), Arc::new(SECRET.to_string()));

    let res = request!(
        api,
        "POST",
        "/api/recipe/recipes",
        1,
        json!({
            "title": "Chili",
            "time_minutes": 60,
            "price": 6,
            "tag": [{ "name": "hot" }, { "name": "beans" }],
        })
    );
    let recipe = body(&res);
    let recipe_id = recipe["id"].as_i64().expect("id");

    // drop "beans" from the recipe so it becomes unassigned
    request!(
        api,
        "PATCH",
        &format!("/api/recipe/recipes/{recipe_id}"),
        1,
        json!({ "tag": [{ "name": "hot" }] })
    );

    let res = request!(api, "GET", "/api/recipe/tags", 1);
    let names: Vec<Value> = body(&res)
        .as_array()
        .expect("tags")
        .iter()
        .map(|t| t["name"].clone())
        .collect();
    assert_eq!(names, vec![json!("hot"), json!("beans")]);

    let res = request!(api, "GET", "/api/recipe/tags?assigned_only=1", 1);
    let assigned = body(&res);
    assert_eq!(assigned.as_array().map(Vec::len), Some(1));
    let hot_id = assigned[0]["id"].as_i64().expect("tag id");

    let res = request!(api, "GET", "/api/recipe/tags", 2);
    assert_eq!(body(&res), json!([]));

    let res = request!(
        api,
        "PATCH",
        &format!("/api/recipe/tags/{hot_id}"),
        1,
        json!({ "name": "very hot" })
    );
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body(&res), json!({ "id": hot_id, "name": "very hot" }));

    let res = request!(api, "DELETE", &format!("/api/recipe/tags/{hot_id}"), 2);
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = request!(api, "DELETE", &format!("/api/recipe/tags/{hot_id}"), 1);
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = request!(api, "GET", &format!("/api/recipe/recipes/{recipe_id}"), 1);
    assert_eq!(body(&res)["tag"], json!([]));
}

#[tokio::test]
async fn ingredients_share_the_tag_rules() {
    let api = routes(Arc::new(MemoryStore::new()), Arc::new(SECRET.to_string()));

    for user in [1, 2] {
        request!(
            api,
            "POST",
            "/api/recipe/recipes",
            user,
            json!({
                "title": "Oats",
                "time_minutes": 5,
                "price": 1,
                "ingredient": [{ "name": "oats" }],
            })
        );
    }

    let mine = body(&request!(api, "GET", "/api/recipe/ingredients", 1));
    let theirs = body(&request!(api, "GET", "/api/recipe/ingredients", 2));
    assert_eq!(mine[0]["name"], json!("oats"));
    assert_eq!(theirs[0]["name"], json!("oats"));
    assert_ne!(mine[0]["id"], theirs[0]["id"]);

    let id = mine[0]["id"].as_i64().expect("id");
    let res = request!(
        api,
        "PUT",
        &format!("/api/recipe/ingredients/{id}"),
        1,
        json!({})
    );
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body(&res)["name"], json!(["This field is required."]));
}

#[tokio::test]
async fn deleting_a_recipe_keeps_its_tags() {
    let api = routes(Arc::new(MemoryStore::new()), Arc::new(SECRET.to_string()));

    let res = request!(
        api,
        "POST",
        "/api/recipe/recipes",
        1,
        json!({ "title": "Cake", "time_minutes": 50, "price": 5, "tag": [{ "name": "sweet" }] })
    );
    let id = body(&res)["id"].as_i64().expect("id");
    let path = format!("/api/recipe/recipes/{id}");

    let res = request!(api, "DELETE", &path, 1);
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = request!(api, "GET", &path, 1);
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let tags = body(&request!(api, "GET", "/api/recipe/tags", 1));
    assert_eq!(tags[0]["name"], json!("sweet"));
}
