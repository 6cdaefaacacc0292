use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::helpers::{TestApp, sample_recipe, spawn_app};

/// Creates a recipe carrying `tags` and returns the created tags.
async fn tagged_recipe(app: &TestApp, token: &str, title: &str, tags: &[&str]) -> Value {
    let mut body = sample_recipe(title);
    body["tags"] = tags.iter().map(|name| json!({ "name": name })).collect();
    app.create_recipe(token, body).await["tags"].clone()
}

fn tag_id(tags: &Value, name: &str) -> i64 {
    tags.as_array()
        .unwrap()
        .iter()
        .find(|t| t["name"] == name)
        .and_then(|t| t["id"].as_i64())
        .expect("tag not found")
}

#[tokio::test]
async fn tags_require_authentication() {
    let app = spawn_app().await;

    app.server
        .get("/tags")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_is_by_descending_name_and_limited_to_owner() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let other = app.login("other@example.com").await;
    tagged_recipe(&app, &token, "Mine", &["Dessert", "Vegan"]).await;
    tagged_recipe(&app, &other, "Theirs", &["Fruity"]).await;

    let response = app.get(&token, "/tags").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Vegan", "Dessert"]);
}

#[tokio::test]
async fn get_tag_detail() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let tags = tagged_recipe(&app, &token, "Cake", &["Dessert"]).await;
    let id = tag_id(&tags, "Dessert");

    let response = app.get(&token, &format!("/tags/{id}")).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!({ "id": id, "name": "Dessert" }));
}

#[tokio::test]
async fn rename_tag() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let tags = tagged_recipe(&app, &token, "Eggs", &["After Dinner"]).await;
    let id = tag_id(&tags, "After Dinner");

    let response = app
        .patch(&token, &format!("/tags/{id}"), json!({ "name": "Dessert" }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["name"], "Dessert");
    let recipes = app.get(&token, "/recipes").await.json::<Value>();
    assert_eq!(recipes[0]["tags"][0]["name"], "Dessert");
}

#[tokio::test]
async fn rename_to_own_name_is_accepted() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let tags = tagged_recipe(&app, &token, "Eggs", &["Breakfast"]).await;
    let id = tag_id(&tags, "Breakfast");

    app.patch(&token, &format!("/tags/{id}"), json!({ "name": "Breakfast" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn rename_onto_existing_tag_is_rejected() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let tags = tagged_recipe(&app, &token, "Brunch", &["Breakfast", "Lunch"]).await;
    let id = tag_id(&tags, "Lunch");

    let response = app
        .patch(&token, &format!("/tags/{id}"), json!({ "name": "Breakfast" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["fields"]["name"].is_array());
    let detail = app.get(&token, &format!("/tags/{id}")).await.json::<Value>();
    assert_eq!(detail["name"], "Lunch");
}

#[tokio::test]
async fn rename_with_blank_name_is_rejected() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let tags = tagged_recipe(&app, &token, "Soup", &["Winter"]).await;
    let id = tag_id(&tags, "Winter");

    app.patch(&token, &format!("/tags/{id}"), json!({ "name": "" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn replacing_a_tag_is_not_allowed() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let tags = tagged_recipe(&app, &token, "Soup", &["Winter"]).await;
    let id = tag_id(&tags, "Winter");

    app.put(&token, &format!("/tags/{id}"), json!({ "name": "Summer" }))
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    app.post(&token, "/tags", json!({ "name": "Summer" }))
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn other_users_tag_is_not_found() {
    let app = spawn_app().await;
    let owner = app.login("owner@example.com").await;
    let intruder = app.login("intruder@example.com").await;
    let tags = tagged_recipe(&app, &owner, "Private", &["Secret"]).await;
    let path = format!("/tags/{}", tag_id(&tags, "Secret"));

    app.get(&intruder, &path)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.patch(&intruder, &path, json!({ "name": "Stolen" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.delete(&intruder, &path)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let detail = app.get(&owner, &path).await.json::<Value>();
    assert_eq!(detail["name"], "Secret");
}

#[tokio::test]
async fn delete_tag_detaches_it_from_recipes() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let tags = tagged_recipe(&app, &token, "Toast", &["Breakfast"]).await;
    let path = format!("/tags/{}", tag_id(&tags, "Breakfast"));

    app.delete(&token, &path)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.get(&token, &path)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    let recipes = app.get(&token, "/recipes").await.json::<Value>();
    assert_eq!(recipes[0]["tags"], json!([]));
}

#[tokio::test]
async fn assigned_only_lists_tags_on_recipes() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let created = tagged_recipe(&app, &token, "Apple Crumble", &["Breakfast", "Lunch"]).await;
    let path = format!("/recipes?tags={}", tag_id(&created, "Lunch"));
    let recipes = app.get(&token, &path).await.json::<Value>();
    // Detach "Lunch" by replacing the recipe's tags.
    app.patch(
        &token,
        &format!("/recipes/{}", recipes[0]["id"]),
        json!({ "tags": [{ "name": "Breakfast" }] }),
    )
    .await
    .assert_status_ok();

    let all = app.get(&token, "/tags").await.json::<Value>();
    let assigned = app
        .get(&token, "/tags?assigned_only=1")
        .await
        .json::<Value>();

    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(assigned, json!([{ "id": tag_id(&created, "Breakfast"), "name": "Breakfast" }]));
}

#[tokio::test]
async fn assigned_only_returns_each_tag_once() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    tagged_recipe(&app, &token, "Eggs Benedict", &["Breakfast"]).await;
    tagged_recipe(&app, &token, "Herb Pancakes", &["Breakfast"]).await;

    let assigned = app
        .get(&token, "/tags?assigned_only=1")
        .await
        .json::<Value>();

    assert_eq!(assigned.as_array().unwrap().len(), 1);
}
