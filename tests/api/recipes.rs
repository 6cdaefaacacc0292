use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::helpers::{sample_recipe, spawn_app};

fn titles(list: &Value) -> Vec<&str> {
    list.as_array()
        .expect("list body")
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect()
}

fn names(labels: &Value) -> Vec<&str> {
    labels
        .as_array()
        .expect("label array")
        .iter()
        .map(|l| l["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn recipes_require_authentication() {
    let app = spawn_app().await;

    app.server
        .get("/recipes")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn list_is_newest_first_and_limited_to_owner() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let other = app.login("other@example.com").await;
    app.create_recipe(&token, sample_recipe("First")).await;
    app.create_recipe(&token, sample_recipe("Second")).await;
    app.create_recipe(&other, sample_recipe("Not mine")).await;

    let response = app.get(&token, "/recipes").await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(titles(&body), ["Second", "First"]);
    assert!(body[0].get("description").is_none());
    assert_eq!(body[0]["price"], "3.45");
}

#[tokio::test]
async fn detail_includes_description() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let created = app.create_recipe(&token, sample_recipe("Soup")).await;

    let response = app
        .get(&token, &format!("/recipes/{}", created["id"]))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["title"], "Soup");
    assert_eq!(body["description"], "Sample Test Recipe Description.");
    assert_eq!(body["tags"], json!([]));
    assert_eq!(body["ingredients"], json!([]));
}

#[tokio::test]
async fn create_recipe_normalizes_price() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;

    let response = app
        .post(
            &token,
            "/recipes",
            json!({ "title": "Sample recipe", "time_minutes": 30, "price": 12 }),
        )
        .await;

    response.assert_status(StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["price"], "12.00");
    assert_eq!(body["time_minutes"], 30);
    assert_eq!(body["description"], "");
    assert_eq!(body["link"], "");
}

#[tokio::test]
async fn create_recipe_with_new_tags() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let mut body = sample_recipe("Prawn Curry");
    body["tags"] = json!([{ "name": "Seafood" }, { "name": "Starters" }]);

    let created = app.create_recipe(&token, body).await;

    assert_eq!(created["tags"].as_array().unwrap().len(), 2);
    let tags = app.get(&token, "/tags").await.json::<Value>();
    assert_eq!(names(&tags), ["Starters", "Seafood"]);
}

#[tokio::test]
async fn create_recipe_reuses_existing_tag() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let mut first = sample_recipe("Pancakes");
    first["tags"] = json!([{ "name": "Breakfast" }]);
    let first = app.create_recipe(&token, first).await;
    let mut second = sample_recipe("Porridge");
    second["tags"] = json!([{ "name": "Breakfast" }, { "name": "Warm" }]);

    let second = app.create_recipe(&token, second).await;

    let tags = app.get(&token, "/tags").await.json::<Value>();
    assert_eq!(names(&tags), ["Warm", "Breakfast"]);
    let breakfast_id = first["tags"][0]["id"].clone();
    assert!(
        second["tags"]
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t["id"] == breakfast_id)
    );
}

#[tokio::test]
async fn same_tag_name_is_separate_per_user() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let other = app.login("other@example.com").await;
    let mut body = sample_recipe("Dal");
    body["tags"] = json!([{ "name": "Indian" }]);

    let mine = app.create_recipe(&token, body.clone()).await;
    let theirs = app.create_recipe(&other, body).await;

    assert_ne!(mine["tags"][0]["id"], theirs["tags"][0]["id"]);
}

#[tokio::test]
async fn create_recipe_with_ingredients() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let mut body = sample_recipe("Tacos");
    body["ingredients"] = json!([{ "name": "Salt" }, { "name": "Lime" }]);

    let created = app.create_recipe(&token, body).await;

    assert_eq!(names(&created["ingredients"]).len(), 2);
    let ingredients = app.get(&token, "/ingredients").await.json::<Value>();
    assert_eq!(names(&ingredients), ["Salt", "Lime"]);
}

#[tokio::test]
async fn create_recipe_rejects_invalid_fields() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;

    let response = app
        .post(
            &token,
            "/recipes",
            json!({ "title": "", "time_minutes": 0, "price": "1234.5" }),
        )
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let fields = &response.json::<Value>()["fields"];
    assert!(fields["title"].is_array());
    assert!(fields["time_minutes"].is_array());
    assert!(fields["price"].is_array());
    let list = app.get(&token, "/recipes").await.json::<Value>();
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn invalid_nested_tag_creates_nothing() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let mut body = sample_recipe("Prawn Curry");
    body["tags"] = json!([{ "name": "Seafood" }, { "name": "" }]);

    let response = app.post(&token, "/recipes", body).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["fields"]["tags"].is_array());
    let recipes = app.get(&token, "/recipes").await.json::<Value>();
    assert_eq!(recipes, json!([]));
    let tags = app.get(&token, "/tags").await.json::<Value>();
    assert!(!names(&tags).contains(&"Seafood"));
}

#[tokio::test]
async fn oversized_tag_filter_is_a_bad_request() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let ids: Vec<String> = (1..=101).map(|id: i64| id.to_string()).collect();

    let response = app
        .get(&token, &format!("/recipes?tags={}", ids.join(",")))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["fields"]["tags"].is_array());
}

#[tokio::test]
async fn create_recipe_requires_title_time_and_price() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;

    let response = app.post(&token, "/recipes", json!({})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let fields = &response.json::<Value>()["fields"];
    assert!(fields["title"].is_array());
    assert!(fields["time_minutes"].is_array());
    assert!(fields["price"].is_array());
}

#[tokio::test]
async fn partial_update_keeps_other_fields() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let created = app.create_recipe(&token, sample_recipe("Old title")).await;
    let path = format!("/recipes/{}", created["id"]);

    let response = app
        .patch(&token, &path, json!({ "title": "New recipe title" }))
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["title"], "New recipe title");
    assert_eq!(body["link"], "http://example.com/recipe.pdf");
    assert_eq!(body["price"], "3.45");
}

#[tokio::test]
async fn update_cannot_change_owner() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let other = app.login("other@example.com").await;
    let created = app.create_recipe(&token, sample_recipe("Mine")).await;
    let path = format!("/recipes/{}", created["id"]);

    app.patch(&token, &path, json!({ "user": 2, "id": 999 }))
        .await
        .assert_status_ok();

    app.get(&token, &path).await.assert_status_ok();
    app.get(&other, &path)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn full_update_replaces_fields() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let created = app.create_recipe(&token, sample_recipe("Old title")).await;
    let path = format!("/recipes/{}", created["id"]);

    let response = app
        .put(
            &token,
            &path,
            json!({
                "title": "New title",
                "link": "https://example.com/new-recipe.pdf",
                "description": "New recipe description",
                "time_minutes": 10,
                "price": "2.50",
            }),
        )
        .await;

    response.assert_status_ok();
    let body = response.json::<Value>();
    assert_eq!(body["title"], "New title");
    assert_eq!(body["link"], "https://example.com/new-recipe.pdf");
    assert_eq!(body["description"], "New recipe description");
    assert_eq!(body["price"], "2.50");
}

#[tokio::test]
async fn full_update_requires_mandatory_fields() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let created = app.create_recipe(&token, sample_recipe("Kept")).await;
    let path = format!("/recipes/{}", created["id"]);

    let response = app.put(&token, &path, json!({ "title": "Only title" })).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body = app.get(&token, &path).await.json::<Value>();
    assert_eq!(body["title"], "Kept");
}

#[tokio::test]
async fn update_replaces_tags_only_when_given() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let mut body = sample_recipe("Tagged");
    body["tags"] = json!([{ "name": "Breakfast" }]);
    let created = app.create_recipe(&token, body).await;
    let path = format!("/recipes/{}", created["id"]);

    let untouched = app
        .patch(&token, &path, json!({ "title": "Still tagged" }))
        .await
        .json::<Value>();
    assert_eq!(names(&untouched["tags"]), ["Breakfast"]);

    let replaced = app
        .patch(&token, &path, json!({ "tags": [{ "name": "Lunch" }] }))
        .await
        .json::<Value>();
    assert_eq!(names(&replaced["tags"]), ["Lunch"]);

    let cleared = app
        .patch(&token, &path, json!({ "tags": [] }))
        .await
        .json::<Value>();
    assert_eq!(cleared["tags"], json!([]));

    let tags = app.get(&token, "/tags").await.json::<Value>();
    assert_eq!(names(&tags), ["Lunch", "Breakfast"]);
}

#[tokio::test]
async fn other_users_recipe_is_not_found() {
    let app = spawn_app().await;
    let owner = app.login("owner@example.com").await;
    let intruder = app.login("intruder@example.com").await;
    let created = app.create_recipe(&owner, sample_recipe("Private")).await;
    let path = format!("/recipes/{}", created["id"]);

    app.get(&intruder, &path)
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.patch(&intruder, &path, json!({ "title": "Hijacked" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.put(&intruder, &path, json!({}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.delete(&intruder, &path)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let body = app.get(&owner, &path).await.json::<Value>();
    assert_eq!(body["title"], "Private");
}

#[tokio::test]
async fn delete_recipe() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let created = app.create_recipe(&token, sample_recipe("Doomed")).await;
    let path = format!("/recipes/{}", created["id"]);

    app.delete(&token, &path)
        .await
        .assert_status(StatusCode::NO_CONTENT);

    app.get(&token, &path)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_not_found() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;

    app.get(&token, "/recipes/abc")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_method_is_rejected() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;

    app.delete(&token, "/recipes")
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn filter_recipes_by_tags() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let mut vegan = sample_recipe("Thai Vegetable Curry");
    vegan["tags"] = json!([{ "name": "Vegan" }]);
    let vegan = app.create_recipe(&token, vegan).await;
    let mut veggie = sample_recipe("Aubergine with Tahini");
    veggie["tags"] = json!([{ "name": "Vegetarian" }]);
    let veggie = app.create_recipe(&token, veggie).await;
    app.create_recipe(&token, sample_recipe("Fish and chips")).await;

    let path = format!(
        "/recipes?tags={},{}",
        vegan["tags"][0]["id"], veggie["tags"][0]["id"]
    );
    let body = app.get(&token, &path).await.json::<Value>();

    assert_eq!(
        titles(&body),
        ["Aubergine with Tahini", "Thai Vegetable Curry"]
    );
}

#[tokio::test]
async fn filter_recipes_by_ingredients() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;
    let mut beans = sample_recipe("Posh Beans on Toast");
    beans["ingredients"] = json!([{ "name": "Feta Cheese" }]);
    let beans = app.create_recipe(&token, beans).await;
    app.create_recipe(&token, sample_recipe("Red Lentil Dal")).await;

    let path = format!("/recipes?ingredients={}", beans["ingredients"][0]["id"]);
    let body = app.get(&token, &path).await.json::<Value>();

    assert_eq!(titles(&body), ["Posh Beans on Toast"]);
}

#[tokio::test]
async fn malformed_filter_is_a_bad_request() {
    let app = spawn_app().await;
    let token = app.login("user@example.com").await;

    let response = app.get(&token, "/recipes?tags=abc").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["fields"]["tags"].is_array());
}
