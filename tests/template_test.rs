//! PDF template CRUD tests. Templates are cosmetic configuration; the only
//! invariant worth guarding is that at most one is marked default.

mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn create_template_applies_default_color() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/templates", &json!({ "name": "Classic" }))
        .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Classic");
    assert_eq!(body["primaryColor"], "#2563eb");
    assert_eq!(body["isDefault"], false);
}

#[tokio::test]
async fn create_template_with_custom_fields() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/api/templates",
            &json!({
                "name": "Branded",
                "logo": "data:image/png;base64,iVBORw0KGgo=",
                "primaryColor": "#10b981",
                "isDefault": true
            }),
        )
        .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["primaryColor"], "#10b981");
    assert_eq!(body["isDefault"], true);
    assert!(body["logo"].as_str().unwrap().starts_with("data:image/png"));
}

#[tokio::test]
async fn only_one_template_is_default() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/templates", &json!({ "name": "First", "isDefault": true }))
        .await;
    let first: Value = response.json().await.unwrap();
    assert_eq!(first["isDefault"], true);

    // Creating a second default demotes the first.
    let response = app
        .post("/api/templates", &json!({ "name": "Second", "isDefault": true }))
        .await;
    let second: Value = response.json().await.unwrap();
    assert_eq!(second["isDefault"], true);

    let body: Value = app.get("/api/templates").await.json().await.unwrap();
    let templates = body.as_array().unwrap();
    let defaults: Vec<&Value> = templates
        .iter()
        .filter(|t| t["isDefault"] == true)
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0]["name"], "Second");

    // Promoting via update demotes the current default too.
    let first_id = first["id"].as_str().unwrap();
    let response = app
        .put(
            &format!("/api/templates/{}", first_id),
            &json!({ "isDefault": true }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = app.get("/api/templates").await.json().await.unwrap();
    let defaults: Vec<&Value> = body
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["isDefault"] == true)
        .collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0]["name"], "First");
}

#[tokio::test]
async fn update_template_patches_fields() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/templates", &json!({ "name": "Draft" }))
        .await;
    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    let response = app
        .put(
            &format!("/api/templates/{}", id),
            &json!({ "primaryColor": "#dc2626" }),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Draft");
    assert_eq!(body["primaryColor"], "#dc2626");
}

#[tokio::test]
async fn delete_template_removes_record() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/templates", &json!({ "name": "Ephemeral" }))
        .await;
    let body: Value = response.json().await.unwrap();
    let id = body["id"].as_str().unwrap().to_string();

    let response = app.delete(&format!("/api/templates/{}", id)).await;
    assert_eq!(response.status(), 204);

    let response = app.get(&format!("/api/templates/{}", id)).await;
    assert_eq!(response.status(), 404);
}
