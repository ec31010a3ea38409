//! Customer CRUD integration tests.

mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn create_customer_returns_created_record() {
    let app = TestApp::spawn().await;

    let response = app
        .post(
            "/api/customers",
            &json!({
                "name": "Acme Traders",
                "email": "accounts@acme.example",
                "phone": "+91 98765 43210",
                "gstin": "29ABCDE1234F1Z5",
                "address": "12 MG Road, Bengaluru"
            }),
        )
        .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert!(!body["id"].as_str().unwrap().is_empty());
    assert_eq!(body["name"], "Acme Traders");
    assert_eq!(body["gstin"], "29ABCDE1234F1Z5");
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn create_customer_without_name_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app.post("/api/customers", &json!({ "name": "" })).await;

    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn get_customer_round_trips() {
    let app = TestApp::spawn().await;
    let id = app.seed_customer("Round Trip Ltd").await;

    let response = app.get(&format!("/api/customers/{}", id)).await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"].as_str().unwrap(), id.to_string());
    assert_eq!(body["name"], "Round Trip Ltd");
}

#[tokio::test]
async fn get_missing_customer_returns_not_found() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/api/customers/00000000-0000-0000-0000-000000000000")
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn list_customers_returns_all() {
    let app = TestApp::spawn().await;
    app.seed_customer("First").await;
    app.seed_customer("Second").await;

    let response = app.get("/api/customers").await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn update_customer_patches_fields() {
    let app = TestApp::spawn().await;
    let id = app.seed_customer("Before Rename").await;

    let response = app
        .put(
            &format!("/api/customers/{}", id),
            &json!({ "name": "After Rename", "phone": "12345" }),
        )
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "After Rename");
    assert_eq!(body["phone"], "12345");
    // Untouched fields survive the patch
    assert_eq!(body["email"], "billing@example.com");
}

#[tokio::test]
async fn delete_customer_removes_record() {
    let app = TestApp::spawn().await;
    let id = app.seed_customer("Short Lived").await;

    let response = app.delete(&format!("/api/customers/{}", id)).await;
    assert_eq!(response.status(), 204);

    let response = app.get(&format!("/api/customers/{}", id)).await;
    assert_eq!(response.status(), 404);

    let response = app.delete(&format!("/api/customers/{}", id)).await;
    assert_eq!(response.status(), 404);
}
