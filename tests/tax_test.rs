//! Tax rate CRUD integration tests.

mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn create_tax_returns_created_record() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/taxes", &json!({ "name": "GST 18%", "percentage": "18" }))
        .await;

    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "GST 18%");
    assert_eq!(body["percentage"], "18");
}

#[tokio::test]
async fn percentage_accepts_numbers_and_strings() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/taxes", &json!({ "name": "CGST", "percentage": 9 }))
        .await;
    assert_eq!(response.status(), 201);

    let response = app
        .post("/api/taxes", &json!({ "name": "SGST", "percentage": "9.00" }))
        .await;
    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn percentage_outside_range_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post("/api/taxes", &json!({ "name": "Too Big", "percentage": "101" }))
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .post("/api/taxes", &json!({ "name": "Negative", "percentage": "-1" }))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn update_tax_changes_percentage() {
    let app = TestApp::spawn().await;
    let id = app.seed_tax("VAT", "12.50").await;

    let response = app
        .put(&format!("/api/taxes/{}", id), &json!({ "percentage": "5" }))
        .await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "VAT");
    assert_eq!(body["percentage"], "5");
}

#[tokio::test]
async fn delete_tax_removes_record_and_links() {
    let app = TestApp::spawn().await;
    let tax_id = app.seed_tax("Ephemeral", "10").await;
    let item_id = app.seed_item("Linked Item", "50", &[tax_id]).await;

    let response = app.delete(&format!("/api/taxes/{}", tax_id)).await;
    assert_eq!(response.status(), 204);

    // The link row cascaded away; the item survives with no taxes.
    let response = app.get(&format!("/api/items/{}", item_id)).await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["taxes"].as_array().unwrap().len(), 0);
}
