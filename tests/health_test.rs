mod common;

use common::TestApp;
use serde_json::Value;

#[tokio::test]
async fn health_check_reports_database_status() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "invoicely");
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text() {
    let app = TestApp::spawn().await;
    // Generate some database activity so the query histogram has samples.
    app.seed_customer("Metrics Co").await;

    let response = app.get("/metrics").await;

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("invoicely_db_query_duration_seconds"));
}
