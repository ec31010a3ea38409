//! Shared test harness: boots the full application against an in-memory
//! SQLite database on an ephemeral port and drives it over HTTP.

#![allow(dead_code)]

use invoicely::config::{Config, DatabaseConfig, ServerConfig};
use invoicely::Application;
use serde_json::{json, Value};
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                // One connection: an in-memory database lives and dies with it.
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            service_name: "invoicely".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build application");
        let port = app.port();
        tokio::spawn(app.run_until_stopped());

        Self {
            address: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute POST")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute GET")
    }

    pub async fn put(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute PUT")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to execute DELETE")
    }

    /// Create a customer and return its id.
    pub async fn seed_customer(&self, name: &str) -> Uuid {
        let response = self
            .post(
                "/api/customers",
                &json!({ "name": name, "email": "billing@example.com" }),
            )
            .await;
        assert_eq!(response.status(), 201, "seed_customer failed");
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Create a tax rate and return its id.
    pub async fn seed_tax(&self, name: &str, percentage: &str) -> Uuid {
        let response = self
            .post("/api/taxes", &json!({ "name": name, "percentage": percentage }))
            .await;
        assert_eq!(response.status(), 201, "seed_tax failed");
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Create a catalog item and return its id.
    pub async fn seed_item(&self, name: &str, unit_price: &str, tax_ids: &[Uuid]) -> Uuid {
        let response = self
            .post(
                "/api/items",
                &json!({ "name": name, "unitPrice": unit_price, "taxIds": tax_ids }),
            )
            .await;
        assert_eq!(response.status(), 201, "seed_item failed");
        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().parse().unwrap()
    }
}
