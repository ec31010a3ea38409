pub mod customers;
pub mod invoices;
pub mod items;
pub mod taxes;
pub mod templates;

use crate::error::AppError;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Health check endpoint; verifies the database answers.
pub async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.db.health_check().await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "invoicely",
            "version": env!("CARGO_PKG_VERSION")
        })),
    ))
}

/// Prometheus metrics endpoint.
pub async fn metrics() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        crate::services::get_metrics(),
    )
}
