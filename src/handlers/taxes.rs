//! Tax rate CRUD handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{CreateTaxRequest, TaxResponse, UpdateTaxRequest},
    error::AppError,
    models::{CreateTax, UpdateTax},
    AppState,
};

/// Percentages are flat rates between 0 and 100 with two-decimal intent.
fn validate_percentage(percentage: Decimal) -> Result<(), AppError> {
    if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "percentage must be between 0 and 100, got {}",
            percentage
        )));
    }
    Ok(())
}

pub async fn create_tax(
    State(state): State<AppState>,
    Json(payload): Json<CreateTaxRequest>,
) -> Result<(StatusCode, Json<TaxResponse>), AppError> {
    payload.validate()?;
    validate_percentage(payload.percentage)?;

    let input = CreateTax {
        name: payload.name,
        percentage: payload.percentage,
    };
    let tax = state.db.create_tax(&input).await?;

    Ok((StatusCode::CREATED, Json(tax.into())))
}

pub async fn get_tax(
    State(state): State<AppState>,
    Path(tax_id): Path<Uuid>,
) -> Result<Json<TaxResponse>, AppError> {
    let tax = state
        .db
        .get_tax(tax_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tax not found")))?;

    Ok(Json(tax.into()))
}

pub async fn list_taxes(State(state): State<AppState>) -> Result<Json<Vec<TaxResponse>>, AppError> {
    let taxes = state.db.list_taxes().await?;
    Ok(Json(taxes.into_iter().map(Into::into).collect()))
}

pub async fn update_tax(
    State(state): State<AppState>,
    Path(tax_id): Path<Uuid>,
    Json(payload): Json<UpdateTaxRequest>,
) -> Result<Json<TaxResponse>, AppError> {
    payload.validate()?;
    if let Some(percentage) = payload.percentage {
        validate_percentage(percentage)?;
    }

    let input = UpdateTax {
        name: payload.name,
        percentage: payload.percentage,
    };
    let tax = state
        .db
        .update_tax(tax_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tax not found")))?;

    Ok(Json(tax.into()))
}

pub async fn delete_tax(
    State(state): State<AppState>,
    Path(tax_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_tax(tax_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Tax not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
