//! Catalog item CRUD handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{CreateItemRequest, ItemResponse, UpdateItemRequest},
    error::AppError,
    models::{CreateItem, UpdateItem},
    AppState,
};

fn validate_unit_price(unit_price: Decimal) -> Result<(), AppError> {
    if unit_price < Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "unitPrice must be non-negative, got {}",
            unit_price
        )));
    }
    Ok(())
}

pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), AppError> {
    payload.validate()?;
    validate_unit_price(payload.unit_price)?;

    let input = CreateItem {
        name: payload.name,
        description: payload.description,
        unit_price: payload.unit_price,
        tax_ids: payload.tax_ids,
    };
    let item = state.db.create_item(&input).await?;

    Ok((StatusCode::CREATED, Json(item.into())))
}

pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = state
        .db
        .get_item(item_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item not found")))?;

    Ok(Json(item.into()))
}

pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let items = state.db.list_items().await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// Update an item. A supplied `taxIds` set replaces the existing links
/// wholesale; stored invoice line items are snapshots and stay untouched.
pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    payload.validate()?;
    if let Some(unit_price) = payload.unit_price {
        validate_unit_price(unit_price)?;
    }

    let input = UpdateItem {
        name: payload.name,
        description: payload.description,
        unit_price: payload.unit_price,
        tax_ids: payload.tax_ids,
    };
    let item = state
        .db
        .update_item(item_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Item not found")))?;

    Ok(Json(item.into()))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_item(item_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Item not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
