//! Customer CRUD handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{CreateCustomerRequest, CustomerResponse, UpdateCustomerRequest},
    error::AppError,
    models::{CreateCustomer, UpdateCustomer},
    AppState,
};

pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    payload.validate()?;

    let input = CreateCustomer {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        gstin: payload.gstin,
        address: payload.address,
    };
    let customer = state.db.create_customer(&input).await?;

    Ok((StatusCode::CREATED, Json(customer.into())))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<Json<CustomerResponse>, AppError> {
    let customer = state
        .db
        .get_customer(customer_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    Ok(Json(customer.into()))
}

pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let customers = state.db.list_customers().await?;
    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerRequest>,
) -> Result<Json<CustomerResponse>, AppError> {
    payload.validate()?;

    let input = UpdateCustomer {
        name: payload.name,
        email: payload.email,
        phone: payload.phone,
        gstin: payload.gstin,
        address: payload.address,
    };
    let customer = state
        .db
        .update_customer(customer_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Customer not found")))?;

    Ok(Json(customer.into()))
}

pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_customer(customer_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Customer not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
