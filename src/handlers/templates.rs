//! PDF template CRUD handlers. Cosmetic configuration only; at most one
//! template holds the default flag.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{CreateTemplateRequest, TemplateResponse, UpdateTemplateRequest},
    error::AppError,
    models::{CreateTemplate, UpdateTemplate},
    AppState,
};

pub async fn create_template(
    State(state): State<AppState>,
    Json(payload): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>), AppError> {
    payload.validate()?;

    let input = CreateTemplate {
        name: payload.name,
        logo: payload.logo,
        primary_color: payload.primary_color,
        is_default: payload.is_default,
    };
    let template = state.db.create_template(&input).await?;

    Ok((StatusCode::CREATED, Json(template.into())))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> Result<Json<TemplateResponse>, AppError> {
    let template = state
        .db
        .get_template(template_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Template not found")))?;

    Ok(Json(template.into()))
}

pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateResponse>>, AppError> {
    let templates = state.db.list_templates().await?;
    Ok(Json(templates.into_iter().map(Into::into).collect()))
}

pub async fn update_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
    Json(payload): Json<UpdateTemplateRequest>,
) -> Result<Json<TemplateResponse>, AppError> {
    payload.validate()?;

    let input = UpdateTemplate {
        name: payload.name,
        logo: payload.logo,
        primary_color: payload.primary_color,
        is_default: payload.is_default,
    };
    let template = state
        .db
        .update_template(template_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Template not found")))?;

    Ok(Json(template.into()))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_template(template_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Template not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
