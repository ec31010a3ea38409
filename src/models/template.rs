//! PDF template model. Cosmetic configuration only; rendering is a
//! placeholder endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_PRIMARY_COLOR: &str = "#2563eb";

/// A cosmetic invoice template (logo, accent color).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Template {
    pub id: Uuid,
    pub name: String,
    pub logo: Option<String>,
    pub primary_color: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a template.
#[derive(Debug, Clone)]
pub struct CreateTemplate {
    pub name: String,
    pub logo: Option<String>,
    pub primary_color: Option<String>,
    pub is_default: bool,
}

/// Input for updating a template.
#[derive(Debug, Clone, Default)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub logo: Option<String>,
    pub primary_color: Option<String>,
    pub is_default: Option<bool>,
}
