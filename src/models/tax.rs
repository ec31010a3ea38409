//! Tax rate model.

use crate::models::decimal_column;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use uuid::Uuid;

/// A named flat percentage rate applicable to catalog items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tax {
    pub id: Uuid,
    pub name: String,
    pub percentage: Decimal,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Tax {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            percentage: decimal_column(row, "percentage")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Input for creating a tax rate.
#[derive(Debug, Clone)]
pub struct CreateTax {
    pub name: String,
    pub percentage: Decimal,
}

/// Input for updating a tax rate.
#[derive(Debug, Clone, Default)]
pub struct UpdateTax {
    pub name: Option<String>,
    pub percentage: Option<Decimal>,
}
