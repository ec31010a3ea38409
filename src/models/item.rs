//! Catalog item model.

use crate::models::{decimal_column, Tax};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use uuid::Uuid;

/// A billable catalog item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Item {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            unit_price: decimal_column(row, "unit_price")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// An item together with its resolved tax rates.
#[derive(Debug, Clone)]
pub struct ItemWithTaxes {
    pub item: Item,
    pub taxes: Vec<Tax>,
}

/// Input for creating an item. Tax links are inserted as a set.
#[derive(Debug, Clone)]
pub struct CreateItem {
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub tax_ids: Vec<Uuid>,
}

/// Input for updating an item. When `tax_ids` is present the existing
/// links are replaced wholesale.
#[derive(Debug, Clone, Default)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
    pub tax_ids: Option<Vec<Uuid>>,
}
