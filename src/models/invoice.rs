//! Invoice and line item models.

use crate::models::decimal_column;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row};
use uuid::Uuid;

/// Invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
        }
    }

    /// Parse a stored or caller-supplied status string. Anything outside the
    /// three literal values is invalid input.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvoiceStatus::Pending),
            "paid" => Some(InvoiceStatus::Paid),
            "overdue" => Some(InvoiceStatus::Overdue),
            _ => None,
        }
    }
}

/// An invoice with stored, engine-computed totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Invoice {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let status_raw: String = row.try_get("status")?;
        let status = InvoiceStatus::parse(&status_raw).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: format!("unknown invoice status '{}'", status_raw).into(),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            invoice_number: row.try_get("invoice_number")?,
            customer_id: row.try_get("customer_id")?,
            issue_date: row.try_get("issue_date")?,
            due_date: row.try_get("due_date")?,
            subtotal: decimal_column(row, "subtotal")?,
            total_tax: decimal_column(row, "total_tax")?,
            discount: decimal_column(row, "discount")?,
            total: decimal_column(row, "total")?,
            status,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// A stored line item: a frozen quantity/price snapshot. `item_id` is severed
/// when the catalog item is deleted; the snapshot values stay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub item_id: Option<Uuid>,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total: Decimal,
    pub sort_order: i64,
}

impl<'r> FromRow<'r, SqliteRow> for InvoiceLineItem {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            invoice_id: row.try_get("invoice_id")?,
            item_id: row.try_get("item_id")?,
            quantity: row.try_get("quantity")?,
            unit_price: decimal_column(row, "unit_price")?,
            total: decimal_column(row, "total")?,
            sort_order: row.try_get("sort_order")?,
        })
    }
}

/// An invoice together with its line items in insertion order.
#[derive(Debug, Clone)]
pub struct InvoiceWithLineItems {
    pub invoice: Invoice,
    pub line_items: Vec<InvoiceLineItem>,
}

/// A line item snapshot ready for insertion (engine-verified).
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub item_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total: Decimal,
}

/// Input for creating an invoice. Totals are the engine's output, never
/// caller-supplied values.
#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub status: InvoiceStatus,
    pub line_items: Vec<NewLineItem>,
}

/// Input for updating an invoice. Totals are always rewritten from the
/// engine's recomputation; when `line_items` is present the stored set is
/// replaced wholesale in the same transaction.
#[derive(Debug, Clone)]
pub struct UpdateInvoice {
    pub invoice_number: Option<String>,
    pub customer_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub line_items: Option<Vec<NewLineItem>>,
}

/// Filter parameters for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct ListInvoicesFilter {
    pub status: Option<InvoiceStatus>,
    pub customer_id: Option<Uuid>,
}

/// Dashboard counts, recomputed on each request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct InvoiceStats {
    pub total: i64,
    pub paid: i64,
    pub pending: i64,
    pub overdue: i64,
}
