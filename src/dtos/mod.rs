//! Request/response shapes for the HTTP API.
//!
//! The wire format is camelCase JSON (`itemId`, `unitPrice`, ...). Decimal
//! fields serialize as strings and are accepted back as either strings or
//! numbers.

use crate::models::{
    Customer, Invoice, InvoiceLineItem, InvoiceStatus, InvoiceWithLineItems, ItemWithTaxes, Tax,
    Template, CURRENCY_SYMBOL,
};
use crate::services::totals::InvoiceTotals;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// -----------------------------------------------------------------------------
// Customers
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gstin: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gstin: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub gstin: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            name: c.name,
            email: c.email,
            phone: c.phone,
            gstin: c.gstin,
            address: c.address,
            created_at: c.created_at,
        }
    }
}

// -----------------------------------------------------------------------------
// Taxes
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaxRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub percentage: Decimal,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaxRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub percentage: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxResponse {
    pub id: Uuid,
    pub name: String,
    pub percentage: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<Tax> for TaxResponse {
    fn from(t: Tax) -> Self {
        Self {
            id: t.id,
            name: t.name,
            percentage: t.percentage,
            created_at: t.created_at,
        }
    }
}

// -----------------------------------------------------------------------------
// Items
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    #[serde(default)]
    pub tax_ids: Vec<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit_price: Option<Decimal>,
    pub tax_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub taxes: Vec<TaxResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<ItemWithTaxes> for ItemResponse {
    fn from(i: ItemWithTaxes) -> Self {
        Self {
            id: i.item.id,
            name: i.item.name,
            description: i.item.description,
            unit_price: i.item.unit_price,
            taxes: i.taxes.into_iter().map(TaxResponse::from).collect(),
            created_at: i.item.created_at,
        }
    }
}

// -----------------------------------------------------------------------------
// Invoices
// -----------------------------------------------------------------------------

/// Line item input: `{ itemId, quantity, unitPrice, total? }`. A supplied
/// `total` is accepted for compatibility but always recomputed server-side.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub item_id: Uuid,
    pub quantity: i64,
    pub unit_price: Decimal,
    #[serde(default)]
    pub total: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, message = "invoiceNumber is required"))]
    pub invoice_number: String,
    pub customer_id: Uuid,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub discount: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub line_items: Vec<LineItemInput>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvoiceRequest {
    #[validate(length(min = 1, message = "invoiceNumber must not be empty"))]
    pub invoice_number: Option<String>,
    pub customer_id: Option<Uuid>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub discount: Option<Decimal>,
    pub status: Option<InvoiceStatus>,
    pub line_items: Option<Vec<LineItemInput>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInvoicesQuery {
    pub status: Option<String>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemResponse {
    pub id: Uuid,
    pub item_id: Option<Uuid>,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total: Decimal,
}

impl From<InvoiceLineItem> for LineItemResponse {
    fn from(li: InvoiceLineItem) -> Self {
        Self {
            id: li.id,
            item_id: li.item_id,
            quantity: li.quantity,
            unit_price: li.unit_price,
            total: li.total,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummaryResponse {
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
    pub currency: &'static str,
    pub created_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceSummaryResponse {
    fn from(inv: Invoice) -> Self {
        Self {
            id: inv.id,
            invoice_number: inv.invoice_number,
            customer_id: inv.customer_id,
            issue_date: inv.issue_date,
            due_date: inv.due_date,
            subtotal: inv.subtotal,
            total_tax: inv.total_tax,
            discount: inv.discount,
            total: inv.total,
            status: inv.status,
            currency: CURRENCY_SYMBOL,
            created_at: inv.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    #[serde(flatten)]
    pub invoice: InvoiceSummaryResponse,
    pub line_items: Vec<LineItemResponse>,
}

impl From<InvoiceWithLineItems> for InvoiceResponse {
    fn from(iwl: InvoiceWithLineItems) -> Self {
        Self {
            invoice: iwl.invoice.into(),
            line_items: iwl.line_items.into_iter().map(LineItemResponse::from).collect(),
        }
    }
}

// -----------------------------------------------------------------------------
// Totals preview
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewTotalsRequest {
    #[serde(default)]
    pub line_items: Vec<LineItemInput>,
    pub discount: Option<Decimal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsResponse {
    pub subtotal: Decimal,
    pub total_tax: Decimal,
    pub total: Decimal,
}

impl From<InvoiceTotals> for TotalsResponse {
    fn from(t: InvoiceTotals) -> Self {
        Self {
            subtotal: t.subtotal,
            total_tax: t.total_tax,
            total: t.total,
        }
    }
}

// -----------------------------------------------------------------------------
// Templates
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub logo: Option<String>,
    pub primary_color: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTemplateRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    pub logo: Option<String>,
    pub primary_color: Option<String>,
    pub is_default: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResponse {
    pub id: Uuid,
    pub name: String,
    pub logo: Option<String>,
    pub primary_color: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Template> for TemplateResponse {
    fn from(t: Template) -> Self {
        Self {
            id: t.id,
            name: t.name,
            logo: t.logo,
            primary_color: t.primary_color,
            is_default: t.is_default,
            created_at: t.created_at,
        }
    }
}
