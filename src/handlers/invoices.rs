//! Invoice handlers: CRUD, dashboard stats, totals preview, PDF placeholder.
//!
//! Both the preview endpoint and the create/update paths run the same totals
//! engine over the same catalog snapshot, so the previewed and stored values
//! are always identical for identical inputs.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        CreateInvoiceRequest, InvoiceResponse, InvoiceSummaryResponse, LineItemInput,
        ListInvoicesQuery, PreviewTotalsRequest, TotalsResponse, UpdateInvoiceRequest,
    },
    error::AppError,
    models::{CreateInvoice, InvoiceStats, InvoiceStatus, ListInvoicesFilter, NewLineItem, UpdateInvoice},
    services::metrics::INVOICES_TOTAL,
    services::totals::{self, InvoiceTotals, LineEntry},
    AppState,
};

fn to_line_entries(inputs: &[LineItemInput]) -> Vec<LineEntry> {
    inputs
        .iter()
        .map(|li| LineEntry {
            item_id: li.item_id,
            quantity: li.quantity,
            unit_price: li.unit_price,
        })
        .collect()
}

/// Freeze line snapshots from validated entries. Caller-supplied totals are
/// discarded in favor of the engine's arithmetic.
fn snapshot_lines(entries: &[LineEntry]) -> Vec<NewLineItem> {
    entries
        .iter()
        .map(|e| NewLineItem {
            item_id: e.item_id,
            quantity: e.quantity,
            unit_price: e.unit_price,
            total: totals::line_total(e.quantity, e.unit_price),
        })
        .collect()
}

/// Resolve the catalog snapshot and run the totals engine.
async fn compute_for(
    state: &AppState,
    inputs: &[LineItemInput],
    discount: Option<Decimal>,
) -> Result<(Vec<LineEntry>, InvoiceTotals), AppError> {
    let entries = to_line_entries(inputs);
    let item_ids: Vec<Uuid> = entries.iter().map(|e| e.item_id).collect();
    let catalog = state.db.tax_catalog(&item_ids).await?;
    let totals = totals::compute_totals(&entries, &catalog, discount)?;
    Ok((entries, totals))
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(payload): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), AppError> {
    payload.validate()?;

    let (entries, totals) = compute_for(&state, &payload.line_items, payload.discount).await?;
    let discount = payload
        .discount
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);
    let status = payload.status.unwrap_or(InvoiceStatus::Pending);

    let input = CreateInvoice {
        invoice_number: payload.invoice_number,
        customer_id: payload.customer_id,
        issue_date: payload.issue_date,
        due_date: payload.due_date,
        subtotal: totals.subtotal,
        total_tax: totals.total_tax,
        discount,
        total: totals.total,
        status,
        line_items: snapshot_lines(&entries),
    };
    let invoice = state.db.create_invoice(&input).await?;

    INVOICES_TOTAL.with_label_values(&[status.as_str()]).inc();

    Ok((StatusCode::CREATED, Json(invoice.into())))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let invoice = state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    Ok(Json(invoice.into()))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<Json<Vec<InvoiceSummaryResponse>>, AppError> {
    let status = match &query.status {
        Some(raw) => Some(InvoiceStatus::parse(raw).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("invalid status '{}'", raw))
        })?),
        None => None,
    };

    let filter = ListInvoicesFilter {
        status,
        customer_id: query.customer_id,
    };
    let invoices = state.db.list_invoices(&filter).await?;

    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}

/// Update an invoice. Field patches are partial, but totals are always
/// recomputed: from the new line item set when one is supplied, otherwise
/// from the stored snapshots with the (possibly changed) discount re-applied.
pub async fn update_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<UpdateInvoiceRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    payload.validate()?;

    let existing = state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    let discount = payload
        .discount
        .unwrap_or(existing.invoice.discount)
        .max(Decimal::ZERO);

    let (subtotal, total_tax, total, line_items) = match &payload.line_items {
        Some(inputs) => {
            let (entries, totals) = compute_for(&state, inputs, Some(discount)).await?;
            (
                totals.subtotal,
                totals.total_tax,
                totals.total,
                Some(snapshot_lines(&entries)),
            )
        }
        None => {
            let subtotal = existing.invoice.subtotal;
            let total_tax = existing.invoice.total_tax;
            let total = (subtotal + total_tax - discount).max(Decimal::ZERO);
            (subtotal, total_tax, total, None)
        }
    };

    let input = UpdateInvoice {
        invoice_number: payload.invoice_number,
        customer_id: payload.customer_id,
        issue_date: payload.issue_date,
        due_date: payload.due_date,
        status: payload.status,
        subtotal,
        total_tax,
        discount,
        total,
        line_items,
    };
    let invoice = state
        .db
        .update_invoice(invoice_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    Ok(Json(invoice.into()))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_invoice(invoice_id).await?;
    if !deleted {
        return Err(AppError::NotFound(anyhow::anyhow!("Invoice not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Dashboard counts by status.
pub async fn invoice_stats(
    State(state): State<AppState>,
) -> Result<Json<InvoiceStats>, AppError> {
    let stats = state.db.invoice_stats().await?;
    Ok(Json(stats))
}

/// Live preview for the invoice form; same engine as the persistence path.
pub async fn preview_totals(
    State(state): State<AppState>,
    Json(payload): Json<PreviewTotalsRequest>,
) -> Result<Json<TotalsResponse>, AppError> {
    let (_, totals) = compute_for(&state, &payload.line_items, payload.discount).await?;
    Ok(Json(totals.into()))
}

/// PDF rendering placeholder; templates are cosmetic configuration only.
pub async fn render_pdf(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .db
        .get_invoice(invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

    Err(AppError::NotImplemented(
        "PDF rendering is not implemented".to_string(),
    ))
}
