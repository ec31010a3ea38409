//! Database models for invoicely.

mod customer;
mod invoice;
mod item;
mod tax;
mod template;

pub use customer::{CreateCustomer, Customer, UpdateCustomer};
pub use invoice::{
    CreateInvoice, Invoice, InvoiceLineItem, InvoiceStats, InvoiceStatus, InvoiceWithLineItems,
    ListInvoicesFilter, NewLineItem, UpdateInvoice,
};
pub use item::{CreateItem, Item, ItemWithTaxes, UpdateItem};
pub use tax::{CreateTax, Tax, UpdateTax};
pub use template::{CreateTemplate, Template, UpdateTemplate, DEFAULT_PRIMARY_COLOR};

use rust_decimal::Decimal;
use sqlx::{sqlite::SqliteRow, Row};
use std::str::FromStr;

/// Fixed presentation currency; no multi-currency support.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Decode a TEXT money/percentage column into a `Decimal`.
pub(crate) fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
