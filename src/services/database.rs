//! Database service for invoicely.
//!
//! One `Database` instance is built at startup and handed to request
//! handlers through `AppState`. Wholesale replacement of child rows (item
//! tax links, invoice line items) always runs inside a single transaction so
//! a mid-sequence failure can never leave a parent with a partial child set.

use crate::error::AppError;
use crate::models::{
    CreateCustomer, CreateInvoice, CreateItem, CreateTax, CreateTemplate, Customer, Invoice,
    InvoiceLineItem, InvoiceStats, InvoiceWithLineItems, Item, ItemWithTaxes, ListInvoicesFilter,
    Tax, Template, UpdateCustomer, UpdateInvoice, UpdateItem, UpdateTax, UpdateTemplate,
    DEFAULT_PRIMARY_COLOR,
};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::totals::TaxCatalog;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "invoicely"))]
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        info!(max_connections = max_connections, "Connecting to SQLite");

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("SQLite connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Close the pool. Called once on shutdown.
    #[instrument(skip(self))]
    pub async fn close(&self) {
        self.pool.close().await;
        info!("SQLite connection pool closed");
    }

    // -------------------------------------------------------------------------
    // Customer Operations
    // -------------------------------------------------------------------------

    /// Create a new customer.
    #[instrument(skip(self, input))]
    pub async fn create_customer(&self, input: &CreateCustomer) -> Result<Customer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (id, name, email, phone, gstin, address, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, name, email, phone, gstin, address, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.gstin)
        .bind(&input.address)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create customer: {}", e)))?;

        timer.observe_duration();

        info!(customer_id = %customer.id, name = %customer.name, "Customer created");

        Ok(customer)
    }

    /// Get a customer by ID.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn get_customer(&self, customer_id: Uuid) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, gstin, address, created_at
            FROM customers
            WHERE id = ?
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))?;

        timer.observe_duration();

        Ok(customer)
    }

    /// List all customers, most recent first.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, phone, gstin, address, created_at
            FROM customers
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list customers: {}", e)))?;

        timer.observe_duration();

        Ok(customers)
    }

    /// Update a customer.
    #[instrument(skip(self, input), fields(customer_id = %customer_id))]
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: &UpdateCustomer,
    ) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = COALESCE(?, name),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                gstin = COALESCE(?, gstin),
                address = COALESCE(?, address)
            WHERE id = ?
            RETURNING id, name, email, phone, gstin, address, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.gstin)
        .bind(&input.address)
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update customer: {}", e)))?;

        timer.observe_duration();

        Ok(customer)
    }

    /// Delete a customer. Owned invoices (and their line items) cascade.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn delete_customer(&self, customer_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_customer"])
            .start_timer();

        let result = sqlx::query("DELETE FROM customers WHERE id = ?")
            .bind(customer_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete customer: {}", e))
            })?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(customer_id = %customer_id, "Customer deleted");
        }

        Ok(deleted)
    }

    // -------------------------------------------------------------------------
    // Tax Operations
    // -------------------------------------------------------------------------

    /// Create a new tax rate.
    #[instrument(skip(self, input))]
    pub async fn create_tax(&self, input: &CreateTax) -> Result<Tax, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_tax"])
            .start_timer();

        let tax = sqlx::query_as::<_, Tax>(
            r#"
            INSERT INTO taxes (id, name, percentage, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, percentage, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.percentage.to_string())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create tax: {}", e)))?;

        timer.observe_duration();

        info!(tax_id = %tax.id, name = %tax.name, percentage = %tax.percentage, "Tax created");

        Ok(tax)
    }

    /// Get a tax by ID.
    #[instrument(skip(self), fields(tax_id = %tax_id))]
    pub async fn get_tax(&self, tax_id: Uuid) -> Result<Option<Tax>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_tax"])
            .start_timer();

        let tax = sqlx::query_as::<_, Tax>(
            r#"
            SELECT id, name, percentage, created_at
            FROM taxes
            WHERE id = ?
            "#,
        )
        .bind(tax_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get tax: {}", e)))?;

        timer.observe_duration();

        Ok(tax)
    }

    /// List all taxes.
    #[instrument(skip(self))]
    pub async fn list_taxes(&self) -> Result<Vec<Tax>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_taxes"])
            .start_timer();

        let taxes = sqlx::query_as::<_, Tax>(
            r#"
            SELECT id, name, percentage, created_at
            FROM taxes
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list taxes: {}", e)))?;

        timer.observe_duration();

        Ok(taxes)
    }

    /// Update a tax rate. Stored invoice totals are snapshots and are not
    /// recomputed.
    #[instrument(skip(self, input), fields(tax_id = %tax_id))]
    pub async fn update_tax(
        &self,
        tax_id: Uuid,
        input: &UpdateTax,
    ) -> Result<Option<Tax>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_tax"])
            .start_timer();

        let tax = sqlx::query_as::<_, Tax>(
            r#"
            UPDATE taxes
            SET name = COALESCE(?, name),
                percentage = COALESCE(?, percentage)
            WHERE id = ?
            RETURNING id, name, percentage, created_at
            "#,
        )
        .bind(&input.name)
        .bind(input.percentage.map(|p| p.to_string()))
        .bind(tax_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update tax: {}", e)))?;

        timer.observe_duration();

        Ok(tax)
    }

    /// Delete a tax. Item links cascade.
    #[instrument(skip(self), fields(tax_id = %tax_id))]
    pub async fn delete_tax(&self, tax_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_tax"])
            .start_timer();

        let result = sqlx::query("DELETE FROM taxes WHERE id = ?")
            .bind(tax_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete tax: {}", e)))?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Item Operations
    // -------------------------------------------------------------------------

    /// Create a new item with its tax links in one transaction.
    #[instrument(skip(self, input))]
    pub async fn create_item(&self, input: &CreateItem) -> Result<ItemWithTaxes, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_item"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (id, name, description, unit_price, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, name, description, unit_price, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.unit_price.to_string())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create item: {}", e)))?;

        let taxes = Self::insert_tax_links(&mut tx, item.id, &input.tax_ids).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(item_id = %item.id, name = %item.name, tax_count = taxes.len(), "Item created");

        Ok(ItemWithTaxes { item, taxes })
    }

    /// Get an item with its resolved taxes.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<Option<ItemWithTaxes>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_item"])
            .start_timer();

        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, description, unit_price, created_at
            FROM items
            WHERE id = ?
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get item: {}", e)))?;

        let result = match item {
            Some(item) => {
                let taxes = self.taxes_for_item(item.id).await?;
                Some(ItemWithTaxes { item, taxes })
            }
            None => None,
        };

        timer.observe_duration();

        Ok(result)
    }

    /// List all items with their taxes.
    #[instrument(skip(self))]
    pub async fn list_items(&self) -> Result<Vec<ItemWithTaxes>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_items"])
            .start_timer();

        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT id, name, description, unit_price, created_at
            FROM items
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list items: {}", e)))?;

        let mut result = Vec::with_capacity(items.len());
        for item in items {
            let taxes = self.taxes_for_item(item.id).await?;
            result.push(ItemWithTaxes { item, taxes });
        }

        timer.observe_duration();

        Ok(result)
    }

    /// Update an item. When `tax_ids` is present the existing links are
    /// deleted and the new set inserted, all inside one transaction.
    #[instrument(skip(self, input), fields(item_id = %item_id))]
    pub async fn update_item(
        &self,
        item_id: Uuid,
        input: &UpdateItem,
    ) -> Result<Option<ItemWithTaxes>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_item"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET name = COALESCE(?, name),
                description = COALESCE(?, description),
                unit_price = COALESCE(?, unit_price)
            WHERE id = ?
            RETURNING id, name, description, unit_price, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.unit_price.map(|p| p.to_string()))
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update item: {}", e)))?;

        let Some(item) = item else {
            return Ok(None);
        };

        let taxes = match &input.tax_ids {
            Some(tax_ids) => {
                sqlx::query("DELETE FROM item_taxes WHERE item_id = ?")
                    .bind(item_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!(
                            "Failed to clear item tax links: {}",
                            e
                        ))
                    })?;
                Self::insert_tax_links(&mut tx, item_id, tax_ids).await?
            }
            None => Vec::new(),
        };

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        let taxes = if input.tax_ids.is_some() {
            taxes
        } else {
            self.taxes_for_item(item_id).await?
        };

        timer.observe_duration();

        info!(item_id = %item_id, "Item updated");

        Ok(Some(ItemWithTaxes { item, taxes }))
    }

    /// Delete an item. Tax links cascade; historical invoice line items keep
    /// their snapshots with the item reference severed.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn delete_item(&self, item_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_item"])
            .start_timer();

        let result = sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(item_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to delete item: {}", e)))?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(item_id = %item_id, "Item deleted");
        }

        Ok(deleted)
    }

    /// Resolve the tax percentages for a set of items in one catalog
    /// snapshot. Items that do not exist are simply absent from the map; the
    /// totals engine reports them as invalid line items.
    #[instrument(skip(self, item_ids))]
    pub async fn tax_catalog(&self, item_ids: &[Uuid]) -> Result<TaxCatalog, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["tax_catalog"])
            .start_timer();

        let mut catalog = TaxCatalog::new();
        for item_id in item_ids {
            if catalog.contains_key(item_id) {
                continue;
            }
            let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM items WHERE id = ?")
                .bind(item_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to resolve item: {}", e))
                })?;
            if exists.is_none() {
                continue;
            }

            let percentages: Vec<String> = sqlx::query_scalar(
                r#"
                SELECT t.percentage
                FROM item_taxes it
                JOIN taxes t ON t.id = it.tax_id
                WHERE it.item_id = ?
                "#,
            )
            .bind(item_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to resolve item taxes: {}", e))
            })?;

            let mut parsed = Vec::with_capacity(percentages.len());
            for raw in percentages {
                let pct = Decimal::from_str(&raw).map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Corrupt tax percentage: {}", e))
                })?;
                parsed.push(pct);
            }
            catalog.insert(*item_id, parsed);
        }

        timer.observe_duration();

        Ok(catalog)
    }

    /// Fetch the taxes linked to an item.
    async fn taxes_for_item(&self, item_id: Uuid) -> Result<Vec<Tax>, AppError> {
        sqlx::query_as::<_, Tax>(
            r#"
            SELECT t.id, t.name, t.percentage, t.created_at
            FROM item_taxes it
            JOIN taxes t ON t.id = it.tax_id
            WHERE it.item_id = ?
            ORDER BY t.created_at
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get item taxes: {}", e)))
    }

    /// Verify and insert the tax link set for an item inside a transaction.
    async fn insert_tax_links(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        item_id: Uuid,
        tax_ids: &[Uuid],
    ) -> Result<Vec<Tax>, AppError> {
        let mut taxes = Vec::with_capacity(tax_ids.len());
        for tax_id in tax_ids {
            let tax = sqlx::query_as::<_, Tax>(
                "SELECT id, name, percentage, created_at FROM taxes WHERE id = ?",
            )
            .bind(tax_id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to verify tax: {}", e)))?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Tax {} not found", tax_id)))?;

            sqlx::query("INSERT INTO item_taxes (id, item_id, tax_id) VALUES (?, ?, ?)")
                .bind(Uuid::new_v4())
                .bind(item_id)
                .bind(tax_id)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to link tax: {}", e))
                })?;

            taxes.push(tax);
        }
        Ok(taxes)
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    /// Create an invoice with its line items in one transaction.
    #[instrument(skip(self, input), fields(invoice_number = %input.invoice_number))]
    pub async fn create_invoice(
        &self,
        input: &CreateInvoice,
    ) -> Result<InvoiceWithLineItems, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let customer: Option<Uuid> = sqlx::query_scalar("SELECT id FROM customers WHERE id = ?")
            .bind(input.customer_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to verify customer: {}", e))
            })?;
        if customer.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Customer {} not found",
                input.customer_id
            )));
        }

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                id, invoice_number, customer_id, issue_date, due_date,
                subtotal, total_tax, discount, total, status, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, invoice_number, customer_id, issue_date, due_date,
                subtotal, total_tax, discount, total, status, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.invoice_number)
        .bind(input.customer_id)
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(input.subtotal.to_string())
        .bind(input.total_tax.to_string())
        .bind(input.discount.to_string())
        .bind(input.total.to_string())
        .bind(input.status.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Invoice number '{}' already exists",
                    input.invoice_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)),
        })?;

        let line_items =
            Self::insert_line_items(&mut tx, invoice.id, &input.line_items).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            total = %invoice.total,
            "Invoice created"
        );

        Ok(InvoiceWithLineItems {
            invoice,
            line_items,
        })
    }

    /// Get an invoice with its line items.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn get_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Option<InvoiceWithLineItems>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, invoice_number, customer_id, issue_date, due_date,
                subtotal, total_tax, discount, total, status, created_at
            FROM invoices
            WHERE id = ?
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        let result = match invoice {
            Some(invoice) => {
                let line_items = self.line_items_for_invoice(invoice.id).await?;
                Some(InvoiceWithLineItems {
                    invoice,
                    line_items,
                })
            }
            None => None,
        };

        timer.observe_duration();

        Ok(result)
    }

    /// List invoices, optionally filtered by status and customer.
    #[instrument(skip(self, filter))]
    pub async fn list_invoices(
        &self,
        filter: &ListInvoicesFilter,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let status_str = filter.status.map(|s| s.as_str().to_string());

        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, invoice_number, customer_id, issue_date, due_date,
                subtotal, total_tax, discount, total, status, created_at
            FROM invoices
            WHERE (?1 IS NULL OR status = ?1)
              AND (?2 IS NULL OR customer_id = ?2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(&status_str)
        .bind(filter.customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Update an invoice. Totals are always rewritten; when a new line item
    /// set is given, the old set is deleted and the new one inserted in the
    /// same transaction.
    #[instrument(skip(self, input), fields(invoice_id = %invoice_id))]
    pub async fn update_invoice(
        &self,
        invoice_id: Uuid,
        input: &UpdateInvoice,
    ) -> Result<Option<InvoiceWithLineItems>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        if let Some(customer_id) = input.customer_id {
            let customer: Option<Uuid> =
                sqlx::query_scalar("SELECT id FROM customers WHERE id = ?")
                    .bind(customer_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!("Failed to verify customer: {}", e))
                    })?;
            if customer.is_none() {
                return Err(AppError::NotFound(anyhow::anyhow!(
                    "Customer {} not found",
                    customer_id
                )));
            }
        }

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET invoice_number = COALESCE(?, invoice_number),
                customer_id = COALESCE(?, customer_id),
                issue_date = COALESCE(?, issue_date),
                due_date = COALESCE(?, due_date),
                status = COALESCE(?, status),
                subtotal = ?,
                total_tax = ?,
                discount = ?,
                total = ?
            WHERE id = ?
            RETURNING id, invoice_number, customer_id, issue_date, due_date,
                subtotal, total_tax, discount, total, status, created_at
            "#,
        )
        .bind(&input.invoice_number)
        .bind(input.customer_id)
        .bind(input.issue_date)
        .bind(input.due_date)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.subtotal.to_string())
        .bind(input.total_tax.to_string())
        .bind(input.discount.to_string())
        .bind(input.total.to_string())
        .bind(invoice_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Invoice number already exists"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice: {}", e)),
        })?;

        let Some(invoice) = invoice else {
            return Ok(None);
        };

        let line_items = match &input.line_items {
            Some(new_items) => {
                sqlx::query("DELETE FROM invoice_line_items WHERE invoice_id = ?")
                    .bind(invoice_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| {
                        AppError::DatabaseError(anyhow::anyhow!(
                            "Failed to clear line items: {}",
                            e
                        ))
                    })?;
                Some(Self::insert_line_items(&mut tx, invoice_id, new_items).await?)
            }
            None => None,
        };

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        let line_items = match line_items {
            Some(items) => items,
            None => self.line_items_for_invoice(invoice_id).await?,
        };

        timer.observe_duration();

        info!(invoice_id = %invoice_id, total = %invoice.total, "Invoice updated");

        Ok(Some(InvoiceWithLineItems {
            invoice,
            line_items,
        }))
    }

    /// Delete an invoice. Line items cascade.
    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    pub async fn delete_invoice(&self, invoice_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_invoice"])
            .start_timer();

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(invoice_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete invoice: {}", e))
            })?;

        timer.observe_duration();

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(invoice_id = %invoice_id, "Invoice deleted");
        }

        Ok(deleted)
    }

    /// Dashboard counts by status, recomputed per request.
    #[instrument(skip(self))]
    pub async fn invoice_stats(&self) -> Result<InvoiceStats, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["invoice_stats"])
            .start_timer();

        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM invoices GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e))
                })?;

        timer.observe_duration();

        let mut stats = InvoiceStats::default();
        for (status, count) in rows {
            stats.total += count;
            match status.as_str() {
                "paid" => stats.paid = count,
                "pending" => stats.pending = count,
                "overdue" => stats.overdue = count,
                _ => {}
            }
        }

        Ok(stats)
    }

    /// Fetch the line items for an invoice in insertion order.
    async fn line_items_for_invoice(
        &self,
        invoice_id: Uuid,
    ) -> Result<Vec<InvoiceLineItem>, AppError> {
        sqlx::query_as::<_, InvoiceLineItem>(
            r#"
            SELECT id, invoice_id, item_id, quantity, unit_price, total, sort_order
            FROM invoice_line_items
            WHERE invoice_id = ?
            ORDER BY sort_order
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get line items: {}", e)))
    }

    /// Insert a line item set inside a transaction, preserving input order.
    async fn insert_line_items(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        invoice_id: Uuid,
        items: &[crate::models::NewLineItem],
    ) -> Result<Vec<InvoiceLineItem>, AppError> {
        let mut inserted = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let line_item = sqlx::query_as::<_, InvoiceLineItem>(
                r#"
                INSERT INTO invoice_line_items (
                    id, invoice_id, item_id, quantity, unit_price, total, sort_order
                )
                VALUES (?, ?, ?, ?, ?, ?, ?)
                RETURNING id, invoice_id, item_id, quantity, unit_price, total, sort_order
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(invoice_id)
            .bind(item.item_id)
            .bind(item.quantity)
            .bind(item.unit_price.to_string())
            .bind(item.total.to_string())
            .bind(index as i64)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to insert line item: {}", e))
            })?;
            inserted.push(line_item);
        }
        Ok(inserted)
    }

    // -------------------------------------------------------------------------
    // Template Operations
    // -------------------------------------------------------------------------

    /// Create a template. Marking it default clears the flag on the others in
    /// the same transaction.
    #[instrument(skip(self, input))]
    pub async fn create_template(&self, input: &CreateTemplate) -> Result<Template, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_template"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        if input.is_default {
            sqlx::query("UPDATE templates SET is_default = 0")
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to clear defaults: {}", e))
                })?;
        }

        let primary_color = input
            .primary_color
            .clone()
            .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string());

        let template = sqlx::query_as::<_, Template>(
            r#"
            INSERT INTO templates (id, name, logo, primary_color, is_default, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, name, logo, primary_color, is_default, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.logo)
        .bind(primary_color)
        .bind(input.is_default)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create template: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(template_id = %template.id, name = %template.name, "Template created");

        Ok(template)
    }

    /// Get a template by ID.
    #[instrument(skip(self), fields(template_id = %template_id))]
    pub async fn get_template(&self, template_id: Uuid) -> Result<Option<Template>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_template"])
            .start_timer();

        let template = sqlx::query_as::<_, Template>(
            r#"
            SELECT id, name, logo, primary_color, is_default, created_at
            FROM templates
            WHERE id = ?
            "#,
        )
        .bind(template_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get template: {}", e)))?;

        timer.observe_duration();

        Ok(template)
    }

    /// List all templates.
    #[instrument(skip(self))]
    pub async fn list_templates(&self) -> Result<Vec<Template>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_templates"])
            .start_timer();

        let templates = sqlx::query_as::<_, Template>(
            r#"
            SELECT id, name, logo, primary_color, is_default, created_at
            FROM templates
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list templates: {}", e)))?;

        timer.observe_duration();

        Ok(templates)
    }

    /// Update a template, keeping at most one default.
    #[instrument(skip(self, input), fields(template_id = %template_id))]
    pub async fn update_template(
        &self,
        template_id: Uuid,
        input: &UpdateTemplate,
    ) -> Result<Option<Template>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_template"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        if input.is_default == Some(true) {
            sqlx::query("UPDATE templates SET is_default = 0")
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to clear defaults: {}", e))
                })?;
        }

        let template = sqlx::query_as::<_, Template>(
            r#"
            UPDATE templates
            SET name = COALESCE(?, name),
                logo = COALESCE(?, logo),
                primary_color = COALESCE(?, primary_color),
                is_default = COALESCE(?, is_default)
            WHERE id = ?
            RETURNING id, name, logo, primary_color, is_default, created_at
            "#,
        )
        .bind(&input.name)
        .bind(&input.logo)
        .bind(&input.primary_color)
        .bind(input.is_default)
        .bind(template_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update template: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        Ok(template)
    }

    /// Delete a template.
    #[instrument(skip(self), fields(template_id = %template_id))]
    pub async fn delete_template(&self, template_id: Uuid) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_template"])
            .start_timer();

        let result = sqlx::query("DELETE FROM templates WHERE id = ?")
            .bind(template_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete template: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }
}
