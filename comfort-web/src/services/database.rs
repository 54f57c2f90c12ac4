//! Database service for comfort-web.

use crate::models::{
    Customer, CustomerInput, InvoiceHeader, InvoiceLine, InvoiceStatus, InvoiceSummary,
    InvoiceView, NewInvoice, User,
};
use crate::services::metrics::{DB_QUERY_DURATION, INVOICES_TOTAL};
use comfort_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
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

    // -------------------------------------------------------------------------
    // User Operations
    // -------------------------------------------------------------------------

    /// Look up a user by email, case-insensitively.
    #[instrument(skip(self, email))]
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_user_by_email"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, role, created_utc
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get user: {}", e)))?;

        timer.observe_duration();

        Ok(user)
    }

    /// Create a user account. Provisioning is out-of-band; this exists for
    /// bootstrap scripts and tests, not for any self-registration flow.
    #[instrument(skip(self, password_hash))]
    pub async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_user"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, name, password_hash, role)
            VALUES ($1, LOWER($2), $3, $4, $5)
            RETURNING id, email, name, password_hash, role, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("A user with this email already exists"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create user: {}", e)),
        })?;

        timer.observe_duration();

        info!(user_id = %user.id, "User created");

        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Customer Operations
    // -------------------------------------------------------------------------

    /// Create a customer. The caller identity is recorded on the row.
    #[instrument(skip(self, input), fields(entered_by = %entered_by))]
    pub async fn create_customer(
        &self,
        entered_by: Uuid,
        input: &CustomerInput,
    ) -> Result<Customer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (id, name, email, mobileno, address, entered_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, mobileno, address, entered_by, created_utc, updated_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(input.normalized_email())
        .bind(&input.mobileno)
        .bind(input.normalized_address())
        .bind(entered_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create customer: {}", e)))?;

        timer.observe_duration();

        info!(customer_id = %customer.id, "Customer created");

        Ok(customer)
    }

    /// Get a customer by id.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn get_customer(&self, id: Uuid) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, mobileno, address, entered_by, created_utc, updated_utc
            FROM customers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e)))?;

        timer.observe_duration();

        Ok(customer)
    }

    /// List all customers, oldest first.
    #[instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, mobileno, address, entered_by, created_utc, updated_utc
            FROM customers
            ORDER BY created_utc
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list customers: {}", e)))?;

        timer.observe_duration();

        Ok(customers)
    }

    /// Update a customer. Returns `None` when the id does not exist.
    #[instrument(skip(self, input), fields(customer_id = %id))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        input: &CustomerInput,
    ) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_customer"])
            .start_timer();

        let customer = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $2,
                email = $3,
                mobileno = $4,
                address = $5,
                updated_utc = NOW()
            WHERE id = $1
            RETURNING id, name, email, mobileno, address, entered_by, created_utc, updated_utc
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.normalized_email())
        .bind(&input.mobileno)
        .bind(input.normalized_address())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update customer: {}", e)))?;

        timer.observe_duration();

        if let Some(ref c) = customer {
            info!(customer_id = %c.id, "Customer updated");
        }

        Ok(customer)
    }

    /// Delete a customer. Deletion is blocked while invoices reference the
    /// customer; those invoices are the billing record and must keep their
    /// party resolvable.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn delete_customer(&self, id: Uuid) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_customer"])
            .start_timer();

        let invoice_count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM invoice_headers WHERE customer_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e))
        })?;

        if invoice_count > 0 {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Customer has {} invoice(s) and cannot be deleted",
                invoice_count
            )));
        }

        let result = sqlx::query(
            r#"
            DELETE FROM customers WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            // The FK also guards against an invoice created between the
            // count above and this delete.
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Customer has invoices and cannot be deleted"
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to delete customer: {}", e)),
        })?;

        timer.observe_duration();

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!("Customer not found")));
        }

        info!(customer_id = %id, "Customer deleted");

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Invoice Operations
    // -------------------------------------------------------------------------

    /// List all invoices, newest invoice number first, each resolved against
    /// its customer. A missing customer yields a NULL name rather than
    /// failing the listing.
    #[instrument(skip(self))]
    pub async fn list_invoices(&self) -> Result<Vec<InvoiceSummary>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, InvoiceSummary>(
            r#"
            SELECT h.invoice_no, h.customer_id, c.name AS customer_name,
                c.mobileno AS customer_mobile,
                h.invoice_amount, h.discount_amount, h.net_amount,
                h.status, h.remark, h.created_utc, h.updated_utc
            FROM invoice_headers h
            LEFT JOIN customers c ON c.id = h.customer_id
            ORDER BY h.invoice_no DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    /// Fetch one invoice with its customer and full line set.
    #[instrument(skip(self), fields(invoice_no = invoice_no))]
    pub async fn get_invoice(&self, invoice_no: i64) -> Result<InvoiceView, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice"])
            .start_timer();

        let summary = sqlx::query_as::<_, InvoiceSummary>(
            r#"
            SELECT h.invoice_no, h.customer_id, c.name AS customer_name,
                c.mobileno AS customer_mobile,
                h.invoice_amount, h.discount_amount, h.net_amount,
                h.status, h.remark, h.created_utc, h.updated_utc
            FROM invoice_headers h
            LEFT JOIN customers c ON c.id = h.customer_id
            WHERE h.invoice_no = $1
            "#,
        )
        .bind(invoice_no)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        let items = sqlx::query_as::<_, InvoiceLine>(
            r#"
            SELECT id, invoice_no, itemname, qty, amount, created_utc, updated_utc
            FROM invoice_details
            WHERE invoice_no = $1
            ORDER BY created_utc
            "#,
        )
        .bind(invoice_no)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get line items: {}", e)))?;

        timer.observe_duration();

        Ok(InvoiceView { summary, items })
    }

    /// Create an invoice: validate, compute totals from the lines, then
    /// insert the header and every detail row in one transaction. A failure
    /// at any point rolls the whole invoice back; a header without items is
    /// never observable.
    #[instrument(skip(self, input), fields(entered_by = %entered_by, customer_id = %input.customer_id))]
    pub async fn create_invoice(
        &self,
        entered_by: Uuid,
        input: &NewInvoice,
    ) -> Result<InvoiceHeader, AppError> {
        let totals = input.totals()?;

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_invoice"])
            .start_timer();

        if self.get_customer(input.customer_id).await?.is_none() {
            return Err(AppError::NotFound(anyhow::anyhow!("Customer not found")));
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let header = sqlx::query_as::<_, InvoiceHeader>(
            r#"
            INSERT INTO invoice_headers
                (customer_id, invoice_amount, discount_amount, net_amount, entered_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING invoice_no, customer_id, invoice_amount, discount_amount, net_amount,
                status, remark, entered_by, created_utc, updated_utc
            "#,
        )
        .bind(input.customer_id)
        .bind(totals.invoice_amount)
        .bind(totals.discount_amount)
        .bind(totals.net_amount)
        .bind(entered_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            // The FK catches a customer deleted between the pre-check above
            // and this insert.
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("Customer not found"))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)),
        })?;

        for item in &input.items {
            sqlx::query(
                r#"
                INSERT INTO invoice_details (id, invoice_no, itemname, qty, amount)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(header.invoice_no)
            .bind(&item.itemname)
            .bind(item.qty)
            .bind(item.amount)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to create line item: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit invoice: {}", e))
        })?;

        timer.observe_duration();

        INVOICES_TOTAL.with_label_values(&["created"]).inc();

        info!(
            invoice_no = header.invoice_no,
            net_amount = %header.net_amount,
            "Invoice created"
        );

        Ok(header)
    }

    /// Cancel an invoice: one-way Active to Cancelled transition carrying a
    /// mandatory free-text reason. Re-cancelling is a conflict.
    #[instrument(skip(self, reason), fields(invoice_no = invoice_no))]
    pub async fn cancel_invoice(
        &self,
        invoice_no: i64,
        reason: &str,
    ) -> Result<InvoiceHeader, AppError> {
        if reason.trim().is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Cancellation reason is required"
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["cancel_invoice"])
            .start_timer();

        let existing = sqlx::query_as::<_, InvoiceHeader>(
            r#"
            SELECT invoice_no, customer_id, invoice_amount, discount_amount, net_amount,
                status, remark, entered_by, created_utc, updated_utc
            FROM invoice_headers
            WHERE invoice_no = $1
            "#,
        )
        .bind(invoice_no)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found")))?;

        if existing.status == InvoiceStatus::Cancelled.as_str() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice is already cancelled"
            )));
        }

        let header = sqlx::query_as::<_, InvoiceHeader>(
            r#"
            UPDATE invoice_headers
            SET status = 'Cancelled',
                remark = $2,
                updated_utc = NOW()
            WHERE invoice_no = $1 AND status = 'Active'
            RETURNING invoice_no, customer_id, invoice_amount, discount_amount, net_amount,
                status, remark, entered_by, created_utc, updated_utc
            "#,
        )
        .bind(invoice_no)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to cancel invoice: {}", e)))?
        // Lost the race with a concurrent cancellation.
        .ok_or_else(|| AppError::Conflict(anyhow::anyhow!("Invoice is already cancelled")))?;

        timer.observe_duration();

        INVOICES_TOTAL.with_label_values(&["cancelled"]).inc();

        info!(invoice_no = header.invoice_no, "Invoice cancelled");

        Ok(header)
    }

    // -------------------------------------------------------------------------
    // Dashboard Counts
    // -------------------------------------------------------------------------

    /// Count customers and invoices for the dashboard.
    #[instrument(skip(self))]
    pub async fn dashboard_counts(&self) -> Result<(i64, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["dashboard_counts"])
            .start_timer();

        let customers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count customers: {}", e))
            })?;

        let invoices: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoice_headers")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e))
            })?;

        timer.observe_duration();

        Ok((customers, invoices))
    }
}
