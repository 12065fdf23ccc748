use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use super::{InvoiceFilter, Store, StoreError};
use crate::config::Config;
use crate::models::{
    CustomerField, CustomerTotals, Invoice, InvoiceChanges, InvoiceStatus, InvoicesTable,
    LatestInvoiceRaw, Revenue, User,
};
use crate::seed::SeedData;

const INVOICE_SEARCH: &str = r#"
    FROM invoices
    JOIN customers ON invoices.customer_id = customers.id
    WHERE customers.name ILIKE $1
       OR customers.email ILIKE $1
       OR invoices.status ILIKE $1
       OR ($2::float8 IS NOT NULL AND invoices.amount::float8 = $2)
       OR ($3::timestamptz IS NOT NULL AND invoices.date = $3)
"#;

/// PostgreSQL-backed store sharing one connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new Database instance with a connection pool
    pub async fn new(config: &Config) -> Result<Self, StoreError> {
        let url = config.database_url().ok_or(StoreError::MissingDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn get_pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the schema in `migrations/`
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(self.get_pool()).await?;
        Ok(())
    }
}

fn bind_search<'q, O>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments>,
    filter: &InvoiceFilter,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, sqlx::postgres::PgArguments> {
    query
        .bind(filter.like_pattern())
        .bind(filter.amount())
        .bind(filter.date())
}

impl Store for Database {
    async fn revenue(&self) -> Result<Vec<Revenue>, StoreError> {
        let revenue = sqlx::query_as::<_, Revenue>("SELECT id, month, revenue FROM revenue")
            .fetch_all(self.get_pool())
            .await?;

        Ok(revenue)
    }

    async fn latest_invoices(&self, limit: i64) -> Result<Vec<LatestInvoiceRaw>, StoreError> {
        let invoices = sqlx::query_as::<_, LatestInvoiceRaw>(
            r#"
            SELECT invoices.id, invoices.amount, customers.name, customers.email, customers.image_url
            FROM invoices
            JOIN customers ON invoices.customer_id = customers.id
            ORDER BY invoices.date DESC, invoices.id ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.get_pool())
        .await?;

        Ok(invoices)
    }

    async fn count_invoices(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM invoices")
            .fetch_one(self.get_pool())
            .await?;

        Ok(count)
    }

    async fn count_customers(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers")
            .fetch_one(self.get_pool())
            .await?;

        Ok(count)
    }

    async fn sum_amount_by_status(&self, status: InvoiceStatus) -> Result<i64, StoreError> {
        let sum = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(amount), 0)::BIGINT FROM invoices WHERE status = $1",
        )
        .bind(status.as_str())
        .fetch_one(self.get_pool())
        .await?;

        Ok(sum)
    }

    async fn filtered_invoices(
        &self,
        filter: &InvoiceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InvoicesTable>, StoreError> {
        let sql = format!(
            r#"
            SELECT
                invoices.id,
                invoices.customer_id,
                customers.name,
                customers.email,
                customers.image_url,
                invoices.date,
                invoices.amount,
                invoices.status
            {INVOICE_SEARCH}
            ORDER BY invoices.date DESC, invoices.id ASC
            LIMIT $4 OFFSET $5
            "#
        );

        let invoices = bind_search(sqlx::query_as::<_, InvoicesTable>(&sql), filter)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.get_pool())
            .await?;

        Ok(invoices)
    }

    async fn count_filtered_invoices(&self, filter: &InvoiceFilter) -> Result<i64, StoreError> {
        let sql = format!("SELECT COUNT(*) {INVOICE_SEARCH}");

        let (count,) = bind_search(sqlx::query_as::<_, (i64,)>(&sql), filter)
            .fetch_one(self.get_pool())
            .await?;

        Ok(count)
    }

    async fn invoice_by_id(&self, id: &str) -> Result<Option<Invoice>, StoreError> {
        let invoice = sqlx::query_as::<_, Invoice>(
            "SELECT id, customer_id, amount, status, date FROM invoices WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.get_pool())
        .await?;

        Ok(invoice)
    }

    async fn customers(&self) -> Result<Vec<CustomerField>, StoreError> {
        let customers =
            sqlx::query_as::<_, CustomerField>("SELECT id, name FROM customers ORDER BY name ASC")
                .fetch_all(self.get_pool())
                .await?;

        Ok(customers)
    }

    async fn filtered_customers(&self, query: &str) -> Result<Vec<CustomerTotals>, StoreError> {
        let pattern = InvoiceFilter::new(query).like_pattern();

        let customers = sqlx::query_as::<_, CustomerTotals>(
            r#"
            SELECT
                customers.id,
                customers.name,
                customers.email,
                customers.image_url,
                COUNT(invoices.id) AS total_invoices,
                COALESCE(SUM(CASE WHEN invoices.status = 'pending' THEN invoices.amount ELSE 0 END), 0)::BIGINT AS total_pending,
                COALESCE(SUM(CASE WHEN invoices.status = 'paid' THEN invoices.amount ELSE 0 END), 0)::BIGINT AS total_paid
            FROM customers
            LEFT JOIN invoices ON customers.id = invoices.customer_id
            WHERE customers.name ILIKE $1 OR customers.email ILIKE $1
            GROUP BY customers.id, customers.name, customers.email, customers.image_url
            ORDER BY customers.name ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(self.get_pool())
        .await?;

        Ok(customers)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.get_pool())
        .await?;

        Ok(user)
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO invoices (id, customer_id, amount, status, date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&invoice.id)
        .bind(&invoice.customer_id)
        .bind(invoice.amount)
        .bind(invoice.status.as_str())
        .bind(invoice.date)
        .execute(self.get_pool())
        .await?;

        Ok(())
    }

    async fn update_invoice(&self, id: &str, changes: &InvoiceChanges) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET customer_id = $1, amount = $2, status = $3
            WHERE id = $4
            "#,
        )
        .bind(&changes.customer_id)
        .bind(changes.amount)
        .bind(changes.status.as_str())
        .bind(id)
        .execute(self.get_pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "invoice", id: id.to_string() });
        }

        Ok(())
    }

    async fn delete_invoice(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(self.get_pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "invoice", id: id.to_string() });
        }

        Ok(())
    }

    async fn seed(&self, data: &SeedData) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for user in &data.users {
            sqlx::query(
                r#"
                INSERT INTO users (id, name, email, password)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (email) DO NOTHING
                "#,
            )
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password)
            .execute(&mut *tx)
            .await?;
        }

        for customer in &data.customers {
            sqlx::query(
                r#"
                INSERT INTO customers (id, name, email, image_url)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(&customer.id)
            .bind(&customer.name)
            .bind(&customer.email)
            .bind(&customer.image_url)
            .execute(&mut *tx)
            .await?;
        }

        for invoice in &data.invoices {
            sqlx::query(
                r#"
                INSERT INTO invoices (id, customer_id, amount, status, date)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(&invoice.id)
            .bind(&invoice.customer_id)
            .bind(invoice.amount)
            .bind(invoice.status.as_str())
            .bind(invoice.date)
            .execute(&mut *tx)
            .await?;
        }

        for revenue in &data.revenue {
            sqlx::query(
                r#"
                INSERT INTO revenue (id, month, revenue)
                VALUES ($1, $2, $3)
                ON CONFLICT (month) DO NOTHING
                "#,
            )
            .bind(&revenue.id)
            .bind(&revenue.month)
            .bind(revenue.revenue)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

/// Initialize the database connection pool
pub async fn init(config: &Config) -> Result<Database, StoreError> {
    let db = Database::new(config).await?;
    tracing::info!(max_connections = config.max_connections, "database pool ready");
    Ok(db)
}
