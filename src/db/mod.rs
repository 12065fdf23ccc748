mod filter;
mod memory;
mod postgres;

use thiserror::Error;

use crate::models::{
    CustomerField, CustomerTotals, Invoice, InvoiceChanges, InvoiceStatus, InvoicesTable,
    LatestInvoiceRaw, Revenue, User,
};
use crate::seed::SeedData;

pub use filter::InvoiceFilter;
pub use memory::MemoryStore;
pub use postgres::{init, Database};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("DATABASE_URL must be set to connect to PostgreSQL")]
    MissingDatabaseUrl,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("customer {0} does not exist")]
    UnknownCustomer(String),

    #[error("store unavailable")]
    Unavailable,
}

/// The relational store behind the dashboard.
///
/// Each method is a single logical query. Implementations hold their own
/// connection handle and are cheap to clone.
#[allow(async_fn_in_trait)]
pub trait Store: Send + Sync + Clone {
    async fn revenue(&self) -> Result<Vec<Revenue>, StoreError>;

    /// Newest invoices first, joined with their customer.
    async fn latest_invoices(&self, limit: i64) -> Result<Vec<LatestInvoiceRaw>, StoreError>;

    async fn count_invoices(&self) -> Result<i64, StoreError>;

    async fn count_customers(&self) -> Result<i64, StoreError>;

    /// Sum of amounts (cents) over invoices with the given status.
    async fn sum_amount_by_status(&self, status: InvoiceStatus) -> Result<i64, StoreError>;

    /// Matching invoices ordered by date descending, then id.
    async fn filtered_invoices(
        &self,
        filter: &InvoiceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InvoicesTable>, StoreError>;

    async fn count_filtered_invoices(&self, filter: &InvoiceFilter) -> Result<i64, StoreError>;

    async fn invoice_by_id(&self, id: &str) -> Result<Option<Invoice>, StoreError>;

    /// All customers ordered by name.
    async fn customers(&self) -> Result<Vec<CustomerField>, StoreError>;

    /// Customers whose name or email contains `query`, with invoice totals, ordered by name.
    async fn filtered_customers(&self, query: &str) -> Result<Vec<CustomerTotals>, StoreError>;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] when no invoice has this id.
    async fn update_invoice(&self, id: &str, changes: &InvoiceChanges) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] when no invoice has this id.
    async fn delete_invoice(&self, id: &str) -> Result<(), StoreError>;

    async fn seed(&self, data: &SeedData) -> Result<(), StoreError>;
}
