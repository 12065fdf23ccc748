use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::Month;
use thiserror::Error;

use crate::config::{Config, PendingTotal};
use crate::db::{InvoiceFilter, Store, StoreError};
use crate::format::format_currency;
use crate::models::{
    CardData, CustomerField, FormattedCustomersTable, InvoiceForm, InvoiceStatus, InvoicesTable,
    LatestInvoice, Revenue, User,
};

pub const ITEMS_PER_PAGE: i64 = 6;
pub const LATEST_INVOICE_COUNT: i64 = 5;

/// What a failed read was trying to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Revenue,
    LatestInvoices,
    CardData,
    Invoices,
    InvoicePages,
    Invoice,
    Customers,
    CustomerTable,
    User,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Resource::Revenue => "revenue data",
            Resource::LatestInvoices => "the latest invoices",
            Resource::CardData => "card data",
            Resource::Invoices => "invoices",
            Resource::InvoicePages => "total number of invoices",
            Resource::Invoice => "invoice",
            Resource::Customers => "all customers",
            Resource::CustomerTable => "customer table",
            Resource::User => "user",
        };
        f.write_str(text)
    }
}

/// A read failed in the store. Callers render a fallback instead of partial data.
#[derive(Debug, Error)]
#[error("Failed to fetch {resource}.")]
pub struct FetchError {
    pub resource: Resource,
    #[source]
    pub source: StoreError,
}

fn failed(resource: Resource) -> impl FnOnce(StoreError) -> FetchError {
    move |source| {
        tracing::error!(error = %source, %resource, "Database Error");
        FetchError { resource, source }
    }
}

/// Calendar position of a month label; labels that are not month names sort last.
fn month_order(label: &str) -> u32 {
    Month::from_str(label.trim())
        .map(|m| m.number_from_month())
        .unwrap_or(u32::MAX)
}

/// Read side of the dashboard. Every call goes to the store; nothing is cached.
#[derive(Debug, Clone)]
pub struct DashboardData<S> {
    store: S,
    revenue_delay: Duration,
    pending_total: PendingTotal,
}

impl<S: Store> DashboardData<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            revenue_delay: Duration::ZERO,
            pending_total: PendingTotal::default(),
        }
    }

    pub fn with_config(store: S, config: &Config) -> Self {
        Self {
            store,
            revenue_delay: Duration::from_millis(config.revenue_delay_ms),
            pending_total: config.pending_total,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn fetch_revenue(&self) -> Result<Vec<Revenue>, FetchError> {
        if !self.revenue_delay.is_zero() {
            tracing::info!(delay_ms = self.revenue_delay.as_millis() as u64, "Fetching revenue data...");
            tokio::time::sleep(self.revenue_delay).await;
        }

        let mut revenue = self.store.revenue().await.map_err(failed(Resource::Revenue))?;
        revenue.sort_by_key(|r| month_order(&r.month));

        if !self.revenue_delay.is_zero() {
            tracing::info!("Data fetch completed");
        }

        Ok(revenue)
    }

    pub async fn fetch_latest_invoices(&self) -> Result<Vec<LatestInvoice>, FetchError> {
        let rows = self
            .store
            .latest_invoices(LATEST_INVOICE_COUNT)
            .await
            .map_err(failed(Resource::LatestInvoices))?;

        Ok(rows
            .into_iter()
            .map(|row| LatestInvoice {
                id: row.id,
                amount: format_currency(i64::from(row.amount)),
                name: row.name,
                email: row.email,
                image_url: row.image_url,
            })
            .collect())
    }

    /// Overview figures, from independent queries issued concurrently.
    pub async fn fetch_card_data(&self) -> Result<CardData, FetchError> {
        let (number_of_invoices, number_of_customers, paid, pending) = tokio::try_join!(
            self.store.count_invoices(),
            self.store.count_customers(),
            self.store.sum_amount_by_status(InvoiceStatus::Paid),
            self.store.sum_amount_by_status(InvoiceStatus::Pending),
        )
        .map_err(failed(Resource::CardData))?;

        let pending = match self.pending_total {
            PendingTotal::Legacy => number_of_invoices - paid,
            PendingTotal::PendingSum => pending,
        };

        Ok(CardData {
            number_of_customers,
            number_of_invoices,
            total_paid_invoices: format_currency(paid),
            total_pending_invoices: format_currency(pending),
        })
    }

    /// One page of invoices matching `query`, newest first. Pages start at 1.
    pub async fn fetch_filtered_invoices(
        &self,
        query: &str,
        current_page: i64,
    ) -> Result<Vec<InvoicesTable>, FetchError> {
        let offset = (current_page.max(1) - 1).saturating_mul(ITEMS_PER_PAGE);
        let filter = InvoiceFilter::new(query);

        self.store
            .filtered_invoices(&filter, ITEMS_PER_PAGE, offset)
            .await
            .map_err(failed(Resource::Invoices))
    }

    pub async fn fetch_invoices_pages(&self, query: &str) -> Result<i64, FetchError> {
        let count = self
            .store
            .count_filtered_invoices(&InvoiceFilter::new(query))
            .await
            .map_err(failed(Resource::InvoicePages))?;

        Ok((count + ITEMS_PER_PAGE - 1) / ITEMS_PER_PAGE)
    }

    pub async fn fetch_invoice_by_id(&self, id: &str) -> Result<Option<InvoiceForm>, FetchError> {
        let invoice = self
            .store
            .invoice_by_id(id)
            .await
            .map_err(failed(Resource::Invoice))?;

        Ok(invoice.map(InvoiceForm::from))
    }

    pub async fn fetch_customers(&self) -> Result<Vec<CustomerField>, FetchError> {
        self.store.customers().await.map_err(failed(Resource::Customers))
    }

    pub async fn fetch_filtered_customers(
        &self,
        query: &str,
    ) -> Result<Vec<FormattedCustomersTable>, FetchError> {
        let rows = self
            .store
            .filtered_customers(query)
            .await
            .map_err(failed(Resource::CustomerTable))?;

        Ok(rows
            .into_iter()
            .map(|row| FormattedCustomersTable {
                id: row.id,
                name: row.name,
                email: row.email,
                image_url: row.image_url,
                total_invoices: row.total_invoices,
                total_pending: format_currency(row.total_pending),
                total_paid: format_currency(row.total_paid),
            })
            .collect())
    }

    pub async fn get_user(&self, email: &str) -> Result<Option<User>, FetchError> {
        self.store.user_by_email(email).await.map_err(failed(Resource::User))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{Customer, Invoice};
    use crate::seed::{self, SeedData};
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};

    async fn seeded() -> DashboardData<MemoryStore> {
        let store = MemoryStore::new();
        seed::run(&store, 4).await.unwrap();
        DashboardData::new(store)
    }

    fn customer(id: &str, name: &str) -> Customer {
        Customer {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{id}@example.com"),
            image_url: String::new(),
        }
    }

    /// `count` invoices for one customer, one day apart, alternating status.
    async fn with_invoices(count: usize) -> DashboardData<MemoryStore> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let invoices = (0..count)
            .map(|i| Invoice {
                id: format!("inv-{i:02}"),
                customer_id: "cust-1".to_string(),
                amount: 100 * (i as i32 + 1),
                status: if i % 2 == 0 { InvoiceStatus::Pending } else { InvoiceStatus::Paid },
                date: start + ChronoDuration::days(i as i64),
            })
            .collect();

        let store = MemoryStore::new();
        store
            .seed(&SeedData {
                customers: vec![customer("cust-1", "Amy Burns")],
                invoices,
                ..SeedData::default()
            })
            .await
            .unwrap();
        DashboardData::new(store)
    }

    #[tokio::test]
    async fn revenue_is_in_calendar_order() {
        let store = MemoryStore::new();
        let revenue = ["March", "January", "Q4", "February"]
            .iter()
            .map(|m| Revenue { id: m.to_string(), month: m.to_string(), revenue: 100 })
            .collect();
        store.seed(&SeedData { revenue, ..SeedData::default() }).await.unwrap();

        let months: Vec<_> = DashboardData::new(store)
            .fetch_revenue()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.month)
            .collect();
        assert_eq!(months, vec!["January", "February", "March", "Q4"]);
    }

    #[tokio::test(start_paused = true)]
    async fn revenue_waits_for_configured_delay() {
        let config = Config { revenue_delay_ms: 3000, ..Config::default() };
        let data = DashboardData::with_config(MemoryStore::new(), &config);

        let started = tokio::time::Instant::now();
        data.fetch_revenue().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn latest_invoices_are_five_newest_formatted() {
        let data = seeded().await;

        let latest = data.fetch_latest_invoices().await.unwrap();
        assert_eq!(latest.len(), 5);
        assert_eq!(latest[0].amount, "$50.00");
        assert_eq!(latest[0].name, "Customer 1");
        assert_eq!(latest[1].amount, "$75.00");
    }

    #[tokio::test]
    async fn card_data_keeps_legacy_pending_figure() {
        let data = with_invoices(4).await;

        let cards = data.fetch_card_data().await.unwrap();
        assert_eq!(cards.number_of_customers, 1);
        assert_eq!(cards.number_of_invoices, 4);
        // paid: 200 + 400 cents
        assert_eq!(cards.total_paid_invoices, "$6.00");
        // 4 invoices - 600 cents
        assert_eq!(cards.total_pending_invoices, "-$5.96");
    }

    #[tokio::test]
    async fn card_data_can_sum_pending_invoices() {
        let store = with_invoices(4).await.store().clone();
        let config = Config { pending_total: PendingTotal::PendingSum, ..Config::default() };
        let data = DashboardData::with_config(store, &config);

        let cards = data.fetch_card_data().await.unwrap();
        // pending: 100 + 300 cents
        assert_eq!(cards.total_pending_invoices, "$4.00");
    }

    #[tokio::test]
    async fn filtered_invoices_page_by_six() {
        let data = with_invoices(14).await;

        let first = data.fetch_filtered_invoices("", 1).await.unwrap();
        let third = data.fetch_filtered_invoices("", 3).await.unwrap();
        assert_eq!(first.len(), 6);
        assert_eq!(first[0].id, "inv-13");
        assert_eq!(third.len(), 2);
        assert_eq!(third[1].id, "inv-00");
        assert_eq!(data.fetch_invoices_pages("").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn page_below_one_is_first_page() {
        let data = with_invoices(8).await;

        let zero = data.fetch_filtered_invoices("", 0).await.unwrap();
        let one = data.fetch_filtered_invoices("", 1).await.unwrap();
        assert_eq!(zero, one);
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_empty() {
        let data = with_invoices(8).await;

        assert!(data.fetch_filtered_invoices("", 3).await.unwrap().is_empty());
        assert!(data.fetch_filtered_invoices("", i64::MAX).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn filtering_by_paid_returns_paid_newest_first() {
        let data = seeded().await;

        let rows = data.fetch_filtered_invoices("paid", 1).await.unwrap();
        assert!(!rows.is_empty() && rows.len() <= 6);
        assert!(rows.iter().all(|r| r.status.as_str().contains("paid")));
        assert!(rows.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[tokio::test]
    async fn page_count_matches_rows_across_pages() {
        let data = seeded().await;

        for query in ["", "paid", "pending", "customer", "oliveira", "zzz", "10000", "2023-12-01"] {
            let pages = data.fetch_invoices_pages(query).await.unwrap();
            let mut total = 0;
            for page in 1..=pages.max(1) {
                total += data.fetch_filtered_invoices(query, page).await.unwrap().len() as i64;
            }
            assert_eq!(pages, (total + 5) / 6, "query {query:?}");
        }
    }

    #[tokio::test]
    async fn invoice_by_id_returns_dollars_or_none() {
        let data = seeded().await;

        let form = data
            .fetch_invoice_by_id("9a1d3b4e-0001-4f6a-8d2c-1c7e5b000001")
            .await
            .unwrap()
            .expect("invoice");
        assert_eq!(form.amount, 100.0);
        assert_eq!(form.status, InvoiceStatus::Paid);
        assert!(data.fetch_invoice_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn customer_totals_cover_their_invoices() {
        let data = seeded().await;

        let customers = data.fetch_filtered_customers("").await.unwrap();
        assert_eq!(customers.len(), 6);
        assert!(customers.windows(2).all(|w| w[0].name <= w[1].name));

        let delba = data.fetch_filtered_customers("OLIVEIRA").await.unwrap();
        assert_eq!(delba.len(), 1);
        assert_eq!(delba[0].total_invoices, 3);
        assert_eq!(delba[0].total_pending, "$157.00");
        assert_eq!(delba[0].total_paid, "$1,244.00");
    }

    #[tokio::test]
    async fn customers_for_selection_are_sorted() {
        let data = seeded().await;

        let names: Vec<_> =
            data.fetch_customers().await.unwrap().into_iter().map(|c| c.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[tokio::test]
    async fn get_user_by_email() {
        let data = seeded().await;

        assert!(data.get_user("janedoe2@example.com").await.unwrap().is_some());
        assert!(data.get_user("missing@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_failures_become_typed_errors() {
        let data = seeded().await;
        data.store().set_unavailable(true);

        let err = data.fetch_card_data().await.unwrap_err();
        assert_eq!(err.resource, Resource::CardData);
        assert_eq!(err.to_string(), "Failed to fetch card data.");

        let err = data.fetch_invoices_pages("").await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch total number of invoices.");
        assert!(matches!(err.source, StoreError::Unavailable));
    }
}
