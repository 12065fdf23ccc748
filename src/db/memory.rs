use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{InvoiceFilter, Store, StoreError};
use crate::models::{
    Customer, CustomerField, CustomerTotals, Invoice, InvoiceChanges, InvoiceStatus,
    InvoicesTable, LatestInvoiceRaw, Revenue, User,
};
use crate::seed::SeedData;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    customers: Vec<Customer>,
    invoices: Vec<Invoice>,
    revenue: Vec<Revenue>,
}

impl Tables {
    fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    /// Invoices joined with their customers, newest first.
    fn joined_invoices(&self) -> Vec<(&Invoice, &Customer)> {
        let mut rows: Vec<_> = self
            .invoices
            .iter()
            .filter_map(|inv| self.customer(&inv.customer_id).map(|c| (inv, c)))
            .collect();
        rows.sort_by(|(a, _), (b, _)| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        rows
    }
}

/// A store kept entirely in process memory.
///
/// Backs the `--in-memory` demo mode and the test suite. Mirrors the
/// PostgreSQL store's ordering, join and constraint behaviour.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`] until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }
}

fn offset_page<T>(rows: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    rows.skip(usize::try_from(offset).unwrap_or(usize::MAX))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect()
}

impl Store for MemoryStore {
    async fn revenue(&self) -> Result<Vec<Revenue>, StoreError> {
        self.check()?;
        Ok(self.tables.read().await.revenue.clone())
    }

    async fn latest_invoices(&self, limit: i64) -> Result<Vec<LatestInvoiceRaw>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;

        let rows = tables.joined_invoices().into_iter().map(|(inv, c)| LatestInvoiceRaw {
            id: inv.id.clone(),
            amount: inv.amount,
            name: c.name.clone(),
            email: c.email.clone(),
            image_url: c.image_url.clone(),
        });

        Ok(offset_page(rows, limit, 0))
    }

    async fn count_invoices(&self) -> Result<i64, StoreError> {
        self.check()?;
        Ok(self.tables.read().await.invoices.len() as i64)
    }

    async fn count_customers(&self) -> Result<i64, StoreError> {
        self.check()?;
        Ok(self.tables.read().await.customers.len() as i64)
    }

    async fn sum_amount_by_status(&self, status: InvoiceStatus) -> Result<i64, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;

        Ok(tables
            .invoices
            .iter()
            .filter(|inv| inv.status == status)
            .map(|inv| i64::from(inv.amount))
            .sum())
    }

    async fn filtered_invoices(
        &self,
        filter: &InvoiceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InvoicesTable>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;

        let rows = tables
            .joined_invoices()
            .into_iter()
            .filter(|(inv, c)| filter.matches(inv, c))
            .map(|(inv, c)| InvoicesTable {
                id: inv.id.clone(),
                customer_id: inv.customer_id.clone(),
                name: c.name.clone(),
                email: c.email.clone(),
                image_url: c.image_url.clone(),
                date: inv.date,
                amount: inv.amount,
                status: inv.status,
            });

        Ok(offset_page(rows, limit, offset))
    }

    async fn count_filtered_invoices(&self, filter: &InvoiceFilter) -> Result<i64, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;

        Ok(tables
            .joined_invoices()
            .into_iter()
            .filter(|(inv, c)| filter.matches(inv, c))
            .count() as i64)
    }

    async fn invoice_by_id(&self, id: &str) -> Result<Option<Invoice>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.invoices.iter().find(|inv| inv.id == id).cloned())
    }

    async fn customers(&self) -> Result<Vec<CustomerField>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;

        let mut customers: Vec<_> = tables
            .customers
            .iter()
            .map(|c| CustomerField { id: c.id.clone(), name: c.name.clone() })
            .collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(customers)
    }

    async fn filtered_customers(&self, query: &str) -> Result<Vec<CustomerTotals>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;
        let needle = query.to_lowercase();

        let mut rows: Vec<_> = tables
            .customers
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&needle) || c.email.to_lowercase().contains(&needle)
            })
            .map(|c| {
                let owned = tables.invoices.iter().filter(|inv| inv.customer_id == c.id);
                let sum_for = |status: InvoiceStatus| -> i64 {
                    owned
                        .clone()
                        .filter(|inv| inv.status == status)
                        .map(|inv| i64::from(inv.amount))
                        .sum()
                };

                CustomerTotals {
                    id: c.id.clone(),
                    name: c.name.clone(),
                    email: c.email.clone(),
                    image_url: c.image_url.clone(),
                    total_invoices: owned.clone().count() as i64,
                    total_pending: sum_for(InvoiceStatus::Pending),
                    total_paid: sum_for(InvoiceStatus::Paid),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(rows)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;

        if tables.customer(&invoice.customer_id).is_none() {
            return Err(StoreError::UnknownCustomer(invoice.customer_id.clone()));
        }
        tables.invoices.push(invoice.clone());

        Ok(())
    }

    async fn update_invoice(&self, id: &str, changes: &InvoiceChanges) -> Result<(), StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;

        if tables.customer(&changes.customer_id).is_none() {
            return Err(StoreError::UnknownCustomer(changes.customer_id.clone()));
        }
        let invoice = tables
            .invoices
            .iter_mut()
            .find(|inv| inv.id == id)
            .ok_or_else(|| StoreError::NotFound { entity: "invoice", id: id.to_string() })?;

        invoice.customer_id = changes.customer_id.clone();
        invoice.amount = changes.amount;
        invoice.status = changes.status;

        Ok(())
    }

    async fn delete_invoice(&self, id: &str) -> Result<(), StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;

        let before = tables.invoices.len();
        tables.invoices.retain(|inv| inv.id != id);
        if tables.invoices.len() == before {
            return Err(StoreError::NotFound { entity: "invoice", id: id.to_string() });
        }

        Ok(())
    }

    async fn seed(&self, data: &SeedData) -> Result<(), StoreError> {
        self.check()?;
        let mut tables = self.tables.write().await;

        for user in &data.users {
            if !tables.users.iter().any(|u| u.email == user.email) {
                tables.users.push(user.clone());
            }
        }
        for customer in &data.customers {
            if tables.customer(&customer.id).is_none() {
                tables.customers.push(customer.clone());
            }
        }
        for invoice in &data.invoices {
            if tables.customer(&invoice.customer_id).is_none() {
                return Err(StoreError::UnknownCustomer(invoice.customer_id.clone()));
            }
            if !tables.invoices.iter().any(|inv| inv.id == invoice.id) {
                tables.invoices.push(invoice.clone());
            }
        }
        for revenue in &data.revenue {
            if !tables.revenue.iter().any(|r| r.month == revenue.month) {
                tables.revenue.push(revenue.clone());
            }
        }

        Ok(())
    }
}
