use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::auth;
use crate::db::Store;
use crate::models::{Customer, Invoice, InvoiceStatus, Revenue, User};

/// Baseline rows for a fresh database.
#[derive(Debug, Clone, Default)]
pub struct SeedData {
    pub users: Vec<User>,
    pub customers: Vec<Customer>,
    pub invoices: Vec<Invoice>,
    pub revenue: Vec<Revenue>,
}

const USERS: [(&str, &str, &str, &str); 2] = [
    ("410544b2-4001-4271-9855-fec4b6a6442a", "John Doe1", "johndoe1@example.com", "password123"),
    ("7c5a8e0d-2b1f-4c9e-9a55-3f0e6d1b2c44", "Jane Doe2", "janedoe2@example.com", "password456"),
];

const CUSTOMERS: [(&str, &str, &str); 6] = [
    ("3958dc9e-712f-4377-85e9-fec4b6a6442a", "Customer 1", "customer1@example.com"),
    ("3958dc9e-742f-4377-85e9-fec4b6a6442a", "Customer 2", "customer2@example.com"),
    ("3958dc9e-737f-4377-85e9-fec4b6a6442a", "Delba de Oliveira", "delba@oliveira.com"),
    ("50ca3e18-62cd-11ee-8c99-0242ac120002", "Lee Robinson", "lee@robinson.com"),
    ("76d65c26-f784-44a2-ac19-586678f7c2f2", "Michael Novotny", "michael@novotny.com"),
    ("d6e15727-9fe1-4961-8c5b-ea44a9bd81aa", "Evil Rabbit", "evil@rabbit.com"),
];

/// (id, customer index, dollars, status, date)
const INVOICES: [(&str, usize, i32, InvoiceStatus, &str); 14] = [
    ("9a1d3b4e-0001-4f6a-8d2c-1c7e5b000001", 0, 100, InvoiceStatus::Paid, "2023-12-01"),
    ("9a1d3b4e-0002-4f6a-8d2c-1c7e5b000002", 0, 50, InvoiceStatus::Pending, "2023-12-10"),
    ("9a1d3b4e-0003-4f6a-8d2c-1c7e5b000003", 1, 75, InvoiceStatus::Paid, "2023-12-05"),
    ("9a1d3b4e-0004-4f6a-8d2c-1c7e5b000004", 2, 157, InvoiceStatus::Pending, "2023-11-14"),
    ("9a1d3b4e-0005-4f6a-8d2c-1c7e5b000005", 3, 209, InvoiceStatus::Pending, "2023-10-29"),
    ("9a1d3b4e-0006-4f6a-8d2c-1c7e5b000006", 4, 320, InvoiceStatus::Paid, "2023-09-10"),
    ("9a1d3b4e-0007-4f6a-8d2c-1c7e5b000007", 5, 88, InvoiceStatus::Paid, "2023-08-05"),
    ("9a1d3b4e-0008-4f6a-8d2c-1c7e5b000008", 2, 345, InvoiceStatus::Paid, "2023-07-16"),
    ("9a1d3b4e-0009-4f6a-8d2c-1c7e5b000009", 3, 542, InvoiceStatus::Pending, "2023-06-27"),
    ("9a1d3b4e-0010-4f6a-8d2c-1c7e5b000010", 4, 666, InvoiceStatus::Pending, "2023-06-09"),
    ("9a1d3b4e-0011-4f6a-8d2c-1c7e5b000011", 5, 329, InvoiceStatus::Paid, "2023-06-17"),
    ("9a1d3b4e-0012-4f6a-8d2c-1c7e5b000012", 1, 125, InvoiceStatus::Paid, "2023-06-07"),
    ("9a1d3b4e-0013-4f6a-8d2c-1c7e5b000013", 3, 89, InvoiceStatus::Paid, "2023-08-19"),
    ("9a1d3b4e-0014-4f6a-8d2c-1c7e5b000014", 2, 899, InvoiceStatus::Paid, "2023-06-03"),
];

const REVENUE: [(&str, i32); 12] = [
    ("January", 500),
    ("February", 750),
    ("March", 1000),
    ("April", 2500),
    ("May", 2300),
    ("June", 3200),
    ("July", 3500),
    ("August", 3700),
    ("September", 2500),
    ("October", 2800),
    ("November", 3000),
    ("December", 4800),
];

fn midnight_utc(date: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("invalid seed date {date}"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc())
        .with_context(|| format!("invalid seed date {date}"))
}

impl SeedData {
    /// The baseline dataset, with user passwords hashed at the given bcrypt cost.
    pub fn baseline(bcrypt_cost: u32) -> Result<Self> {
        let users = USERS
            .iter()
            .map(|(id, name, email, password)| {
                Ok(User {
                    id: id.to_string(),
                    name: name.to_string(),
                    email: email.to_string(),
                    password: auth::hash_password(password, bcrypt_cost)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let customers: Vec<Customer> = CUSTOMERS
            .iter()
            .map(|(id, name, email)| Customer {
                id: id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
                image_url: format!("/customers/{}.png", name.to_lowercase().replace(' ', "-")),
            })
            .collect();

        let invoices = INVOICES
            .iter()
            .map(|(id, customer, dollars, status, date)| {
                Ok(Invoice {
                    id: id.to_string(),
                    customer_id: customers[*customer].id.clone(),
                    amount: dollars * 100,
                    status: *status,
                    date: midnight_utc(date)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let revenue = REVENUE
            .iter()
            .map(|(month, amount)| Revenue {
                id: format!("revenue-{}", month.to_lowercase()),
                month: month.to_string(),
                revenue: *amount,
            })
            .collect();

        Ok(Self { users, customers, invoices, revenue })
    }
}

/// Populate `store` with the baseline rows. Safe to run more than once.
pub async fn run<S: Store>(store: &S, bcrypt_cost: u32) -> Result<SeedData> {
    let data = SeedData::baseline(bcrypt_cost)?;

    if let Err(err) = store.seed(&data).await {
        tracing::error!(error = %err, "Error seeding the database");
        return Err(err).context("seeding failed");
    }

    tracing::info!(
        users = data.users.len(),
        customers = data.customers.len(),
        invoices = data.invoices.len(),
        revenue = data.revenue.len(),
        "Seed data created successfully"
    );

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[test]
    fn baseline_hashes_passwords() {
        let data = SeedData::baseline(4).unwrap();

        assert_eq!(data.users.len(), 2);
        for (user, (_, _, _, plain)) in data.users.iter().zip(USERS.iter()) {
            assert_ne!(user.password, *plain);
            assert!(auth::verify_password(plain, &user.password).unwrap());
        }
    }

    #[test]
    fn baseline_invoices_reference_seeded_customers() {
        let data = SeedData::baseline(4).unwrap();

        for invoice in &data.invoices {
            assert!(data.customers.iter().any(|c| c.id == invoice.customer_id));
            assert!(invoice.amount > 0);
        }
        assert_eq!(data.invoices[0].amount, 10_000);
    }

    #[tokio::test]
    async fn run_populates_store() {
        let store = MemoryStore::new();
        run(&store, 4).await.unwrap();

        assert_eq!(store.count_customers().await.unwrap(), 6);
        assert_eq!(store.count_invoices().await.unwrap(), 14);
        assert_eq!(store.revenue().await.unwrap().len(), 12);
        assert!(store.user_by_email("johndoe1@example.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn run_reports_store_failure() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        assert!(run(&store, 4).await.is_err());
    }
}
