//! Property tests for the money and pagination invariants.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use invoice_dashboard::data::{DashboardData, ITEMS_PER_PAGE};
use invoice_dashboard::db::{MemoryStore, Store};
use invoice_dashboard::models::{Customer, Invoice, InvoiceForm, InvoiceStatus};
use invoice_dashboard::seed::SeedData;
use invoice_dashboard::validation::{dollars_to_cents, parse_invoice_form, FormData};

fn store_with_invoices(count: usize) -> SeedData {
    let customer = Customer {
        id: "cust-1".to_string(),
        name: "Delba de Oliveira".to_string(),
        email: "delba@oliveira.com".to_string(),
        image_url: String::new(),
    };
    let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    let invoices = (0..count)
        .map(|i| Invoice {
            id: format!("inv-{i:03}"),
            customer_id: customer.id.clone(),
            amount: 100 + i as i32,
            status: if i % 2 == 0 { InvoiceStatus::Paid } else { InvoiceStatus::Pending },
            date: start + Duration::days(i as i64),
        })
        .collect();

    SeedData {
        customers: vec![customer],
        invoices,
        ..SeedData::default()
    }
}

proptest! {
    /// Property: an amount typed with two decimals is stored as exactly that many cents
    /// and comes back to the edit form as the same amount.
    #[test]
    fn prop_submitted_amount_round_trips(cents in 1i32..=999_999_999) {
        let typed = format!("{}.{:02}", cents / 100, cents % 100);
        let form = FormData::new()
            .with("customerId", "cust-1")
            .with("amount", typed)
            .with("status", "pending");

        let validated = parse_invoice_form(&form).expect("valid submission");
        prop_assert_eq!(validated.amount_in_cents, cents);

        let stored = Invoice {
            id: "inv".to_string(),
            customer_id: validated.customer_id,
            amount: validated.amount_in_cents,
            status: validated.status,
            date: Utc::now(),
        };
        let edit = InvoiceForm::from(stored);
        prop_assert_eq!(dollars_to_cents(edit.amount), i64::from(cents));
    }

    /// Property: cents never drift when converted to dollars and back
    #[test]
    fn prop_cents_to_dollars_and_back(cents in any::<i32>()) {
        prop_assert_eq!(dollars_to_cents(f64::from(cents) / 100.0), i64::from(cents));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: the page count is ceil(matches / 6) and the pages together hold
    /// every match exactly once.
    #[test]
    fn prop_pages_cover_all_matches(count in 0usize..40) {
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        let (pages, seen) = runtime.block_on(async {
            let store = MemoryStore::new();
            store.seed(&store_with_invoices(count)).await.expect("seed");
            let data = DashboardData::new(store);

            let pages = data.fetch_invoices_pages("").await.expect("pages");
            let mut seen = Vec::new();
            for page in 1..=pages {
                let rows = data.fetch_filtered_invoices("", page).await.expect("page");
                assert!(rows.len() as i64 <= ITEMS_PER_PAGE);
                seen.extend(rows.into_iter().map(|row| row.id));
            }
            (pages, seen)
        });

        let expected_pages = (count as i64 + ITEMS_PER_PAGE - 1) / ITEMS_PER_PAGE;
        prop_assert_eq!(pages, expected_pages);

        let mut unique = seen.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), count);
        prop_assert_eq!(seen.len(), count);
    }
}
