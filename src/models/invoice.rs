use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 2] = [InvoiceStatus::Pending, InvoiceStatus::Paid];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            InvoiceStatus::Pending => InvoiceStatus::Paid,
            InvoiceStatus::Paid => InvoiceStatus::Pending,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown invoice status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for InvoiceStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

fn status_column(row: &PgRow) -> Result<InvoiceStatus, sqlx::Error> {
    let raw: String = row.try_get("status")?;
    raw.parse().map_err(|e| sqlx::Error::ColumnDecode {
        index: "status".to_string(),
        source: Box::new(e),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: String,
    pub customer_id: String,
    /// Cents
    pub amount: i32,
    pub status: InvoiceStatus,
    pub date: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Invoice {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            amount: row.try_get("amount")?,
            status: status_column(row)?,
            date: row.try_get("date")?,
        })
    }
}

/// Customer, amount and status as written by the create and update forms.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceChanges {
    pub customer_id: String,
    pub amount: i32,
    pub status: InvoiceStatus,
}

/// An invoice joined with its customer, before the amount is formatted.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct LatestInvoiceRaw {
    pub id: String,
    pub amount: i32,
    pub name: String,
    pub email: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestInvoice {
    pub id: String,
    pub amount: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
}

/// A row of the searchable invoices table.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoicesTable {
    pub id: String,
    pub customer_id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub date: DateTime<Utc>,
    /// Cents
    pub amount: i32,
    pub status: InvoiceStatus,
}

impl<'r> FromRow<'r, PgRow> for InvoicesTable {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            image_url: row.try_get("image_url")?,
            date: row.try_get("date")?,
            amount: row.try_get("amount")?,
            status: status_column(row)?,
        })
    }
}

/// An invoice prepared for the edit form, amount back in dollars.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceForm {
    pub id: String,
    pub customer_id: String,
    pub amount: f64,
    pub status: InvoiceStatus,
}

impl From<Invoice> for InvoiceForm {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            customer_id: invoice.customer_id,
            amount: f64::from(invoice.amount) / 100.0,
            status: invoice.status,
        }
    }
}
