use std::collections::BTreeMap;
use std::fmt;

use crate::models::{InvoiceChanges, InvoiceStatus};

pub const CUSTOMER_MESSAGE: &str = "Please select a customer.";
pub const AMOUNT_MESSAGE: &str = "Please enter an amount greater than $0.";
pub const AMOUNT_TOO_LARGE_MESSAGE: &str = "Amount is too large.";
pub const STATUS_MESSAGE: &str = "Please select an invoice status.";

/// A flat key/value form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: BTreeMap<String, String>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = FormData::new();
        for (key, value) in iter {
            form.insert(key, value);
        }
        form
    }
}

/// The invoice form's fields, named as they are submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    CustomerId,
    Amount,
    Status,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::CustomerId => "customerId",
            Field::Amount => "amount",
            Field::Status => "status",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Human-readable messages per invalid field. Empty when the form is valid.
pub type FieldErrors = BTreeMap<Field, Vec<String>>;

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedInvoice {
    pub customer_id: String,
    /// Dollars, as entered
    pub amount: f64,
    pub amount_in_cents: i32,
    pub status: InvoiceStatus,
}

impl ValidatedInvoice {
    pub fn into_changes(self) -> InvoiceChanges {
        InvoiceChanges {
            customer_id: self.customer_id,
            amount: self.amount_in_cents,
            status: self.status,
        }
    }
}

/// `round(amount * 100)`
pub fn dollars_to_cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Coerce a submitted value to a number: surrounding whitespace is ignored and
/// a missing or blank value counts as zero.
fn coerce_number(raw: Option<&str>) -> Option<f64> {
    let trimmed = raw.unwrap_or("").trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parse an invoice submission, collecting every field error instead of
/// stopping at the first.
pub fn parse_invoice_form(form: &FormData) -> Result<ValidatedInvoice, FieldErrors> {
    let mut errors = FieldErrors::new();

    let customer_id = match form.get(Field::CustomerId.name()).map(str::trim) {
        Some(id) if !id.is_empty() => Some(id.to_string()),
        _ => {
            errors.insert(Field::CustomerId, vec![CUSTOMER_MESSAGE.to_string()]);
            None
        }
    };

    let amount = match coerce_number(form.get(Field::Amount.name())) {
        Some(amount) if amount > 0.0 => {
            let cents = dollars_to_cents(amount);
            match i32::try_from(cents) {
                Ok(cents) if cents > 0 => Some((amount, cents)),
                Ok(_) => {
                    errors.insert(Field::Amount, vec![AMOUNT_MESSAGE.to_string()]);
                    None
                }
                Err(_) => {
                    errors.insert(Field::Amount, vec![AMOUNT_TOO_LARGE_MESSAGE.to_string()]);
                    None
                }
            }
        }
        _ => {
            errors.insert(Field::Amount, vec![AMOUNT_MESSAGE.to_string()]);
            None
        }
    };

    let status = match form.get(Field::Status.name()).map(str::parse::<InvoiceStatus>) {
        Some(Ok(status)) => Some(status),
        _ => {
            errors.insert(Field::Status, vec![STATUS_MESSAGE.to_string()]);
            None
        }
    };

    match (customer_id, amount, status) {
        (Some(customer_id), Some((amount, amount_in_cents)), Some(status)) => Ok(ValidatedInvoice {
            customer_id,
            amount,
            amount_in_cents,
            status,
        }),
        _ => Err(errors),
    }
}
