use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::models::{Customer, Invoice};

/// The search predicate shared by the invoice table and its page count.
///
/// An invoice matches when its customer's name or email, or its status,
/// contains the query case-insensitively; when the query is a number equal to
/// the stored amount in cents; or when the query is a date equal to the
/// invoice date.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceFilter {
    query: String,
    amount: Option<f64>,
    date: Option<DateTime<Utc>>,
}

impl InvoiceFilter {
    pub fn new(query: &str) -> Self {
        let trimmed = query.trim();

        Self {
            query: query.to_string(),
            amount: trimmed.parse::<f64>().ok().filter(|n| n.is_finite()),
            date: parse_date(trimmed),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn amount(&self) -> Option<f64> {
        self.amount
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        self.date
    }

    /// `ILIKE` pattern for a substring match, with the query's own wildcards escaped.
    pub fn like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.query.len() + 2);
        pattern.push('%');
        for c in self.query.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }

    pub fn matches(&self, invoice: &Invoice, customer: &Customer) -> bool {
        let needle = self.query.to_lowercase();
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

        contains(&customer.name)
            || contains(&customer.email)
            || contains(invoice.status.as_str())
            || self.amount.is_some_and(|amount| f64::from(invoice.amount) == amount)
            || self.date.is_some_and(|date| invoice.date == date)
    }
}

fn parse_date(query: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(query) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(query, "%Y-%m-%d %H:%M:%S") {
        return Some(date.and_utc());
    }
    if let Ok(date) = NaiveDateTime::parse_from_str(query, "%Y-%m-%dT%H:%M:%S") {
        return Some(date.and_utc());
    }
    NaiveDate::parse_from_str(query, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date| date.and_utc())
}
