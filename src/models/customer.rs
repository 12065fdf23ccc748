#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
}

/// The slice of a customer needed to populate a selection control.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct CustomerField {
    pub id: String,
    pub name: String,
}

/// Per-customer invoice aggregate as it comes back from the store (sums in cents).
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct CustomerTotals {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub total_invoices: i64,
    pub total_pending: i64,
    pub total_paid: i64,
}

/// A row of the customers table with the sums already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedCustomersTable {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub total_invoices: i64,
    pub total_pending: String,
    pub total_paid: String,
}
