mod customer;
mod dashboard;
mod invoice;
mod revenue;
mod user;

pub use customer::{Customer, CustomerField, CustomerTotals, FormattedCustomersTable};
pub use dashboard::CardData;
pub use invoice::{
    Invoice, InvoiceChanges, InvoiceForm, InvoiceStatus, InvoicesTable, LatestInvoice,
    LatestInvoiceRaw, UnknownStatus,
};
pub use revenue::Revenue;
pub use user::User;
