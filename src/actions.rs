use chrono::Utc;
use uuid::Uuid;

use crate::db::{Store, StoreError};
use crate::models::Invoice;
use crate::validation::{parse_invoice_form, FieldErrors, FormData};

/// The invoice listing view, the target of every revalidation and redirect here.
pub const INVOICES_PATH: &str = "/dashboard/invoices";

const CREATE_MISSING_FIELDS: &str = "Missing Fields. Failed to Create Invoice.";
const UPDATE_MISSING_FIELDS: &str = "Missing Fields. Failed to Update Invoice.";
const CREATE_FAILED: &str = "Database Error: Failed to Create Invoice.";
const UPDATE_FAILED: &str = "Database Error: Failed to Update Invoice.";
const DELETE_FAILED: &str = "Database Error: Failed to Delete Invoice.";
const DELETED: &str = "Deleted Invoice.";

/// What the form shows after a rejected submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub message: Option<String>,
    pub errors: FieldErrors,
}

impl FormState {
    fn failure(message: &str, errors: FieldErrors) -> Self {
        Self { message: Some(message.to_string()), errors }
    }
}

/// Side effects a successful mutation asks of its caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    /// View whose cached rendering is now stale
    pub revalidate: Option<&'static str>,
    /// View to navigate to
    pub redirect: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub invoice_id: String,
    pub message: Option<&'static str>,
    pub effects: Effects,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed(Completed),
    Failed(FormState),
}

impl ActionOutcome {
    pub fn effects(&self) -> Option<&Effects> {
        match self {
            ActionOutcome::Completed(done) => Some(&done.effects),
            ActionOutcome::Failed(_) => None,
        }
    }

    pub fn form_state(&self) -> Option<&FormState> {
        match self {
            ActionOutcome::Completed(_) => None,
            ActionOutcome::Failed(state) => Some(state),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ActionOutcome::Completed(_))
    }
}

fn store_failure(action: &str, id: &str, message: &str, err: StoreError) -> ActionOutcome {
    tracing::error!(error = %err, invoice_id = id, action, "Database Error");
    ActionOutcome::Failed(FormState::failure(message, FieldErrors::new()))
}

/// Write side of the dashboard: invoice create, update and delete.
///
/// Failures never escape as errors. They come back as a [`FormState`] for
/// the form to display, and nothing is written.
#[derive(Debug, Clone)]
pub struct InvoiceActions<S> {
    store: S,
}

impl<S: Store> InvoiceActions<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn create_invoice(&self, form: &FormData) -> ActionOutcome {
        let validated = match parse_invoice_form(form) {
            Ok(validated) => validated,
            Err(errors) => {
                return ActionOutcome::Failed(FormState::failure(CREATE_MISSING_FIELDS, errors));
            }
        };

        let invoice = Invoice {
            id: Uuid::new_v4().to_string(),
            customer_id: validated.customer_id,
            amount: validated.amount_in_cents,
            status: validated.status,
            date: Utc::now(),
        };

        if let Err(err) = self.store.insert_invoice(&invoice).await {
            return store_failure("create", &invoice.id, CREATE_FAILED, err);
        }

        tracing::info!(invoice_id = %invoice.id, amount = invoice.amount, "invoice created");

        ActionOutcome::Completed(Completed {
            invoice_id: invoice.id,
            message: None,
            effects: Effects {
                revalidate: Some(INVOICES_PATH),
                redirect: Some(INVOICES_PATH),
            },
        })
    }

    pub async fn update_invoice(&self, id: &str, form: &FormData) -> ActionOutcome {
        let changes = match parse_invoice_form(form) {
            Ok(validated) => validated.into_changes(),
            Err(errors) => {
                return ActionOutcome::Failed(FormState::failure(UPDATE_MISSING_FIELDS, errors));
            }
        };

        if let Err(err) = self.store.update_invoice(id, &changes).await {
            return store_failure("update", id, UPDATE_FAILED, err);
        }

        tracing::info!(invoice_id = id, amount = changes.amount, "invoice updated");

        ActionOutcome::Completed(Completed {
            invoice_id: id.to_string(),
            message: None,
            effects: Effects {
                revalidate: Some(INVOICES_PATH),
                redirect: Some(INVOICES_PATH),
            },
        })
    }

    pub async fn delete_invoice(&self, id: &str) -> ActionOutcome {
        if let Err(err) = self.store.delete_invoice(id).await {
            return store_failure("delete", id, DELETE_FAILED, err);
        }

        tracing::info!(invoice_id = id, "invoice deleted");

        ActionOutcome::Completed(Completed {
            invoice_id: id.to_string(),
            message: Some(DELETED),
            effects: Effects {
                revalidate: Some(INVOICES_PATH),
                redirect: None,
            },
        })
    }
}
