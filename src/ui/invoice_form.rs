use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::actions::FormState;
use crate::models::{CustomerField, InvoiceForm, InvoiceStatus};
use crate::ui::render_help;
use crate::validation::{Field, FormData};

pub enum InvoiceFormAction {
    Cancel,
    Submit(FormData),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FormField {
    Customer,
    Amount,
    Status,
}

impl FormField {
    fn label(self) -> &'static str {
        match self {
            FormField::Customer => "Customer",
            FormField::Amount => "Amount (USD)",
            FormField::Status => "Status",
        }
    }

    fn field(self) -> Field {
        match self {
            FormField::Customer => Field::CustomerId,
            FormField::Amount => Field::Amount,
            FormField::Status => Field::Status,
        }
    }
}

const FIELDS: [FormField; 3] = [FormField::Customer, FormField::Amount, FormField::Status];

pub struct InvoiceFormState {
    invoice_id: Option<String>,
    customers: Vec<CustomerField>,
    customer: Option<usize>,
    amount: String,
    status: Option<InvoiceStatus>,
    current_field: FormField,
    editing: bool,
    result: FormState,
}

impl InvoiceFormState {
    /// An empty form for a new invoice. Nothing is preselected.
    pub fn new(customers: Vec<CustomerField>) -> Self {
        Self {
            invoice_id: None,
            customers,
            customer: None,
            amount: String::new(),
            status: None,
            current_field: FormField::Customer,
            editing: false,
            result: FormState::default(),
        }
    }

    pub fn from_existing(customers: Vec<CustomerField>, invoice: InvoiceForm) -> Self {
        let customer = customers.iter().position(|c| c.id == invoice.customer_id);
        Self {
            invoice_id: Some(invoice.id),
            customer,
            customers,
            amount: invoice.amount.to_string(),
            status: Some(invoice.status),
            current_field: FormField::Customer,
            editing: false,
            result: FormState::default(),
        }
    }

    pub fn invoice_id(&self) -> Option<&str> {
        self.invoice_id.as_deref()
    }

    pub fn result(&self) -> &FormState {
        &self.result
    }

    pub fn set_result(&mut self, result: FormState) {
        self.result = result;
    }

    pub fn next_field(&mut self) {
        self.current_field = match self.current_field {
            FormField::Customer => FormField::Amount,
            FormField::Amount => FormField::Status,
            FormField::Status => FormField::Customer,
        };
    }

    pub fn previous_field(&mut self) {
        self.current_field = match self.current_field {
            FormField::Customer => FormField::Status,
            FormField::Amount => FormField::Customer,
            FormField::Status => FormField::Amount,
        };
    }

    /// Step the customer or status choice. Amount is typed, not cycled.
    pub fn cycle(&mut self, forward: bool) {
        match self.current_field {
            FormField::Customer => {
                let len = self.customers.len();
                if len == 0 {
                    return;
                }
                self.customer = Some(match self.customer {
                    None if forward => 0,
                    None => len - 1,
                    Some(i) if forward => (i + 1) % len,
                    Some(i) => (i + len - 1) % len,
                });
            }
            FormField::Status => {
                self.status = Some(match self.status {
                    Some(status) => status.toggle(),
                    None if forward => InvoiceStatus::Pending,
                    None => InvoiceStatus::Paid,
                });
            }
            FormField::Amount => {}
        }
    }

    pub fn toggle_editing(&mut self) {
        self.editing = self.current_field == FormField::Amount && !self.editing;
    }

    pub fn edit_amount(&mut self, key: KeyCode) {
        if !self.editing {
            return;
        }

        match key {
            KeyCode::Char(c) => {
                self.amount.push(c);
            }
            KeyCode::Backspace => {
                self.amount.pop();
            }
            _ => {}
        }
    }

    /// The submission as the form would post it. Unset fields are absent.
    pub fn to_form(&self) -> FormData {
        let mut form = FormData::new();
        if let Some(customer) = self.customer.and_then(|i| self.customers.get(i)) {
            form.insert(Field::CustomerId.name(), customer.id.as_str());
        }
        if !self.amount.is_empty() {
            form.insert(Field::Amount.name(), self.amount.as_str());
        }
        if let Some(status) = self.status {
            form.insert(Field::Status.name(), status.as_str());
        }
        form
    }

    fn display_value(&self, field: FormField) -> String {
        match field {
            FormField::Customer => self
                .customer
                .and_then(|i| self.customers.get(i))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| "Select a customer".to_string()),
            FormField::Amount if self.editing => format!("{}|", self.amount),
            FormField::Amount => self.amount.clone(),
            FormField::Status => self
                .status
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "Select a status".to_string()),
        }
    }
}

pub fn render_invoice_form<B: Backend>(f: &mut Frame<B>, state: &mut InvoiceFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(2)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(3),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(f.size());

    let title_text = if state.invoice_id.is_none() {
        "Create Invoice"
    } else {
        "Edit Invoice"
    };
    let title = Paragraph::new(title_text)
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    render_fields(f, state, chunks[1]);

    let message = state.result.message.as_deref().unwrap_or("");
    let status = Paragraph::new(message)
        .style(Style::default().fg(Color::Red))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, chunks[2]);

    let help_text = if state.editing {
        "Enter - Done | Backspace - Delete"
    } else {
        "Up/Down - Navigate | Left/Right - Choose | Enter - Edit amount | S - Submit | Esc - Cancel"
    };
    render_help(f, help_text, chunks[3]);
}

fn render_fields<B: Backend>(f: &mut Frame<B>, state: &InvoiceFormState, area: Rect) {
    let mut items = Vec::new();

    for field in FIELDS {
        let selected = field == state.current_field;
        let label_style = if selected {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let value_style = if selected && state.editing {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        items.push(ListItem::new(Spans::from(vec![
            Span::styled(format!("{}: ", field.label()), label_style),
            Span::styled(state.display_value(field), value_style),
        ])));

        if let Some(errors) = state.result.errors.get(&field.field()) {
            for error in errors {
                items.push(ListItem::new(Span::styled(
                    format!("  {error}"),
                    Style::default().fg(Color::Red),
                )));
            }
        }
    }

    let form_list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title("Invoice Details"));
    f.render_widget(form_list, area);
}

pub fn handle_input(state: &mut InvoiceFormState) -> Result<Option<InvoiceFormAction>> {
    if let Event::Key(key) = event::read()? {
        match key.code {
            KeyCode::Esc => {
                if state.editing {
                    state.toggle_editing();
                } else {
                    return Ok(Some(InvoiceFormAction::Cancel));
                }
            }
            KeyCode::Enter => {
                state.toggle_editing();
            }
            _ if state.editing => {
                state.edit_amount(key.code);
            }
            KeyCode::Up => {
                state.previous_field();
            }
            KeyCode::Down | KeyCode::Tab => {
                state.next_field();
            }
            KeyCode::Left => {
                state.cycle(false);
            }
            KeyCode::Right => {
                state.cycle(true);
            }
            KeyCode::Char('s') => {
                return Ok(Some(InvoiceFormAction::Submit(state.to_form())));
            }
            _ => {}
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customers() -> Vec<CustomerField> {
        ["Delba de Oliveira", "Lee Robinson"]
            .iter()
            .enumerate()
            .map(|(i, name)| CustomerField { id: format!("cust-{i}"), name: name.to_string() })
            .collect()
    }

    #[test]
    fn new_form_submits_nothing() {
        let state = InvoiceFormState::new(customers());
        assert_eq!(state.to_form(), FormData::new());
    }

    #[test]
    fn filled_form_uses_submission_keys() {
        let mut state = InvoiceFormState::new(customers());
        state.cycle(true);
        state.next_field();
        state.toggle_editing();
        for c in "49.99".chars() {
            state.edit_amount(KeyCode::Char(c));
        }
        state.toggle_editing();
        state.next_field();
        state.cycle(true);

        let form = state.to_form();
        assert_eq!(form.get("customerId"), Some("cust-0"));
        assert_eq!(form.get("amount"), Some("49.99"));
        assert_eq!(form.get("status"), Some("pending"));
    }

    #[test]
    fn existing_invoice_preselects_its_values() {
        let invoice = InvoiceForm {
            id: "inv-1".to_string(),
            customer_id: "cust-1".to_string(),
            amount: 12.5,
            status: InvoiceStatus::Paid,
        };
        let state = InvoiceFormState::from_existing(customers(), invoice);

        assert_eq!(state.invoice_id(), Some("inv-1"));
        let form = state.to_form();
        assert_eq!(form.get("customerId"), Some("cust-1"));
        assert_eq!(form.get("amount"), Some("12.5"));
        assert_eq!(form.get("status"), Some("paid"));
    }

    #[test]
    fn customer_choice_wraps_both_ways() {
        let mut state = InvoiceFormState::new(customers());
        state.cycle(false);
        assert_eq!(state.to_form().get("customerId"), Some("cust-1"));
        state.cycle(true);
        assert_eq!(state.to_form().get("customerId"), Some("cust-0"));
    }

    #[test]
    fn only_the_amount_field_can_be_edited() {
        let mut state = InvoiceFormState::new(customers());
        state.toggle_editing();
        state.edit_amount(KeyCode::Char('9'));
        assert!(state.to_form().get("amount").is_none());
    }
}
