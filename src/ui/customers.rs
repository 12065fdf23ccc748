use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::models::FormattedCustomersTable;
use crate::ui::components::search_input::{render_search_input, SearchEvent, SearchInputState};
use crate::ui::{nav_key, render_help, Screen};

pub struct CustomersState {
    search: SearchInputState,
    customers: Vec<FormattedCustomersTable>,
    table_state: TableState,
}

impl CustomersState {
    pub fn new() -> Self {
        Self {
            search: SearchInputState::new(),
            customers: Vec::new(),
            table_state: TableState::default(),
        }
    }

    pub fn query(&self) -> &str {
        &self.search.query
    }

    pub fn set_customers(&mut self, customers: Vec<FormattedCustomersTable>) {
        self.table_state.select(if customers.is_empty() { None } else { Some(0) });
        self.customers = customers;
    }

    pub fn next(&mut self) {
        if self.customers.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) if i + 1 < self.customers.len() => i + 1,
            _ => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.customers.is_empty() {
            return;
        }
        let i = match self.table_state.selected() {
            Some(0) | None => self.customers.len() - 1,
            Some(i) => i - 1,
        };
        self.table_state.select(Some(i));
    }
}

pub enum CustomerAction {
    Navigate(Screen),
    Reload,
    Quit,
}

pub fn render_customers<B: Backend>(frame: &mut Frame<B>, state: &mut CustomersState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(frame.size());

    render_search_input(frame, &state.search, "Search customers...", chunks[0]);

    let header_cells = ["Name", "Email", "Total Invoices", "Total Pending", "Total Paid"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells).height(1).bottom_margin(1);

    let rows = state.customers.iter().map(|customer| {
        Row::new(vec![
            Cell::from(customer.name.clone()),
            Cell::from(customer.email.clone()),
            Cell::from(customer.total_invoices.to_string()),
            Cell::from(customer.total_pending.clone()),
            Cell::from(customer.total_paid.clone()),
        ])
    });

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().title("Customers").borders(Borders::ALL))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .widths(&[
            Constraint::Percentage(25),
            Constraint::Percentage(30),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
        ]);
    frame.render_stateful_widget(table, chunks[1], &mut state.table_state);

    let help = if state.search.editing {
        "Enter - Search | Esc - Cancel"
    } else {
        "/ Search | Up/Down Scroll | 1 Overview | 2 Invoices | Q Quit"
    };
    render_help(frame, help, chunks[2]);
}

pub fn handle_input(state: &mut CustomersState) -> Result<Option<CustomerAction>> {
    if let Event::Key(key) = event::read()? {
        if state.search.editing {
            if let Some(SearchEvent::Committed) = state.search.handle_input(key.code) {
                return Ok(Some(CustomerAction::Reload));
            }
            return Ok(None);
        }

        if let Some(screen) = nav_key(key.code) {
            return Ok(Some(CustomerAction::Navigate(screen)));
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Some(CustomerAction::Quit)),
            KeyCode::Char('/') => state.search.start_editing(),
            KeyCode::Down => state.next(),
            KeyCode::Up => state.previous(),
            _ => {}
        }
    }

    Ok(None)
}
